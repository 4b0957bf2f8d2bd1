//! Field conditions agent.
//!
//! Fetches current conditions, then scans the short-range forecast for the
//! advisory. The forecast is best-effort enrichment: if it cannot be
//! fetched the favorable default advisory is kept.

use super::Analyzer;
use crate::analysis::{Advisory, AdvisoryThresholds};
use crate::backend::{Coordinates, WeatherBackend};
use crate::models::ConditionReport;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ConditionAnalyzer {
    backend: Option<Arc<dyn WeatherBackend>>,
    thresholds: AdvisoryThresholds,
}

impl ConditionAnalyzer {
    pub fn new(backend: Option<Arc<dyn WeatherBackend>>, thresholds: AdvisoryThresholds) -> Self {
        Self {
            backend,
            thresholds,
        }
    }

    async fn advisory(
        &self,
        backend: &dyn WeatherBackend,
        coordinates: Option<Coordinates>,
    ) -> Advisory {
        let Some(coordinates) = coordinates else {
            debug!("No coordinates in current conditions; skipping forecast");
            return Advisory::Favorable;
        };

        match backend.forecast(coordinates).await {
            Ok(slices) => Advisory::derive(&slices, &self.thresholds),
            Err(e) => {
                warn!("Forecast unavailable, keeping default advisory: {}", e);
                Advisory::Favorable
            }
        }
    }
}

#[async_trait]
impl Analyzer for ConditionAnalyzer {
    type Input = String;
    type Output = ConditionReport;

    fn name(&self) -> &'static str {
        "condition"
    }

    async fn run(&self, location: String) -> ConditionReport {
        let location = location.trim();
        if location.is_empty() {
            warn!("No location provided for weather lookup");
            return ConditionReport::missing_location();
        }

        let Some(ref backend) = self.backend else {
            warn!("Weather backend not configured");
            return ConditionReport::unavailable(location);
        };

        info!("Fetching weather for {}", location);
        let current = match backend.current(location).await {
            Ok(current) => current,
            Err(e) => {
                warn!("Weather lookup for {} failed: {}", location, e);
                return ConditionReport::unavailable(location);
            }
        };

        let advisory = self.advisory(backend.as_ref(), current.coordinates).await;

        ConditionReport {
            city: Some(location.to_string()),
            temperature: current.temperature,
            humidity: current.humidity,
            condition: current.description.unwrap_or_else(|| "unknown".to_string()),
            wind_speed: current.wind_speed,
            precipitation: current.precipitation,
            advisory: Some(advisory.message().to_string()),
        }
    }
}
