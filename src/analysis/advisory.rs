//! Farmer advisory derived from the short-range forecast.

use serde::{Deserialize, Serialize};

/// Rain volume (mm per slice) at or above which rain counts as heavy.
pub const DEFAULT_HEAVY_RAIN_MM: f64 = 5.0;

/// Precipitation probability at or above which rain is expected.
pub const DEFAULT_RAIN_PROBABILITY: f64 = 0.35;

/// Number of 3-hour forecast slices scanned (~24h).
pub const DEFAULT_FORECAST_SLICES: usize = 8;

/// Thresholds used when scanning forecast slices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryThresholds {
    pub heavy_rain_mm: f64,
    pub rain_probability: f64,
    pub slices: usize,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        Self {
            heavy_rain_mm: DEFAULT_HEAVY_RAIN_MM,
            rain_probability: DEFAULT_RAIN_PROBABILITY,
            slices: DEFAULT_FORECAST_SLICES,
        }
    }
}

/// One future time slice of the forecast.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForecastSlice {
    pub rain_volume: Option<f64>,
    pub snow_volume: Option<f64>,
    /// Probability of precipitation in `[0, 1]`.
    pub precipitation_probability: Option<f64>,
}

impl ForecastSlice {
    fn has_precipitation(&self) -> bool {
        self.rain_volume.is_some_and(|v| v > 0.0) || self.snow_volume.is_some_and(|v| v > 0.0)
    }
}

/// Advisory attached to the condition report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    HeavyRain,
    RainExpected,
    Favorable,
}

impl Advisory {
    /// Scan the first `thresholds.slices` slices. Heavy rain anywhere wins
    /// over expected rain, which wins over the favorable default.
    pub fn derive(slices: &[ForecastSlice], thresholds: &AdvisoryThresholds) -> Self {
        let window = &slices[..slices.len().min(thresholds.slices)];

        let heavy = window
            .iter()
            .any(|s| s.rain_volume.is_some_and(|v| v >= thresholds.heavy_rain_mm));
        if heavy {
            return Advisory::HeavyRain;
        }

        let expected = window.iter().any(|s| {
            s.has_precipitation()
                || s.precipitation_probability
                    .is_some_and(|p| p >= thresholds.rain_probability)
        });
        if expected {
            Advisory::RainExpected
        } else {
            Advisory::Favorable
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Advisory::HeavyRain => "Heavy rain expected in the next 24 hours. Secure produce, check drainage, and avoid field operations where waterlogging may occur.",
            Advisory::RainExpected => "Rain expected in the next 24 hours. Consider covering sensitive crops, postpone pesticide sprays, and prepare for wet conditions.",
            Advisory::Favorable => "Nice weather. Conditions look good for field work.",
        }
    }
}
