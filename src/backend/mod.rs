//! Remote capabilities behind the analyzer agents.
//!
//! Each backend is a narrow async trait so agents can be driven by test
//! doubles. A backend that is not configured is represented as `None` at
//! construction time; agents never probe the environment at call time.

pub mod ollama;
pub mod openweather;

use crate::analysis::ForecastSlice;
use crate::config::{ModelConfig, WeatherConfig};
use crate::error::{AgentError, SupervisorError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

pub use ollama::OllamaBackend;
pub use openweather::OpenWeatherClient;

/// A single generation request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    /// Base64-encoded images attached to the user message.
    pub images: Vec<String>,
}

impl Prompt {
    pub fn new(system: &str, user: impl Into<String>) -> Self {
        Self {
            system: system.to_string(),
            user: user.into(),
            images: Vec::new(),
        }
    }

    pub fn with_image(mut self, encoded: String) -> Self {
        self.images.push(encoded);
        self
    }
}

/// Text generation backend (classification, prices, knowledge).
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    fn model_name(&self) -> &str;

    /// Returns the raw text of the model's reply.
    async fn generate(&self, prompt: &Prompt) -> Result<String, AgentError>;
}

/// Geographic coordinates returned with current conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// Current weather at a location.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub description: Option<String>,
    pub wind_speed: Option<f64>,
    pub precipitation: Option<f64>,
    pub coordinates: Option<Coordinates>,
}

/// Weather data backend.
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn current(&self, location: &str) -> Result<CurrentConditions, AgentError>;

    /// Future slices in chronological order.
    async fn forecast(&self, coordinates: Coordinates) -> Result<Vec<ForecastSlice>, AgentError>;
}

/// Build the generative backend, or `None` when it is disabled.
pub fn build_generative(
    config: &ModelConfig,
) -> Result<Option<Arc<dyn GenerativeBackend>>, SupervisorError> {
    if !config.enabled {
        info!("Generative backend disabled; vision and prices run in stub mode");
        return Ok(None);
    }

    let backend = OllamaBackend::new(config)?;
    Ok(Some(Arc::new(backend)))
}

/// Build the weather backend, or `None` when no API key is configured.
pub fn build_weather(
    config: &WeatherConfig,
) -> Result<Option<Arc<dyn WeatherBackend>>, SupervisorError> {
    match config.api_key {
        Some(ref key) if !key.trim().is_empty() => {
            let client = OpenWeatherClient::new(config, key.trim())?;
            Ok(Some(Arc::new(client)))
        }
        _ => {
            info!("No weather API key configured; conditions run in stub mode");
            Ok(None)
        }
    }
}

/// Build the HTTP client shared by one backend.
fn http_client(
    component: &'static str,
    timeout_seconds: u64,
) -> Result<reqwest::Client, SupervisorError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| SupervisorError::Construction {
            component,
            reason: e.to_string(),
        })
}

/// Reject base URLs that cannot be requested.
fn parse_base_url(component: &'static str, url: &str) -> Result<String, SupervisorError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| SupervisorError::Construction {
        component,
        reason: format!("invalid URL '{}': {}", url, e),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(SupervisorError::Construction {
            component,
            reason: format!("unsupported URL scheme '{}'", parsed.scheme()),
        });
    }

    Ok(url.trim_end_matches('/').to_string())
}
