//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.agrodiag.toml` files. Agents never read the environment themselves;
//! everything they need arrives through these structs.

use crate::analysis::advisory::{
    AdvisoryThresholds, DEFAULT_FORECAST_SLICES, DEFAULT_HEAVY_RAIN_MM, DEFAULT_RAIN_PROBABILITY,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".agrodiag.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Generative model settings (vision, prices, knowledge).
    #[serde(default)]
    pub model: ModelConfig,

    /// Weather provider settings.
    #[serde(default)]
    pub weather: WeatherConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log at debug level even without `--verbose`.
    #[serde(default)]
    pub verbose: bool,

    /// City used when `--city` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    /// Crop used when `--crop` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<String>,
}

/// Generative model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Disable to run classification and prices in stub mode.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Model name. Must accept images for classification.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama-compatible API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Bearer token for hosted endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: default_model(),
            ollama_url: default_ollama_url(),
            api_key: None,
            temperature: default_temperature(),
            timeout_seconds: default_model_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "llava:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_model_timeout() -> u64 {
    60
}

/// Weather provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeather API key. Without one the condition agent returns stubs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenWeather-compatible API.
    #[serde(default = "default_weather_url")]
    pub base_url: String,

    /// Unit system passed to the provider.
    #[serde(default = "default_units")]
    pub units: String,

    /// Request timeout in seconds.
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u64,

    /// Forecast slices scanned for the advisory.
    #[serde(default = "default_forecast_slices")]
    pub forecast_slices: usize,

    /// Rain volume per slice counted as heavy.
    #[serde(default = "default_heavy_rain_mm")]
    pub heavy_rain_mm: f64,

    /// Precipitation probability counted as expected rain.
    #[serde(default = "default_rain_probability")]
    pub rain_probability: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_url(),
            units: default_units(),
            timeout_seconds: default_weather_timeout(),
            forecast_slices: default_forecast_slices(),
            heavy_rain_mm: default_heavy_rain_mm(),
            rain_probability: default_rain_probability(),
        }
    }
}

impl WeatherConfig {
    pub fn thresholds(&self) -> AdvisoryThresholds {
        AdvisoryThresholds {
            heavy_rain_mm: self.heavy_rain_mm,
            rain_probability: self.rain_probability,
            slices: self.forecast_slices,
        }
    }
}

fn default_weather_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_weather_timeout() -> u64 {
    10
}

fn default_forecast_slices() -> usize {
    DEFAULT_FORECAST_SLICES
}

fn default_heavy_rain_mm() -> f64 {
    DEFAULT_HEAVY_RAIN_MM
}

fn default_rain_probability() -> f64 {
    DEFAULT_RAIN_PROBABILITY
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually provided.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
            self.weather.timeout_seconds = timeout;
        }
        if let Some(ref key) = args.weather_api_key {
            self.weather.api_key = Some(key.clone());
        }
        if let Some(ref city) = args.city {
            self.general.city = Some(city.clone());
        }
        if let Some(ref crop) = args.crop {
            self.general.crop = Some(crop.clone());
        }

        // Offline disables every backend
        if args.offline {
            self.model.enabled = false;
            self.weather.api_key = None;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Effective log level. `--quiet` wins over a verbose config file.
    pub fn log_level(&self, args: &crate::cli::Args) -> tracing::Level {
        if args.quiet {
            tracing::Level::ERROR
        } else if self.general.verbose {
            tracing::Level::DEBUG
        } else {
            args.log_level()
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
