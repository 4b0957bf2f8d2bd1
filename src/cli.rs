//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation of the two required request fields.

use crate::config::GeneralConfig;
use crate::models::{AnalysisRequest, Artifact};
use clap::Parser;
use std::path::PathBuf;

/// AgroDiag - concurrent crop diagnosis from a single leaf photo
///
/// Classifies the leaf image, fetches field weather with a 24h advisory,
/// and looks up mandi prices for the crop, all at once. Any backend that is
/// missing or failing degrades to a stub section instead of an error.
///
/// Examples:
///   agrodiag --image leaf.jpg --city Bangalore --crop Potato
///   agrodiag --image leaf.jpg --city Nashik --crop Onion --format markdown -o report.md
///   agrodiag --image leaf.jpg --city Pune --crop Tomato --offline
///   agrodiag --list-commodities
///   agrodiag --ask "When should I irrigate wheat after sowing?"
///   agrodiag --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Leaf image to classify
    #[arg(short, long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// City used for weather and market prices
    #[arg(long, env = "AGRODIAG_CITY")]
    pub city: Option<String>,

    /// Crop (commodity) to price
    #[arg(long, env = "AGRODIAG_CROP")]
    pub crop: Option<String>,

    /// Model to use for vision, prices and questions
    ///
    /// Must support image input for classification, e.g. llava:latest.
    #[arg(short, long, env = "AGRODIAG_MODEL")]
    pub model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// OpenWeather API key
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub weather_api_key: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .agrodiag.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (json, markdown)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Per-request timeout in seconds for every backend call
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Disable all backends and return stub sections
    #[arg(long)]
    pub offline: bool,

    /// Print the commodities known to the market backend and exit
    #[arg(long, conflicts_with_all = ["ask", "image"])]
    pub list_commodities: bool,

    /// Ask the agronomy knowledge agent a question and exit
    #[arg(long, value_name = "QUESTION", conflicts_with = "image")]
    pub ask: Option<String>,

    /// Generate a default .agrodiag.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON format (default)
    #[default]
    Json,
    /// Markdown format
    Markdown,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    InitConfig,
    ListCommodities,
    Ask(String),
    Diagnose,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn mode(&self) -> Mode {
        if self.init_config {
            Mode::InitConfig
        } else if self.list_commodities {
            Mode::ListCommodities
        } else if let Some(ref question) = self.ask {
            Mode::Ask(question.clone())
        } else {
            Mode::Diagnose
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        match self.mode() {
            Mode::Ask(question) if question.trim().is_empty() => {
                Err("Question must not be empty".to_string())
            }
            Mode::Diagnose => self.validate_image(),
            _ => Ok(()),
        }
    }

    fn validate_image(&self) -> Result<(), String> {
        let image = self
            .image
            .as_ref()
            .ok_or_else(|| "No image file provided (use --image)".to_string())?;

        if !image.exists() {
            return Err(format!("Image file does not exist: {}", image.display()));
        }
        if !image.is_file() {
            return Err(format!("Image path is not a file: {}", image.display()));
        }

        Ok(())
    }

    /// Build the analysis request, falling back to configured defaults for
    /// city and crop. Both must be non-empty after trimming.
    pub fn request(&self, general: &GeneralConfig) -> Result<AnalysisRequest, String> {
        let image = self
            .image
            .clone()
            .ok_or_else(|| "No image file provided (use --image)".to_string())?;

        let city = self
            .city
            .as_deref()
            .or(general.city.as_deref())
            .map(str::trim)
            .unwrap_or_default();
        let crop = self
            .crop
            .as_deref()
            .or(general.crop.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if city.is_empty() || crop.is_empty() {
            return Err("Both 'city' and 'crop' fields are required.".to_string());
        }

        Ok(AnalysisRequest::new(Artifact::Path(image), city, crop))
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
