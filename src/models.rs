//! Data models for the diagnosis pipeline.
//!
//! This module contains the request handed to the supervisor, the three
//! per-agent results, the composite that aggregates them, and the report
//! wrapper written by the CLI.

use crate::error::AgentError;
use chrono::{DateTime, Local, Utc};
use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Disease marker when the classification backend is not configured.
pub const DISEASE_UNKNOWN: &str = "unknown";
/// Disease marker when classification was attempted and failed.
pub const DISEASE_ERROR: &str = "error";
/// Disease marker used by the request guard fallback.
pub const DISEASE_UNANALYZED: &str = "Unable to analyze";

pub const CONDITION_MISSING_LOCATION: &str = "missing_location";
pub const CONDITION_UNAVAILABLE: &str = "unavailable";

pub const SOURCE_STUB: &str = "stub";
pub const SOURCE_MISSING_PARAMETERS: &str = "missing_parameters";

/// Handle to the uploaded leaf image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Image stored on disk.
    Path(PathBuf),
    /// Image already held in memory.
    #[cfg_attr(not(test), allow(dead_code))]
    Bytes(Vec<u8>),
}

impl Artifact {
    /// Read the artifact's bytes.
    pub async fn load(&self) -> Result<Vec<u8>, AgentError> {
        match self {
            Artifact::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| AgentError::Artifact {
                        path: path.display().to_string(),
                        source,
                    })
            }
            Artifact::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Path(path) => write!(f, "{}", path.display()),
            Artifact::Bytes(bytes) => write!(f, "<{} bytes in memory>", bytes.len()),
        }
    }
}

/// One diagnosis request. Location and commodity are validated by the caller.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    artifact: Artifact,
    location: String,
    commodity: String,
}

impl AnalysisRequest {
    pub fn new(
        artifact: Artifact,
        location: impl Into<String>,
        commodity: impl Into<String>,
    ) -> Self {
        Self {
            artifact,
            location: location.into(),
            commodity: commodity.into(),
        }
    }

    pub fn artifact(&self) -> &Artifact {
        &self.artifact
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn commodity(&self) -> &str {
        &self.commodity
    }
}

/// Result of the leaf image classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Detected disease name, or a stub marker.
    pub disease: String,
    /// Model confidence in `[0, 1]`.
    #[serde(deserialize_with = "lenient_f64")]
    pub confidence: f64,
    /// Severity as reported by the model.
    pub severity: String,
    /// Suggested treatment.
    pub recommendation: String,
    /// Reasoning, or why analysis could not be performed.
    pub explanation: String,
}

impl DiagnosisResult {
    /// Stub for a classification backend that is not configured.
    pub fn unconfigured(reason: impl fmt::Display) -> Self {
        Self {
            disease: DISEASE_UNKNOWN.to_string(),
            confidence: 0.0,
            severity: "unknown".to_string(),
            recommendation:
                "Vision model not configured. Provide a model endpoint or run in stub mode."
                    .to_string(),
            explanation: reason.to_string(),
        }
    }

    /// Stub for a classification attempt that failed.
    pub fn failed(err: &AgentError) -> Self {
        Self {
            disease: DISEASE_ERROR.to_string(),
            confidence: 0.0,
            severity: "unknown".to_string(),
            recommendation: "Error calling vision model; check logs.".to_string(),
            explanation: err.to_string(),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(
            self.disease.as_str(),
            DISEASE_UNKNOWN | DISEASE_ERROR | DISEASE_UNANALYZED
        )
    }
}

/// Current field conditions plus the forecast-derived advisory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionReport {
    pub city: Option<String>,
    /// Temperature in the configured units.
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Weather description, or a stub marker.
    pub condition: String,
    pub wind_speed: Option<f64>,
    /// Precipitation volume over the last hour (or three hours).
    pub precipitation: Option<f64>,
    pub advisory: Option<String>,
}

impl ConditionReport {
    pub fn missing_location() -> Self {
        Self::empty(None, CONDITION_MISSING_LOCATION)
    }

    pub fn unavailable(city: &str) -> Self {
        Self::empty(Some(city.to_string()), CONDITION_UNAVAILABLE)
    }

    /// Plausible placeholder values used by the request guard.
    pub fn placeholder(city: &str) -> Self {
        Self {
            city: Some(city.to_string()),
            temperature: Some(25.0),
            humidity: Some(60.0),
            condition: "clear sky".to_string(),
            wind_speed: Some(2.5),
            precipitation: None,
            advisory: None,
        }
    }

    fn empty(city: Option<String>, condition: &str) -> Self {
        Self {
            city,
            temperature: None,
            humidity: None,
            condition: condition.to_string(),
            wind_speed: None,
            precipitation: None,
            advisory: None,
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(
            self.condition.as_str(),
            CONDITION_MISSING_LOCATION | CONDITION_UNAVAILABLE
        )
    }
}

/// Prices of one commodity at one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub market: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub min_price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub max_price: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub modal_price: f64,
}

impl PriceEntry {
    pub fn placeholder() -> Self {
        Self {
            market: "Local Market".to_string(),
            min_price: 10.0,
            max_price: 12.0,
            modal_price: 11.0,
        }
    }
}

/// Market prices for the requested commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReport {
    pub commodity: Option<String>,
    #[serde(alias = "location")]
    pub city: Option<String>,
    pub date: String,
    #[serde(default)]
    pub prices: Vec<PriceEntry>,
    pub source: String,
}

impl PriceReport {
    /// Stub for a request lacking commodity or location.
    pub fn missing_parameters(commodity: &str, city: &str) -> Self {
        Self {
            commodity: non_empty(commodity),
            city: non_empty(city),
            date: today(),
            prices: Vec::new(),
            source: SOURCE_MISSING_PARAMETERS.to_string(),
        }
    }

    /// Stub with one synthetic entry.
    pub fn stub(commodity: &str, city: &str) -> Self {
        Self {
            commodity: Some(commodity.to_string()),
            city: Some(city.to_string()),
            date: today(),
            prices: vec![PriceEntry::placeholder()],
            source: SOURCE_STUB.to_string(),
        }
    }

    pub fn is_stub(&self) -> bool {
        matches!(
            self.source.as_str(),
            SOURCE_STUB | SOURCE_MISSING_PARAMETERS
        )
    }
}

/// Aggregated output of one diagnosis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub classification: DiagnosisResult,
    pub condition: ConditionReport,
    pub price: PriceReport,
}

impl CompositeResult {
    /// Fully stubbed composite returned when the pipeline itself fails.
    pub fn fallback(request: &AnalysisRequest, reason: impl fmt::Display) -> Self {
        Self {
            classification: DiagnosisResult {
                disease: DISEASE_UNANALYZED.to_string(),
                confidence: 0.0,
                severity: "unknown".to_string(),
                recommendation: "Ensure model credentials and endpoints are configured. Returned stub response.".to_string(),
                explanation: reason.to_string(),
            },
            condition: ConditionReport::placeholder(request.location()),
            price: PriceReport::stub(request.commodity(), request.location()),
        }
    }

    /// Names of the sections carrying stub markers.
    pub fn degraded_sections(&self) -> Vec<&'static str> {
        let mut sections = Vec::new();
        if self.classification.is_stub() {
            sections.push("classification");
        }
        if self.condition.is_stub() {
            sections.push("condition");
        }
        if self.price.is_stub() {
            sections.push("price");
        }
        sections
    }
}

/// Answer from the knowledge agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeAnswer {
    pub answer: String,
}

/// Metadata about a diagnostic report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub city: String,
    pub crop: String,
    /// Description of the analyzed image.
    pub artifact: String,
    pub generated_at: DateTime<Utc>,
    pub model_used: String,
    pub duration_seconds: f64,
    /// Sections that fell back to stub content.
    pub degraded: Vec<String>,
}

/// The complete report written by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub metadata: ReportMetadata,
    pub result: CompositeResult,
}

impl DiagnosticReport {
    pub fn new(
        request: &AnalysisRequest,
        result: CompositeResult,
        model_used: &str,
        duration_seconds: f64,
    ) -> Self {
        let degraded = result
            .degraded_sections()
            .into_iter()
            .map(String::from)
            .collect();

        Self {
            metadata: ReportMetadata {
                city: request.location().to_string(),
                crop: request.commodity().to_string(),
                artifact: request.artifact().to_string(),
                generated_at: Utc::now(),
                model_used: model_used.to_string(),
                duration_seconds,
                degraded,
            },
            result,
        }
    }
}

/// Today's local date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Models often quote numbers (`"1,400"`, `" 0.85 "`).
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => Ok(n),
        NumberOrText::Text(text) => text
            .trim()
            .replace(',', "")
            .parse()
            .map_err(|_| de::Error::invalid_value(Unexpected::Str(&text), &"a number")),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
