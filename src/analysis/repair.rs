//! Repair of loosely formatted JSON from text backends.
//!
//! Generative backends are asked for pure JSON but often wrap it in prose
//! or code fences. Parsing is attempted directly first; on failure the text
//! between the first opening and the last closing delimiter of the expected
//! container is parsed instead.
//!
//! The slice heuristic is deliberately naive: text holding several sibling
//! containers (`{..} and {..}`) yields a slice spanning both, which fails to
//! parse and is reported as malformed.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Maximum characters of the raw payload quoted in errors.
const PREVIEW_CHARS: usize = 80;

/// Expected top-level container of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Object,
    Array,
}

impl Shape {
    fn delimiters(self) -> (char, char) {
        match self {
            Shape::Object => ('{', '}'),
            Shape::Array => ('[', ']'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Object => value.is_object(),
            Shape::Array => value.is_array(),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Object => write!(f, "object"),
            Shape::Array => write!(f, "array"),
        }
    }
}

/// Error raised when a payload cannot be recovered.
#[derive(Debug, Error)]
pub enum RepairError {
    /// Neither the raw text nor the extracted slice parsed as the shape.
    #[error("no JSON {shape} found in payload: {preview:?}")]
    MalformedPayload { shape: Shape, preview: String },

    /// Valid JSON, but keys are missing or have the wrong type.
    #[error("payload does not match the expected schema: {0}")]
    SchemaMismatch(#[source] serde_json::Error),
}

/// Parse `raw` as JSON of the given shape, extracting the container from
/// surrounding text when a direct parse fails.
pub fn repair(raw: &str, shape: Shape) -> Result<Value, RepairError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if shape.matches(&value) {
            return Ok(value);
        }
    }

    let (open, close) = shape.delimiters();
    let slice = match (trimmed.find(open), trimmed.rfind(close)) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => return Err(malformed(shape, trimmed)),
    };

    debug!(
        "Direct parse failed, retrying on extracted {} ({} of {} bytes)",
        shape,
        slice.len(),
        trimmed.len()
    );

    match serde_json::from_str::<Value>(slice) {
        Ok(value) if shape.matches(&value) => Ok(value),
        _ => Err(malformed(shape, trimmed)),
    }
}

/// Repair `raw` and decode it into a typed result.
pub fn repair_into<T: DeserializeOwned>(raw: &str, shape: Shape) -> Result<T, RepairError> {
    let value = repair(raw, shape)?;
    serde_json::from_value(value).map_err(RepairError::SchemaMismatch)
}

fn malformed(shape: Shape, raw: &str) -> RepairError {
    RepairError::MalformedPayload {
        shape,
        preview: raw.chars().take(PREVIEW_CHARS).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiagnosisResult;

    const NOISY_DIAGNOSIS: &str = include_str!("../../fixtures/responses/diagnosis_noisy.txt");

    #[test]
    fn test_direct_object() {
        let value = repair(r#"{"disease": "rust"}"#, Shape::Object).unwrap();
        assert_eq!(value["disease"], "rust");
    }

    #[test]
    fn test_object_wrapped_in_prose() {
        let raw = r#"Here is the result: {"disease":"blight","confidence":0.9,"severity":"high","recommendation":"spray","explanation":"lesions"} thanks"#;
        let value = repair(raw, Shape::Object).unwrap();
        assert_eq!(value["disease"], "blight");
        assert_eq!(value["confidence"], 0.9);
    }

    #[test]
    fn test_object_in_code_fence() {
        let diagnosis: DiagnosisResult = repair_into(NOISY_DIAGNOSIS, Shape::Object).unwrap();
        assert_eq!(diagnosis.disease, "Late Blight");
        assert!(diagnosis.confidence > 0.8);
    }

    #[test]
    fn test_no_braces_is_malformed() {
        let err = repair("I could not see any leaf in this picture.", Shape::Object).unwrap_err();
        assert!(matches!(
            err,
            RepairError::MalformedPayload {
                shape: Shape::Object,
                ..
            }
        ));
    }

    #[test]
    fn test_closing_before_opening_is_malformed() {
        assert!(repair("} nothing here {", Shape::Object).is_err());
    }

    #[test]
    fn test_array_shape() {
        let raw = "Commodities today:\n[\"Potato\", \"Onion\"]\nHope this helps.";
        let value = repair(raw, Shape::Array).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_wrong_container_falls_back_to_extraction() {
        // A bare array parses directly but is not the object we asked for.
        let value = repair(r#"[{"disease": "scab"}]"#, Shape::Object).unwrap();
        assert_eq!(value["disease"], "scab");
    }

    #[test]
    fn test_multiple_containers_are_not_split() {
        let raw = r#"first {"a": 1} then {"b": 2}"#;
        assert!(repair(raw, Shape::Object).is_err());
    }

    #[test]
    fn test_schema_mismatch() {
        let err = repair_into::<DiagnosisResult>(r#"{"disease": "rust"}"#, Shape::Object)
            .unwrap_err();
        assert!(matches!(err, RepairError::SchemaMismatch(_)));
    }

    #[test]
    fn test_preview_is_truncated() {
        let raw = "x".repeat(500);
        match repair(&raw, Shape::Array).unwrap_err() {
            RepairError::MalformedPayload { preview, .. } => {
                assert_eq!(preview.len(), PREVIEW_CHARS)
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
