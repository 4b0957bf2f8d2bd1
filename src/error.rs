//! Error types for the analysis core.
//!
//! Agent-level errors never leave an agent: each analyzer turns them into
//! stub content. Supervisor-level errors are caught by the request guard.

use crate::analysis::repair::RepairError;
use thiserror::Error;

/// Failure inside a single analyzer agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The backend has no endpoint or credentials configured.
    #[error("{0} backend is not configured")]
    Unconfigured(&'static str),

    #[error("request to {backend} timed out after {seconds}s")]
    Timeout { backend: &'static str, seconds: u64 },

    #[error("cannot connect to {backend} at {url}")]
    Connect { backend: &'static str, url: String },

    #[error("{backend} API error {status}: {body}")]
    Status {
        backend: &'static str,
        status: u16,
        body: String,
    },

    #[error("{backend} request failed: {message}")]
    Request {
        backend: &'static str,
        message: String,
    },

    /// The backend answered but the payload could not be repaired.
    #[error("malformed payload: {0}")]
    Malformed(#[from] RepairError),

    #[error("failed to load artifact {path}: {source}")]
    Artifact {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AgentError {
    /// Classify a reqwest failure the same way for every backend.
    pub fn from_reqwest(
        backend: &'static str,
        url: &str,
        timeout_seconds: u64,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            AgentError::Timeout {
                backend,
                seconds: timeout_seconds,
            }
        } else if err.is_connect() {
            AgentError::Connect {
                backend,
                url: url.to_string(),
            }
        } else {
            AgentError::Request {
                backend,
                message: err.to_string(),
            }
        }
    }
}

/// Failure outside any single agent's control.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to construct {component}: {reason}")]
    Construction {
        component: &'static str,
        reason: String,
    },

    #[error("{agent} task did not complete: {source}")]
    TaskFailed {
        agent: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::repair::Shape;

    #[test]
    fn test_malformed_converts_from_repair_error() {
        let err: AgentError = RepairError::MalformedPayload {
            shape: Shape::Object,
            preview: "no braces".to_string(),
        }
        .into();
        assert!(matches!(err, AgentError::Malformed(_)));
        assert!(err.to_string().starts_with("malformed payload"));
    }

    #[test]
    fn test_construction_message() {
        let err = SupervisorError::Construction {
            component: "generative backend",
            reason: "invalid URL".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to construct generative backend: invalid URL"
        );
    }
}
