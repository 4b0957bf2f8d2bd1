//! Leaf image classification agent.

use super::Analyzer;
use crate::analysis::{repair_into, Shape};
use crate::backend::{GenerativeBackend, Prompt};
use crate::error::AgentError;
use crate::models::{Artifact, DiagnosisResult};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Classifies a plant leaf image through a vision-capable model.
pub struct ImageAnalyzer {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl ImageAnalyzer {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }

    async fn classify(
        &self,
        backend: &dyn GenerativeBackend,
        artifact: &Artifact,
    ) -> Result<DiagnosisResult, AgentError> {
        info!("Loading image: {}", artifact);
        let bytes = artifact.load().await?;
        debug!("Loaded {} bytes, sending to {}", bytes.len(), backend.model_name());

        let prompt = Prompt::new(SYSTEM_PROMPT, USER_PROMPT).with_image(BASE64.encode(&bytes));
        let raw = backend.generate(&prompt).await?;

        Ok(repair_into(&raw, Shape::Object)?)
    }
}

#[async_trait]
impl Analyzer for ImageAnalyzer {
    type Input = Artifact;
    type Output = DiagnosisResult;

    fn name(&self) -> &'static str {
        "image"
    }

    async fn run(&self, artifact: Artifact) -> DiagnosisResult {
        let Some(ref backend) = self.backend else {
            return DiagnosisResult::unconfigured(AgentError::Unconfigured("vision"));
        };

        match self.classify(backend.as_ref(), &artifact).await {
            Ok(result) => {
                info!(
                    "Classified leaf as {} ({:.2})",
                    result.disease, result.confidence
                );
                result
            }
            Err(e) => {
                warn!("Image classification failed: {}", e);
                DiagnosisResult::failed(&e)
            }
        }
    }
}

const SYSTEM_PROMPT: &str = r#"You are an agricultural plant disease detection expert.
ALWAYS respond only in JSON with these keys:
disease, confidence, severity, recommendation, explanation.
No extra text."#;

const USER_PROMPT: &str = "Analyze this plant leaf image and return JSON only.";
