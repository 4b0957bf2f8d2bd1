//! Agronomy question answering.

use super::Analyzer;
use crate::backend::{GenerativeBackend, Prompt};
use crate::models::KnowledgeAnswer;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

const UNAVAILABLE_ANSWER: &str =
    "Please configure the knowledge model (Ollama endpoint and model name) to get full answers.";

pub struct KnowledgeAgent {
    backend: Option<Arc<dyn GenerativeBackend>>,
}

impl KnowledgeAgent {
    pub fn new(backend: Option<Arc<dyn GenerativeBackend>>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Analyzer for KnowledgeAgent {
    type Input = String;
    type Output = KnowledgeAnswer;

    fn name(&self) -> &'static str {
        "knowledge"
    }

    async fn run(&self, question: String) -> KnowledgeAnswer {
        let unavailable = || KnowledgeAnswer {
            answer: UNAVAILABLE_ANSWER.to_string(),
        };

        let Some(ref backend) = self.backend else {
            return unavailable();
        };

        info!("Generating knowledge answer");
        match backend.generate(&Prompt::new(SYSTEM_PROMPT, question)).await {
            Ok(answer) if !answer.is_empty() => KnowledgeAnswer { answer },
            Ok(_) => unavailable(),
            Err(e) => {
                warn!("Knowledge model failed: {}", e);
                unavailable()
            }
        }
    }
}

const SYSTEM_PROMPT: &str = "You are an agriculture expert. Answer briefly.";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{Reply, ScriptedBackend};

    #[tokio::test]
    async fn test_answer_passthrough() {
        let backend = Arc::new(ScriptedBackend::text("Irrigate within 3 days of sowing."));
        let agent = KnowledgeAgent::new(Some(backend.clone() as Arc<dyn GenerativeBackend>));

        let answer = agent.run("When to irrigate wheat?".to_string()).await;
        assert_eq!(answer.answer, "Irrigate within 3 days of sowing.");
        assert_eq!(
            backend.last_prompt().unwrap().user,
            "When to irrigate wheat?"
        );
    }

    #[tokio::test]
    async fn test_fallback_answers() {
        let answer = KnowledgeAgent::new(None).run("q".to_string()).await;
        assert_eq!(answer.answer, UNAVAILABLE_ANSWER);

        let failing = Arc::new(ScriptedBackend::new(Reply::Fail));
        let answer = KnowledgeAgent::new(Some(failing as Arc<dyn GenerativeBackend>))
            .run("q".to_string())
            .await;
        assert_eq!(answer.answer, UNAVAILABLE_ANSWER);
    }
}
