//! Ollama chat API client.
//!
//! Sends a system + user message pair (optionally with images) to
//! `/api/chat` with streaming disabled and returns the reply text.

use super::{http_client, parse_base_url, GenerativeBackend, Prompt};
use crate::config::ModelConfig;
use crate::error::{AgentError, SupervisorError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const BACKEND: &str = "Ollama";

/// Message in the chat request.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Generative backend speaking the Ollama chat protocol.
pub struct OllamaBackend {
    base_url: String,
    model_name: String,
    temperature: f32,
    timeout_seconds: u64,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(config: &ModelConfig) -> Result<Self, SupervisorError> {
        let base_url = parse_base_url("generative backend", &config.ollama_url)?;
        let http_client = http_client("generative backend", config.timeout_seconds)?;

        debug!(
            "Generative backend: model {} at {}",
            config.name, base_url
        );

        Ok(Self {
            base_url,
            model_name: config.name.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
            api_key: config.api_key.clone(),
            http_client,
        })
    }

    fn build_request(&self, prompt: &Prompt) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.model_name.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: prompt.system.clone(),
                    images: Vec::new(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.user.clone(),
                    images: prompt.images.clone(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl GenerativeBackend for OllamaBackend {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, AgentError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = self.build_request(prompt);

        debug!(
            "Sending chat request to {} ({} image(s))",
            self.model_name,
            prompt.images.len()
        );

        let mut builder = self.http_client.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            AgentError::from_reqwest(BACKEND, &self.base_url, self.timeout_seconds, e)
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Status {
                backend: BACKEND,
                status,
                body,
            });
        }

        let chat_response: OllamaChatResponse = response.json().await.map_err(|e| {
            AgentError::Request {
                backend: BACKEND,
                message: format!("failed to parse response: {}", e),
            }
        })?;

        Ok(chat_response.message.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::stub_server::{self, Route};

    fn config(url: &str) -> ModelConfig {
        ModelConfig {
            ollama_url: url.to_string(),
            timeout_seconds: 5,
            ..Default::default()
        }
    }

    #[test]
    fn test_request_serialization() {
        let backend = OllamaBackend::new(&config("http://localhost:11434/")).unwrap();
        let prompt = Prompt::new("be terse", "look at this").with_image("AAAA".to_string());

        let json = serde_json::to_value(backend.build_request(&prompt)).unwrap();
        assert_eq!(json["model"], "llava:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert!(json["messages"][0].get("images").is_none());
        assert_eq!(json["messages"][1]["images"][0], "AAAA");
        assert_eq!(backend.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_generate_returns_trimmed_content() {
        let body = r#"{"model":"llava:latest","message":{"role":"assistant","content":"  {\"ok\":true}\n"},"done":true}"#;
        let url = stub_server::spawn(vec![Route::ok("/api/chat", body)]).await;

        let backend = OllamaBackend::new(&config(&url)).unwrap();
        let text = backend.generate(&Prompt::new("s", "u")).await.unwrap();
        assert_eq!(text, r#"{"ok":true}"#);
    }

    #[tokio::test]
    async fn test_generate_reports_status() {
        let url = stub_server::spawn(vec![Route::status(
            "/api/chat",
            404,
            r#"{"error":"model not found"}"#,
        )])
        .await;

        let backend = OllamaBackend::new(&config(&url)).unwrap();
        let err = backend.generate(&Prompt::new("s", "u")).await.unwrap_err();
        match err {
            AgentError::Status { status, body, .. } => {
                assert_eq!(status, 404);
                assert!(body.contains("model not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_unexpected_body() {
        let url = stub_server::spawn(vec![Route::ok("/api/chat", r#"{"done":true}"#)]).await;

        let backend = OllamaBackend::new(&config(&url)).unwrap();
        let err = backend.generate(&Prompt::new("s", "u")).await.unwrap_err();
        assert!(matches!(err, AgentError::Request { .. }));
    }
}
