//! HTTP text-generation client
//!
//! Posts `{model, prompt, stream: false}` to a generate endpoint (Ollama style
//! by default). Uses a long-lived reqwest::Client for connection pooling.

use crate::config::LlmConfig;
use crate::error::AdvisorError;
use crate::llm::{LlmClient, LlmResponse};
use crate::Result;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Reusable LLM client (connection-pooled)
pub struct HttpLlmClient {
    client: Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[async_trait::async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        };

        debug!(model = %self.config.model, "Calling LLM endpoint");

        let mut builder = self.client.post(&self.config.api_url).json(&request);
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            error!("LLM request failed: {}", e);
            AdvisorError::LlmError(format!("LLM request failed: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(status = %status, "LLM error response: {}", body);
            return Err(AdvisorError::LlmError(format!(
                "LLM endpoint returned {}: {}",
                status, body
            )));
        }

        match LlmResponse::parse(&body) {
            LlmResponse::Unparsed(raw) => {
                warn!("Unrecognized LLM response shape: {}", truncate(&raw, 200));
                Err(AdvisorError::LlmError(
                    "Unrecognized LLM response shape".to_string(),
                ))
            }
            parsed => parsed
                .into_text()
                .ok_or_else(|| AdvisorError::LlmError("Empty LLM response".to_string())),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = GenerateRequest {
            model: "llama3.1:8b",
            prompt: "What is a SIP?",
            stream: false,
            options: GenerateOptions {
                temperature: 0.2,
                num_predict: 256,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3.1:8b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 256);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_llm_error() {
        let config = LlmConfig {
            api_url: "http://127.0.0.1:9/api/generate".to_string(),
            timeout: Duration::from_millis(500),
            ..LlmConfig::default()
        };
        let client = HttpLlmClient::new(config).unwrap();

        let err = client.complete("hello").await.unwrap_err();
        assert!(matches!(err, AdvisorError::LlmError(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("₹₹₹₹", 2), "₹₹");
    }
}
