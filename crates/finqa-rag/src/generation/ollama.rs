//! Ollama client for answer generation

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::config::OllamaConfig;
use crate::error::{Error, Result};

use super::llm::LlmProvider;
use super::prompt::GenerateRequest;

/// Answer used when the service replies without a `response` field
pub const NO_RESPONSE_FALLBACK: &str = "No response received.";

/// Ollama API client
///
/// Every request is bounded by the configured timeout and never retried;
/// the user re-asks instead.
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Base URL without trailing slash
    base_url: String,
    /// Request timeout in seconds
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::GenerationRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.host.trim_end_matches('/').to_string(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn classify(&self, err: reqwest::Error) -> Error {
        Error::from_generation(err, self.timeout_secs)
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        tracing::info!("Generating answer with model: {}", request.model);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Generation failed: HTTP {}", status);
            return Err(Error::GenerationStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let generated: GenerateResponse = serde_json::from_slice(&body).map_err(|e| {
            Error::GenerationRequest(format!("Failed to parse generation response: {}", e))
        })?;

        Ok(generated
            .response
            .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string()))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
