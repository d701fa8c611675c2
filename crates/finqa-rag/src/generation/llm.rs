//! LLM provider trait for generating answers

use async_trait::async_trait;

use super::prompt::GenerateRequest;
use crate::error::Result;

/// Trait for the text generation service
///
/// Implementations:
/// - `OllamaClient`: local Ollama server (llama2, phi3, etc.)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a generation request and return the answer text
    async fn generate(&self, request: &GenerateRequest) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
