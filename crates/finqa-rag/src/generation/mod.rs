//! Answer generation against the external LLM service

pub mod llm;
pub mod ollama;
pub mod prompt;

pub use llm::LlmProvider;
pub use ollama::OllamaClient;
pub use prompt::{GenerateRequest, PromptBuilder};
