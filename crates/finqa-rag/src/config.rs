//! Configuration for the Q&A session

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main session configuration
///
/// Mirrors the `config.json` document the user edits:
/// `{ "ollama": { .. }, "retrieval": { .. } }`. Missing sections or fields
/// take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Ollama/LLM configuration
    pub ollama: OllamaConfig,
    /// Chunking and context selection configuration
    pub retrieval: RetrievalConfig,
}

/// LLM (Ollama) configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub host: String,
    /// Generation model name (as listed by `ollama list`)
    pub model: String,
    /// Generation options forwarded verbatim to the service
    pub options: OllamaOptions,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            model: "llama2".to_string(),
            options: OllamaOptions::default(),
            timeout_secs: 30,
        }
    }
}

/// Generation options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OllamaOptions {
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Any further options (`top_p`, `num_ctx`, ..)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_temperature() -> f32 {
    0.2
}

impl Default for OllamaOptions {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Chunking and context selection configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
    /// Number of leading chunks sent as context
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 150,
            top_k: 6,
        }
    }
}

impl RetrievalConfig {
    /// Check the retrieval invariants
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::config("retrieval.chunk_size must be positive"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::config(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be positive"));
        }
        Ok(())
    }
}

impl RagConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(input: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|e| Error::config(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a TOML configuration document
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| Error::config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, picking the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml_str(&input),
            _ => Self::from_json_str(&input),
        }
    }

    /// Load a configuration file, falling back to defaults on any error
    ///
    /// The error, if any, is handed back so the caller can show it.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<Error>) {
        match Self::from_file(path.as_ref()) {
            Ok(config) => (config, None),
            Err(err) => {
                tracing::warn!(
                    "Falling back to default configuration ({}): {}",
                    path.as_ref().display(),
                    err
                );
                (Self::default(), Some(err))
            }
        }
    }

    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        if self.ollama.host.trim().is_empty() {
            return Err(Error::config("ollama.host must not be empty"));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(Error::config("ollama.model must not be empty"));
        }
        if self.ollama.timeout_secs == 0 {
            return Err(Error::config("ollama.timeout_secs must be positive"));
        }
        self.retrieval.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_config_document() {
        let config = RagConfig::default();
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.ollama.model, "llama2");
        assert_eq!(config.ollama.options.temperature, 0.2);
        assert_eq!(config.ollama.timeout_secs, 30);
        assert_eq!(config.retrieval.chunk_size, 1200);
        assert_eq!(config.retrieval.chunk_overlap, 150);
        assert_eq!(config.retrieval.top_k, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = RagConfig::from_json_str(
            r#"{ "ollama": { "model": "mistral", "options": { "temperature": 0.7, "top_p": 0.9 } },
                 "retrieval": { "top_k": 3 } }"#,
        )
        .unwrap();

        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.ollama.options.temperature, 0.7);
        assert_eq!(config.ollama.options.extra["top_p"], serde_json::json!(0.9));
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.chunk_size, 1200);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = RagConfig::from_json_str(
            r#"{ "retrieval": { "chunk_size": 100, "chunk_overlap": 100 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = RagConfig::from_json_str(r#"{ "retrieval": { "top_k": 0 } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        // Negative numbers do not fit usize
        let err = RagConfig::from_json_str(r#"{ "retrieval": { "chunk_overlap": -5 } }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, "{{ \"ollama\": ").unwrap();

        let (config, err) = RagConfig::load_or_default(file.path());
        assert_eq!(config, RagConfig::default());
        assert!(matches!(err, Some(Error::Config(_))));
    }

    #[test]
    fn test_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[ollama]\nmodel = \"phi3\"\n\n[retrieval]\nchunk_size = 500\nchunk_overlap = 50").unwrap();

        let (config, err) = RagConfig::load_or_default(file.path());
        assert!(err.is_none());
        assert_eq!(config.ollama.model, "phi3");
        assert_eq!(config.retrieval.chunk_size, 500);
        assert_eq!(config.retrieval.chunk_overlap, 50);
    }
}
