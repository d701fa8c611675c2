//! Error types for the document Q&A pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors
///
/// Only file-level and generation-level failures surface here. Faults on a
/// single PDF page or table are absorbed by the extractor and never become
/// an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (malformed document or invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A whole file could not be read
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Processing was requested without any uploads
    #[error("No documents were uploaded")]
    NoDocuments,

    /// A question was asked before any document was processed
    #[error("Knowledge base is empty; process documents first")]
    EmptyKnowledgeBase,

    /// Blank question text
    #[error("Question is empty")]
    EmptyQuestion,

    /// The generation request exceeded its time bound
    #[error("Generation request timed out after {timeout_secs}s. Is Ollama running?")]
    GenerationTimeout { timeout_secs: u64 },

    /// The generation service could not be reached
    #[error("Could not connect to generation service: {0}")]
    GenerationConnection(String),

    /// The generation service answered with a non-success status
    #[error("Generation failed: HTTP {status} - {body}")]
    GenerationStatus { status: u16, body: String },

    /// Any other transport or decoding failure
    #[error("Generation request failed: {0}")]
    GenerationRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map a reqwest failure onto the generation error taxonomy
    pub fn from_generation(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::GenerationTimeout { timeout_secs }
        } else if err.is_connect() {
            Self::GenerationConnection(err.to_string())
        } else if let Some(status) = err.status() {
            Self::GenerationStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            Self::GenerationRequest(err.to_string())
        }
    }

    /// Whether this error came from the generation service boundary
    pub fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::GenerationTimeout { .. }
                | Self::GenerationConnection(_)
                | Self::GenerationStatus { .. }
                | Self::GenerationRequest(_)
        )
    }

    /// Whether this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::GenerationTimeout { .. })
    }
}
