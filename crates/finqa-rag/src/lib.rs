//! finqa-rag: question answering over uploaded financial documents
//!
//! PDFs and spreadsheets are extracted into normalized text and tables, the
//! text is cut into overlapping character windows, and the leading windows
//! are sent with the user's question to a locally hosted Ollama model.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod retrieval;
pub mod session;
pub mod types;

pub use config::{RagConfig, RetrievalConfig};
pub use error::{Error, Result};
pub use generation::{GenerateRequest, LlmProvider, OllamaClient, PromptBuilder};
pub use ingestion::{chunk_text, clean, DocumentExtractor, TabularFrame, TextChunker};
pub use retrieval::KnowledgeBase;
pub use session::{FileFailure, ProcessReport, Session};
pub use types::{ChatTurn, Chunk, ExtractedDocument, FileType, Upload};
