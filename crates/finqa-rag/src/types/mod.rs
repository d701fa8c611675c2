//! Core types for the Q&A pipeline

pub mod document;

pub use document::{ChatTurn, Chunk, ExtractedDocument, FileType, Upload};
