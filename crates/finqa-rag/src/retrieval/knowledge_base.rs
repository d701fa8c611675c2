//! Ordered chunk corpus built from the processed documents

use serde::Serialize;

use crate::config::RetrievalConfig;
use crate::ingestion::TextChunker;
use crate::types::{Chunk, ExtractedDocument};

const DOCUMENT_SEPARATOR: &str = "\n\n";

/// The chunks of every document processed in one "process" action
///
/// Built in one go and never updated incrementally; a new processing
/// action builds a fresh knowledge base that replaces this one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeBase {
    chunks: Vec<Chunk>,
    /// Filenames in concatenation order
    sources: Vec<String>,
    /// Characters in the chunked text
    text_len: usize,
}

impl KnowledgeBase {
    /// Concatenate the documents' text in the given order and chunk it
    pub fn build(documents: &[ExtractedDocument], config: &RetrievalConfig) -> Self {
        let text = documents
            .iter()
            .map(|doc| doc.text.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);

        let chunker = TextChunker::new(config.chunk_size, config.chunk_overlap);
        let chunks = chunker.chunk(&text);
        let text_len = chunks.last().map_or(0, Chunk::end);

        tracing::info!(
            "Built knowledge base: {} documents, {} chars, {} chunks (size {}, overlap {})",
            documents.len(),
            text_len,
            chunks.len(),
            chunker.chunk_size(),
            chunker.overlap()
        );

        Self {
            chunks,
            sources: documents.iter().map(|doc| doc.filename.clone()).collect(),
            text_len,
        }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Filenames the corpus was built from
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Length in characters of the normalized concatenated text
    pub fn text_len(&self) -> usize {
        self.text_len
    }
}
