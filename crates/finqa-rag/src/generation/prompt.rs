//! Context selection and generation payload assembly

use serde::{Deserialize, Serialize};

use crate::config::{OllamaConfig, OllamaOptions};
use crate::retrieval::KnowledgeBase;
use crate::types::Chunk;

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Body of a generation request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub options: OllamaOptions,
    pub stream: bool,
}

/// Prompt builder for knowledge base questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// The first `top_k` chunks in stored order
    ///
    /// Selection is positional; chunk content plays no part.
    pub fn select_context(kb: &KnowledgeBase, top_k: usize) -> &[Chunk] {
        let chunks = kb.chunks();
        &chunks[..top_k.min(chunks.len())]
    }

    /// Build the question-answering prompt
    pub fn build_prompt(kb: &KnowledgeBase, question: &str, top_k: usize) -> String {
        let context = Self::select_context(kb, top_k)
            .iter()
            .map(|chunk| chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        Self::build_qa_prompt(question, &context)
    }

    /// Format an already selected context and question
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            "Context:\n{context}\n\nQuestion: {question}",
            context = context,
            question = question
        )
    }

    /// Build the full generation payload
    pub fn build_request(
        kb: &KnowledgeBase,
        question: &str,
        top_k: usize,
        ollama: &OllamaConfig,
    ) -> GenerateRequest {
        GenerateRequest {
            model: ollama.model.clone(),
            prompt: Self::build_prompt(kb, question, top_k),
            options: ollama.options.clone(),
            stream: false,
        }
    }
}
