//! Per-user session: knowledge base, transcript and the actions on them

use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::{LlmProvider, PromptBuilder};
use crate::ingestion::{DocumentExtractor, TabularFrame};
use crate::retrieval::KnowledgeBase;
use crate::types::{ChatTurn, ExtractedDocument, FileType, Upload};

/// A file that could not be processed
#[derive(Debug)]
pub struct FileFailure {
    pub filename: String,
    pub error: Error,
}

/// Outcome of one "process files" action
#[derive(Debug, Default)]
pub struct ProcessReport {
    /// Documents that were extracted, in concatenation order
    pub documents: Vec<ExtractedDocument>,
    /// Files reported as failed
    pub failures: Vec<FileFailure>,
    /// Chunks in the new knowledge base
    pub chunk_count: usize,
}

impl ProcessReport {
    /// Filenames in concatenation order
    pub fn processed(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.filename.as_str()).collect()
    }

    /// All recovered tables, document by document
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TabularFrame)> {
        self.documents
            .iter()
            .flat_map(|d| d.tables.iter().map(move |t| (d.filename.as_str(), t)))
    }
}

/// Session state owned by one user
pub struct Session {
    config: RagConfig,
    llm: Arc<dyn LlmProvider>,
    knowledge_base: KnowledgeBase,
    transcript: Vec<ChatTurn>,
}

impl Session {
    /// Start a session with an empty knowledge base and transcript
    pub fn new(config: RagConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            config,
            llm,
            knowledge_base: KnowledgeBase::default(),
            transcript: Vec::new(),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn knowledge_base(&self) -> &KnowledgeBase {
        &self.knowledge_base
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    /// Extract every upload and replace the knowledge base
    ///
    /// Files are handled one at a time, PDFs before spreadsheets, each group
    /// in upload order. A file that fails is reported and skipped. The new
    /// knowledge base is installed only once it is complete.
    pub fn process(&mut self, uploads: &[Upload]) -> Result<ProcessReport> {
        if uploads.is_empty() {
            return Err(Error::NoDocuments);
        }

        let mut report = ProcessReport::default();
        let mut typed = Vec::with_capacity(uploads.len());

        for upload in uploads {
            match upload.file_type() {
                Ok(file_type) => typed.push((file_type, upload)),
                Err(error) => {
                    tracing::warn!("Rejected '{}': {}", upload.filename, error);
                    report.failures.push(FileFailure {
                        filename: upload.filename.clone(),
                        error,
                    });
                }
            }
        }

        // Stable sort keeps upload order inside each group
        typed.sort_by_key(|(file_type, _)| match file_type {
            FileType::Pdf => 0,
            FileType::Spreadsheet => 1,
        });

        for (file_type, upload) in typed {
            tracing::info!("Parsing {}: {}", file_type.display_name(), upload.filename);
            match DocumentExtractor::extract(&upload.filename, &upload.data, file_type) {
                Ok(doc) => report.documents.push(doc),
                Err(error) => {
                    tracing::warn!("Error processing {}: {}", upload.filename, error);
                    report.failures.push(FileFailure {
                        filename: upload.filename.clone(),
                        error,
                    });
                }
            }
        }

        let knowledge_base = KnowledgeBase::build(&report.documents, &self.config.retrieval);
        report.chunk_count = knowledge_base.len();
        self.knowledge_base = knowledge_base;

        tracing::info!(
            "Processing completed: {} files, {} failed, {} chunks",
            report.documents.len(),
            report.failures.len(),
            report.chunk_count
        );

        Ok(report)
    }

    /// Answer a question from the leading chunks
    ///
    /// The turn is appended to the transcript only when generation succeeds.
    pub async fn ask(&mut self, question: &str) -> Result<&ChatTurn> {
        if question.trim().is_empty() {
            return Err(Error::EmptyQuestion);
        }
        if self.knowledge_base.is_empty() {
            return Err(Error::EmptyKnowledgeBase);
        }

        let request = PromptBuilder::build_request(
            &self.knowledge_base,
            question,
            self.config.retrieval.top_k,
            &self.config.ollama,
        );

        tracing::debug!(
            "Asking {} with {} context chunks",
            self.llm.name(),
            self.config.retrieval.top_k.min(self.knowledge_base.len())
        );

        let answer = self.llm.generate(&request).await?;
        self.transcript.push(ChatTurn::new(question, answer));

        Ok(&self.transcript[self.transcript.len() - 1])
    }

    /// Drop the knowledge base and transcript
    pub fn reset(&mut self) {
        self.knowledge_base = KnowledgeBase::default();
        self.transcript.clear();
    }
}
