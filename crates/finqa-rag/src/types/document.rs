//! Upload, document, chunk and transcript types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ingestion::TabularFrame;

const PDF_MIME: &str = "application/pdf";

const SPREADSHEET_MIMES: &[&str] = &[
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.ms-excel.sheet.macroenabled.12",
    "application/vnd.ms-excel.sheet.binary.macroenabled.12",
    "application/vnd.oasis.opendocument.spreadsheet",
];

/// Supported upload types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Excel or OpenDocument workbook
    Spreadsheet,
}

impl FileType {
    /// Map a MIME type onto a supported file type
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == PDF_MIME {
            Some(Self::Pdf)
        } else if SPREADSHEET_MIMES.contains(&mime.as_str()) {
            Some(Self::Spreadsheet)
        } else {
            None
        }
    }

    /// Detect the file type from the declared MIME type, then the filename
    pub fn detect(filename: &str, declared_mime: Option<&str>) -> Result<Self> {
        if let Some(file_type) = declared_mime.and_then(Self::from_mime) {
            return Ok(file_type);
        }

        mime_guess::from_path(filename)
            .iter_raw()
            .find_map(Self::from_mime)
            .ok_or_else(|| {
                let declared = declared_mime.unwrap_or("none");
                Error::UnsupportedFileType(format!("{} (declared: {})", filename, declared))
            })
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Spreadsheet => "Spreadsheet",
        }
    }
}

/// An uploaded file, consumed once by the extractor
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as uploaded by the user
    pub filename: String,
    /// MIME type declared by the uploader, if any
    pub mime: Option<String>,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl Upload {
    /// Create an upload without a declared MIME type
    pub fn new(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: None,
            data,
        }
    }

    /// Attach a declared MIME type
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Resolve the upload's file type
    pub fn file_type(&self) -> Result<FileType> {
        FileType::detect(&self.filename, self.mime.as_deref())
    }
}

/// Text and tables recovered from one upload
///
/// `text` is always normalized; it is empty when nothing could be extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Source filename
    pub filename: String,
    /// Source file type
    pub file_type: FileType,
    /// Normalized text
    pub text: String,
    /// Tables in page/sheet order
    pub tables: Vec<TabularFrame>,
    /// Pages (PDF) or sheets (spreadsheet) seen
    pub page_count: u32,
}

/// A contiguous window of the knowledge base text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the knowledge base
    pub index: usize,
    /// Character offset of the first character in the source text
    pub start: usize,
    /// Chunk text
    pub content: String,
}

impl Chunk {
    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Character offset one past the last character
    pub fn end(&self) -> usize {
        self.start + self.char_len()
    }
}

/// One answered question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
    pub asked_at: chrono::DateTime<chrono::Utc>,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            asked_at: chrono::Utc::now(),
        }
    }
}
