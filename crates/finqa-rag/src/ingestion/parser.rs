//! PDF and spreadsheet extraction into normalized text plus tables

use calamine::{Data, ExcelDateTime, Range, Reader};
use chrono::NaiveTime;
use lopdf::content::Content;
use lopdf::{Document, ObjectId};

use super::normalize::clean;
use super::tables::{detect_layout_tables, CellValue, TabularFrame};
use crate::error::{Error, Result};
use crate::types::{ExtractedDocument, FileType, Upload};

/// Data rows shown per sheet in the text preview (header not counted)
pub const SHEET_PREVIEW_ROWS: usize = 20;

const PART_SEPARATOR: &str = "\n\n";

/// What one PDF page yielded; `None` marks a failed extraction step
#[derive(Debug)]
pub struct PageOutcome {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Raw page text
    pub text: Option<String>,
    /// Non-empty tables detected on the page
    pub tables: Option<Vec<TabularFrame>>,
}

/// What one worksheet yielded; `None` when the sheet could not be read
#[derive(Debug)]
pub struct SheetOutcome {
    pub name: String,
    pub frame: Option<TabularFrame>,
}

impl SheetOutcome {
    /// `Sheet: <name>` followed by the aligned preview rows
    pub fn preview(&self) -> Option<String> {
        self.frame.as_ref().map(|frame| {
            let rows = frame.render_aligned(SHEET_PREVIEW_ROWS + 1);
            format!("Sheet: {}\n{}", self.name, rows)
        })
    }
}

/// Converts uploaded bytes into an [`ExtractedDocument`]
pub struct DocumentExtractor;

impl DocumentExtractor {
    /// Extract an upload, detecting its type first
    pub fn extract_upload(upload: &Upload) -> Result<ExtractedDocument> {
        let file_type = upload.file_type()?;
        Self::extract(&upload.filename, &upload.data, file_type)
    }

    /// Extract a document of a known type
    ///
    /// Only a whole-file failure is an error; pages, sheets and tables that
    /// cannot be read are skipped.
    pub fn extract(filename: &str, data: &[u8], file_type: FileType) -> Result<ExtractedDocument> {
        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Spreadsheet => Self::parse_spreadsheet(filename, data),
        }
    }

    /// Parse PDF document page by page
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ExtractedDocument> {
        let doc = Document::load_mem(data)
            .map_err(|e| Error::file_parse(filename, format!("Failed to load PDF: {}", e)))?;

        let outcomes: Vec<PageOutcome> = doc
            .get_pages()
            .into_iter()
            .map(|(page_number, page_id)| Self::extract_page(&doc, page_number, page_id))
            .collect();

        let page_count = outcomes.len() as u32;
        let (text, tables) = Self::assemble_pages(outcomes);

        tracing::debug!(
            "Extracted PDF '{}': {} pages, {} chars, {} tables",
            filename,
            page_count,
            text.chars().count(),
            tables.len()
        );

        Ok(ExtractedDocument {
            filename: filename.to_string(),
            file_type: FileType::Pdf,
            text,
            tables,
            page_count,
        })
    }

    fn extract_page(doc: &Document, page_number: u32, page_id: ObjectId) -> PageOutcome {
        let text = match doc.extract_text(&[page_number]) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!("Skipping text of page {}: {}", page_number, e);
                None
            }
        };

        let tables = match doc
            .get_page_content(page_id)
            .and_then(|content| Content::decode(&content))
        {
            Ok(content) => Some(detect_layout_tables(&content.operations)),
            Err(e) => {
                tracing::debug!("Skipping tables of page {}: {}", page_number, e);
                None
            }
        };

        PageOutcome {
            page_number,
            text,
            tables,
        }
    }

    /// Join page texts with a blank line and collect tables in page order
    pub fn assemble_pages(pages: Vec<PageOutcome>) -> (String, Vec<TabularFrame>) {
        let mut texts = Vec::new();
        let mut tables = Vec::new();

        for page in pages {
            if let Some(text) = page.text.filter(|t| !t.is_empty()) {
                texts.push(text);
            }
            tables.extend(page.tables.unwrap_or_default());
        }

        (clean(&texts.join(PART_SEPARATOR)), tables)
    }

    /// Parse every sheet of a workbook
    fn parse_spreadsheet(filename: &str, data: &[u8]) -> Result<ExtractedDocument> {
        let cursor = std::io::Cursor::new(data);
        let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut outcomes = Vec::new();
        for name in workbook.sheet_names().to_vec() {
            let frame = match workbook.worksheet_range(&name) {
                Ok(range) => Some(frame_from_range(&range)),
                Err(e) => {
                    tracing::debug!("Skipping sheet '{}' of '{}': {}", name, filename, e);
                    None
                }
            };
            outcomes.push(SheetOutcome { name, frame });
        }

        let page_count = outcomes.len() as u32;
        let (text, tables) = Self::assemble_sheets(outcomes);

        tracing::debug!(
            "Extracted spreadsheet '{}': {} sheets, {} chars",
            filename,
            page_count,
            text.chars().count()
        );

        Ok(ExtractedDocument {
            filename: filename.to_string(),
            file_type: FileType::Spreadsheet,
            text,
            tables,
            page_count,
        })
    }

    /// Join sheet previews with a blank line and collect sheet frames
    pub fn assemble_sheets(sheets: Vec<SheetOutcome>) -> (String, Vec<TabularFrame>) {
        let mut texts = Vec::new();
        let mut tables = Vec::new();

        for sheet in sheets {
            if let Some(preview) = sheet.preview() {
                texts.push(preview);
            }
            tables.extend(sheet.frame);
        }

        (clean(&texts.join(PART_SEPARATOR)), tables)
    }
}

/// Convert a worksheet range into a trimmed frame
fn frame_from_range(range: &Range<Data>) -> TabularFrame {
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_value).collect())
        .collect();
    TabularFrame::new(rows).trimmed()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Float(*f),
        Data::Int(i) => CellValue::Int(*i),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Text(date_text(dt)),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Calendar form of a date cell; the raw serial when it has none
fn date_text(dt: &ExcelDateTime) -> String {
    match dt.as_datetime().filter(|_| dt.is_datetime()) {
        Some(value) if value.time() == NaiveTime::MIN => value.format("%Y-%m-%d").to_string(),
        Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => dt.to_string(),
    }
}
