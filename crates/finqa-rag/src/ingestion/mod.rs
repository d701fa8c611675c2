//! Document extraction, text normalization and chunking

mod chunker;
pub mod normalize;
mod parser;
pub mod tables;

pub use chunker::{chunk_text, TextChunker};
pub use normalize::clean;
pub use parser::{DocumentExtractor, PageOutcome, SheetOutcome, SHEET_PREVIEW_ROWS};
pub use tables::{detect_layout_tables, CellValue, TabularFrame};

#[cfg(test)]
pub(crate) use parser::fixtures;
