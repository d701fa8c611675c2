//! Tabular data recovered from spreadsheets and PDF page layouts

use lopdf::content::Operation;
use lopdf::Object;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Baseline distance under which two text runs share a row
const ROW_TOLERANCE: f32 = 2.0;
/// Horizontal distance under which two runs belong to the same cell
const CELL_TOLERANCE: f32 = 1.0;
/// TJ kerning (thousandths of text space) treated as a word gap
const TJ_SPACE_THRESHOLD: f32 = -250.0;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Empty cells and whitespace-only text count as blank
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

/// Rectangular grid of cells; the first row is the header when there is one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularFrame {
    rows: Vec<Vec<CellValue>>,
}

impl TabularFrame {
    /// Build a frame, padding short rows with empty cells
    pub fn new(mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows, header included
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.height() == 0 || self.width() == 0
    }

    /// Drop rows, then columns, that hold nothing but blank cells
    pub fn trimmed(self) -> Self {
        let rows: Vec<Vec<CellValue>> = self
            .rows
            .into_iter()
            .filter(|row| !row.iter().all(CellValue::is_blank))
            .collect();

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let keep: Vec<bool> = (0..width)
            .map(|col| rows.iter().any(|row| row.get(col).is_some_and(|c| !c.is_blank())))
            .collect();

        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(cell, keep)| keep.then_some(cell))
                    .collect()
            })
            .collect();

        Self { rows }
    }

    /// Render up to `max_rows` rows as right-aligned columns
    pub fn render_aligned(&self, max_rows: usize) -> String {
        let rows: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(max_rows)
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect();

        let widths: Vec<usize> = (0..self.width())
            .map(|col| {
                rows.iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        rows.iter()
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{:>width$}", cell, width = *width))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A positioned run of text from a content stream
#[derive(Debug, Clone)]
struct TextRun {
    x: f32,
    y: f32,
    text: String,
}

/// Text-positioning state while walking a content stream
#[derive(Debug, Default)]
struct TextCursor {
    line_x: f32,
    line_y: f32,
    leading: f32,
}

impl TextCursor {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_x += tx;
        self.line_y += ty;
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading;
    }
}

/// Recover tables from a page's decoded content stream
///
/// Text runs are grouped into rows by baseline and ordered by x. Every
/// maximal run of two or more consecutive rows holding at least two cells
/// becomes one table. Tables left empty after trimming are dropped.
pub fn detect_layout_tables(operations: &[Operation]) -> Vec<TabularFrame> {
    let rows = layout_rows(operations);

    let mut tables = Vec::new();
    let mut current: Vec<Vec<CellValue>> = Vec::new();

    for row in rows {
        if row.len() >= 2 {
            current.push(row.into_iter().map(CellValue::Text).collect());
        } else {
            flush_table(&mut current, &mut tables);
        }
    }
    flush_table(&mut current, &mut tables);

    tables
}

fn flush_table(current: &mut Vec<Vec<CellValue>>, tables: &mut Vec<TabularFrame>) {
    if current.len() >= 2 {
        let frame = TabularFrame::new(std::mem::take(current)).trimmed();
        if !frame.is_empty() {
            tables.push(frame);
        }
    }
    current.clear();
}

/// Group text runs into rows of cells, top of page first
fn layout_rows(operations: &[Operation]) -> Vec<Vec<String>> {
    let mut runs = text_runs(operations);
    runs.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut rows: Vec<Vec<TextRun>> = Vec::new();
    for run in runs {
        match rows.last_mut() {
            Some(row) if (row[0].y - run.y).abs() <= ROW_TOLERANCE => row.push(run),
            _ => rows.push(vec![run]),
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            let mut cells: Vec<(f32, String)> = Vec::new();
            for run in row {
                match cells.last_mut() {
                    Some((x, text)) if (run.x - *x).abs() <= CELL_TOLERANCE => {
                        text.push_str(&run.text)
                    }
                    _ => cells.push((run.x, run.text)),
                }
            }
            cells
                .into_iter()
                .map(|(_, text)| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .collect()
        })
        .collect()
}

fn text_runs(operations: &[Operation]) -> Vec<TextRun> {
    let mut cursor = TextCursor::default();
    let mut runs = Vec::new();

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                cursor.line_x = 0.0;
                cursor.line_y = 0.0;
            }
            "Tm" if operands.len() == 6 => {
                if let (Some(e), Some(f)) = (number(&operands[4]), number(&operands[5])) {
                    cursor.line_x = e;
                    cursor.line_y = f;
                }
            }
            "Td" | "TD" if operands.len() == 2 => {
                if let (Some(tx), Some(ty)) = (number(&operands[0]), number(&operands[1])) {
                    if op.operator == "TD" {
                        cursor.leading = -ty;
                    }
                    cursor.move_line(tx, ty);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(number) {
                    cursor.leading = leading;
                }
            }
            "T*" => cursor.next_line(),
            "Tj" | "TJ" | "'" | "\"" => {
                if matches!(op.operator.as_str(), "'" | "\"") {
                    cursor.next_line();
                }
                let text = operands.last().map(show_text).unwrap_or_default();
                if !text.is_empty() {
                    runs.push(TextRun {
                        x: cursor.line_x,
                        y: cursor.line_y,
                        text,
                    });
                }
            }
            _ => {}
        }
    }

    runs
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Text shown by a Tj/TJ operand
fn show_text(object: &Object) -> String {
    match object {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                    other => {
                        if number(other).is_some_and(|kern| kern <= TJ_SPACE_THRESHOLD) {
                            text.push(' ');
                        }
                    }
                }
            }
            text
        }
        _ => String::new(),
    }
}

/// UTF-16BE when BOM-prefixed, otherwise one char per byte
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_at(x: i64, y: i64, text: &str) -> Vec<Operation> {
        vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(x),
                    Object::Integer(y),
                ],
            ),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]
    }

    #[test]
    fn test_trim_blank_rows_and_columns() {
        let frame = TabularFrame::new(vec![
            vec!["".into(), "Revenue".into(), CellValue::Empty],
            vec![CellValue::Empty, CellValue::Empty],
            vec!["  ".into(), 100i64.into(), CellValue::Empty],
        ])
        .trimmed();

        assert_eq!(frame.height(), 2);
        assert_eq!(frame.width(), 1);
        assert_eq!(frame.rows()[1][0], CellValue::Int(100));
    }

    #[test]
    fn test_all_blank_frame_is_empty() {
        let frame = TabularFrame::new(vec![vec![CellValue::Empty, " ".into()]]).trimmed();
        assert!(frame.is_empty());
    }

    #[test]
    fn test_render_aligned() {
        let frame = TabularFrame::new(vec![
            vec!["Revenue".into(), "Cost".into()],
            vec![100.0f64.into(), 40i64.into()],
            vec![2.5f64.into(), 7i64.into()],
        ]);

        assert_eq!(frame.render_aligned(21), "Revenue Cost\n    100   40\n    2.5    7");
        assert_eq!(frame.render_aligned(1), "Revenue Cost");
    }

    #[test]
    fn test_layout_table_from_positioned_text() {
        let mut ops = Vec::new();
        ops.extend(text_at(72, 750, "Quarterly summary"));
        ops.extend(text_at(72, 700, "Item"));
        ops.extend(text_at(200, 700, "Amount"));
        ops.extend(text_at(72, 685, "Revenue"));
        ops.extend(text_at(200, 685, "100"));
        ops.extend(text_at(72, 670, "Cost"));
        ops.extend(text_at(200, 670, "40"));
        ops.extend(text_at(72, 600, "End of report"));

        let tables = detect_layout_tables(&ops);
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.height(), 3);
        assert_eq!(table.width(), 2);
        assert_eq!(table.rows()[0][1], CellValue::Text("Amount".to_string()));
        assert_eq!(table.rows()[2][0], CellValue::Text("Cost".to_string()));
    }

    #[test]
    fn test_single_multi_cell_row_is_not_a_table() {
        let mut ops = Vec::new();
        ops.extend(text_at(72, 700, "Page"));
        ops.extend(text_at(500, 700, "3"));
        ops.extend(text_at(72, 650, "Body text"));

        assert!(detect_layout_tables(&ops).is_empty());
    }

    #[test]
    fn test_td_moves_are_relative() {
        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new("Td", vec![Object::Integer(50), Object::Integer(500)]),
            Operation::new("Tj", vec![Object::string_literal("A")]),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(0)]),
            Operation::new("Tj", vec![Object::string_literal("B")]),
            Operation::new("Td", vec![Object::Integer(-100), Object::Integer(-20)]),
            Operation::new("Tj", vec![Object::string_literal("C")]),
            Operation::new("Td", vec![Object::Integer(100), Object::Integer(0)]),
            Operation::new("Tj", vec![Object::string_literal("D")]),
            Operation::new("ET", vec![]),
        ];

        assert_eq!(
            layout_rows(&ops),
            vec![vec!["A".to_string(), "B".to_string()], vec!["C".to_string(), "D".to_string()]]
        );
    }

    #[test]
    fn test_decode_utf16_string() {
        assert_eq!(decode_pdf_string(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9]), "Aé");
        assert_eq!(decode_pdf_string(b"Cost"), "Cost");
    }
}
