//! Canonical text cleanup applied to every extracted document

use once_cell::sync::Lazy;
use regex::Regex;

static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize raw extracted text
///
/// NUL becomes a space, runs of spaces/tabs collapse to one space, three or
/// more newlines collapse to a paragraph break, and the result is trimmed.
/// `clean(&clean(s)) == clean(s)` for every input.
pub fn clean(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = raw.replace('\0', " ");
    let text = HORIZONTAL_WS.replace_all(&text, " ");
    let text = EXCESS_NEWLINES.replace_all(&text, "\n\n");
    text.trim().to_string()
}
