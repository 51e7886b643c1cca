//! Paragraph boundary derivation.
//!
//! A pure mapping from an edit buffer to the ordered paragraph spans it
//! contains. The derivation is recomputed from scratch on every buffer
//! change; span ids are provisional and never become unit identity.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Separator used when rejoining unit texts into a single document buffer.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

// A blank line: two or more consecutive line breaks, optionally with
// horizontal whitespace between them.
static SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").expect("separator pattern is valid"));

/// One derived paragraph span inside an edit buffer.
///
/// `start` and `end` are byte offsets into the buffer the span was derived
/// from. `id` is sequential within a single derivation and only valid for the
/// lifetime of that buffer; persisted unit identity always comes from the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub start: usize,
    pub end: usize,
}

impl Position {
    /// Returns the span's text within the buffer it was derived from.
    pub fn slice<'a>(&self, buffer: &'a str) -> &'a str {
        &buffer[self.start..self.end]
    }
}

/// Derives the ordered paragraph spans of `text`.
///
/// The buffer is split on blank lines; each span has purely-leading
/// whitespace trimmed (offsets adjusted accordingly), and spans that are
/// empty after trimming are dropped. Never fails, and calling it twice on
/// the same text yields identical output.
pub fn derive_positions(text: &str) -> Vec<Position> {
    let mut positions = Vec::new();
    let mut start = 0usize;

    for separator in SEPARATOR.find_iter(text) {
        push_span(text, start, separator.start(), &mut positions);
        start = separator.end();
    }
    push_span(text, start, text.len(), &mut positions);

    positions
}

fn push_span(text: &str, start: usize, end: usize, positions: &mut Vec<Position>) {
    let raw = &text[start..end];
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return;
    }
    let leading = raw.len() - trimmed.len();
    positions.push(Position {
        id: positions.len() as u64,
        start: start + leading,
        end,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(buffer: &str) -> Vec<&str> {
        derive_positions(buffer)
            .iter()
            .map(|p| p.slice(buffer))
            .collect()
    }

    #[test]
    fn test_single_paragraph() {
        let positions = derive_positions("Just one paragraph.");
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].id, 0);
        assert_eq!(positions[0].start, 0);
        assert_eq!(positions[0].end, 19);
    }

    #[test]
    fn test_empty_buffer() {
        assert!(derive_positions("").is_empty());
        assert!(derive_positions("   \n\t  ").is_empty());
    }

    #[test]
    fn test_splits_on_blank_line() {
        assert_eq!(texts("First.\n\nSecond.\n\nThird."), vec![
            "First.", "Second.", "Third.",
        ]);
    }

    #[test]
    fn test_multiple_blank_lines_are_one_separator() {
        assert_eq!(texts("First.\n\n\n\nSecond."), vec!["First.", "Second."]);
    }

    #[test]
    fn test_horizontal_whitespace_inside_separator() {
        assert_eq!(texts("First. \n \t \nSecond."), vec!["First. ", "Second."]);
    }

    #[test]
    fn test_crlf_line_breaks() {
        assert_eq!(texts("First.\r\n\r\nSecond."), vec!["First.", "Second."]);
    }

    #[test]
    fn test_leading_whitespace_is_trimmed_with_offsets() {
        let buffer = "First.\n\n   Second.";
        let positions = derive_positions(buffer);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[1].slice(buffer), "Second.");
        assert_eq!(positions[1].start, 11);
    }

    #[test]
    fn test_whitespace_only_spans_are_dropped() {
        assert_eq!(texts("First.\n\n   \n\nSecond."), vec!["First.", "Second."]);
    }

    #[test]
    fn test_provisional_ids_are_sequential() {
        let positions = derive_positions("a\n\nb\n\nc");
        let ids: Vec<u64> = positions.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_rejoin_and_rederive_is_idempotent() {
        let buffer = "  First one. \n\n\nSecond,\nstill second.\n \nThird.\n\n   ";
        let first_pass = texts(buffer);

        let rejoined = first_pass.join(PARAGRAPH_SEPARATOR);
        let second_pass: Vec<String> = derive_positions(&rejoined)
            .iter()
            .map(|p| p.slice(&rejoined).to_string())
            .collect();

        assert_eq!(first_pass, second_pass);
    }
}
