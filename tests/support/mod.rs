//! Shared helper for e2e tests: locate a substring in source text and turn
//! it into an LSP `Position` a few characters into the match, so tests read
//! against the text itself rather than hand-counted line/column numbers.

use tekton_lsp::buffer::TextBuffer;
use tower_lsp::lsp_types::Position;

#[allow(dead_code)]
pub fn pos_in(text: &str, needle: &str) -> Position {
    let offset = text.find(needle).unwrap_or_else(|| panic!("{needle:?} not found in source"));
    let buffer = TextBuffer::new(text.to_string());
    buffer.position_at(offset + needle.len() / 2)
}
