//! Immutable text with line-index support.
//!
//! Wraps the `line-index` crate (the same one `wdl-analysis`, in the
//! sibling WDL tooling this crate was grounded against, uses for exactly
//! this job) rather than hand-rolling byte-offset/line/column arithmetic.
//! Everything in this crate that needs to turn a byte offset into an LSP
//! `Position` — or vice versa — goes through here, so the UTF-16-vs-UTF-8
//! column distinction required by the editor protocol is handled in
//! exactly one place.

use line_index::{LineIndex, TextSize, WideEncoding, WideLineCol};
use tower_lsp::lsp_types::Position;

#[derive(Debug, Clone)]
pub struct TextBuffer {
    text: String,
    index: LineIndex,
}

impl TextBuffer {
    pub fn new(text: String) -> Self {
        let index = LineIndex::new(&text);
        Self { text, index }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Convert a byte offset to a 0-based LSP position (UTF-16 columns).
    /// Offsets past the end of the buffer clamp to end-of-buffer.
    pub fn position_at(&self, offset: usize) -> Position {
        let clamped = (offset.min(self.text.len())) as u32;
        let line_col = self.index.line_col(TextSize::from(clamped));
        match self.index.to_wide(WideEncoding::Utf16, line_col) {
            Some(wide) => Position::new(wide.line, wide.col),
            // Not on a char boundary / out of range: fall back to the raw
            // UTF-8 column, which is still a reasonable (if imprecise for
            // non-ASCII lines) answer rather than panicking.
            None => Position::new(line_col.line, line_col.col),
        }
    }

    /// Convert a 0-based LSP position (UTF-16 columns) to a byte offset.
    /// Positions past the end of the buffer clamp to end-of-buffer.
    pub fn offset_at(&self, position: Position) -> usize {
        let wide = WideLineCol {
            line: position.line,
            col: position.character,
        };
        let line_col = self
            .index
            .to_utf8(WideEncoding::Utf16, wide)
            .unwrap_or(line_index::LineCol {
                line: position.line,
                col: position.character,
            });
        match self.index.offset(line_col) {
            Some(offset) => usize::from(offset).min(self.text.len()),
            None => self.text.len(),
        }
    }

    /// Byte offset of the first character of the line `offset` is on.
    pub fn line_start(&self, offset: usize) -> usize {
        self.text[..offset.min(self.text.len())]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// The text of the line containing `offset`, without its terminator.
    pub fn line_at_offset(&self, offset: usize) -> &str {
        let start = self.line_start(offset);
        let rest = &self.text[start..];
        match rest.find('\n') {
            Some(end) => &rest[..end],
            None => rest,
        }
    }

    /// Find the previous occurrence of any of `needles` on the same line,
    /// strictly before `before` (a byte offset). Used by the completion
    /// engine to find where a `$(...)`  or bare-word query starts.
    pub fn rfind_on_line(&self, before: usize, needles: &[char]) -> Option<usize> {
        let line_start = self.line_start(before);
        let slice = &self.text[line_start..before.min(self.text.len())];
        slice
            .char_indices()
            .rev()
            .find(|(_, c)| needles.contains(c))
            .map(|(i, _)| line_start + i)
    }
}
