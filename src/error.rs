//! Error taxonomy for the semantic index.
//!
//! A parse failure is recovered internally into a per-[`File`](crate::file::File)
//! diagnostic rather than surfaced through [`Error`], so the only case a
//! caller of the public API needs to match on today is a rename with
//! nothing to rename.

use tower_lsp::lsp_types::Position;

/// A parse failure, with the position the scanner was at when it gave up.
///
/// `yaml-rust2` exposes this position directly via `ScanError::marker()`;
/// unlike a library whose error type only offers a formatted string, there
/// is no string-scraping involved in producing this.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message} at {}:{}", position.line, position.character)]
pub struct ParseDiagnostic {
    pub position: Position,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("nothing to rename at this position")]
    NothingToRename,
}
