//! The completion engine: find the query under the cursor, filter
//! candidates by literal prefix, and restrict context-sensitive candidates
//! to the YAML paths they're valid at.

use tower_lsp::lsp_types::{Position, Range};

use crate::buffer::TextBuffer;
use crate::model::CompletionCandidate;
use crate::yaml::node::range_contains;
use crate::yaml::{path, Node};

#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub label: String,
    pub insert_range: Range,
    pub documentation: String,
    pub preselect: bool,
}

/// `candidates` pairs each candidate with the documentation of the
/// identifier that produced it (`Meta::documentation()`).
pub fn complete(
    buffer: &TextBuffer,
    pos: Position,
    doc_root: &Node,
    candidates: &[(String, CompletionCandidate)],
) -> Vec<CompletionResult> {
    let pos_offset = buffer.offset_at(pos);
    let mut start = buffer
        .rfind_on_line(pos_offset, &['$', ' '])
        .unwrap_or_else(|| buffer.line_start(pos_offset));

    if buffer.text()[start..].starts_with(char::is_whitespace) {
        start += 1;
    }

    let query = &buffer.text()[start..pos_offset.min(buffer.len())];
    let insert_range = Range {
        start: buffer.position_at(start),
        end: pos,
    };

    let mut first = true;
    let mut results = Vec::new();
    for (documentation, candidate) in candidates {
        if let Some(context) = candidate.context {
            let in_context = path::eval(doc_root, context)
                .into_iter()
                .any(|n| range_contains(n.range, pos));
            if !in_context {
                continue;
            }
        }
        if !candidate.text.starts_with(query) {
            continue;
        }
        results.push(CompletionResult {
            label: candidate.text.clone(),
            insert_range,
            documentation: documentation.clone(),
            preselect: first,
        });
        first = false;
    }
    results
}
