//! The AST the rest of the crate walks.
//!
//! A tree of sum-typed nodes, each carrying the source range of the token
//! it came from. Mapping order is preserved (a `Vec` of entries, not a
//! `HashMap`) because identifier and reference extraction order follows
//! source order, and tests rely on it.

use tower_lsp::lsp_types::Range;

/// A single node in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub value: NodeValue,
    pub range: Range,
}

/// A `key: value` pair inside a mapping. `key_range` is the range of the key
/// token itself, not the whole entry — needed so identifier rules that
/// terminate on `.name` can report the name token's range rather than the
/// whole map.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    pub key: String,
    pub key_range: Range,
    pub value: Node,
}

#[derive(Debug, Clone)]
pub enum NodeValue {
    Scalar(String),
    Mapping(Vec<MappingEntry>),
    Sequence(Vec<Node>),
    Null,
}

impl Node {
    pub fn null(range: Range) -> Self {
        Self {
            value: NodeValue::Null,
            range,
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            NodeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.value, NodeValue::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.value, NodeValue::Sequence(_))
    }

    /// Look up a direct child of a mapping by key. Returns `None` for
    /// non-mappings and missing keys alike (both are "absent" to callers).
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.value {
            NodeValue::Mapping(entries) => entries
                .iter()
                .find(|entry| entry.key == key)
                .map(|entry| &entry.value),
            _ => None,
        }
    }

    /// Like [`Node::get`] but also returns the range of the key token.
    pub fn get_entry(&self, key: &str) -> Option<&MappingEntry> {
        match &self.value {
            NodeValue::Mapping(entries) => entries.iter().find(|entry| entry.key == key),
            _ => None,
        }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        match &self.value {
            NodeValue::Mapping(entries) => entries,
            _ => &[],
        }
    }

    pub fn items(&self) -> &[Node] {
        match &self.value {
            NodeValue::Sequence(items) => items,
            _ => &[],
        }
    }

    /// Depth-first, most-specific node containing `position` (used by
    /// hover/definition to find what the cursor is sitting on).
    pub fn find_at(&self, position: tower_lsp::lsp_types::Position) -> Option<&Node> {
        if !range_contains(self.range, position) {
            return None;
        }

        match &self.value {
            NodeValue::Mapping(entries) => {
                for entry in entries {
                    if let Some(found) = entry.value.find_at(position) {
                        return Some(found);
                    }
                    if range_contains(entry.key_range, position) {
                        return Some(self);
                    }
                }
            }
            NodeValue::Sequence(items) => {
                for item in items {
                    if let Some(found) = item.find_at(position) {
                        return Some(found);
                    }
                }
            }
            _ => {}
        }

        Some(self)
    }
}

pub fn range_contains(range: Range, position: tower_lsp::lsp_types::Position) -> bool {
    if position.line < range.start.line || position.line > range.end.line {
        return false;
    }
    if position.line == range.start.line && position.character < range.start.character {
        return false;
    }
    if position.line == range.end.line && position.character > range.end.character {
        return false;
    }
    true
}
