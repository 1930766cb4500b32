//! Bridges `yaml-rust2`'s SAX-style event stream into the position-bearing
//! [`Node`] tree the rest of the crate walks.
//!
//! `yaml-rust2`'s public `Yaml` value tree (as built by `YamlLoader`)
//! discards token positions entirely, which a language server can't afford
//! to lose. Its lower-level `Parser` API, driven through a
//! `MarkedEventReceiver`, hands back a `Marker` (a byte offset)
//! with every event, which is enough to reconstruct ranges ourselves:
//! container start/end markers bound mapping/sequence ranges directly, and
//! scalar token extents are recovered with a small forward scan from the
//! token's start offset (the event only carries the *decoded* value and its
//! start position, not its raw extent).

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser as YamlEventParser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::buffer::TextBuffer;
use crate::error::ParseDiagnostic;

use super::node::{MappingEntry, Node, NodeValue};

/// One `---`-delimited document's root node plus where its content begins,
/// pre-line-snapping (the [`crate::file::File`] segmentation step snaps
/// this back to the start of its line).
pub struct ParsedDocument {
    pub root: Node,
    pub start_offset: usize,
}

pub fn parse(buffer: &TextBuffer) -> Result<Vec<ParsedDocument>, ParseDiagnostic> {
    let mut builder = Builder::new(buffer);
    let mut parser = YamlEventParser::new(buffer.text().chars());
    parser
        .load(&mut builder, true)
        .map_err(|err| ParseDiagnostic {
            position: buffer.position_at(err.marker().index()),
            message: err.to_string(),
        })?;
    Ok(builder.documents)
}

enum Frame {
    Mapping {
        entries: Vec<MappingEntry>,
        pending_key: Option<(String, tower_lsp::lsp_types::Range)>,
    },
    Sequence {
        items: Vec<Node>,
    },
}

struct Builder<'a> {
    buffer: &'a TextBuffer,
    stack: Vec<(Marker, Frame)>,
    documents: Vec<ParsedDocument>,
    doc_start: Option<Marker>,
    root_pending: Option<Node>,
}

impl<'a> Builder<'a> {
    fn new(buffer: &'a TextBuffer) -> Self {
        Self {
            buffer,
            stack: Vec::new(),
            documents: Vec::new(),
            doc_start: None,
            root_pending: None,
        }
    }

    fn range(&self, start: usize, end: usize) -> tower_lsp::lsp_types::Range {
        tower_lsp::lsp_types::Range {
            start: self.buffer.position_at(start),
            end: self.buffer.position_at(end),
        }
    }

    fn complete_node(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => self.root_pending = Some(node),
            Some((_, Frame::Sequence { items })) => items.push(node),
            Some((_, Frame::Mapping { entries, pending_key })) => match pending_key.take() {
                None => {
                    let key = node.as_scalar().unwrap_or_default().to_string();
                    *pending_key = Some((key, node.range));
                }
                Some((key, key_range)) => entries.push(MappingEntry {
                    key,
                    key_range,
                    value: node,
                }),
            },
        }
    }

    fn scalar_node(&self, value: String, style: TScalarStyle, marker: Marker) -> Node {
        let start = marker.index();
        let end = scalar_end(self.buffer.text().as_bytes(), start, style);
        Node {
            value: NodeValue::Scalar(value),
            range: self.range(start, end),
        }
    }
}

impl<'a> MarkedEventReceiver for Builder<'a> {
    fn on_event(&mut self, event: Event, marker: Marker) {
        match event {
            Event::StreamStart | Event::StreamEnd | Event::Nothing => {}
            Event::DocumentStart => {
                self.doc_start = Some(marker);
                self.root_pending = None;
            }
            Event::DocumentEnd => {
                let start = self.doc_start.take().unwrap_or(marker);
                let root = self
                    .root_pending
                    .take()
                    .unwrap_or_else(|| Node::null(self.range(marker.index(), marker.index())));
                self.documents.push(ParsedDocument {
                    root,
                    start_offset: start.index(),
                });
            }
            Event::Alias(_) => {
                self.complete_node(Node::null(self.range(marker.index(), marker.index())));
            }
            Event::Scalar(value, style, _aid, _tag) => {
                let node = self.scalar_node(value, style, marker);
                self.complete_node(node);
            }
            Event::MappingStart(_, _) => {
                self.stack.push((
                    marker,
                    Frame::Mapping {
                        entries: Vec::new(),
                        pending_key: None,
                    },
                ));
            }
            Event::MappingEnd => {
                if let Some((start, Frame::Mapping { entries, .. })) = self.stack.pop() {
                    let range = self.range(start.index(), marker.index());
                    self.complete_node(Node {
                        value: NodeValue::Mapping(entries),
                        range,
                    });
                }
            }
            Event::SequenceStart(_, _) => {
                self.stack.push((marker, Frame::Sequence { items: Vec::new() }));
            }
            Event::SequenceEnd => {
                if let Some((start, Frame::Sequence { items })) = self.stack.pop() {
                    let range = self.range(start.index(), marker.index());
                    self.complete_node(Node {
                        value: NodeValue::Sequence(items),
                        range,
                    });
                }
            }
        }
    }
}

/// Recover a scalar token's end byte offset. The event stream gives us the
/// start offset and the decoded value but not the raw extent, so this scans
/// forward over the original bytes according to the scalar's style.
fn scalar_end(bytes: &[u8], start: usize, style: TScalarStyle) -> usize {
    match style {
        TScalarStyle::SingleQuoted => scan_quoted(bytes, start, b'\''),
        TScalarStyle::DoubleQuoted => scan_quoted(bytes, start, b'"'),
        TScalarStyle::Literal | TScalarStyle::Folded => scan_block_scalar(bytes, start),
        _ => scan_plain(bytes, start),
    }
}

fn scan_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        if bytes[i] == quote {
            if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') {
                i += 2;
                continue;
            }
            if quote == b'"' && bytes[i - 1] == b'\\' {
                i += 1;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    bytes.len()
}

fn scan_plain(bytes: &[u8], start: usize) -> usize {
    let mut i = start;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => break,
            b'#' if i > start && bytes[i - 1] == b' ' => break,
            b',' | b']' | b'}' => break,
            _ => i += 1,
        }
    }
    while i > start && matches!(bytes[i - 1], b' ' | b'\t' | b'\r') {
        i -= 1;
    }
    i
}

/// Block scalars (`|`, `>`) keep going while subsequent lines are blank or
/// indented at least as far as the first content line.
fn scan_block_scalar(bytes: &[u8], start: usize) -> usize {
    // Skip to the end of the header line (past the `|`/`>` chevron and any
    // chomping/indentation indicators) to find the first content line.
    let mut i = start;
    while i < bytes.len() && bytes[i] != b'\n' {
        i += 1;
    }
    if i >= bytes.len() {
        return bytes.len();
    }
    i += 1; // past the newline

    let first_content_line_start = i;
    let indent = line_indent(bytes, first_content_line_start);
    if indent.is_none() {
        return first_content_line_start;
    }
    let indent = indent.unwrap();

    let mut end = first_content_line_start;
    let mut pos = first_content_line_start;
    loop {
        let line_end = bytes[pos..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|n| pos + n)
            .unwrap_or(bytes.len());
        let is_blank = bytes[pos..line_end].iter().all(|&b| b == b' ' || b == b'\r');
        if is_blank {
            if line_end >= bytes.len() {
                end = line_end;
                break;
            }
            pos = line_end + 1;
            continue;
        }
        if line_indent(bytes, pos).unwrap_or(0) < indent {
            break;
        }
        end = line_end;
        if line_end >= bytes.len() {
            break;
        }
        pos = line_end + 1;
    }
    end
}

fn line_indent(bytes: &[u8], line_start: usize) -> Option<usize> {
    let mut n = 0;
    while line_start + n < bytes.len() && bytes[line_start + n] == b' ' {
        n += 1;
    }
    if line_start + n >= bytes.len() || bytes[line_start + n] == b'\n' {
        None
    } else {
        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(text: &str) -> Vec<ParsedDocument> {
        let buffer = TextBuffer::new(text.to_string());
        parse(&buffer).expect("valid yaml")
    }

    #[test]
    fn parses_simple_mapping() {
        let docs = parse_ok("apiVersion: tekton.dev/v1\nkind: Task\n");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].root.get("kind").and_then(Node::as_scalar), Some("Task"));
    }

    #[test]
    fn parses_multiple_documents() {
        let docs = parse_ok("kind: Task\n---\nkind: Pipeline\n");
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].root.get("kind").and_then(Node::as_scalar), Some("Task"));
        assert_eq!(docs[1].root.get("kind").and_then(Node::as_scalar), Some("Pipeline"));
    }

    #[test]
    fn name_token_range_matches_raw_text() {
        let text = "spec:\n  params:\n    - name: foo\n";
        let buffer = TextBuffer::new(text.to_string());
        let docs = parse(&buffer).unwrap();
        let name_node = docs[0]
            .root
            .get("spec")
            .unwrap()
            .get("params")
            .unwrap()
            .items()[0]
            .get("name")
            .unwrap();
        let start = buffer.offset_at(name_node.range.start);
        let end = buffer.offset_at(name_node.range.end);
        assert_eq!(&text[start..end], "foo");
    }

    #[test]
    fn sequences_preserve_order() {
        let text = "items:\n  - a\n  - b\n  - c\n";
        let docs = parse_ok(text);
        let items = docs[0].root.get("items").unwrap().items();
        let values: Vec<&str> = items.iter().map(|n| n.as_scalar().unwrap()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }

    #[test]
    fn invalid_yaml_reports_a_position() {
        let buffer = TextBuffer::new("key: [unterminated".to_string());
        let err = parse(&buffer).unwrap_err();
        assert_eq!(err.position.line, 0);
    }
}
