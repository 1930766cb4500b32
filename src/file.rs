//! One editor-visible YAML source file: sanitized text, AST, and the
//! ordered list of Documents it contains.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, Position, Range, Url,
};

use crate::buffer::TextBuffer;
use crate::completion;
use crate::document::{Document, IdentifierLookup, ResolveContext};
use crate::error::ParseDiagnostic;
use crate::model::{CompletionCandidate, Identifier, IdentifierKind};
use crate::resolvers;
use crate::yaml::parser;

#[derive(Debug, Clone)]
pub struct File {
    pub uri: Url,
    pub buffer: TextBuffer,
    pub parse_error: Option<ParseDiagnostic>,
    pub documents: Vec<Document>,
    pub dangling_ref_names: HashSet<String>,
}

fn helm_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("static pattern is valid"))
}

/// Replace every `{{...}}` span with same-length, newline-preserving filler
/// so the YAML parser doesn't choke on Helm templating while every other
/// byte offset in the file stays exactly where it was.
fn sanitize_helm(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in helm_regex().find_iter(text) {
        out.push_str(&text[last..m.start()]);
        for ch in m.as_str().chars() {
            out.push(if ch == '\n' { '\n' } else { 'x' });
        }
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

impl File {
    /// Parse and construct; does not resolve identifiers or references.
    pub fn new(uri: Url, text: String) -> Self {
        let buffer = TextBuffer::new(text.clone());
        let sanitized_buffer = TextBuffer::new(sanitize_helm(&text));

        match parser::parse(&sanitized_buffer) {
            Ok(parsed_docs) => {
                let documents = segment(&buffer, &uri, parsed_docs);
                Self {
                    uri,
                    buffer,
                    parse_error: None,
                    documents,
                    dangling_ref_names: HashSet::new(),
                }
            }
            Err(err) => Self {
                uri,
                buffer,
                parse_error: Some(err),
                documents: Vec::new(),
                dangling_ref_names: HashSet::new(),
            },
        }
    }

    pub fn resolve_identifiers(&mut self) {
        for doc in &mut self.documents {
            doc.resolve_identifiers();
        }
    }

    pub fn all_identifiers(&self) -> impl Iterator<Item = &Identifier> {
        self.documents.iter().flat_map(|d| d.identifiers.iter())
    }

    pub fn resolve_references(&mut self, lookup: &dyn IdentifierLookup) {
        let file_identifiers: Vec<Identifier> = self.all_identifiers().cloned().collect();
        let regex_refs = resolvers::scan_interpolations(&self.buffer);
        let mut dangling = HashSet::new();

        for doc in &mut self.documents {
            let window = doc.byte_range();
            let mut raw_refs: Vec<_> = regex_refs
                .iter()
                .filter(|r| window.contains(&r.whole_offsets.0) && r.whole_offsets.1 <= window.end)
                .cloned()
                .collect();
            raw_refs.extend(resolvers::scan_structural(&doc.ast, &self.buffer));

            let doc_identifiers = doc.identifiers.clone();
            let ctx = ResolveContext {
                document_identifiers: &doc_identifiers,
                file_identifiers: &file_identifiers,
                lookup,
            };
            dangling.extend(doc.resolve_references(raw_refs, &ctx));
        }
        self.dangling_ref_names = dangling;
    }

    fn document_at(&self, pos: Position) -> Option<&Document> {
        let offset = self.buffer.offset_at(pos);
        self.documents.iter().find(|d| d.contains_offset(offset))
    }

    pub fn hover(&self, pos: Position) -> Option<String> {
        self.document_at(pos)?.hover(pos)
    }

    pub fn definition(&self, pos: Position) -> Option<(Url, Range)> {
        self.document_at(pos)?.definition(pos)
    }

    pub fn rename_target(&self, pos: Position) -> Option<(IdentifierKind, String, Url)> {
        self.document_at(pos)?.rename_target(pos)
    }

    pub fn prepare_rename(&self, pos: Position) -> Option<Range> {
        self.document_at(pos)?.prepare_rename(pos)
    }

    pub fn local_reference_locations(
        &self,
        kind: IdentifierKind,
        name: &str,
        uri: &Url,
    ) -> Vec<crate::model::ReferenceLocation> {
        self.documents
            .iter()
            .flat_map(|d| d.local_reference_locations(kind, name, uri))
            .collect()
    }

    /// Completions at `pos`: candidates come from every identifier in this
    /// File, across all of its Documents.
    pub fn completions(&self, pos: Position) -> Vec<completion::CompletionResult> {
        let Some(doc) = self.document_at(pos) else {
            return Vec::new();
        };
        let candidates: Vec<(String, CompletionCandidate)> = self
            .all_identifiers()
            .flat_map(|id| {
                let doc_text = id.meta.documentation();
                id.meta
                    .completions()
                    .into_iter()
                    .map(move |c| (doc_text.clone(), c))
            })
            .collect();
        completion::complete(&self.buffer, pos, &doc.ast, &candidates)
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        if let Some(err) = &self.parse_error {
            return vec![Diagnostic {
                range: Range {
                    start: err.position,
                    end: err.position,
                },
                severity: Some(DiagnosticSeverity::ERROR),
                source: Some("tekton-lsp".into()),
                message: err.message.clone(),
                ..Default::default()
            }];
        }

        self.documents
            .iter()
            .flat_map(|doc| {
                doc.references.iter().filter(|r| r.resolved_to.is_none()).map(|r| Diagnostic {
                    range: r.whole_range,
                    severity: Some(DiagnosticSeverity::ERROR),
                    source: Some("tekton-lsp".into()),
                    message: format!("unknown {} {}", r.kind.label(), r.name),
                    ..Default::default()
                })
            })
            .collect()
    }
}

fn segment(buffer: &TextBuffer, uri: &Url, parsed_docs: Vec<parser::ParsedDocument>) -> Vec<Document> {
    let mut documents = Vec::with_capacity(parsed_docs.len());
    let mut starts: Vec<usize> = parsed_docs
        .iter()
        .map(|d| buffer.line_start(d.start_offset))
        .collect();
    starts.push(buffer.len());

    for (i, parsed) in parsed_docs.into_iter().enumerate() {
        let start = starts[i];
        let end = starts[i + 1];
        documents.push(Document::new(uri.clone(), start, end.saturating_sub(start), parsed.root));
    }
    documents
}
