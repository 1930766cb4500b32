//! One YAML sub-document within a File.

use std::collections::HashSet;

use tower_lsp::lsp_types::{Position, Range, Url};

use crate::model::{Identifier, IdentifierKind, Meta, Reference, ReferenceLocation, ResolvedIdentifier};
use crate::resolvers::{RawReference, ResolutionScope};
use crate::rules;
use crate::yaml::node::range_contains;
use crate::yaml::Node;

/// Given `(kind, name)`, resolve to a snapshot of the matching identifier.
/// Implemented by `Workspace` so `Document`/`File` never need a handle back
/// to it (see DESIGN.md on back-references).
pub trait IdentifierLookup {
    fn lookup(&self, kind: IdentifierKind, name: &str) -> Option<ResolvedIdentifier>;
    fn lookup_task_param(&self, task_name: &str, param_name: &str) -> Option<ResolvedIdentifier>;
}

/// Context a Document needs to resolve its references: its own identifiers,
/// every identifier defined anywhere else in the same File, and a handle to
/// the Workspace-wide lookup for structural/cross-file resolution.
pub struct ResolveContext<'a> {
    pub document_identifiers: &'a [Identifier],
    pub file_identifiers: &'a [Identifier],
    pub lookup: &'a dyn IdentifierLookup,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub file_uri: Url,
    pub byte_offset: usize,
    pub byte_size: usize,
    pub ast: Node,
    pub identifiers: Vec<Identifier>,
    pub references: Vec<Reference>,
}

impl Document {
    pub fn new(file_uri: Url, byte_offset: usize, byte_size: usize, ast: Node) -> Self {
        Self {
            file_uri,
            byte_offset,
            byte_size,
            ast,
            identifiers: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.byte_offset..(self.byte_offset + self.byte_size)
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.byte_range().contains(&offset)
    }

    /// Populate `self.identifiers` from the declarative rule table. Has no
    /// cross-document or cross-file dependency, so it is safe to call on
    /// each Document independently (the engine's first pass).
    pub fn resolve_identifiers(&mut self) {
        self.identifiers = rules::extract(&self.ast, &self.file_uri);
    }

    /// Populate `self.references`, consuming every raw reference the caller
    /// determined belongs to this document's byte window. Returns the set
    /// of names that failed to resolve, to be folded into `File::dangling_ref_names`.
    pub fn resolve_references(&mut self, raw_refs: Vec<RawReference>, ctx: &ResolveContext) -> HashSet<String> {
        let mut dangling = HashSet::new();
        let mut references = Vec::with_capacity(raw_refs.len());
        for raw in raw_refs {
            let resolved_to = match &raw.scope {
                ResolutionScope::Lookup => lookup_kind_name(raw.kind, &raw.name, ctx),
                ResolutionScope::TaskScopedParam { task_name } => {
                    ctx.lookup.lookup_task_param(task_name, &raw.name)
                }
            };
            if resolved_to.is_none() {
                dangling.insert(raw.name.clone());
            }
            references.push(Reference {
                kind: raw.kind,
                name: raw.name,
                uri: self.file_uri.clone(),
                whole_range: raw.whole_range,
                name_range: raw.name_range,
                whole_offsets: raw.whole_offsets,
                name_offsets: raw.name_offsets,
                resolved_to,
            });
        }
        self.references = references;
        dangling
    }

    pub fn identifier_at(&self, pos: Position) -> Option<&Identifier> {
        self.identifiers
            .iter()
            .find(|id| range_contains(id.defining_range, pos))
    }

    pub fn reference_at(&self, pos: Position) -> Option<&Reference> {
        self.references
            .iter()
            .find(|r| range_contains(r.whole_range, pos))
    }

    pub fn hover(&self, pos: Position) -> Option<String> {
        self.reference_at(pos)?.resolved_to.as_ref().map(|r| r.meta.documentation())
    }

    pub fn definition(&self, pos: Position) -> Option<(Url, Range)> {
        let resolved = self.reference_at(pos)?.resolved_to.as_ref()?;
        Some((resolved.uri.clone(), resolved.defining_range))
    }

    /// The `(kind, name, uri)` key identifying the identifier that
    /// find-references/rename should operate on, whether `pos` sits on the
    /// identifier's own defining range or on a reference to it.
    pub fn rename_target(&self, pos: Position) -> Option<(IdentifierKind, String, Url)> {
        if let Some(id) = self.identifier_at(pos) {
            return Some((id.kind, id.name.clone(), id.uri.clone()));
        }
        let resolved = self.reference_at(pos)?.resolved_to.as_ref()?;
        Some((resolved.kind, resolved.name.clone(), resolved.uri.clone()))
    }

    pub fn prepare_rename(&self, pos: Position) -> Option<Range> {
        if let Some(id) = self.identifier_at(pos) {
            return Some(id.defining_range);
        }
        Some(self.reference_at(pos)?.resolved_to.as_ref()?.defining_range)
    }

    /// Every reference range inside *this* document that resolves to
    /// `(kind, name, uri)`, paired with its name-range (what rename edits).
    pub fn local_reference_locations(&self, kind: IdentifierKind, name: &str, uri: &Url) -> Vec<ReferenceLocation> {
        self.references
            .iter()
            .filter(|r| {
                r.resolved_to
                    .as_ref()
                    .map(|resolved| resolved.kind == kind && resolved.name == name && &resolved.uri == uri)
                    .unwrap_or(false)
            })
            .map(|r| ReferenceLocation {
                uri: self.file_uri.clone(),
                whole_range: r.whole_range,
                name_range: r.name_range,
            })
            .collect()
    }
}

fn lookup_kind_name(kind: IdentifierKind, name: &str, ctx: &ResolveContext) -> Option<ResolvedIdentifier> {
    ctx.document_identifiers
        .iter()
        .find(|id| id.kind == kind && id.name == name)
        .map(ResolvedIdentifier::from_identifier)
        .or_else(|| {
            ctx.file_identifiers
                .iter()
                .find(|id| id.kind == kind && id.name == name)
                .map(ResolvedIdentifier::from_identifier)
        })
        .or_else(|| ctx.lookup.lookup(kind, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Meta;

    struct NullLookup;
    impl IdentifierLookup for NullLookup {
        fn lookup(&self, _kind: IdentifierKind, _name: &str) -> Option<ResolvedIdentifier> {
            None
        }
        fn lookup_task_param(&self, _task_name: &str, _param_name: &str) -> Option<ResolvedIdentifier> {
            None
        }
    }

    fn uri() -> Url {
        Url::parse("file:///task.yaml").unwrap()
    }

    fn range(n: u32) -> Range {
        Range {
            start: Position::new(n, 0),
            end: Position::new(n, 3),
        }
    }

    fn identifier(name: &str) -> Identifier {
        Identifier {
            kind: IdentifierKind::Param,
            name: name.to_string(),
            meta: Meta::Param {
                name: name.to_string(),
                description: None,
                default: None,
                param_type: None,
                parent_kind: "task".into(),
                parent_name: "t".into(),
            },
            defining_range: range(0),
            uri: uri(),
        }
    }

    #[test]
    fn resolves_against_document_local_identifier_first() {
        let mut doc = Document::new(uri(), 0, 100, crate::yaml::Node::null(range(0)));
        doc.identifiers = vec![identifier("foo")];
        let raw = RawReference {
            kind: IdentifierKind::Param,
            name: "foo".into(),
            whole_range: range(1),
            name_range: range(1),
            whole_offsets: (0, 3),
            name_offsets: (0, 3),
            scope: ResolutionScope::Lookup,
        };
        let lookup = NullLookup;
        let ctx = ResolveContext {
            document_identifiers: &doc.identifiers,
            file_identifiers: &doc.identifiers,
            lookup: &lookup,
        };
        let dangling = doc.resolve_references(vec![raw], &ctx);
        assert!(dangling.is_empty());
        assert!(doc.references[0].resolved_to.is_some());
    }

    #[test]
    fn unresolved_reference_is_reported_dangling() {
        let mut doc = Document::new(uri(), 0, 100, crate::yaml::Node::null(range(0)));
        let raw = RawReference {
            kind: IdentifierKind::Param,
            name: "missing".into(),
            whole_range: range(1),
            name_range: range(1),
            whole_offsets: (0, 3),
            name_offsets: (0, 3),
            scope: ResolutionScope::Lookup,
        };
        let lookup = NullLookup;
        let ctx = ResolveContext {
            document_identifiers: &[],
            file_identifiers: &[],
            lookup: &lookup,
        };
        let dangling = doc.resolve_references(vec![raw], &ctx);
        assert_eq!(dangling.len(), 1);
        assert!(doc.references[0].resolved_to.is_none());
    }
}
