//! The semantic index's value types: identifiers, references, and the
//! polymorphic per-kind metadata hover/completion reads from.

use tower_lsp::lsp_types::{Range, Url};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Param,
    Result,
    Workspace,
    PipelineTask,
    Task,
}

impl IdentifierKind {
    /// The noun used in `"unknown <label> <name>"` diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            IdentifierKind::Param => "parameter",
            IdentifierKind::Result => "result",
            IdentifierKind::Workspace => "workspace",
            IdentifierKind::PipelineTask => "pipelineTask",
            IdentifierKind::Task => "task",
        }
    }
}

/// A single `CompletionCandidate` a `Meta` can offer, optionally restricted
/// to positions inside the node(s) `context` (a path evaluated against the
/// Document root) matches.
#[derive(Debug, Clone)]
pub struct CompletionCandidate {
    pub text: String,
    pub context: Option<&'static str>,
}

impl CompletionCandidate {
    pub fn unrestricted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn restricted(text: impl Into<String>, context: &'static str) -> Self {
        Self {
            text: text.into(),
            context: Some(context),
        }
    }
}

/// Kind-specific metadata carried by an [`Identifier`]; the small capability
/// set (`name`, `documentation`, `completions`) hover/completion read from.
#[derive(Debug, Clone)]
pub enum Meta {
    Param {
        name: String,
        description: Option<String>,
        default: Option<String>,
        param_type: Option<String>,
        parent_kind: String,
        parent_name: String,
    },
    Result {
        name: String,
        description: Option<String>,
    },
    Workspace {
        name: String,
        description: Option<String>,
    },
    PipelineTask {
        name: String,
    },
    Task {
        name: String,
    },
}

impl Meta {
    pub fn name(&self) -> &str {
        match self {
            Meta::Param { name, .. }
            | Meta::Result { name, .. }
            | Meta::Workspace { name, .. }
            | Meta::PipelineTask { name }
            | Meta::Task { name } => name,
        }
    }

    pub fn documentation(&self) -> String {
        match self {
            Meta::Param {
                name,
                description,
                default,
                param_type,
                parent_kind,
                parent_name,
            } => {
                let mut doc = format!("**Param** `{name}` (from {parent_kind} `{parent_name}`)");
                if let Some(t) = param_type {
                    doc.push_str(&format!("\n\ntype: `{t}`"));
                }
                if let Some(d) = default {
                    doc.push_str(&format!("\n\ndefault: `{d}`"));
                }
                if let Some(desc) = description {
                    doc.push_str(&format!("\n\n{desc}"));
                }
                doc
            }
            Meta::Result { name, description } => {
                let mut doc = format!("**Result** `{name}`");
                if let Some(desc) = description {
                    doc.push_str(&format!("\n\n{desc}"));
                }
                doc
            }
            Meta::Workspace { name, description } => {
                let mut doc = format!("**Workspace** `{name}`");
                if let Some(desc) = description {
                    doc.push_str(&format!("\n\n{desc}"));
                }
                doc
            }
            Meta::PipelineTask { name } => format!("**PipelineTask** `{name}`"),
            Meta::Task { name } => format!("**Task** `{name}`"),
        }
    }

    pub fn completions(&self) -> Vec<CompletionCandidate> {
        match self {
            Meta::Param { name, .. } => {
                vec![CompletionCandidate::unrestricted(format!("$(params.{name})"))]
            }
            Meta::Result { name, .. } => {
                vec![CompletionCandidate::unrestricted(format!(
                    "$(results.{name}.path)"
                ))]
            }
            Meta::Workspace { name, .. } => vec![
                CompletionCandidate::unrestricted(format!("$(workspaces.{name}.path)")),
                CompletionCandidate::restricted(
                    name.clone(),
                    "$.spec.tasks[*].workspaces[*].workspace",
                ),
            ],
            Meta::PipelineTask { name } => vec![CompletionCandidate::restricted(
                name.clone(),
                "$.spec.tasks[*].runAfter",
            )],
            Meta::Task { .. } => Vec::new(),
        }
    }
}

/// A definition site. `defining_range` is the name token's range — what
/// rename edits and what hover/definition jump to.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub kind: IdentifierKind,
    pub name: String,
    pub meta: Meta,
    pub defining_range: Range,
    pub uri: Url,
}

impl Identifier {
    pub fn location(&self) -> (Url, Range) {
        (self.uri.clone(), self.defining_range)
    }
}

/// The shape returned when asking "where is this identifier used" — computed
/// on demand by [`crate::workspace::Workspace::references_of`] rather than
/// stored on the `Identifier` itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceLocation {
    pub uri: Url,
    pub whole_range: Range,
    pub name_range: Range,
}

/// A text fragment that purports to refer to an identifier of some kind.
/// `resolved_to` is a snapshot taken once identifiers are stable (after the
/// identifiers/references barrier), not a live pointer.
#[derive(Debug, Clone)]
pub struct Reference {
    pub kind: IdentifierKind,
    pub name: String,
    pub uri: Url,
    pub whole_range: Range,
    pub name_range: Range,
    pub whole_offsets: (usize, usize),
    pub name_offsets: (usize, usize),
    pub resolved_to: Option<ResolvedIdentifier>,
}

/// A lightweight snapshot of the identifier a [`Reference`] resolved to:
/// enough to answer `definition`/`hover`/`find_references` without holding a
/// live handle into another File's (possibly since-replaced) index.
#[derive(Debug, Clone)]
pub struct ResolvedIdentifier {
    pub kind: IdentifierKind,
    pub name: String,
    pub uri: Url,
    pub defining_range: Range,
    pub meta: Meta,
}

impl ResolvedIdentifier {
    pub fn from_identifier(identifier: &Identifier) -> Self {
        Self {
            kind: identifier.kind,
            name: identifier.name.clone(),
            uri: identifier.uri.clone(),
            defining_range: identifier.defining_range,
            meta: identifier.meta.clone(),
        }
    }

    pub fn matches(&self, identifier: &Identifier) -> bool {
        self.kind == identifier.kind && self.name == identifier.name && self.uri == identifier.uri
    }
}
