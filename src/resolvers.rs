//! Reference resolvers: the regex scanners over raw bytes and the AST path
//! walkers that locate structural reference sites.
//!
//! Resolvers only *produce* references here — matching a name against the
//! known identifiers (document, then file, then workspace) is the caller's
//! job, since that requires context (sibling documents, sibling files) this
//! module has no business holding onto.

use std::sync::OnceLock;

use regex::Regex;
use tower_lsp::lsp_types::Range;

use crate::buffer::TextBuffer;
use crate::model::IdentifierKind;
use crate::yaml::{path, Node};

/// Matches within a single pattern are capped to guard against pathological
/// inputs (e.g. a file with thousands of `$(...)` occurrences).
pub const MAX_MATCHES_PER_PATTERN: usize = 1000;

/// How a [`RawReference`] should be resolved. Most references resolve by
/// plain `(kind, name)` lookup; a param override on a `taskRef`'d task's
/// `params[*]` entry needs the task-scoped locator instead, since the same
/// param name can mean different things under different tasks.
#[derive(Debug, Clone)]
pub enum ResolutionScope {
    Lookup,
    TaskScopedParam { task_name: String },
}

#[derive(Debug, Clone)]
pub struct RawReference {
    pub kind: IdentifierKind,
    pub name: String,
    pub whole_range: Range,
    pub name_range: Range,
    pub whole_offsets: (usize, usize),
    pub name_offsets: (usize, usize),
    pub scope: ResolutionScope,
}

struct RegexPattern {
    kind: IdentifierKind,
    pattern: &'static str,
}

static REGEX_PATTERNS: &[RegexPattern] = &[
    RegexPattern {
        kind: IdentifierKind::Param,
        pattern: r"\$\(params\.(.*?)(\[\*\])?\)",
    },
    RegexPattern {
        kind: IdentifierKind::Result,
        pattern: r"\$\(results\.(.*?)\.(.*?)\)",
    },
    RegexPattern {
        kind: IdentifierKind::Workspace,
        pattern: r"\$\(workspaces\.(.*?)\.(.*?)\)",
    },
    RegexPattern {
        kind: IdentifierKind::PipelineTask,
        pattern: r"\$\(tasks\.(.*?)\.(.*?)\.(.*?)\)",
    },
];

fn compiled(pattern: &'static str) -> &'static Regex {
    static CACHE: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| {
        REGEX_PATTERNS
            .iter()
            .map(|p| (p.pattern, Regex::new(p.pattern).expect("static pattern is valid")))
            .collect()
    });
    &cache.iter().find(|(p, _)| *p == pattern).expect("pattern registered").1
}

/// Scan the file's raw (unsanitized) bytes for every interpolation pattern.
/// Returns matches across the *whole file*; callers (Document resolution)
/// filter to those whose whole-range falls entirely inside their own byte
/// window.
pub fn scan_interpolations(buffer: &TextBuffer) -> Vec<RawReference> {
    let mut out = Vec::new();
    for entry in REGEX_PATTERNS {
        let regex = compiled(entry.pattern);
        for capture in regex.captures_iter(buffer.text()).take(MAX_MATCHES_PER_PATTERN) {
            let whole = capture.get(0).unwrap();
            let name_cap = match capture.get(1) {
                Some(m) => m,
                None => continue,
            };
            out.push(RawReference {
                kind: entry.kind,
                name: name_cap.as_str().to_string(),
                whole_range: Range {
                    start: buffer.position_at(whole.start()),
                    end: buffer.position_at(whole.end()),
                },
                name_range: Range {
                    start: buffer.position_at(name_cap.start()),
                    end: buffer.position_at(name_cap.end()),
                },
                whole_offsets: (whole.start(), whole.end()),
                name_offsets: (name_cap.start(), name_cap.end()),
                scope: ResolutionScope::Lookup,
            });
        }
    }
    out
}

fn node_reference(
    buffer: &TextBuffer,
    kind: IdentifierKind,
    name_node: &Node,
    scope: ResolutionScope,
) -> Option<RawReference> {
    let name = name_node.as_scalar()?.to_string();
    let start = buffer.offset_at(name_node.range.start);
    let end = buffer.offset_at(name_node.range.end);
    Some(RawReference {
        kind,
        name,
        whole_range: name_node.range,
        name_range: name_node.range,
        whole_offsets: (start, end),
        name_offsets: (start, end),
        scope,
    })
}

/// The structural (AST path) reference sites — `taskRef.name`,
/// `runAfter[*]`, `workspaces[*].workspace`, and task-scoped param
/// overrides — run against a single Document's root node.
pub fn scan_structural(doc_root: &Node, buffer: &TextBuffer) -> Vec<RawReference> {
    let mut out = Vec::new();

    for chain in path::eval_chain(doc_root, &["$.spec.tasks[*].workspaces[*]"]) {
        let binding = chain[0];
        if let Some(workspace_name) = binding.get("workspace") {
            if let Some(r) = node_reference(buffer, IdentifierKind::Workspace, workspace_name, ResolutionScope::Lookup) {
                out.push(r);
            }
        }
    }

    for chain in path::eval_chain(doc_root, &["$.spec.tasks[*].runAfter[*]"]) {
        if let Some(r) = node_reference(buffer, IdentifierKind::PipelineTask, chain[0], ResolutionScope::Lookup) {
            out.push(r);
        }
    }

    for chain in path::eval_chain(doc_root, &["$.spec.tasks[*].taskRef.name"]) {
        if let Some(r) = node_reference(buffer, IdentifierKind::Task, chain[0], ResolutionScope::Lookup) {
            out.push(r);
        }
    }

    for chain in path::eval_chain(doc_root, &["$.spec.tasks[*]", "$.params[*]", "$.name"]) {
        let task_node = chain[0];
        let name_node = chain[2];
        let Some(task_name) = task_node.get("taskRef").and_then(|r| r.get("name")).and_then(Node::as_scalar) else {
            continue;
        };
        if let Some(r) = node_reference(
            buffer,
            IdentifierKind::Param,
            name_node,
            ResolutionScope::TaskScopedParam {
                task_name: task_name.to_string(),
            },
        ) {
            out.push(r);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_param_interpolation() {
        let buffer = TextBuffer::new("script: echo $(params.foo)\n".to_string());
        let refs = scan_interpolations(&buffer);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, IdentifierKind::Param);
        assert_eq!(refs[0].name, "foo");
        let (ws, we) = refs[0].whole_offsets;
        assert_eq!(&buffer.text()[ws..we], "$(params.foo)");
    }

    #[test]
    fn scans_result_interpolation_with_suffix() {
        let buffer = TextBuffer::new("$(results.bar.path)".to_string());
        let refs = scan_interpolations(&buffer);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].kind, IdentifierKind::Result);
        assert_eq!(refs[0].name, "bar");
    }

    #[test]
    fn caps_matches_per_pattern() {
        let text = "$(params.x)\n".repeat(MAX_MATCHES_PER_PATTERN + 50);
        let buffer = TextBuffer::new(text);
        let refs = scan_interpolations(&buffer);
        assert_eq!(refs.len(), MAX_MATCHES_PER_PATTERN);
    }

    #[test]
    fn structural_task_ref_is_scanned() {
        let text = "spec:\n  tasks:\n    - name: t1\n      taskRef:\n        name: gen-code\n";
        let buffer = TextBuffer::new(text.to_string());
        let docs = crate::yaml::parse(&buffer).unwrap();
        let refs = scan_structural(&docs[0].root, &buffer);
        assert!(refs.iter().any(|r| r.kind == IdentifierKind::Task && r.name == "gen-code"));
    }

    #[test]
    fn task_scoped_param_carries_task_name() {
        let text = "spec:\n  tasks:\n    - name: t1\n      taskRef:\n        name: builder\n      params:\n        - name: foo\n";
        let buffer = TextBuffer::new(text.to_string());
        let docs = crate::yaml::parse(&buffer).unwrap();
        let refs = scan_structural(&docs[0].root, &buffer);
        let param_ref = refs
            .iter()
            .find(|r| r.kind == IdentifierKind::Param)
            .expect("task-scoped param reference");
        match &param_ref.scope {
            ResolutionScope::TaskScopedParam { task_name } => assert_eq!(task_name, "builder"),
            _ => panic!("expected TaskScopedParam"),
        }
    }
}
