//! The declarative identifier-extraction rule table.
//!
//! Each [`Rule`] names a chain of YAML paths and a builder that turns the
//! matched node chain into an [`Identifier`]. Keeping this as data (a table
//! walked by [`extract`]) rather than one function per kind means a new
//! identifier kind is a new table row, not a new code path.

use tower_lsp::lsp_types::Url;

use crate::model::{Identifier, IdentifierKind, Meta};
use crate::yaml::{path, Node};

pub struct Rule {
    pub kind: IdentifierKind,
    pub paths: &'static [&'static str],
    pub build: fn(chain: &[&Node], doc_root: &Node, uri: &Url) -> Option<Identifier>,
}

pub static RULES: &[Rule] = &[
    Rule {
        kind: IdentifierKind::Param,
        paths: &["$.spec.params[*]", "$.name"],
        build: build_param,
    },
    Rule {
        kind: IdentifierKind::Result,
        paths: &["$.spec.results[*]", "$.name"],
        build: build_result,
    },
    Rule {
        kind: IdentifierKind::Workspace,
        paths: &["$.spec.workspaces[*]", "$.name"],
        build: build_workspace,
    },
    Rule {
        kind: IdentifierKind::PipelineTask,
        paths: &["$.spec.tasks[*]", "$.name"],
        build: build_pipeline_task,
    },
    Rule {
        kind: IdentifierKind::Task,
        paths: &["$.metadata.name"],
        build: build_task,
    },
];

/// Run every rule against `doc_root` in table order, producing identifiers
/// ordered outer-by-kind (table order), inner-by-source-order.
pub fn extract(doc_root: &Node, uri: &Url) -> Vec<Identifier> {
    let mut out = Vec::new();
    for rule in RULES {
        for chain in path::eval_chain(doc_root, rule.paths) {
            if let Some(identifier) = (rule.build)(&chain, doc_root, uri) {
                out.push(identifier);
            }
        }
    }
    out
}

fn doc_kind(doc_root: &Node) -> Option<&str> {
    doc_root.get("kind").and_then(Node::as_scalar)
}

fn doc_name(doc_root: &Node) -> Option<&str> {
    doc_root.get("metadata")?.get("name")?.as_scalar()
}

fn build_param(chain: &[&Node], doc_root: &Node, uri: &Url) -> Option<Identifier> {
    let [param_map, name_node] = chain else {
        return None;
    };
    let name = name_node.as_scalar()?.to_string();
    let parent_kind = doc_kind(doc_root).unwrap_or_default().to_lowercase();
    let parent_name = doc_name(doc_root).unwrap_or_default().to_string();
    Some(Identifier {
        kind: IdentifierKind::Param,
        name: name.clone(),
        meta: Meta::Param {
            name,
            description: param_map.get("description").and_then(Node::as_scalar).map(String::from),
            default: param_map.get("default").and_then(Node::as_scalar).map(String::from),
            param_type: param_map.get("type").and_then(Node::as_scalar).map(String::from),
            parent_kind,
            parent_name,
        },
        defining_range: name_node.range,
        uri: uri.clone(),
    })
}

fn build_result(chain: &[&Node], _doc_root: &Node, uri: &Url) -> Option<Identifier> {
    let [result_map, name_node] = chain else {
        return None;
    };
    let name = name_node.as_scalar()?.to_string();
    Some(Identifier {
        kind: IdentifierKind::Result,
        name: name.clone(),
        meta: Meta::Result {
            name,
            description: result_map.get("description").and_then(Node::as_scalar).map(String::from),
        },
        defining_range: name_node.range,
        uri: uri.clone(),
    })
}

fn build_workspace(chain: &[&Node], _doc_root: &Node, uri: &Url) -> Option<Identifier> {
    let [workspace_map, name_node] = chain else {
        return None;
    };
    let name = name_node.as_scalar()?.to_string();
    Some(Identifier {
        kind: IdentifierKind::Workspace,
        name: name.clone(),
        meta: Meta::Workspace {
            name,
            description: workspace_map
                .get("description")
                .and_then(Node::as_scalar)
                .map(String::from),
        },
        defining_range: name_node.range,
        uri: uri.clone(),
    })
}

fn build_pipeline_task(chain: &[&Node], _doc_root: &Node, uri: &Url) -> Option<Identifier> {
    let [_task_map, name_node] = chain else {
        return None;
    };
    let name = name_node.as_scalar()?.to_string();
    Some(Identifier {
        kind: IdentifierKind::PipelineTask,
        name: name.clone(),
        meta: Meta::PipelineTask { name },
        defining_range: name_node.range,
        uri: uri.clone(),
    })
}

fn build_task(chain: &[&Node], doc_root: &Node, uri: &Url) -> Option<Identifier> {
    let [name_node] = chain else {
        return None;
    };
    let kind = doc_kind(doc_root)?;
    if !kind.eq_ignore_ascii_case("task") {
        return None;
    }
    let name = name_node.as_scalar()?.to_string();
    Some(Identifier {
        kind: IdentifierKind::Task,
        name: name.clone(),
        meta: Meta::Task { name },
        defining_range: name_node.range,
        uri: uri.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::yaml::parser;
    use crate::buffer::TextBuffer;

    fn parse_single(text: &str) -> Node {
        let buffer = TextBuffer::new(text.to_string());
        let mut docs = parser::parse(&buffer).unwrap();
        docs.remove(0).root
    }

    fn uri() -> Url {
        Url::parse("file:///task.yaml").unwrap()
    }

    #[test]
    fn extracts_task_local_param() {
        let root = parse_single(
            "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: hello\nspec:\n  params:\n    - name: foo\n",
        );
        let ids = extract(&root, &uri());
        assert!(ids.iter().any(|i| i.kind == IdentifierKind::Param && i.name == "foo"));
        assert!(ids.iter().any(|i| i.kind == IdentifierKind::Task && i.name == "hello"));
    }

    #[test]
    fn param_carries_parent_context() {
        let root = parse_single(
            "kind: Task\nmetadata:\n  name: builder\nspec:\n  params:\n    - name: foo\n",
        );
        let ids = extract(&root, &uri());
        let param = ids.iter().find(|i| i.kind == IdentifierKind::Param).unwrap();
        match &param.meta {
            Meta::Param { parent_kind, parent_name, .. } => {
                assert_eq!(parent_kind, "task");
                assert_eq!(parent_name, "builder");
            }
            _ => panic!("expected Param meta"),
        }
    }

    #[test]
    fn pipeline_document_does_not_yield_task_identifier() {
        let root = parse_single("kind: Pipeline\nmetadata:\n  name: p\n");
        let ids = extract(&root, &uri());
        assert!(ids.iter().all(|i| i.kind != IdentifierKind::Task));
    }

    #[test]
    fn ordering_follows_rule_table_then_source_order() {
        let root = parse_single(
            "kind: Task\nmetadata:\n  name: t\nspec:\n  params:\n    - name: a\n    - name: b\n  results:\n    - name: r\n",
        );
        let ids = extract(&root, &uri());
        let kinds: Vec<IdentifierKind> = ids.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                IdentifierKind::Param,
                IdentifierKind::Param,
                IdentifierKind::Result,
                IdentifierKind::Task,
            ]
        );
    }
}
