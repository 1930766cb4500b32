//! End-to-end test for find-references: the closure of every location across
//! the workspace that resolves to a given identifier, whether invoked from
//! the identifier's own definition or from one of its uses.

mod support;

use tekton_lsp::Workspace;
use tower_lsp::lsp_types::Url;

use support::pos_in;

fn uri(path: &str) -> Url {
    Url::parse(&format!("file:///{path}")).unwrap()
}

#[test]
fn find_references_collects_every_use_across_files() {
    let workspace = Workspace::new();
    let task_uri = uri("task.yaml");
    let pipeline_a_uri = uri("pipeline-a.yaml");
    let pipeline_b_uri = uri("pipeline-b.yaml");

    let task_text = "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: gen-code\nspec: {}\n";
    let pipeline_a_text = "apiVersion: tekton.dev/v1beta1\nkind: Pipeline\nmetadata:\n  name: a\nspec:\n  tasks:\n    - name: build\n      taskRef:\n        name: gen-code\n";
    let pipeline_b_text = "apiVersion: tekton.dev/v1beta1\nkind: Pipeline\nmetadata:\n  name: b\nspec:\n  tasks:\n    - name: compile\n      taskRef:\n        name: gen-code\n";

    workspace.upsert_file(task_uri.clone(), task_text.to_string());
    workspace.upsert_file(pipeline_a_uri.clone(), pipeline_a_text.to_string());
    workspace.upsert_file(pipeline_b_uri.clone(), pipeline_b_text.to_string());
    workspace.lint();

    let def_pos = pos_in(task_text, "gen-code");
    let from_definition = workspace.find_references(&task_uri, def_pos);
    assert_eq!(from_definition.len(), 2, "expected a use in each pipeline, got {from_definition:?}");
    assert!(from_definition.iter().any(|r| r.uri == pipeline_a_uri));
    assert!(from_definition.iter().any(|r| r.uri == pipeline_b_uri));

    // invoking from one of the uses resolves the same closure
    let use_pos = pos_in(pipeline_a_text, "gen-code");
    let from_use = workspace.find_references(&pipeline_a_uri, use_pos);
    assert_eq!(from_use.len(), 2);
    assert!(from_use.iter().any(|r| r.uri == pipeline_a_uri));
    assert!(from_use.iter().any(|r| r.uri == pipeline_b_uri));
}

#[test]
fn find_references_on_unused_identifier_is_empty() {
    let workspace = Workspace::new();
    let task_uri = uri("task.yaml");
    let text = "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: unused-task\nspec: {}\n";
    workspace.upsert_file(task_uri.clone(), text.to_string());
    workspace.lint();

    let def_pos = pos_in(text, "unused-task");
    assert!(workspace.find_references(&task_uri, def_pos).is_empty());
}
