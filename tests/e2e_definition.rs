//! End-to-end tests for go-to-definition: cross-file task references (S3)
//! and definitions inside a single document.

mod support;

use tekton_lsp::Workspace;
use tower_lsp::lsp_types::Url;

use support::pos_in;

fn uri(path: &str) -> Url {
    Url::parse(&format!("file:///{path}")).unwrap()
}

#[test]
fn s3_cross_file_task_reference_resolves() {
    let workspace = Workspace::new();
    let task_uri = uri("task.yaml");
    let pipeline_uri = uri("pipeline.yaml");

    workspace.upsert_file(
        task_uri.clone(),
        "apiVersion: tekton.dev/v1beta1\nkind: Task\nmetadata:\n  name: gen-code\nspec: {}\n".to_string(),
    );
    let pipeline_text =
        "apiVersion: tekton.dev/v1beta1\nkind: Pipeline\nmetadata:\n  name: p\nspec:\n  tasks:\n    - name: build\n      taskRef:\n        name: gen-code\n";
    workspace.upsert_file(pipeline_uri.clone(), pipeline_text.to_string());
    workspace.lint();

    let pos = pos_in(pipeline_text, "gen-code");
    let (def_uri, _range) = workspace
        .definition(&pipeline_uri, pos)
        .expect("expected definition for gen-code");
    assert_eq!(def_uri, task_uri);
}

#[test]
fn no_definition_when_task_unknown() {
    let workspace = Workspace::new();
    let pipeline_uri = uri("pipeline.yaml");
    let text = "kind: Pipeline\nmetadata:\n  name: p\nspec:\n  tasks:\n    - name: build\n      taskRef:\n        name: missing\n";
    workspace.upsert_file(pipeline_uri.clone(), text.to_string());
    workspace.lint();

    let pos = pos_in(text, "missing");
    assert!(workspace.definition(&pipeline_uri, pos).is_none());
}

#[test]
fn definition_for_param_interpolation_inside_same_document() {
    let workspace = Workspace::new();
    let task_uri = uri("task.yaml");
    let text = "kind: Task\nmetadata:\n  name: hello\nspec:\n  params:\n    - name: foo\n  steps:\n    - name: s\n      script: \"echo $(params.foo)\"\n";
    workspace.upsert_file(task_uri.clone(), text.to_string());
    workspace.lint();

    let pos = pos_in(text, "$(params.foo)");
    let (def_uri, range) = workspace
        .definition(&task_uri, pos)
        .expect("expected definition for params.foo");
    assert_eq!(def_uri, task_uri);
    // the definition should land on the "name: foo" line, not the script line
    assert!(range.start.line < 8);
}
