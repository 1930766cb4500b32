//! End-to-end test for S5: a file containing Helm `{{ ... }}` templating
//! (including a multi-line block) still parses, and every diagnostic and
//! reference range lands at the same line/column a plain YAML file would
//! produce, since sanitization preserves length and newlines exactly.

mod support;

use tekton_lsp::Workspace;
use tower_lsp::lsp_types::Url;

use support::pos_in;

fn uri(path: &str) -> Url {
    Url::parse(&format!("file:///{path}")).unwrap()
}

#[test]
fn helm_templated_file_parses_and_keeps_accurate_positions() {
    let workspace = Workspace::new();
    let task_uri = uri("task.yaml");
    let text = concat!(
        "apiVersion: tekton.dev/v1beta1\n",
        "kind: Task\n",
        "metadata:\n",
        "  name: {{ .Values.taskName }}\n",
        "spec:\n",
        "  params:\n",
        "    - name: foo\n",
        "  steps:\n",
        "    - name: s\n",
        "      image: {{\n",
        "        .Values.image\n",
        "      }}\n",
        "      script: \"echo $(params.missing)\"\n",
    );
    workspace.upsert_file(task_uri.clone(), text.to_string());
    workspace.lint();

    let file = workspace.file(&task_uri).expect("file should be present");
    assert!(file.parse_error.is_none(), "Helm templating should not break the parse");

    let mut diags = Vec::new();
    workspace.diagnostics(|u, d| {
        if u == &task_uri {
            diags = d;
        }
    });
    assert_eq!(diags.len(), 1, "only the unknown param reference should be flagged, got {diags:?}");

    let reported_pos = pos_in(text, "$(params.missing)");
    assert_eq!(diags[0].range.start.line, reported_pos.line);
}
