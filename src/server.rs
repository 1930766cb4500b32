//! The `tower-lsp` `LanguageServer` implementation. Thin: every operation
//! translates LSP wire types to/from the `Workspace` API and otherwise does
//! no work of its own.

use std::sync::Arc;

use tower_lsp::jsonrpc::Result as RpcResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

use crate::workspace::Workspace;

pub struct Backend {
    client: Client,
    workspace: Arc<Workspace>,
}

impl Backend {
    pub fn new(client: Client, workspace_roots: &[std::path::PathBuf]) -> Self {
        let workspace = Workspace::new();
        for root in workspace_roots {
            workspace.add_folder(root);
        }
        Self {
            client,
            workspace: Arc::new(workspace),
        }
    }

    async fn publish_diagnostics(&self, uri: &Url) {
        if let Some(file) = self.workspace.file(uri) {
            let diags = file.diagnostics();
            self.client.publish_diagnostics(uri.clone(), diags, None).await;
        }
    }

    async fn relint_and_publish(&self) {
        self.workspace.lint();
        let client = self.client.clone();
        let mut per_file = Vec::new();
        self.workspace.diagnostics(|uri, diags| per_file.push((uri.clone(), diags)));
        for (uri, diags) in per_file {
            client.publish_diagnostics(uri, diags, None).await;
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> RpcResult<InitializeResult> {
        if let Some(folders) = params.workspace_folders {
            for folder in folders {
                if let Ok(path) = folder.uri.to_file_path() {
                    self.workspace.add_folder(&path);
                }
            }
        } else if let Some(root_uri) = params.root_uri {
            if let Ok(path) = root_uri.to_file_path() {
                self.workspace.add_folder(&path);
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: Default::default(),
                })),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".into(), "(".into()]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "tekton-lsp".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.relint_and_publish().await;
    }

    async fn shutdown(&self) -> RpcResult<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        self.workspace.upsert_file(uri.clone(), params.text_document.text);
        self.publish_diagnostics(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.clone();
        if let Some(change) = params.content_changes.into_iter().last() {
            self.workspace.upsert_file(uri.clone(), change.text);
            self.publish_diagnostics(&uri).await;
        }
    }

    async fn hover(&self, params: HoverParams) -> RpcResult<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;
        Ok(self.workspace.hover(&uri, pos).map(|markdown| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: markdown,
            }),
            range: None,
        }))
    }

    async fn goto_definition(&self, params: GotoDefinitionParams) -> RpcResult<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;
        Ok(self.workspace.definition(&uri, pos).map(|(uri, range)| {
            GotoDefinitionResponse::Scalar(Location { uri, range })
        }))
    }

    async fn references(&self, params: ReferenceParams) -> RpcResult<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;
        let locations = self
            .workspace
            .find_references(&uri, pos)
            .into_iter()
            .map(|loc| Location {
                uri: loc.uri,
                range: loc.whole_range,
            })
            .collect();
        Ok(Some(locations))
    }

    async fn prepare_rename(&self, params: TextDocumentPositionParams) -> RpcResult<Option<PrepareRenameResponse>> {
        Ok(self
            .workspace
            .prepare_rename(&params.text_document.uri, params.position)
            .map(PrepareRenameResponse::Range))
    }

    async fn rename(&self, params: RenameParams) -> RpcResult<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;
        match self.workspace.rename(&uri, pos, &params.new_name) {
            Ok(edit) => Ok(Some(edit)),
            Err(_) => Ok(None),
        }
    }

    async fn completion(&self, params: CompletionParams) -> RpcResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;
        let items = self
            .workspace
            .completions(&uri, pos)
            .into_iter()
            .enumerate()
            .map(|(i, c)| CompletionItem {
                label: c.label.clone(),
                kind: Some(CompletionItemKind::PROPERTY),
                documentation: Some(Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: c.documentation,
                })),
                preselect: Some(c.preselect),
                sort_text: Some(format!("{i:04}")),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range: c.insert_range,
                    new_text: c.label,
                })),
                ..Default::default()
            })
            .collect();
        Ok(Some(CompletionResponse::Array(items)))
    }
}
