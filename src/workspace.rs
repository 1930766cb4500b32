//! Owns all Files; coordinates incremental (re)resolution on edits; answers
//! cross-file lookups, find-references, rename, and diagnostics.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use ignore::WalkBuilder;
use rayon::prelude::*;
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, Position, Range, TextEdit, Url, WorkspaceEdit,
};

use crate::completion::CompletionResult;
use crate::document::IdentifierLookup;
use crate::error::Error;
use crate::file::File;
use crate::model::{IdentifierKind, ReferenceLocation, ResolvedIdentifier};

#[derive(Default)]
pub struct Workspace {
    files: RwLock<HashMap<Url, Arc<File>>>,
}

/// A point-in-time view over every identifier currently defined in the
/// workspace, built fresh for each resolution pass (lint, or the touched
/// subset of an incremental upsert). First-in-(sorted-uri)-iteration wins on
/// `(kind, name)` collisions; later definitions are recorded in `duplicates`
/// so callers can surface a duplicate-identifier diagnostic.
struct WorkspaceIndex {
    by_kind_name: HashMap<(IdentifierKind, String), ResolvedIdentifier>,
    task_params: HashMap<(String, String), ResolvedIdentifier>,
    duplicates: Vec<(IdentifierKind, String, Url, Range)>,
}

impl WorkspaceIndex {
    fn build<'a>(files: impl Iterator<Item = (&'a Url, &'a File)>) -> Self {
        let mut sorted: Vec<(&Url, &File)> = files.collect();
        sorted.sort_by_key(|(uri, _)| uri.as_str().to_string());

        let mut by_kind_name = HashMap::new();
        let mut task_params = HashMap::new();
        let mut duplicates = Vec::new();

        for (_, file) in sorted {
            for id in file.all_identifiers() {
                let key = (id.kind, id.name.clone());
                if by_kind_name.contains_key(&key) {
                    duplicates.push((id.kind, id.name.clone(), id.uri.clone(), id.defining_range));
                } else {
                    by_kind_name.insert(key, ResolvedIdentifier::from_identifier(id));
                }

                if id.kind == IdentifierKind::Param {
                    if let crate::model::Meta::Param { parent_kind, parent_name, .. } = &id.meta {
                        if parent_kind == "task" {
                            let task_key = (parent_name.clone(), id.name.clone());
                            task_params
                                .entry(task_key)
                                .or_insert_with(|| ResolvedIdentifier::from_identifier(id));
                        }
                    }
                }
            }
        }

        Self {
            by_kind_name,
            task_params,
            duplicates,
        }
    }
}

impl IdentifierLookup for WorkspaceIndex {
    fn lookup(&self, kind: IdentifierKind, name: &str) -> Option<ResolvedIdentifier> {
        self.by_kind_name.get(&(kind, name.to_string())).cloned()
    }

    fn lookup_task_param(&self, task_name: &str, param_name: &str) -> Option<ResolvedIdentifier> {
        self.task_params
            .get(&(task_name.to_string(), param_name.to_string()))
            .cloned()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the filesystem under `root` for `.yaml`/`.yml` files, honoring
    /// `.gitignore` conventions, parsing each in parallel before a serialized
    /// insertion into the map. Does not resolve; call `lint()` afterward.
    pub fn add_folder(&self, root: &Path) {
        let entries: Vec<std::path::PathBuf> = WalkBuilder::new(root)
            .hidden(false)
            .require_git(false)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();

        let parsed: Vec<(Url, File)> = entries
            .par_iter()
            .filter_map(|path| {
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                        return None;
                    }
                };
                let uri = Url::from_file_path(path).ok()?;
                Some((uri.clone(), File::new(uri, text)))
            })
            .collect();

        let mut files = self.files.write().expect("workspace lock poisoned");
        for (uri, file) in parsed {
            files.insert(uri, Arc::new(file));
        }
    }

    /// Inserts or replaces a File, then incrementally re-resolves exactly
    /// the files whose reference tables could have changed.
    pub fn upsert_file(&self, uri: Url, text: String) {
        let mut new_file = File::new(uri.clone(), text);
        new_file.resolve_identifiers();
        let new_names: HashSet<String> = new_file.all_identifiers().map(|id| id.name.clone()).collect();

        let (s1, snapshot): (HashSet<Url>, HashMap<Url, Arc<File>>) = {
            let files = self.files.read().expect("workspace lock poisoned");
            let snapshot = files.clone();
            let s1 = match files.get(&uri) {
                Some(old_file) => {
                    let old_identifiers: Vec<(IdentifierKind, String)> = old_file
                        .all_identifiers()
                        .map(|id| (id.kind, id.name.clone()))
                        .collect();
                    snapshot
                        .iter()
                        .filter(|(other_uri, other_file)| {
                            **other_uri != uri
                                && other_file.documents.iter().any(|doc| {
                                    doc.references.iter().any(|r| {
                                        r.resolved_to
                                            .as_ref()
                                            .map(|resolved| {
                                                resolved.uri == uri
                                                    && old_identifiers
                                                        .iter()
                                                        .any(|(k, n)| *k == resolved.kind && n == &resolved.name)
                                            })
                                            .unwrap_or(false)
                                    })
                                })
                        })
                        .map(|(u, _)| u.clone())
                        .collect()
                }
                None => HashSet::new(),
            };
            (s1, snapshot)
        };

        let s2: HashSet<Url> = snapshot
            .iter()
            .filter(|(other_uri, other_file)| {
                **other_uri != uri && !other_file.dangling_ref_names.is_disjoint(&new_names)
            })
            .map(|(u, _)| u.clone())
            .collect();

        let mut combined: HashMap<Url, File> = snapshot
            .iter()
            .map(|(u, f)| (u.clone(), (**f).clone()))
            .collect();
        combined.insert(uri.clone(), new_file);

        let index = WorkspaceIndex::build(combined.iter().map(|(u, f)| (u, f)));

        let mut to_recompute: Vec<Url> = s1.union(&s2).cloned().collect();
        to_recompute.push(uri.clone());

        let recomputed: Vec<(Url, File)> = to_recompute
            .par_iter()
            .map(|u| {
                let mut file = combined.get(u).expect("file present in combined snapshot").clone();
                file.resolve_references(&index);
                (u.clone(), file)
            })
            .collect();

        let mut files = self.files.write().expect("workspace lock poisoned");
        for (u, file) in recomputed {
            files.insert(u, Arc::new(file));
        }
    }

    /// Full-workspace resolution: identifiers for every file, a barrier,
    /// then references for every file.
    pub fn lint(&self) {
        let snapshot: HashMap<Url, File> = {
            let files = self.files.read().expect("workspace lock poisoned");
            files.iter().map(|(u, f)| (u.clone(), (**f).clone())).collect()
        };

        let mut with_identifiers: HashMap<Url, File> = snapshot
            .into_par_iter()
            .map(|(u, mut f)| {
                f.resolve_identifiers();
                (u, f)
            })
            .collect();

        let index = WorkspaceIndex::build(with_identifiers.iter().map(|(u, f)| (u, f)));

        with_identifiers.par_iter_mut().for_each(|(_, f)| {
            f.resolve_references(&index);
        });

        let mut files = self.files.write().expect("workspace lock poisoned");
        for (u, f) in with_identifiers {
            files.insert(u, Arc::new(f));
        }
    }

    pub fn file(&self, uri: &Url) -> Option<Arc<File>> {
        self.files.read().expect("workspace lock poisoned").get(uri).cloned()
    }

    /// First identifier matching `(kind, name)`, iterating files in a fixed
    /// (sorted-by-uri) order; ties are an acknowledged ambiguity, surfaced
    /// separately as a duplicate-identifier diagnostic.
    pub fn get_ident(&self, kind: IdentifierKind, name: &str) -> Option<ResolvedIdentifier> {
        let files = self.files.read().expect("workspace lock poisoned");
        let mut uris: Vec<&Url> = files.keys().collect();
        uris.sort_by_key(|u| u.as_str().to_string());
        for uri in uris {
            let file = &files[uri];
            if let Some(id) = file.all_identifiers().find(|id| id.kind == kind && id.name == name) {
                return Some(ResolvedIdentifier::from_identifier(id));
            }
        }
        None
    }

    /// Every location across the workspace where `(kind, name, uri)` is
    /// referenced — the computed view replacing a mutable `Identifier.references`
    /// field (see DESIGN.md).
    pub fn references_of(&self, kind: IdentifierKind, name: &str, uri: &Url) -> Vec<ReferenceLocation> {
        let files = self.files.read().expect("workspace lock poisoned");
        files.values().flat_map(|f| f.local_reference_locations(kind, name, uri)).collect()
    }

    pub fn hover(&self, uri: &Url, pos: Position) -> Option<String> {
        self.file(uri)?.hover(pos)
    }

    pub fn definition(&self, uri: &Url, pos: Position) -> Option<(Url, Range)> {
        self.file(uri)?.definition(pos)
    }

    pub fn find_references(&self, uri: &Url, pos: Position) -> Vec<ReferenceLocation> {
        let Some(file) = self.file(uri) else {
            return Vec::new();
        };
        let Some((kind, name, target_uri)) = file.rename_target(pos) else {
            return Vec::new();
        };
        self.references_of(kind, &name, &target_uri)
    }

    pub fn prepare_rename(&self, uri: &Url, pos: Position) -> Option<Range> {
        self.file(uri)?.prepare_rename(pos)
    }

    pub fn rename(&self, uri: &Url, pos: Position, new_name: &str) -> Result<WorkspaceEdit, Error> {
        let file = self.file(uri).ok_or(Error::NothingToRename)?;
        let (kind, name, target_uri) = file.rename_target(pos).ok_or(Error::NothingToRename)?;

        let Some(identifier) = self.get_ident(kind, &name) else {
            return Err(Error::NothingToRename);
        };
        if identifier.uri != target_uri {
            return Err(Error::NothingToRename);
        }

        let mut edits: HashMap<Url, Vec<TextEdit>> = HashMap::new();
        edits.entry(identifier.uri.clone()).or_default().push(TextEdit {
            range: identifier.defining_range,
            new_text: new_name.to_string(),
        });

        for location in self.references_of(kind, &name, &target_uri) {
            edits.entry(location.uri.clone()).or_default().push(TextEdit {
                range: location.name_range,
                new_text: new_name.to_string(),
            });
        }

        Ok(WorkspaceEdit {
            changes: Some(edits.into_iter().collect()),
            document_changes: None,
            change_annotations: None,
        })
    }

    pub fn completions(&self, uri: &Url, pos: Position) -> Vec<CompletionResult> {
        self.file(uri).map(|f| f.completions(pos)).unwrap_or_default()
    }

    /// Invokes `callback(uri, diagnostics)` for every File, folding in the
    /// workspace-level ambiguous-identifier diagnostics onto the duplicate's
    /// own file.
    pub fn diagnostics(&self, mut callback: impl FnMut(&Url, Vec<Diagnostic>)) {
        let files = self.files.read().expect("workspace lock poisoned");
        let index = WorkspaceIndex::build(files.iter().map(|(u, f)| (u, &**f)));

        for (uri, file) in files.iter() {
            let mut diags = file.diagnostics();
            for (kind, name, dup_uri, range) in &index.duplicates {
                if dup_uri == uri {
                    diags.push(Diagnostic {
                        range: *range,
                        severity: Some(DiagnosticSeverity::WARNING),
                        source: Some("tekton-lsp".into()),
                        message: format!("duplicate {} '{}' defined in more than one file", kind.label(), name),
                        ..Default::default()
                    });
                }
            }
            callback(uri, diags);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn add_folder_ingests_yaml_and_yml_files_and_ignores_others() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("task.yaml"),
            "kind: Task\nmetadata:\n  name: hello\nspec: {}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("pipeline.yml"),
            "kind: Pipeline\nmetadata:\n  name: p\nspec: {}\n",
        )
        .unwrap();
        fs::write(dir.path().join("README.md"), "not yaml").unwrap();

        let workspace = Workspace::new();
        workspace.add_folder(dir.path());
        workspace.lint();

        let files = workspace.files.read().unwrap();
        assert_eq!(files.len(), 2, "only the two yaml/yml files should be ingested");
        assert!(files.keys().all(|u| {
            let path = u.as_str();
            path.ends_with(".yaml") || path.ends_with(".yml")
        }));
    }

    #[test]
    fn add_folder_respects_gitignore() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(".gitignore"), "ignored.yaml\n").unwrap();
        fs::write(dir.path().join("ignored.yaml"), "kind: Task\n").unwrap();
        fs::write(dir.path().join("kept.yaml"), "kind: Task\nmetadata:\n  name: kept\nspec: {}\n").unwrap();

        let workspace = Workspace::new();
        workspace.add_folder(dir.path());

        let files = workspace.files.read().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files.keys().any(|u| u.as_str().ends_with("kept.yaml")));
    }
}
