//! `tekton-lsp` — a language server for Tekton `Task`/`Pipeline` YAML
//! manifests. This crate exposes the semantic index (`Workspace`, `File`,
//! `Document`) as a library so both the LSP server binary and the test
//! suite can drive it directly, without going through the wire protocol.

pub mod buffer;
pub mod completion;
pub mod document;
pub mod error;
pub mod file;
pub mod model;
pub mod resolvers;
pub mod rules;
pub mod server;
pub mod yaml;
pub mod workspace;

pub use error::Error;
pub use workspace::Workspace;
