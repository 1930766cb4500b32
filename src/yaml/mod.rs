//! The YAML facade: position-bearing AST, path selectors, and the
//! `yaml-rust2`-backed parser that builds one from source text.

pub mod node;
pub mod parser;
pub mod path;

pub use node::{range_contains, MappingEntry, Node, NodeValue};
pub use parser::{parse, ParsedDocument};
