//! Domain layer: configuration tree and its text format
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod error;
pub mod parser;
pub mod path;
pub mod policy;
pub mod render;

pub use arena::{ConfigNode, ConfigTree, NodeKind, NodeValue};
pub use error::{DomainError, DomainResult, ParseError, ParseErrorKind};
pub use path::ConfigPath;
pub use policy::{sanitize, SanitizePolicy, SanitizeReport};
