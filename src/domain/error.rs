//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::ConfigPath;

/// Domain errors represent tree contract violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("node not found: {0}")]
    NotFound(ConfigPath),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// Malformed configuration text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse error at line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number where the problem was detected
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected closing brace")]
    UnbalancedBrace,

    #[error("unexpected end of input, {0} block(s) still open")]
    UnexpectedEof(usize),

    #[error("duplicate node: {0}")]
    DuplicateNode(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("unterminated quoted string")]
    UnterminatedString,

    #[error("unterminated comment")]
    UnterminatedComment,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
