//! Error conversion helpers that attach the document path
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::DomainError;

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read_to_string(&path)
    ///     .with_path_context("read document", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Extension trait naming the offending document on parse failures.
pub trait DomainResultExt<T> {
    fn in_document(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> DomainResultExt<T> for Result<T, DomainError> {
    fn in_document(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| match e {
            DomainError::Parse(source) => ApplicationError::InvalidDocument {
                path: path.to_path_buf(),
                source,
            },
            other => ApplicationError::Domain(other),
        })
    }
}
