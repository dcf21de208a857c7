//! Document service
//!
//! Reads a boot configuration, runs the cleanup policy and writes it back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, DomainResultExt, IoResultExt};
use crate::domain::{sanitize, ConfigTree, SanitizePolicy, SanitizeReport};
use crate::infrastructure::traits::FileSystem;

/// How `sanitize_file` persists its result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizeOptions {
    /// Render only, leave the file untouched
    pub dry_run: bool,
    /// Copy the original here before overwriting it
    pub backup: Option<PathBuf>,
}

/// Result of sanitizing one document.
#[derive(Debug, Clone)]
pub struct SanitizeOutcome {
    pub report: SanitizeReport,
    /// Serialized document after the policy ran
    pub rendered: String,
    /// Whether the document file was overwritten
    pub written: bool,
    /// Backup copy that was created, if any
    pub backup: Option<PathBuf>,
}

/// `<file>.bak` next to the document.
pub fn default_backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Service for loading and rewriting configuration documents.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
}

impl DocumentService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read and parse the whole document.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<ConfigTree> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read document", path)?;
        debug!("load: read {} bytes", content.len());
        ConfigTree::parse(&content).in_document(path)
    }

    /// Normalized rendering of the document.
    pub fn render(&self, path: &Path) -> ApplicationResult<String> {
        Ok(self.load(path)?.serialize())
    }

    /// Load, apply `policy`, and write the result back unless it is a dry run.
    ///
    /// Nothing is written when reading or parsing fails.
    #[instrument(level = "debug", skip(self, policy, options))]
    pub fn sanitize_file(
        &self,
        path: &Path,
        policy: &SanitizePolicy,
        options: &SanitizeOptions,
    ) -> ApplicationResult<SanitizeOutcome> {
        let mut tree = self.load(path)?;
        let report =
            sanitize(&mut tree, policy).map_err(|source| ApplicationError::PolicyFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let rendered = tree.serialize();

        if options.dry_run {
            debug!("sanitize_file: dry run, not writing {}", path.display());
            return Ok(SanitizeOutcome {
                report,
                rendered,
                written: false,
                backup: None,
            });
        }

        if let Some(backup) = &options.backup {
            self.fs
                .copy(path, backup)
                .with_path_context("back up document", backup)?;
            info!("backed up {} to {}", path.display(), backup.display());
        }

        self.fs
            .write(path, &rendered)
            .with_path_context("write document", path)?;
        info!(
            "sanitized {}: removed {} interface(s), hw-id stripped: {}",
            path.display(),
            report.removed.len(),
            report.stripped_hw_id.is_some()
        );

        Ok(SanitizeOutcome {
            report,
            rendered,
            written: true,
            backup: options.backup.clone(),
        })
    }
}
