//! The checker plugin contract and the per-run input handed to checkers.
//!
//! A checker owns one or more check identifiers and reports findings against
//! them through a [`FindingsCollector`]. It signals its own malfunction with
//! [`CheckerError::Internal`], which the engine converts into findings; every
//! other failure travels as [`CheckerError::Failed`] and aborts the run.

use crate::collector::{FindingsCollector, UndeclaredCheck};
use pvpcheck_common::{FileSourceError, PackageFileSource, PackageIdentity};
use serde_json::{Map, Value};
use thiserror::Error;

/// Boxed error carried by [`CheckerError::Failed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A validation plugin implementing one or more PVP checks.
///
/// # Examples
///
/// ```
/// use pvpcheck::{Checker, CheckerError, FindingsCollector, Input};
///
/// struct RequiresReadme;
///
/// impl Checker for RequiresReadme {
///     fn name(&self) -> &str {
///         "requires_readme"
///     }
///
///     fn checks(&self) -> &[&str] {
///         &["PVP-100-1"]
///     }
///
///     fn run(&self, input: &Input, findings: &mut FindingsCollector<'_>) -> Result<(), CheckerError> {
///         if !input.files().contains("README.md") {
///             findings.error("PVP-100-1", "README.md is missing")?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Checker {
    /// Stable, human-readable name used in logs and error messages.
    fn name(&self) -> &str;

    /// The identifiers this checker owns, in declaration order.
    fn checks(&self) -> &[&str];

    /// Runs the checks against `input`, reporting through `findings`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckerError::Internal`] when the checker itself
    /// malfunctioned, or [`CheckerError::Failed`] for any other failure.
    fn run(&self, input: &Input, findings: &mut FindingsCollector<'_>) -> Result<(), CheckerError>;
}

/// Failure reported by a checker run.
#[derive(Debug, Error)]
pub enum CheckerError {
    /// The checker detected a defect in itself. Recovered by the engine.
    #[error("internal checker error: {message}")]
    Internal {
        /// Description of the malfunction.
        message: String,
    },

    /// Any other failure. Aborts the run.
    #[error("checker failed: {0}")]
    Failed(#[source] BoxError),
}

impl CheckerError {
    /// Builds an [`CheckerError::Internal`] from a message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wraps any error as [`CheckerError::Failed`].
    #[must_use]
    pub fn failed(source: impl Into<BoxError>) -> Self {
        Self::Failed(source.into())
    }

    /// Returns `true` for the recoverable internal-error signal.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<FileSourceError> for CheckerError {
    fn from(source: FileSourceError) -> Self {
        Self::Failed(Box::new(source))
    }
}

impl From<UndeclaredCheck> for CheckerError {
    fn from(source: UndeclaredCheck) -> Self {
        Self::Failed(Box::new(source))
    }
}

impl From<std::io::Error> for CheckerError {
    fn from(source: std::io::Error) -> Self {
        Self::Failed(Box::new(source))
    }
}

/// Everything a checker may read during a run.
///
/// Built once per run in the initializing phase and shared read-only by every
/// checker.
#[derive(Debug)]
pub struct Input {
    package: PackageIdentity,
    files: PackageFileSource,
    manifest: Value,
    metadata: Map<String, Value>,
}

impl Input {
    /// Assembles the run input.
    #[must_use]
    pub const fn new(
        package: PackageIdentity,
        files: PackageFileSource,
        manifest: Value,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            package,
            files,
            manifest,
            metadata,
        }
    }

    /// The package under validation.
    #[must_use]
    pub const fn package(&self) -> &PackageIdentity {
        &self.package
    }

    /// The package's files.
    #[must_use]
    pub const fn files(&self) -> &PackageFileSource {
        &self.files
    }

    /// The raw manifest document, or `null` when the package has none.
    #[must_use]
    pub const fn manifest(&self) -> &Value {
        &self.manifest
    }

    /// Auxiliary metadata supplied by the resolver.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}
