//! Validation report assembly and serialisation.
//!
//! A report carries four top-level sections: the CI `context`, the
//! `implementation` label, the per-check `results`, and the `target`
//! describing the package and editor. The JSON form is pretty-printed with
//! keys in a fixed order so identical runs produce identical bytes.

mod context;
mod target;

pub use context::{CONTEXT_KEYS, Context};
pub use target::{EditorTarget, HostOs, PackageTarget, Target};

use crate::collector::FindingsMap;
use camino::Utf8Path;
use log::debug;
use pvpcheck_common::CheckId;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::io::{self, Write};
use thiserror::Error;

/// Errors raised while serialising or writing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The report could not be rendered as JSON.
    #[error("failed to serialise report")]
    Serialise(#[source] serde_json::Error),

    /// The report file could not be written.
    #[error("failed to write report to {path}")]
    Write {
        /// Destination path.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Per-check outcome as it appears in the `results` section.
#[derive(Serialize)]
struct CheckOutcome<'a> {
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    errors: &'a [String],
}

/// Ordered per-check findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Results {
    entries: Vec<(CheckId, Vec<String>)>,
}

impl Results {
    /// Returns the findings for `check`, if it was declared.
    #[must_use]
    pub fn get(&self, check: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.as_str() == check)
            .map(|(_, errors)| errors.as_slice())
    }

    /// Iterates over checks and their findings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&CheckId, &[String])> {
        self.entries
            .iter()
            .map(|(check, errors)| (check, errors.as_slice()))
    }

    /// Number of checks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no checks were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<FindingsMap> for Results {
    fn from(findings: FindingsMap) -> Self {
        Self {
            entries: findings.into_entries(),
        }
    }
}

impl Serialize for Results {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (check, errors) in &self.entries {
            map.serialize_entry(check, &CheckOutcome { errors })?;
        }
        map.end()
    }
}

/// The outcome of one validation run.
///
/// # Examples
///
/// ```
/// use pvpcheck::{Context, EditorTarget, HostOs, PackageTarget, ReportBuilder, Target};
/// use pvpcheck_common::PackageIdentity;
///
/// let package = PackageIdentity::parse("com.example.tools@1.0.0")?;
/// let target = Target::new(
///     PackageTarget::new(package, None),
///     EditorTarget::new("2022.3").with_os(HostOs::Linux),
/// );
/// let report = ReportBuilder::new("pvpcheck@0.3.0", target)
///     .with_context(Context::empty())
///     .build(Default::default());
///
/// assert!(!report.has_errors());
/// assert!(report.to_json_string()?.ends_with("}\n"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    context: Context,
    implementation: String,
    results: Results,
    target: Target,
}

impl Report {
    /// The captured CI context.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// The engine label recorded in the report.
    #[must_use]
    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    /// Per-check findings.
    #[must_use]
    pub const fn results(&self) -> &Results {
        &self.results
    }

    /// The validated package and editor.
    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the findings for `check`.
    #[must_use]
    pub fn errors_for(&self, check: &str) -> Option<&[String]> {
        self.results.get(check)
    }

    /// Returns `true` when any check has findings.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.results.iter().any(|(_, errors)| !errors.is_empty())
    }

    /// Total number of findings across all checks.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.results.iter().map(|(_, errors)| errors.len()).sum()
    }

    /// Renders the report as pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Serialise`] when JSON rendering fails.
    pub fn to_json_string(&self) -> Result<String, ReportError> {
        let mut json = serde_json::to_string_pretty(self).map_err(ReportError::Serialise)?;
        json.push('\n');
        Ok(json)
    }

    /// Writes the report to `path`, replacing any existing file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] when rendering, writing or renaming fails.
    pub fn write_to(&self, path: &Utf8Path) -> Result<(), ReportError> {
        let json = self.to_json_string()?;
        let write_error = |source: io::Error| ReportError::Write {
            path: path.to_string(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };
        let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        staged.write_all(json.as_bytes()).map_err(write_error)?;
        staged.flush().map_err(write_error)?;
        staged.persist(path).map_err(|err| write_error(err.error))?;

        debug!("wrote report for {} to {path}", self.target.package().id());
        Ok(())
    }
}

/// Assembles a [`Report`] from a completed run.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    implementation: String,
    target: Target,
    context: Context,
}

impl ReportBuilder {
    /// Starts a report for `target` produced by `implementation`.
    #[must_use]
    pub fn new(implementation: impl Into<String>, target: Target) -> Self {
        Self {
            implementation: implementation.into(),
            target,
            context: Context::empty(),
        }
    }

    /// Sets the CI context.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Finishes the report with the run's findings.
    #[must_use]
    pub fn build(self, findings: FindingsMap) -> Report {
        Report {
            context: self.context,
            implementation: self.implementation,
            results: Results::from(findings),
            target: self.target,
        }
    }
}
