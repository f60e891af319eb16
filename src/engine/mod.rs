//! The execution engine: one validation run from identity to report.
//!
//! A run moves through a fixed sequence of phases. Initializing resolves the
//! package and enumerates its files; declaring seeds an empty findings entry
//! for every registered check; executing invokes each checker in
//! registration order; completed hands the findings to the report builder.
//! Any unrecovered failure moves the run to aborted and surfaces as an
//! [`EngineError`] instead of a report.

use crate::checker::{BoxError, CheckerError, Input};
use crate::collector::{FindingsCollector, FindingsMap, UndeclaredCheck};
use crate::registry::{CheckRegistry, RegisteredChecker};
use crate::report::{Context, EditorTarget, PackageTarget, Report, ReportBuilder, Target};
use crate::resolver::{PackageResolver, ResolveError};
use log::{debug, info, warn};
use pvpcheck_common::{FileSourceError, PackageFileSource, PackageIdentity};
use std::fmt;
use thiserror::Error;

/// Lifecycle phase of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Resolving the package and building the checker input.
    Initializing,
    /// Seeding the findings map with every declared check.
    Declaring,
    /// Running checkers.
    Executing,
    /// The report has been assembled.
    Completed,
    /// The run stopped on an unrecovered failure.
    Aborted,
}

impl RunPhase {
    /// Lowercase label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Declaring => "declaring",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures that abort a validation run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The package could not be resolved.
    #[error("cannot resolve package {package}")]
    Resolve {
        /// The requested package.
        package: PackageIdentity,
        /// Resolver failure.
        #[source]
        source: ResolveError,
    },

    /// The package's files could not be enumerated.
    #[error("cannot enumerate files of package {package}")]
    FileSource {
        /// The requested package.
        package: PackageIdentity,
        /// Enumeration failure.
        #[source]
        source: FileSourceError,
    },

    /// A checker reported against an identifier nobody declared.
    #[error(transparent)]
    UndeclaredCheck(#[from] UndeclaredCheck),

    /// A checker failed with something other than an internal error.
    #[error("checker {checker} failed")]
    CheckerFailed {
        /// Name of the failing checker.
        checker: String,
        /// The checker's error.
        #[source]
        source: BoxError,
    },
}

impl EngineError {
    /// The phase the run was in when it aborted.
    #[must_use]
    pub const fn phase(&self) -> RunPhase {
        match self {
            Self::Resolve { .. } | Self::FileSource { .. } => RunPhase::Initializing,
            Self::UndeclaredCheck(_) | Self::CheckerFailed { .. } => RunPhase::Executing,
        }
    }

    /// Returns `true` when the failure points at an engine or checker defect
    /// rather than at the package or its environment.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        match self {
            Self::UndeclaredCheck(_) => true,
            Self::FileSource { source, .. } => source.is_invariant_violation(),
            Self::Resolve { .. } | Self::CheckerFailed { .. } => false,
        }
    }
}

/// Tracks and logs phase transitions for one run.
struct RunState<'a> {
    package: &'a PackageIdentity,
    phase: RunPhase,
}

impl<'a> RunState<'a> {
    fn start(package: &'a PackageIdentity) -> Self {
        debug!("run {package}: {}", RunPhase::Initializing);
        Self {
            package,
            phase: RunPhase::Initializing,
        }
    }

    fn advance(&mut self, next: RunPhase) {
        debug!("run {}: {} -> {next}", self.package, self.phase);
        self.phase = next;
    }
}

/// Runs registered checkers against packages and produces reports.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use pvpcheck::{CheckRegistry, EngineConfig, ExecutionEngine, LocalPackageResolver};
/// use pvpcheck_common::PackageIdentity;
///
/// let config = EngineConfig::load(Utf8Path::new("pvpcheck.toml"))?;
/// let registry = CheckRegistry::new(Vec::new())?;
/// let resolver = LocalPackageResolver::new("packages");
/// let engine = ExecutionEngine::from_config(registry, resolver, &config)?;
///
/// let report = engine.run(&PackageIdentity::parse("com.example.tools@1.0.0")?)?;
/// report.write_to(Utf8Path::new("report.json"))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ExecutionEngine<R> {
    registry: CheckRegistry,
    resolver: R,
    implementation: String,
    editor: EditorTarget,
    context: Option<Context>,
}

impl<R: PackageResolver> ExecutionEngine<R> {
    /// Creates an engine that records `implementation` and `editor` in its
    /// reports.
    #[must_use]
    pub fn new(
        registry: CheckRegistry,
        resolver: R,
        implementation: impl Into<String>,
        editor: EditorTarget,
    ) -> Self {
        Self {
            registry,
            resolver,
            implementation: implementation.into(),
            editor,
            context: None,
        }
    }

    /// Creates an engine from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::MissingEditorVersion`] when the
    /// configuration names no editor version.
    pub fn from_config(
        registry: CheckRegistry,
        resolver: R,
        config: &crate::EngineConfig,
    ) -> Result<Self, crate::ConfigError> {
        let editor = config.editor_target()?;
        Ok(Self::new(registry, resolver, config.implementation(), editor))
    }

    /// Uses a fixed CI context instead of reading the environment per run.
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// The engine's checker registry.
    #[must_use]
    pub const fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Validates `package` and returns its report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when resolution or enumeration fails, or when
    /// a checker fails with anything other than an internal error.
    pub fn run(&self, package: &PackageIdentity) -> Result<Report, EngineError> {
        self.run_with_progress(package, |_, _| {})
    }

    /// Validates `package`, reporting progress as `(completed, total)`
    /// checker counts.
    ///
    /// `progress` is called with `(0, total)` before the first checker runs
    /// and once after each checker finishes, including checkers that ended
    /// in an internal error.
    ///
    /// # Errors
    ///
    /// See [`Self::run`].
    pub fn run_with_progress<F>(
        &self,
        package: &PackageIdentity,
        mut progress: F,
    ) -> Result<Report, EngineError>
    where
        F: FnMut(usize, usize),
    {
        let mut state = RunState::start(package);
        match self.execute(&mut state, &mut progress) {
            Ok(report) => {
                state.advance(RunPhase::Completed);
                info!(
                    "validated {package}: {} finding(s) across {} check(s)",
                    report.error_count(),
                    report.results().len()
                );
                Ok(report)
            }
            Err(err) => {
                state.advance(RunPhase::Aborted);
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        state: &mut RunState<'_>,
        progress: &mut dyn FnMut(usize, usize),
    ) -> Result<Report, EngineError> {
        let package = state.package;
        let context = self.context.clone().unwrap_or_else(Context::from_env);
        let resolved = self.resolver.resolve(package).map_err(|source| EngineError::Resolve {
            package: package.clone(),
            source,
        })?;
        let root = &resolved.root;
        let files = PackageFileSource::open(root).map_err(|source| EngineError::FileSource {
            package: package.clone(),
            source,
        })?;
        let package_target = PackageTarget::new(package.clone(), resolved.sha1);
        let target = Target::new(package_target, self.editor.clone());
        let input = Input::new(package.clone(), files, resolved.manifest, resolved.metadata);

        state.advance(RunPhase::Declaring);
        let mut findings = FindingsMap::declare(self.registry.check_ids());

        state.advance(RunPhase::Executing);
        let total = self.registry.len();
        info!("validating {package} with {total} checker(s)");
        progress(0, total);
        for (index, entry) in self.registry.entries().enumerate() {
            run_checker(entry, &input, &mut findings)?;
            progress(index + 1, total);
        }

        Ok(ReportBuilder::new(self.implementation.clone(), target)
            .with_context(context)
            .build(findings))
    }
}

fn run_checker(
    entry: &RegisteredChecker,
    input: &Input,
    findings: &mut FindingsMap,
) -> Result<(), EngineError> {
    let checker = entry.checker();
    let name = checker.name();
    debug!("running checker {name}");

    let (outcome, violation) = {
        let mut collector = FindingsCollector::new(findings, name);
        let outcome = checker.run(input, &mut collector);
        (outcome, collector.into_violation())
    };
    if let Some(violation) = violation {
        return Err(EngineError::UndeclaredCheck(violation));
    }

    match outcome {
        Ok(()) => Ok(()),
        Err(CheckerError::Internal { message }) => {
            warn!("checker {name} reported an internal error: {message}");
            let finding = internal_error_finding(name, &message);
            for check in entry.checks() {
                findings.push(check.as_str(), finding.clone());
            }
            Ok(())
        }
        Err(CheckerError::Failed(source)) => Err(EngineError::CheckerFailed {
            checker: name.to_owned(),
            source,
        }),
    }
}

/// The finding recorded against each check of a checker that reported an
/// internal error.
#[must_use]
pub fn internal_error_finding(checker: &str, message: &str) -> String {
    format!("internal error in checker {checker}: {message}")
}
