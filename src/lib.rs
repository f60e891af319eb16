//! Execution engine for PVP package validation.
//!
//! The engine resolves a package by identity, runs every registered
//! [`Checker`] over its files in a fixed order, and assembles the findings
//! into a [`Report`] whose JSON form is stable byte for byte.
//!
//! Checkers that hit an internal problem return [`CheckerError::Internal`];
//! the engine records that against each of the checker's checks and carries
//! on. Any other checker failure aborts the run with an [`EngineError`].

pub mod checker;
pub mod collector;
pub mod config;
pub mod engine;
pub mod registry;
pub mod report;
pub mod resolver;

pub use checker::{BoxError, Checker, CheckerError, Input};
pub use collector::{FindingsCollector, FindingsMap, UndeclaredCheck};
pub use config::{ConfigError, DEFAULT_IMPLEMENTATION, EditorConfig, EngineConfig};
pub use engine::{EngineError, ExecutionEngine, RunPhase, internal_error_finding};
pub use registry::{CheckDescriptor, CheckRegistry, RegistryError};
pub use report::{
    CONTEXT_KEYS, Context, EditorTarget, HostOs, PackageTarget, Report, ReportBuilder, ReportError,
    Results, Target,
};
pub use resolver::{
    LocalPackageResolver, MANIFEST_FILE, PackageResolver, ResolveError, ResolvedPackage,
};

pub use pvpcheck_common::{CheckId, PackageIdentity};
