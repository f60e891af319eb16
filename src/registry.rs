//! Explicit checker registration and check-identifier ownership.
//!
//! The registry is built once from an ordered list of checkers. Building
//! validates every declared identifier and rejects duplicates, so the engine
//! can rely on each identifier having exactly one owner.

use crate::checker::Checker;
use log::debug;
use pvpcheck_common::{CheckId, CheckIdError};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while building a [`CheckRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A checker declared an identifier that does not match the PVP pattern.
    #[error("checker {checker} declares invalid check id")]
    InvalidCheckId {
        /// Name of the declaring checker.
        checker: String,
        /// Validation failure for the identifier.
        #[source]
        source: CheckIdError,
    },

    /// An identifier was declared more than once.
    #[error("check id {check} is declared by both {first} and {second}")]
    DuplicateCheckId {
        /// The duplicated identifier.
        check: String,
        /// Checker that declared it first.
        first: String,
        /// Checker that declared it again.
        second: String,
    },

    /// A checker declared no identifiers at all.
    #[error("checker {checker} declares no checks")]
    NoChecksDeclared {
        /// Name of the checker.
        checker: String,
    },
}

/// A registered checker together with its validated identifiers.
pub(crate) struct RegisteredChecker {
    checker: Box<dyn Checker>,
    checks: Vec<CheckId>,
}

impl RegisteredChecker {
    pub(crate) fn checker(&self) -> &dyn Checker {
        self.checker.as_ref()
    }

    pub(crate) fn checks(&self) -> &[CheckId] {
        &self.checks
    }
}

impl fmt::Debug for RegisteredChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredChecker")
            .field("name", &self.checker.name())
            .field("checks", &self.checks)
            .finish()
    }
}

/// One row of the registry listing: an identifier and its owning checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckDescriptor<'a> {
    /// The check identifier.
    pub check: &'a CheckId,
    /// Name of the checker that owns it.
    pub checker: &'a str,
}

/// The validated set of checkers for a run.
#[derive(Debug)]
pub struct CheckRegistry {
    checkers: Vec<RegisteredChecker>,
    owners: HashMap<CheckId, usize>,
    declared: Vec<CheckId>,
}

impl CheckRegistry {
    /// Builds a registry from checkers in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] when a checker declares no identifiers, an
    /// identifier is malformed, or an identifier is declared twice.
    pub fn new(checkers: Vec<Box<dyn Checker>>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            checkers: Vec::with_capacity(checkers.len()),
            owners: HashMap::new(),
            declared: Vec::new(),
        };
        for checker in checkers {
            registry.register(checker)?;
        }
        debug!(
            "registered {} checker(s) owning {} check(s)",
            registry.checkers.len(),
            registry.declared.len()
        );
        Ok(registry)
    }

    fn register(&mut self, checker: Box<dyn Checker>) -> Result<(), RegistryError> {
        let name = checker.name().to_owned();
        let raw = checker.checks();
        if raw.is_empty() {
            return Err(RegistryError::NoChecksDeclared { checker: name });
        }

        let position = self.checkers.len();
        let mut checks = Vec::with_capacity(raw.len());
        for value in raw {
            let check = CheckId::parse(value).map_err(|source| RegistryError::InvalidCheckId {
                checker: name.clone(),
                source,
            })?;
            if let Some(first) = self.owner_name(check.as_str()) {
                return Err(RegistryError::DuplicateCheckId {
                    check: check.to_string(),
                    first: first.to_owned(),
                    second: name,
                });
            }
            if checks.contains(&check) {
                return Err(RegistryError::DuplicateCheckId {
                    check: check.to_string(),
                    first: name.clone(),
                    second: name,
                });
            }
            checks.push(check);
        }

        for check in &checks {
            self.owners.insert(check.clone(), position);
            self.declared.push(check.clone());
        }
        self.checkers.push(RegisteredChecker { checker, checks });
        Ok(())
    }

    fn owner_name(&self, check: &str) -> Option<&str> {
        let position = *self.owners.get(check)?;
        self.checkers
            .get(position)
            .map(|entry| entry.checker.name())
    }

    /// Number of registered checkers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    /// Returns `true` when no checkers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// All declared identifiers, in registration then declaration order.
    #[must_use]
    pub fn check_ids(&self) -> &[CheckId] {
        &self.declared
    }

    /// Returns the name of the checker owning `check`.
    #[must_use]
    pub fn owner_of(&self, check: &str) -> Option<&str> {
        self.owner_name(check)
    }

    /// Names of the registered checkers, in execution order.
    pub fn checker_names(&self) -> impl Iterator<Item = &str> {
        self.checkers.iter().map(|entry| entry.checker.name())
    }

    /// Lists every identifier with its owning checker.
    pub fn descriptors(&self) -> impl Iterator<Item = CheckDescriptor<'_>> {
        self.checkers.iter().flat_map(|entry| {
            let checker = entry.checker.name();
            entry
                .checks
                .iter()
                .map(move |check| CheckDescriptor { check, checker })
        })
    }

    pub(crate) fn entries(&self) -> impl ExactSizeIterator<Item = &RegisteredChecker> {
        self.checkers.iter()
    }
}
