//! Findings map and the write-only collector checkers report through.

use pvpcheck_common::CheckId;
use std::collections::HashMap;
use thiserror::Error;

/// A checker reported against an identifier no checker declared.
///
/// This is an invariant violation: the checker's declaration and its
/// reporting disagree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invariant violated: checker {checker} reported against undeclared check {check}")]
pub struct UndeclaredCheck {
    /// Name of the reporting checker.
    pub checker: String,
    /// The undeclared identifier.
    pub check: String,
}

/// Ordered mapping from check identifier to its findings.
///
/// Every declared identifier has an entry from the start of the run, and
/// entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindingsMap {
    entries: Vec<(CheckId, Vec<String>)>,
    index: HashMap<CheckId, usize>,
}

impl FindingsMap {
    /// Creates a map with an empty entry per identifier, in the given order.
    ///
    /// Repeated identifiers keep their first position.
    #[must_use]
    pub fn declare<'a>(checks: impl IntoIterator<Item = &'a CheckId>) -> Self {
        let mut map = Self::default();
        for check in checks {
            if map.index.contains_key(check) {
                continue;
            }
            map.index.insert(check.clone(), map.entries.len());
            map.entries.push((check.clone(), Vec::new()));
        }
        map
    }

    /// Returns `true` when `check` was declared.
    #[must_use]
    pub fn is_declared(&self, check: &str) -> bool {
        self.index.contains_key(check)
    }

    /// Returns the findings recorded for `check`.
    #[must_use]
    pub fn get(&self, check: &str) -> Option<&[String]> {
        let position = *self.index.get(check)?;
        self.entries
            .get(position)
            .map(|(_, messages)| messages.as_slice())
    }

    /// Iterates over identifiers and findings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&CheckId, &[String])> {
        self.entries
            .iter()
            .map(|(check, messages)| (check, messages.as_slice()))
    }

    /// Number of declared identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no identifiers were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of findings across all identifiers.
    #[must_use]
    pub fn finding_count(&self) -> usize {
        self.entries
            .iter()
            .map(|(_, messages)| messages.len())
            .sum()
    }

    /// Appends a finding; returns `false` when `check` is undeclared.
    pub(crate) fn push(&mut self, check: &str, message: String) -> bool {
        let Some(&position) = self.index.get(check) else {
            return false;
        };
        match self.entries.get_mut(position) {
            Some((_, messages)) => {
                messages.push(message);
                true
            }
            None => false,
        }
    }

    pub(crate) fn into_entries(self) -> Vec<(CheckId, Vec<String>)> {
        self.entries
    }
}

/// Write-only sink bound to one checker's run.
///
/// Reports against undeclared identifiers fail and are also latched, so the
/// engine aborts the run even when the checker discards the returned error.
#[derive(Debug)]
pub struct FindingsCollector<'run> {
    findings: &'run mut FindingsMap,
    checker: &'run str,
    violation: Option<UndeclaredCheck>,
}

impl<'run> FindingsCollector<'run> {
    /// Binds a collector for `checker` to the run's findings map.
    #[must_use]
    pub fn new(findings: &'run mut FindingsMap, checker: &'run str) -> Self {
        Self {
            findings,
            checker,
            violation: None,
        }
    }

    /// Records `message` against `check`, preserving call order.
    ///
    /// # Errors
    ///
    /// Returns [`UndeclaredCheck`] when no checker declared `check`.
    pub fn error(
        &mut self,
        check: &str,
        message: impl Into<String>,
    ) -> Result<(), UndeclaredCheck> {
        if self.findings.push(check, message.into()) {
            return Ok(());
        }

        let violation = UndeclaredCheck {
            checker: self.checker.to_owned(),
            check: check.to_owned(),
        };
        if self.violation.is_none() {
            self.violation = Some(violation.clone());
        }
        Err(violation)
    }

    /// Returns the first undeclared report made through this collector.
    #[must_use]
    pub fn into_violation(self) -> Option<UndeclaredCheck> {
        self.violation
    }
}
