//! Error types for the shared value types.
//!
//! Each variant carries the rejected input so callers can surface an
//! actionable message without re-deriving it.

use thiserror::Error;

/// A package identity string or its parts were malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The combined `name@version` form could not be split into two parts.
    #[error("invalid package identity \"{value}\": {reason}")]
    Malformed {
        /// The rejected identity string.
        value: String,
        /// Description of the violated constraint.
        reason: &'static str,
    },

    /// One of the explicit parts was empty or whitespace-only.
    #[error("invalid package identity: {part} must not be empty")]
    EmptyPart {
        /// Which part was empty (`name` or `version`).
        part: &'static str,
    },

    /// One of the explicit parts contained the `@` separator.
    #[error("invalid package identity: {part} \"{value}\" must not contain '@'")]
    SeparatorInPart {
        /// Which part contained the separator.
        part: &'static str,
        /// The rejected part.
        value: String,
    },
}

/// A check identifier did not match the `PVP-<family>-<number>` syntax.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid check identifier \"{value}\"; expected PVP-<family>-<number> (e.g. PVP-100-1)")]
pub struct CheckIdError {
    /// The rejected identifier.
    pub value: String,
}
