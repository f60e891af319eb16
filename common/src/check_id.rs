//! Check identifier newtype.
//!
//! Identifiers follow `PVP-<family>-<number>`: the family has two to four
//! digits, the number one to four, and neither starts with zero.

use crate::error::CheckIdError;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::LazyLock;

static CHECK_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PVP-[1-9][0-9]{1,3}-[1-9][0-9]{0,3}$")
        .unwrap_or_else(|error| panic!("check identifier pattern should compile: {error}"))
});

/// A validated PVP check identifier such as `PVP-100-1`.
///
/// # Examples
///
/// ```
/// use pvpcheck_common::CheckId;
///
/// let id = CheckId::parse("PVP-100-1")?;
/// assert_eq!(id.as_str(), "PVP-100-1");
/// assert!(CheckId::parse("PVP-010-1").is_err());
/// # Ok::<(), pvpcheck_common::CheckIdError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckId(String);

impl CheckId {
    /// Validates and wraps an identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CheckIdError`] when the value does not match the syntax.
    pub fn parse(value: &str) -> Result<Self, CheckIdError> {
        if is_valid_check_id(value) {
            Ok(Self(value.to_owned()))
        } else {
            Err(CheckIdError {
                value: value.to_owned(),
            })
        }
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Returns `true` when `value` is a syntactically valid check identifier.
#[must_use]
pub fn is_valid_check_id(value: &str) -> bool {
    CHECK_ID_PATTERN.is_match(value)
}

impl TryFrom<&str> for CheckId {
    type Error = CheckIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for CheckId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CheckId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CheckId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}
