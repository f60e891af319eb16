//! Package identity newtype.
//!
//! A package is addressed by `name@version`. Both parts are opaque strings:
//! the version is not interpreted as semver at this layer.

use crate::error::IdentityError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '@';

/// A validated `name@version` package identifier.
///
/// Equality and hashing follow the composed identifier, so two identities
/// built from the same parts are interchangeable as map keys.
///
/// # Examples
///
/// ```
/// use pvpcheck_common::PackageIdentity;
///
/// let identity = PackageIdentity::parse("com.example.tools@1.2.0")?;
/// assert_eq!(identity.name(), "com.example.tools");
/// assert_eq!(identity.version(), "1.2.0");
/// assert_eq!(identity.to_string(), "com.example.tools@1.2.0");
/// # Ok::<(), pvpcheck_common::IdentityError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageIdentity {
    id: String,
    name_len: usize,
}

impl PackageIdentity {
    /// Builds an identity from explicit name and version parts.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::EmptyPart`] when either part is empty or only
    /// whitespace, and [`IdentityError::SeparatorInPart`] when either part
    /// contains `@`, since the composed form would no longer parse back.
    pub fn new(name: &str, version: &str) -> Result<Self, IdentityError> {
        validate_part("name", name)?;
        validate_part("version", version)?;
        Ok(Self {
            id: format!("{name}{SEPARATOR}{version}"),
            name_len: name.len(),
        })
    }

    /// Parses the combined `name@version` form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::Malformed`] unless the value splits on a
    /// single `@` into two non-empty parts.
    pub fn parse(value: &str) -> Result<Self, IdentityError> {
        let malformed = |reason| IdentityError::Malformed {
            value: value.to_owned(),
            reason,
        };

        let mut parts = value.split(SEPARATOR);
        let (Some(name), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(malformed("expected exactly one '@' separating name and version"));
        };

        if name.trim().is_empty() {
            return Err(malformed("name must not be empty"));
        }
        if version.trim().is_empty() {
            return Err(malformed("version must not be empty"));
        }

        Ok(Self {
            id: value.to_owned(),
            name_len: name.len(),
        })
    }

    /// Returns the package name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.get(..self.name_len).unwrap_or_default()
    }

    /// Returns the package version.
    #[must_use]
    pub fn version(&self) -> &str {
        self.id.get(self.name_len + 1..).unwrap_or_default()
    }

    /// Returns the composed `name@version` identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }
}

fn validate_part(part: &'static str, value: &str) -> Result<(), IdentityError> {
    if value.trim().is_empty() {
        return Err(IdentityError::EmptyPart { part });
    }
    if value.contains(SEPARATOR) {
        return Err(IdentityError::SeparatorInPart {
            part,
            value: value.to_owned(),
        });
    }
    Ok(())
}

impl FromStr for PackageIdentity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for PackageIdentity {
    type Error = IdentityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for PackageIdentity {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl Serialize for PackageIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.id)
    }
}

impl<'de> Deserialize<'de> for PackageIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
