//! The `target` section of a report: what was validated and for which editor.

use pvpcheck_common::PackageIdentity;
use serde::Serialize;
use std::fmt;

/// Host operating system family recorded in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostOs {
    /// Apple macOS.
    MacOs,
    /// Microsoft Windows.
    Windows,
    /// Linux and other Unix-like systems.
    Linux,
}

impl HostOs {
    /// The family this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(windows) {
            Self::Windows
        } else {
            Self::Linux
        }
    }

    /// The lowercase label used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editor environment a validation run targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditorTarget {
    os: HostOs,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
}

impl EditorTarget {
    /// Describes an editor by version on the current host.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            os: HostOs::current(),
            version: version.into(),
            revision: None,
        }
    }

    /// Sets the editor revision.
    #[must_use]
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Overrides the host operating system.
    #[must_use]
    pub const fn with_os(mut self, os: HostOs) -> Self {
        self.os = os;
        self
    }

    /// Host operating system.
    #[must_use]
    pub const fn os(&self) -> HostOs {
        self.os
    }

    /// Editor version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Editor revision, when known.
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }
}

/// The validated package and its tarball checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageTarget {
    id: PackageIdentity,
    sha1: Option<String>,
}

impl PackageTarget {
    /// Describes `id` with an optional checksum.
    #[must_use]
    pub const fn new(id: PackageIdentity, sha1: Option<String>) -> Self {
        Self { id, sha1 }
    }

    /// The validated package.
    #[must_use]
    pub const fn id(&self) -> &PackageIdentity {
        &self.id
    }

    /// SHA-1 of the package tarball, when known.
    #[must_use]
    pub fn sha1(&self) -> Option<&str> {
        self.sha1.as_deref()
    }
}

/// What a report describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    package: PackageTarget,
    #[serde(rename = "unity")]
    editor: EditorTarget,
}

impl Target {
    /// Pairs a package with its editor target.
    #[must_use]
    pub const fn new(package: PackageTarget, editor: EditorTarget) -> Self {
        Self { package, editor }
    }

    /// The validated package.
    #[must_use]
    pub const fn package(&self) -> &PackageTarget {
        &self.package
    }

    /// The editor environment.
    #[must_use]
    pub const fn editor(&self) -> &EditorTarget {
        &self.editor
    }
}
