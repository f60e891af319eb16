//! Locating a package on disk from its identity.
//!
//! Resolution is an external concern: callers plug in a [`PackageResolver`]
//! that knows where packages live. [`LocalPackageResolver`] covers the common
//! case of an unpacked package directory next to an optional checksum file.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use pvpcheck_common::PackageIdentity;
use serde_json::{Map, Value};
use std::io;
use thiserror::Error;

/// File name of the package manifest inside the package root.
pub const MANIFEST_FILE: &str = "package.json";

/// Boxed error for resolver implementations outside this crate.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while resolving a package.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No package directory exists for the identity.
    #[error("package {package} not found at {path}")]
    NotFound {
        /// The requested package.
        package: PackageIdentity,
        /// Where the package was expected.
        path: Utf8PathBuf,
    },

    /// A package file exists but could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The manifest is not valid JSON.
    #[error("manifest {path} is not valid JSON")]
    InvalidManifest {
        /// Path of the manifest.
        path: Utf8PathBuf,
        /// Parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// A custom resolver failed.
    #[error("package resolution failed: {0}")]
    Other(#[source] BoxError),
}

/// The on-disk location and metadata of a resolved package.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPackage {
    /// Root directory of the unpacked package.
    pub root: Utf8PathBuf,
    /// Raw manifest document, `null` when the package has none.
    pub manifest: Value,
    /// SHA-1 of the package tarball, when known.
    pub sha1: Option<String>,
    /// Auxiliary metadata exposed to checkers.
    pub metadata: Map<String, Value>,
}

impl ResolvedPackage {
    /// Creates a resolution with no manifest, checksum or metadata.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: Value::Null,
            sha1: None,
            metadata: Map::new(),
        }
    }

    /// Sets the manifest document.
    #[must_use]
    pub fn with_manifest(mut self, manifest: Value) -> Self {
        self.manifest = manifest;
        self
    }

    /// Sets the tarball checksum.
    #[must_use]
    pub fn with_sha1(mut self, sha1: impl Into<String>) -> Self {
        self.sha1 = Some(sha1.into());
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Maps a package identity to its files and metadata.
pub trait PackageResolver {
    /// Resolves `package`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] when the package cannot be located or its
    /// metadata cannot be read.
    fn resolve(&self, package: &PackageIdentity) -> Result<ResolvedPackage, ResolveError>;
}

impl<R: PackageResolver + ?Sized> PackageResolver for &R {
    fn resolve(&self, package: &PackageIdentity) -> Result<ResolvedPackage, ResolveError> {
        (**self).resolve(package)
    }
}

/// Resolves packages unpacked under a single directory.
///
/// A package `name@version` lives in `<dir>/name@version/`. Its manifest is
/// read from `package.json` in that directory when present, and its checksum
/// from a sibling `<dir>/name@version.sha1` file when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPackageResolver {
    packages_dir: Utf8PathBuf,
}

impl LocalPackageResolver {
    /// Creates a resolver rooted at `packages_dir`.
    #[must_use]
    pub fn new(packages_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            packages_dir: packages_dir.into(),
        }
    }

    /// The directory packages are resolved under.
    #[must_use]
    pub fn packages_dir(&self) -> &Utf8Path {
        &self.packages_dir
    }
}

impl PackageResolver for LocalPackageResolver {
    fn resolve(&self, package: &PackageIdentity) -> Result<ResolvedPackage, ResolveError> {
        let root = self.packages_dir.join(package.as_str());
        if !root.is_dir() {
            return Err(ResolveError::NotFound {
                package: package.clone(),
                path: root,
            });
        }

        let manifest = read_manifest(&root.join(MANIFEST_FILE))?;
        let sha1 = read_sha1(&self.packages_dir.join(format!("{package}.sha1")))?;
        debug!(
            "resolved {package} at {root} (manifest: {}, sha1: {})",
            !manifest.is_null(),
            sha1.is_some()
        );

        Ok(ResolvedPackage {
            root,
            manifest,
            sha1,
            metadata: Map::new(),
        })
    }
}

fn read_optional(path: &Utf8Path) -> Result<Option<String>, ResolveError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ResolveError::Read {
            path: path.to_owned(),
            source,
        }),
    }
}

fn read_manifest(path: &Utf8Path) -> Result<Value, ResolveError> {
    let Some(text) = read_optional(path)? else {
        return Ok(Value::Null);
    };
    serde_json::from_str(&text).map_err(|source| ResolveError::InvalidManifest {
        path: path.to_owned(),
        source,
    })
}

fn read_sha1(path: &Utf8Path) -> Result<Option<String>, ResolveError> {
    Ok(read_optional(path)?
        .map(|text| text.trim().to_owned())
        .filter(|digest| !digest.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    struct PackagesDir {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    #[fixture]
    fn packages() -> PackagesDir {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("utf-8 temp path");
        fs::create_dir_all(root.join("com.example.tools@1.0.0")).expect("create package dir");
        PackagesDir { _dir: dir, root }
    }

    fn identity() -> PackageIdentity {
        PackageIdentity::parse("com.example.tools@1.0.0").expect("valid identity")
    }

    #[rstest]
    fn resolves_bare_directory(packages: PackagesDir) {
        let resolved = LocalPackageResolver::new(packages.root.clone())
            .resolve(&identity())
            .expect("resolve package");

        assert_eq!(resolved.root, packages.root.join("com.example.tools@1.0.0"));
        assert_eq!(resolved.manifest, Value::Null);
        assert_eq!(resolved.sha1, None);
        assert!(resolved.metadata.is_empty());
    }

    #[rstest]
    fn reads_manifest_and_trimmed_checksum(packages: PackagesDir) {
        fs::write(
            packages.root.join("com.example.tools@1.0.0/package.json"),
            r#"{"name": "com.example.tools", "version": "1.0.0"}"#,
        )
        .expect("write manifest");
        fs::write(
            packages.root.join("com.example.tools@1.0.0.sha1"),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709\n",
        )
        .expect("write checksum");

        let resolved = LocalPackageResolver::new(packages.root.clone())
            .resolve(&identity())
            .expect("resolve package");

        assert_eq!(
            resolved.manifest,
            json!({"name": "com.example.tools", "version": "1.0.0"})
        );
        assert_eq!(
            resolved.sha1.as_deref(),
            Some("da39a3ee5e6b4b0d3255bfef95601890afd80709")
        );
    }

    #[rstest]
    fn blank_checksum_counts_as_absent(packages: PackagesDir) {
        fs::write(packages.root.join("com.example.tools@1.0.0.sha1"), "  \n")
            .expect("write checksum");

        let resolved = LocalPackageResolver::new(packages.root.clone())
            .resolve(&identity())
            .expect("resolve package");
        assert_eq!(resolved.sha1, None);
    }

    #[rstest]
    fn rejects_malformed_manifest(packages: PackagesDir) {
        let manifest = packages.root.join("com.example.tools@1.0.0/package.json");
        fs::write(manifest, "{ nope").expect("write manifest");

        let err = LocalPackageResolver::new(packages.root.clone())
            .resolve(&identity())
            .expect_err("malformed manifest");
        assert!(matches!(err, ResolveError::InvalidManifest { .. }));
    }

    #[rstest]
    fn reports_missing_package(packages: PackagesDir) {
        let other = PackageIdentity::parse("com.example.other@2.0.0").expect("valid identity");
        let err = LocalPackageResolver::new(packages.root.clone())
            .resolve(&other)
            .expect_err("missing package");

        match err {
            ResolveError::NotFound { package, path } => {
                assert_eq!(package, other);
                assert_eq!(path, packages.root.join("com.example.other@2.0.0"));
            }
            unexpected => panic!("unexpected error: {unexpected:?}"),
        }
    }

    #[test]
    fn builder_methods_fill_in_the_resolution() {
        let resolved = ResolvedPackage::new("/packages/com.example.tools@1.0.0")
            .with_manifest(json!({"name": "com.example.tools"}))
            .with_sha1("abc")
            .with_metadata("assemblies", json!(["Example.Tools"]));

        assert_eq!(resolved.sha1.as_deref(), Some("abc"));
        assert_eq!(resolved.manifest["name"], json!("com.example.tools"));
        let assemblies = json!(["Example.Tools"]);
        assert_eq!(resolved.metadata.get("assemblies"), Some(&assemblies));
    }
}
