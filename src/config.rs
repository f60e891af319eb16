//! Engine configuration loaded from TOML.
//!
//! `EngineConfig` holds the settings that shape a report but are not part of
//! any package: the implementation label and the editor version being
//! targeted. Values are deserialised from a TOML document and fall back to
//! defaults when omitted.
//!
//! ```toml
//! implementation = "pvpcheck@0.3.0"
//!
//! [editor]
//! version = "2022.3"
//! revision = "f00dcafe"
//! ```

use crate::report::EditorTarget;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::io;
use thiserror::Error;

/// Label recorded when no implementation override is configured.
pub const DEFAULT_IMPLEMENTATION: &str =
    concat!(env!("CARGO_PKG_NAME"), "@", env!("CARGO_PKG_VERSION"));

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}")]
    Read {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configuration is not valid TOML or contains unknown keys.
    #[error("invalid configuration")]
    Parse {
        /// Path of the configuration file, when loaded from disk.
        path: Option<Utf8PathBuf>,
        /// Parse failure.
        #[source]
        source: toml::de::Error,
    },

    /// No editor version was configured.
    #[error("editor.version must be set to build a report target")]
    MissingEditorVersion,
}

/// Settings for an execution engine.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Overrides the implementation label recorded in reports.
    ///
    /// Whitespace-only values are treated as absent, so templated files with
    /// `implementation = ""` fall back to [`DEFAULT_IMPLEMENTATION`].
    pub implementation: Option<String>,
    /// The editor the package is validated against.
    pub editor: EditorConfig,
}

/// The `[editor]` table.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Editor version, for example `2022.3`. Required to build a target.
    pub version: Option<String>,
    /// Editor revision hash.
    pub revision: Option<String>,
}

impl EngineConfig {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |path| std::fs::read_to_string(path))
    }

    /// Loads configuration from `path` using the supplied reader.
    ///
    /// This exists so tests can substitute the file system.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::Utf8Path;
    /// use pvpcheck::EngineConfig;
    ///
    /// let config = EngineConfig::load_with(Utf8Path::new("pvpcheck.toml"), |_| {
    ///     Ok("[editor]\nversion = \"2022.3\"\n".to_owned())
    /// })?;
    /// assert_eq!(config.editor.version.as_deref(), Some("2022.3"));
    /// # Ok::<(), pvpcheck::ConfigError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `reader` fails or the text cannot be
    /// parsed.
    pub fn load_with<F>(path: &Utf8Path, reader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> io::Result<String>,
    {
        let text = reader(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: Some(path.to_owned()),
            source,
        })
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: None, source })
    }

    /// The implementation label, falling back to [`DEFAULT_IMPLEMENTATION`].
    #[must_use]
    pub fn implementation(&self) -> &str {
        non_blank(self.implementation.as_deref()).unwrap_or(DEFAULT_IMPLEMENTATION)
    }

    /// Builds the editor target for the current host.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEditorVersion`] when no version is set.
    pub fn editor_target(&self) -> Result<EditorTarget, ConfigError> {
        let version = non_blank(self.editor.version.as_deref())
            .ok_or(ConfigError::MissingEditorVersion)?;
        let target = EditorTarget::new(version);
        Ok(match non_blank(self.editor.revision.as_deref()) {
            Some(revision) => target.with_revision(revision),
            None => target,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
