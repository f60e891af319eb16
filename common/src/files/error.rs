//! Errors raised while enumerating or reading package files.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors produced by [`super::PackageFileSource`] and its content streams.
#[derive(Debug, Error)]
pub enum FileSourceError {
    /// The package root could not be resolved.
    #[error("cannot resolve package root {path}")]
    RootUnavailable {
        /// Root as supplied by the caller.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The package root exists but is not a directory.
    #[error("package root {path} is not a directory")]
    NotADirectory {
        /// Resolved root path.
        path: Utf8PathBuf,
    },

    /// A path under the root is not valid UTF-8.
    #[error("path {path} is not valid UTF-8")]
    NonUtf8Path {
        /// Lossy rendering of the offending path.
        path: String,
    },

    /// Directory traversal failed.
    #[error("failed to walk package tree under {root}")]
    Walk {
        /// Root of the traversal.
        root: Utf8PathBuf,
        /// Underlying traversal error.
        #[source]
        source: walkdir::Error,
    },

    /// File metadata or content could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Package-relative path of the file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The traversal produced a path outside the resolved root.
    ///
    /// This is an invariant violation in the traversal itself rather than a
    /// property of the package.
    #[error("invariant violated: enumerated path {path} is outside package root {root}")]
    OutsideRoot {
        /// The enumerated absolute path.
        path: Utf8PathBuf,
        /// The resolved package root.
        root: Utf8PathBuf,
    },

    /// A content stream was used after its enumeration step ended.
    #[error("content stream for {path} used after its enumeration step ended (source disposed)")]
    StreamDisposed {
        /// Package-relative path of the file.
        path: String,
    },
}

impl FileSourceError {
    /// Returns `true` for errors that indicate an engine or environment defect
    /// rather than a package or checker defect.
    #[must_use]
    pub const fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::OutsideRoot { .. })
    }

    /// Recovers a [`FileSourceError`] that travelled through [`std::io::Read`]
    /// or wraps a plain I/O failure for `path`.
    pub(crate) fn from_io(path: &str, err: std::io::Error) -> Self {
        if err.get_ref().is_some_and(|inner| inner.is::<Self>()) {
            if let Some(inner) = err.into_inner() {
                return match inner.downcast::<Self>() {
                    Ok(source_error) => *source_error,
                    Err(other) => Self::Read {
                        path: path.to_owned(),
                        source: std::io::Error::other(other),
                    },
                };
            }
            return Self::StreamDisposed {
                path: path.to_owned(),
            };
        }
        Self::Read {
            path: path.to_owned(),
            source: err,
        }
    }
}

/// Result type alias using [`FileSourceError`].
pub type Result<T> = std::result::Result<T, FileSourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposed_error_round_trips_through_io() {
        let original = FileSourceError::StreamDisposed {
            path: "a.txt".to_owned(),
        };
        let io = std::io::Error::other(original);

        let recovered = FileSourceError::from_io("a.txt", io);
        assert!(matches!(
            recovered,
            FileSourceError::StreamDisposed { ref path } if path == "a.txt"
        ));
    }

    #[test]
    fn plain_io_errors_become_read_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");

        let recovered = FileSourceError::from_io("sub/b.txt", io);
        assert!(matches!(recovered, FileSourceError::Read { ref path, .. } if path == "sub/b.txt"));
        assert!(std::error::Error::source(&recovered).is_some());
    }

    #[test]
    fn only_outside_root_is_an_invariant_violation() {
        let outside = FileSourceError::OutsideRoot {
            path: Utf8PathBuf::from("/elsewhere/a.txt"),
            root: Utf8PathBuf::from("/pkg"),
        };
        let disposed = FileSourceError::StreamDisposed {
            path: "a.txt".to_owned(),
        };
        assert!(outside.is_invariant_violation());
        assert!(!disposed.is_invariant_violation());
    }
}
