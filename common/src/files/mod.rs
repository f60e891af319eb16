//! Lazy, single-pass view of a package's on-disk file tree.
//!
//! [`PackageFileSource`] resolves the package root and records every regular
//! file beneath it once, as a `/`-separated path relative to the root. Each
//! iteration step yields a [`PackageFile`] whose content stream is opened on
//! first read and released as soon as the step ends: when the iterator
//! advances, when it is dropped after an early `break`, or while unwinding.
//! Reading a released stream fails with [`FileSourceError::StreamDisposed`].
//!
//! ```no_run
//! use pvpcheck_common::files::PackageFileSource;
//!
//! let source = PackageFileSource::open("packages/com.example.tools@1.2.0")?;
//! for file in &source {
//!     if file.path().ends_with(".json") {
//!         let text = file.read_to_string()?;
//!         assert!(!text.is_empty());
//!     }
//! }
//! # Ok::<(), pvpcheck_common::files::FileSourceError>(())
//! ```

mod error;
mod stream;

pub use error::{FileSourceError, Result};
pub use stream::ContentStream;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::io::Read;
use std::rc::Rc;
use stream::StreamSlot;
use walkdir::WalkDir;

/// A file recorded when the source was opened.
#[derive(Debug, Clone)]
struct FileEntry {
    relative: String,
    absolute: Utf8PathBuf,
    size: u64,
}

/// Enumerates the regular files of a package directory.
#[derive(Debug)]
pub struct PackageFileSource {
    root: Utf8PathBuf,
    entries: Vec<FileEntry>,
}

impl PackageFileSource {
    /// Resolves `root` and records every regular file beneath it.
    ///
    /// Symbolic links are not followed. Entries are ordered by their
    /// normalized relative path.
    ///
    /// # Errors
    ///
    /// Returns an error when the root cannot be resolved or is not a
    /// directory, when traversal or metadata reads fail, when a path is not
    /// UTF-8, or ([`FileSourceError::OutsideRoot`]) when the traversal yields
    /// a path outside the resolved root.
    pub fn open(root: impl AsRef<Utf8Path>) -> Result<Self> {
        let requested = root.as_ref();
        let resolved = resolve_root(requested)?;

        let mut entries = Vec::new();
        for item in WalkDir::new(&resolved).follow_links(false) {
            let entry = item.map_err(|source| FileSourceError::Walk {
                root: resolved.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let absolute = Utf8PathBuf::try_from(entry.path().to_path_buf()).map_err(|err| {
                FileSourceError::NonUtf8Path {
                    path: err.as_path().display().to_string(),
                }
            })?;
            let relative = normalise_relative(&resolved, &absolute)?;
            let size = entry
                .metadata()
                .map_err(|source| FileSourceError::Walk {
                    root: resolved.clone(),
                    source,
                })?
                .len();

            entries.push(FileEntry {
                relative,
                absolute,
                size,
            });
        }
        entries.sort_by(|left, right| left.relative.cmp(&right.relative));

        debug!("enumerated {} file(s) under {resolved}", entries.len());
        Ok(Self {
            root: resolved,
            entries,
        })
    }

    /// Returns the resolved package root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns the number of files in the package.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the package contains no regular files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the relative paths without opening any content.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.relative.as_str())
    }

    /// Returns `true` when `path` names a file in the package.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries
            .binary_search_by(|entry| entry.relative.as_str().cmp(path))
            .is_ok()
    }

    /// Starts a new enumeration pass.
    #[must_use = "iterators are lazy and do nothing unless consumed"]
    pub fn iter(&self) -> PackageFiles<'_> {
        PackageFiles {
            entries: self.entries.iter(),
            current: None,
        }
    }
}

impl<'a> IntoIterator for &'a PackageFileSource {
    type Item = PackageFile<'a>;
    type IntoIter = PackageFiles<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn resolve_root(requested: &Utf8Path) -> Result<Utf8PathBuf> {
    let canonical = requested
        .canonicalize_utf8()
        .map_err(|source| FileSourceError::RootUnavailable {
            path: requested.to_owned(),
            source,
        })?;
    if !canonical.is_dir() {
        return Err(FileSourceError::NotADirectory { path: canonical });
    }
    Ok(canonical)
}

/// Converts an absolute path under `root` into a `/`-separated relative path.
fn normalise_relative(root: &Utf8Path, absolute: &Utf8Path) -> Result<String> {
    let relative = absolute
        .strip_prefix(root)
        .map_err(|_| FileSourceError::OutsideRoot {
            path: absolute.to_owned(),
            root: root.to_owned(),
        })?;

    let segments: Vec<&str> = relative
        .components()
        .map(|component| component.as_str())
        .collect();
    Ok(segments.join("/"))
}

/// One enumeration pass over a [`PackageFileSource`].
///
/// The pass owns the content stream of the file it most recently yielded and
/// releases it when advancing or when dropped.
#[derive(Debug)]
pub struct PackageFiles<'a> {
    entries: std::slice::Iter<'a, FileEntry>,
    current: Option<Rc<StreamSlot>>,
}

impl PackageFiles<'_> {
    fn release_current(&mut self) {
        if let Some(slot) = self.current.take() {
            trace!("releasing content stream for {}", slot.path());
            slot.release();
        }
    }
}

impl<'a> Iterator for PackageFiles<'a> {
    type Item = PackageFile<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.release_current();
        let entry = self.entries.next()?;
        let slot = Rc::new(StreamSlot::new(
            entry.relative.clone(),
            entry.absolute.clone(),
        ));
        self.current = Some(Rc::clone(&slot));
        Some(PackageFile { entry, slot })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl ExactSizeIterator for PackageFiles<'_> {}

impl Drop for PackageFiles<'_> {
    fn drop(&mut self) {
        self.release_current();
    }
}

/// A file yielded by one enumeration step.
#[derive(Debug)]
pub struct PackageFile<'a> {
    entry: &'a FileEntry,
    slot: Rc<StreamSlot>,
}

impl PackageFile<'_> {
    /// Returns the `/`-separated path relative to the package root.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.entry.relative
    }

    /// Returns the file size in bytes as recorded when the source was opened.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.entry.size
    }

    /// Returns the file's content stream.
    ///
    /// Every call returns a handle onto the same logical stream, so reads
    /// through one handle advance all of them. The stream is sequential only.
    #[must_use]
    pub fn content(&self) -> ContentStream {
        ContentStream::new(Rc::clone(&self.slot))
    }

    /// Reads the remaining content into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`FileSourceError::StreamDisposed`] after the step has ended,
    /// or [`FileSourceError::Read`] when the file cannot be read.
    pub fn read_to_end(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.content()
            .read_to_end(&mut buffer)
            .map_err(|err| FileSourceError::from_io(self.path(), err))?;
        Ok(buffer)
    }

    /// Reads the remaining content as UTF-8 text.
    ///
    /// # Errors
    ///
    /// As [`Self::read_to_end`], plus [`FileSourceError::Read`] with
    /// [`std::io::ErrorKind::InvalidData`] when the content is not UTF-8.
    pub fn read_to_string(&self) -> Result<String> {
        let mut buffer = String::new();
        self.content()
            .read_to_string(&mut buffer)
            .map_err(|err| FileSourceError::from_io(self.path(), err))?;
        Ok(buffer)
    }
}
