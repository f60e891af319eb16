//! Shared value types for pvpcheck: package identities, check identifiers,
//! and the lazy package file source that checkers read from.

pub mod check_id;
pub mod error;
pub mod files;
pub mod identity;

pub use check_id::{CheckId, is_valid_check_id};
pub use error::{CheckIdError, IdentityError};
pub use files::{ContentStream, FileSourceError, PackageFile, PackageFileSource, PackageFiles};
pub use identity::PackageIdentity;
