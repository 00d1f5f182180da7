//! Archive unpacking for implementation downloads.
//!
//! Archives are identified by MIME type (explicit, or guessed from the URL)
//! and unpacked *over* an existing directory, so that several archives can
//! be layered into one tree. Entry paths are sanitized against zip-slip and
//! symlink escapes; replacing a directory with a file or symlink (or the
//! reverse) is refused.

mod error;
mod extract;
mod format;
mod options;
mod sanitize;

pub use error::{Error, Result};
pub use extract::{EntrySource, PendingEntry, PendingEntryKind, unpack_archive_over};
pub use format::{ArchiveFormat, TarCompress, check_type_supported, format_for, type_from_url};
pub use options::{ArchiveReport, UnpackOptions};
