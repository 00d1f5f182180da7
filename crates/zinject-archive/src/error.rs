use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot guess the archive type of '{url}'; give the type explicitly")]
    UnknownType { url: String },

    #[error("unsupported archive type '{mime_type}'")]
    UnsupportedType { mime_type: String },

    #[error("zip-slip attack detected: entry '{entry}' escapes the destination")]
    ZipSlip { entry: PathBuf },

    #[error("symlink target escapes base directory: '{link}' -> '{target}'")]
    SymlinkEscape { target: PathBuf, link: PathBuf },

    #[error("symlink target is absolute path: '{target}' in '{link}'")]
    AbsoluteSymlinkTarget { target: PathBuf, link: PathBuf },

    #[error("hard link '{link}' points at '{target}', which is not a file unpacked earlier")]
    HardLinkTargetMissing { target: PathBuf, link: PathBuf },

    #[error("invalid entry path: {0}")]
    InvalidPath(String),

    #[error("unsafe unpack at '{path}': {reason}")]
    UnsafeUnpack { path: PathBuf, reason: &'static str },

    #[error("directory '{extract}' not found in archive")]
    ExtractNotFound { extract: PathBuf },

    #[error("archive is corrupted: {0}")]
    Corrupted(String),

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error("failed to create symlink '{link}': {source}")]
    SymlinkCreationFailed {
        target: PathBuf,
        link: PathBuf,
        source: io::Error,
    },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
