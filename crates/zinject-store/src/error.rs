use std::io;
use std::path::PathBuf;

use zinject_verify::VerificationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid implementation digest '{0}': expected 'algorithm=value'")]
    InvalidDigest(String),

    #[error("unknown digest algorithm '{0}'")]
    UnknownAlgorithm(String),

    #[error("incorrect manifest -- archive is corrupted: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("unsupported file type in implementation: {0}")]
    UnsupportedFileType(PathBuf),

    #[error(transparent)]
    Unpack(#[from] zinject_archive::Error),

    #[error(transparent)]
    Fs(#[from] zinject_fs::Error),

    #[error("store I/O error at '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },
}

impl From<VerificationError> for Error {
    fn from(e: VerificationError) -> Self {
        match e {
            VerificationError::UnknownAlgorithm(name) => Self::UnknownAlgorithm(name),
            VerificationError::Mismatch { expected, actual } => {
                Self::DigestMismatch { expected, actual }
            }
            VerificationError::Io(source) => Self::Io {
                path: PathBuf::new(),
                source,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
