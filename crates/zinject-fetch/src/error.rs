//! Error types for zinject-fetch.

use std::fmt;
use std::io;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Coarse classification of a [`FetchError`], used for fallback and
/// reporting decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedScheme,
    UnknownArchiveType,
    UnsupportedType,
    SizeMismatch,
    UnsafeUnpack,
    DigestMismatch,
    UnknownDigestAlgorithm,
    UnsupportedRetrievalMethod,
    NoDownloadLocations,
    NoTrustedKeys,
    ReplayAttack,
    UserCancelled,
    GenericTransferFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors from fetching feeds and implementations.
///
/// Cloneable so that one transfer outcome can be observed by every task
/// waiting on it.
#[derive(Clone, Debug, Error)]
pub enum FetchError {
    #[error("unsupported URL scheme in '{url}' (only http:, https: and ftp: are supported)")]
    UnsupportedScheme { url: String },

    #[error("no 'type' attribute on archive, and the type cannot be guessed from the name ({url})")]
    UnknownArchiveType { url: String },

    #[error("unsupported archive type '{mime_type}'")]
    UnsupportedType { mime_type: String },

    #[error("downloaded archive has incorrect size: '{url}' should be {expected} bytes but got {actual}")]
    SizeMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },

    #[error("unsafe unpack: {0}")]
    UnsafeUnpack(String),

    #[error("incorrect manifest -- archive is corrupted: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("unknown digest algorithm '{algorithm}'")]
    UnknownDigestAlgorithm { algorithm: String },

    #[error("unsupported retrieval method: {method}")]
    UnsupportedRetrievalMethod { method: String },

    #[error(
        "implementation {id} of interface {interface} cannot be downloaded (no download locations given in interface!)"
    )]
    NoDownloadLocations { id: String, interface: String },

    #[error("no trusted keys for '{url}'{}", fingerprint_list(.fingerprints))]
    NoTrustedKeys {
        url: String,
        fingerprints: Vec<String>,
    },

    #[error("replay attack on '{url}': new copy signed at {new}, but the cached copy was signed at {cached}")]
    ReplayAttack {
        url: String,
        new: DateTime<Utc>,
        cached: DateTime<Utc>,
    },

    #[error("download of '{url}' aborted")]
    Aborted { url: String },

    #[error("error downloading '{url}': {message}")]
    Transfer { url: String, message: String },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    #[error("invalid implementation digest '{0}'")]
    InvalidDigest(String),

    #[error("failed to unpack archive: {0}")]
    Unpack(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(Arc<io::Error>),

    #[error("failed to fetch {interface} version {version}: {source}")]
    Implementation {
        interface: String,
        version: String,
        #[source]
        source: Box<FetchError>,
    },
}

fn fingerprint_list(fingerprints: &[String]) -> String {
    if fingerprints.is_empty() {
        " (no valid signatures)".to_string()
    } else {
        format!(" (untrusted keys: {})", fingerprints.join(", "))
    }
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedScheme { .. } => ErrorKind::UnsupportedScheme,
            Self::UnknownArchiveType { .. } => ErrorKind::UnknownArchiveType,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::UnsafeUnpack(_) => ErrorKind::UnsafeUnpack,
            Self::DigestMismatch { .. } => ErrorKind::DigestMismatch,
            Self::UnknownDigestAlgorithm { .. } => ErrorKind::UnknownDigestAlgorithm,
            Self::UnsupportedRetrievalMethod { .. } => ErrorKind::UnsupportedRetrievalMethod,
            Self::NoDownloadLocations { .. } => ErrorKind::NoDownloadLocations,
            Self::NoTrustedKeys { .. } => ErrorKind::NoTrustedKeys,
            Self::ReplayAttack { .. } => ErrorKind::ReplayAttack,
            Self::Aborted { .. } => ErrorKind::UserCancelled,
            Self::Implementation { source, .. } => source.kind(),
            Self::Transfer { .. }
            | Self::InvalidUrl { .. }
            | Self::InvalidDigest(_)
            | Self::Unpack(_)
            | Self::Store(_)
            | Self::Config(_)
            | Self::Io(_) => ErrorKind::GenericTransferFailure,
        }
    }

    /// Whether a feed download failing with this error may fall back to the
    /// mirror. Trust failures, replay attacks and cancellations may not.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.kind(),
            ErrorKind::NoTrustedKeys | ErrorKind::ReplayAttack | ErrorKind::UserCancelled
        )
    }

    /// The underlying error, without implementation context.
    pub fn root(&self) -> &FetchError {
        match self {
            Self::Implementation { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn for_implementation(self, interface: &str, version: &str) -> Self {
        match self {
            e @ Self::Implementation { .. } => e,
            e => Self::Implementation {
                interface: interface.to_string(),
                version: version.to_string(),
                source: Box::new(e),
            },
        }
    }
}

impl From<io::Error> for FetchError {
    fn from(e: io::Error) -> Self {
        Self::Io(Arc::new(e))
    }
}

impl From<zinject_archive::Error> for FetchError {
    fn from(e: zinject_archive::Error) -> Self {
        use zinject_archive::Error as E;
        match e {
            E::UnknownType { url } => Self::UnknownArchiveType { url },
            E::UnsupportedType { mime_type } => Self::UnsupportedType { mime_type },
            E::UnsafeUnpack { .. }
            | E::ZipSlip { .. }
            | E::SymlinkEscape { .. }
            | E::AbsoluteSymlinkTarget { .. } => Self::UnsafeUnpack(e.to_string()),
            other => Self::Unpack(other.to_string()),
        }
    }
}

impl From<zinject_store::Error> for FetchError {
    fn from(e: zinject_store::Error) -> Self {
        use zinject_store::Error as E;
        match e {
            E::DigestMismatch { expected, actual } => Self::DigestMismatch { expected, actual },
            E::UnknownAlgorithm(algorithm) => Self::UnknownDigestAlgorithm { algorithm },
            E::InvalidDigest(digest) => Self::InvalidDigest(digest),
            E::Unpack(e) => e.into(),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<zinject_fs::Error> for FetchError {
    fn from(e: zinject_fs::Error) -> Self {
        Self::Store(e.to_string())
    }
}

impl From<tokio::task::JoinError> for FetchError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Io(Arc::new(io::Error::other(e)))
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
