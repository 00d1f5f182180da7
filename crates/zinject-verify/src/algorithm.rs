use std::fmt;

use crate::hasher::Hasher;
#[cfg(feature = "blake3")]
use crate::hasher::Blake3Hasher;
#[cfg(feature = "sha256")]
use crate::hasher::Sha256Hasher;
use crate::{Result, VerificationError};

/// A digest algorithm that may appear in an implementation id
/// (`<name>=<hex digest>`).
///
/// Only algorithms compiled into this build are registered; anything else is
/// rejected by [`Algorithm::from_name`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[cfg(feature = "sha256")]
    Sha256,
    #[cfg(feature = "blake3")]
    Blake3,
}

impl Algorithm {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            #[cfg(feature = "sha256")]
            "sha256" => Ok(Self::Sha256),
            #[cfg(feature = "blake3")]
            "blake3" => Ok(Self::Blake3),
            other => Err(VerificationError::UnknownAlgorithm(other.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "sha256")]
            Self::Sha256 => "sha256",
            #[cfg(feature = "blake3")]
            Self::Blake3 => "blake3",
        }
    }

    pub fn registered() -> &'static [Algorithm] {
        &[
            #[cfg(feature = "sha256")]
            Self::Sha256,
            #[cfg(feature = "blake3")]
            Self::Blake3,
        ]
    }

    pub fn hasher(self) -> AnyHasher {
        match self {
            #[cfg(feature = "sha256")]
            Self::Sha256 => AnyHasher::Sha256(Sha256Hasher::new()),
            #[cfg(feature = "blake3")]
            Self::Blake3 => AnyHasher::Blake3(Blake3Hasher::new()),
        }
    }

    /// Hex digest of `data`.
    pub fn hex_digest(self, data: &[u8]) -> String {
        let mut hasher = self.hasher();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Runtime-selected hasher for one of the registered algorithms.
pub enum AnyHasher {
    #[cfg(feature = "sha256")]
    Sha256(Sha256Hasher),
    #[cfg(feature = "blake3")]
    Blake3(Blake3Hasher),
}

impl Hasher for AnyHasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            #[cfg(feature = "sha256")]
            Self::Sha256(h) => h.update(data),
            #[cfg(feature = "blake3")]
            Self::Blake3(h) => h.update(data),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            #[cfg(feature = "sha256")]
            Self::Sha256(h) => h.finalize(),
            #[cfg(feature = "blake3")]
            Self::Blake3(h) => h.finalize(),
        }
    }
}
