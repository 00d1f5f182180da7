//! Content verification primitives for downloaded artifacts.
//!
//! Provides incremental hashing and the registry of digest algorithms that
//! implementation ids may name. Verification policy (what gets hashed and
//! what it is compared against) belongs to the store.
//!
//! # Example
//!
//! ```
//! use zinject_verify::{Algorithm, Hasher};
//!
//! let alg = Algorithm::from_name("sha256").unwrap();
//! let mut hasher = alg.hasher();
//! hasher.update(b"hello world");
//! assert_eq!(hex::encode(hasher.finalize()), alg.hex_digest(b"hello world"));
//! ```

pub use self::algorithm::{Algorithm, AnyHasher};
pub use self::error::{Result, VerificationError};
pub use self::hasher::Hasher;

#[cfg(feature = "sha256")]
pub use self::hasher::Sha256Hasher;

#[cfg(feature = "blake3")]
pub use self::hasher::Blake3Hasher;

mod algorithm;
mod error;
mod hasher;
