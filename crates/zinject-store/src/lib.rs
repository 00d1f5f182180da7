//! The implementation store.
//!
//! Implementations are addressed by the digest of their manifest
//! (`sha256=...`, `blake3=...`). Nothing appears under a digest until the
//! staged tree has been hashed and found to match.

mod digest;
mod error;
pub mod manifest;
mod store;

pub use digest::ImplDigest;
pub use error::{Error, Result};
pub use store::{DirStore, Store};
