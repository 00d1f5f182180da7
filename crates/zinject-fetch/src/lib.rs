//! Fetch-and-verify pipeline for an implementation installer.
//!
//! # Architecture
//!
//! The crate follows the three-layer pattern:
//! - `data` - immutable model types and configuration
//! - `core` - pure functions: URL rules, mirror locations, error aggregation
//! - `effects` - transfers, the store, trust decisions and the user, behind traits
//!
//! # Key Features
//!
//! - **Shared transfers**: one download per URL, joinable and abortable from any handle
//! - **Mirror race**: a slow or failing feed download is raced against the mirror copy
//! - **Anti-replay**: a feed older than the cached copy is never imported
//! - **All-or-nothing recipes**: steps download in parallel and unpack in order into
//!   one staging directory that is committed only if the digest matches

mod core;
mod data;
mod effects;
mod error;

pub use core::{check_scheme, domain_from_url, escape_uri, feed_mirror_url, key_mirror_url};
pub use data::{
    DEFAULT_FEED_MIRROR, DownloadSource, FetcherConfig, Icon, Implementation, Interface,
    PackageRef, PendingFeed, Recipe, RetrievalMethod, Signature, SignatureStatus,
};
pub use effects::{
    ArchiveDownload, BoxStream, CachedFeed, Downloads, FeedCache, FetchContext, Fetcher, Handler,
    HttpClient, KeyFetcher, MemoryFeedCache, SignatureVerifier, Transfer, TrustDb,
    UnattendedHandler,
};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{ErrorKind, FetchError, Result};
pub use zinject_store::{DirStore, ImplDigest, Store};
