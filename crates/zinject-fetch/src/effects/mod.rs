//! Side effects: HTTP transfers, the store, trust decisions and the user.

mod batch;
mod context;
mod feed;
mod fetcher;
mod handler;
mod http;
mod icon;
mod implementation;
mod recipe;
mod transfer;
mod trust;

pub use context::FetchContext;
pub use fetcher::{ArchiveDownload, Fetcher};
pub use handler::{Handler, UnattendedHandler};
#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
pub use http::{BoxStream, HttpClient};
pub use transfer::{Downloads, Transfer};
pub use trust::{CachedFeed, FeedCache, KeyFetcher, MemoryFeedCache, SignatureVerifier, TrustDb};
