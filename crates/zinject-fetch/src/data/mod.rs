//! Immutable model types and configuration.

mod config;
mod feed;
mod model;

pub use config::{DEFAULT_FEED_MIRROR, FetcherConfig};
pub use feed::{PendingFeed, Signature, SignatureStatus};
pub use model::{
    DownloadSource, Icon, Implementation, Interface, PackageRef, Recipe, RetrievalMethod,
};
