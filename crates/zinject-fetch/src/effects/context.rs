use std::sync::Arc;

use zinject_store::Store;

use crate::effects::handler::Handler;
use crate::effects::trust::{FeedCache, KeyFetcher, SignatureVerifier};

/// The collaborators a [`Fetcher`](crate::Fetcher) works with.
#[derive(Clone)]
pub struct FetchContext {
    pub store: Arc<dyn Store>,
    pub feed_cache: Arc<dyn FeedCache>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub key_fetcher: Arc<dyn KeyFetcher>,
    pub handler: Arc<dyn Handler>,
}

impl FetchContext {
    pub fn new(
        store: Arc<dyn Store>,
        feed_cache: Arc<dyn FeedCache>,
        verifier: Arc<dyn SignatureVerifier>,
        key_fetcher: Arc<dyn KeyFetcher>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        Self {
            store,
            feed_cache,
            verifier,
            key_fetcher,
            handler,
        }
    }
}
