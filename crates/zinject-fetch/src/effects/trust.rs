use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::core::domain_from_url;
use crate::data::{Interface, PendingFeed, Signature};
use crate::error::{FetchError, Result};

/// Checks the signatures on a downloaded feed.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, feed_url: &str, body: &[u8]) -> Result<Vec<Signature>>;
}

/// Fetches and imports the signing keys a feed refers to.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// `key_mirror` is set when the feed itself came from the mirror.
    async fn download_keys(&self, pending: &PendingFeed, key_mirror: Option<&str>) -> Result<()>;
}

/// The cache of imported feeds and the trust decisions that guard it.
pub trait FeedCache: Send + Sync {
    fn get_interface(&self, uri: &str) -> Interface;

    /// Import `pending` if it has a valid signature from a key trusted for
    /// its domain. Returns `Ok(false)` if there is none; fails with
    /// `ReplayAttack` if it is older than the copy already cached.
    fn update_if_trusted(&self, iface: &Interface, pending: &PendingFeed) -> Result<bool>;

    fn trust_key(&self, fingerprint: &str, domain: &str);
}

/// Which keys are trusted to sign feeds from which domains.
#[derive(Clone, Debug, Default)]
pub struct TrustDb {
    keys: HashMap<String, HashSet<String>>,
}

impl TrustDb {
    pub const ANY_DOMAIN: &'static str = "*";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn trust_key(&mut self, fingerprint: &str, domain: &str) {
        self.keys
            .entry(fingerprint.to_string())
            .or_default()
            .insert(domain.to_string());
    }

    pub fn is_trusted(&self, fingerprint: &str, domain: &str) -> bool {
        self.keys
            .get(fingerprint)
            .is_some_and(|d| d.contains(domain) || d.contains(Self::ANY_DOMAIN))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachedFeed {
    pub body: Bytes,
    pub signed_at: DateTime<Utc>,
}

#[derive(Default)]
struct CacheState {
    trust: TrustDb,
    interfaces: HashMap<String, Interface>,
    feeds: HashMap<String, CachedFeed>,
}

/// An in-memory [`FeedCache`].
#[derive(Default)]
pub struct MemoryFeedCache {
    state: Mutex<CacheState>,
}

impl MemoryFeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trust(trust: TrustDb) -> Self {
        Self {
            state: Mutex::new(CacheState {
                trust,
                ..CacheState::default()
            }),
        }
    }

    pub fn add_interface(&self, iface: Interface) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.interfaces.insert(iface.uri.clone(), iface);
    }

    pub fn cached_feed(&self, url: &str) -> Option<CachedFeed> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.feeds.get(url).cloned()
    }

    /// Seed the cache with a feed imported earlier.
    pub fn insert_feed(&self, url: &str, body: Bytes, signed_at: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .feeds
            .insert(url.to_string(), CachedFeed { body, signed_at });
    }
}

impl FeedCache for MemoryFeedCache {
    fn get_interface(&self, uri: &str) -> Interface {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .interfaces
            .get(uri)
            .cloned()
            .unwrap_or_else(|| Interface::new(uri))
    }

    fn update_if_trusted(&self, iface: &Interface, pending: &PendingFeed) -> Result<bool> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let domain = domain_from_url(&pending.url).unwrap_or_default();

        let trusted = pending
            .signatures
            .iter()
            .any(|s| s.is_valid() && state.trust.is_trusted(&s.fingerprint, domain));
        let (true, Some(new)) = (trusted, pending.signed_at) else {
            return Ok(false);
        };

        if let Some(cached) = state.feeds.get(&pending.url)
            && new < cached.signed_at
        {
            tracing::warn!(
                "rejecting {}: signed at {}, older than cached copy ({})",
                pending.url,
                new,
                cached.signed_at
            );
            return Err(FetchError::ReplayAttack {
                url: pending.url.clone(),
                new,
                cached: cached.signed_at,
            });
        }

        state.feeds.insert(
            pending.url.clone(),
            CachedFeed {
                body: pending.body.clone(),
                signed_at: new,
            },
        );
        tracing::info!("updated cached feed {} for {}", pending.url, iface.uri);
        Ok(true)
    }

    fn trust_key(&self, fingerprint: &str, domain: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.trust.trust_key(fingerprint, domain);
    }
}
