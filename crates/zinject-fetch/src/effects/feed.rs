//! Refreshing a feed from its primary location, with mirror fallback.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use crate::core::{domain_from_url, feed_mirror_url, key_mirror_url};
use crate::data::PendingFeed;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::effects::transfer::Transfer;
use crate::error::{FetchError, Result};

/// One download-and-import attempt: the transfer, so that it can be aborted,
/// and the task that imports its result.
struct FeedImport<'a> {
    transfer: Transfer,
    task: BoxFuture<'a, Result<()>>,
}

async fn next_outcome(import: &mut Option<FeedImport<'_>>) -> Result<()> {
    match import {
        Some(import) => (&mut import.task).await,
        None => std::future::pending().await,
    }
}

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Download `feed_url`, check its signatures and import it into the
    /// feed cache.
    ///
    /// With no mirror configured the primary download is simply awaited.
    /// Otherwise, if it has not finished within the mirror timeout,
    /// or fails with a recoverable error, the mirror copy is fetched as
    /// well and whichever succeeds first wins. Trust failures, replay
    /// attacks and cancellations on the primary are returned directly
    /// without trying the mirror.
    pub async fn refresh_feed(&self, feed_url: &str, force: bool) -> Result<()> {
        tracing::debug!("refreshing feed {} (force = {})", feed_url, force);

        if self.config.mirror().is_none() {
            return self.start_import(feed_url, feed_url, None, force).task.await;
        }

        let mut primary = Some(self.start_import(feed_url, feed_url, None, force));
        let timeout = tokio::time::sleep(self.config.mirror_timeout());
        tokio::pin!(timeout);

        let mut error = None;
        tokio::select! {
            outcome = next_outcome(&mut primary) => {
                primary = None;
                match outcome {
                    Ok(()) => return Ok(()),
                    Err(e) if !e.is_recoverable() => return Err(e),
                    Err(e) => {
                        tracing::warn!("trying mirror, as feed download from {} failed: {}", feed_url, e);
                        error = Some(e);
                    }
                }
            }
            _ = &mut timeout => {
                tracing::info!("feed download from {} is taking a long time; trying mirror too", feed_url);
            }
        }

        let mut mirror = self.start_mirror_import(feed_url, force);
        let mut succeeded = false;

        while primary.is_some() || mirror.is_some() {
            tokio::select! {
                outcome = next_outcome(&mut primary), if primary.is_some() => {
                    primary = None;
                    match outcome {
                        Ok(()) => {
                            if let Some(import) = mirror.take() {
                                tracing::info!("primary feed download succeeded; aborting mirror download for {}", feed_url);
                                import.transfer.abort();
                            }
                            return Ok(());
                        }
                        Err(e) if succeeded => {
                            tracing::info!("feed download from {} failed after mirror succeeded: {}", feed_url, e);
                        }
                        Err(e) => {
                            tracing::info!("feed download from {} failed; still trying mirror: {}", feed_url, e);
                            error = Some(e);
                        }
                    }
                }
                outcome = next_outcome(&mut mirror), if mirror.is_some() => {
                    mirror = None;
                    match outcome {
                        Ok(()) => {
                            tracing::info!("imported {} from mirror", feed_url);
                            succeeded = true;
                            error = None;
                        }
                        Err(e @ FetchError::ReplayAttack { .. }) => {
                            tracing::info!("version from mirror is older than cached version; ignoring it: {}", e);
                            error = None;
                        }
                        Err(e) => {
                            tracing::info!("mirror download failed: {}", e);
                            if error.is_none() && !succeeded {
                                error = Some(e);
                            }
                        }
                    }
                }
            }
        }

        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start_mirror_import<'a>(&'a self, feed_url: &'a str, force: bool) -> Option<FeedImport<'a>> {
        let mirror = self.config.mirror()?;
        match feed_mirror_url(mirror, feed_url) {
            Ok(url) => Some(self.start_import(feed_url, &url, Some(key_mirror_url(mirror)), force)),
            Err(e) => {
                tracing::warn!("no mirror location for {}: {}", feed_url, e);
                None
            }
        }
    }

    /// Start downloading `download_url` now and return the task that will
    /// import it as `feed_url`.
    fn start_import<'a>(
        &'a self,
        feed_url: &'a str,
        download_url: &str,
        key_mirror: Option<String>,
        force: bool,
    ) -> FeedImport<'a> {
        let transfer = self.downloads.get(download_url, None, force);
        let task = self
            .import_feed(feed_url, transfer.clone(), key_mirror)
            .boxed();
        FeedImport { transfer, task }
    }

    async fn import_feed(
        &self,
        feed_url: &str,
        transfer: Transfer,
        key_mirror: Option<String>,
    ) -> Result<()> {
        let body = transfer.wait().await?;

        let signatures = self.ctx.verifier.verify(feed_url, &body)?;
        let mut pending = PendingFeed::new(feed_url, body, signatures);
        if pending.needs_keys() {
            self.ctx
                .key_fetcher
                .download_keys(&pending, key_mirror.as_deref())
                .await?;
            let signatures = self.ctx.verifier.verify(feed_url, &pending.body)?;
            pending = PendingFeed::new(feed_url, pending.body, signatures);
        }

        let cache = &self.ctx.feed_cache;
        let iface = cache.get_interface(feed_url);
        if cache.update_if_trusted(&iface, &pending)? {
            return Ok(());
        }

        let candidates = pending.valid_fingerprints();
        if candidates.is_empty() {
            return Err(FetchError::NoTrustedKeys {
                url: feed_url.to_string(),
                fingerprints: Vec::new(),
            });
        }

        let approved = self
            .ctx
            .handler
            .confirm_trust_keys(&iface, &pending, &candidates)
            .await?;
        let domain = domain_from_url(feed_url).unwrap_or_default();
        for fingerprint in &approved {
            tracing::info!("trusting key {} for {}", fingerprint, domain);
            cache.trust_key(fingerprint, domain);
        }

        if cache.update_if_trusted(&iface, &pending)? {
            Ok(())
        } else {
            Err(FetchError::NoTrustedKeys {
                url: feed_url.to_string(),
                fingerprints: candidates,
            })
        }
    }
}
