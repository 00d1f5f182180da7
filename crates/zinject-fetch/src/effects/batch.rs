//! Fetching a whole selection of implementations at once.

use std::future::Future;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;

use crate::core::FirstError;
use crate::data::Implementation;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Fetch every implementation in `implementations`, each by its first
    /// retrieval method.
    ///
    /// Fails at once with `NoDownloadLocations` if any implementation has no
    /// retrieval method, before anything is downloaded. Returns `None` for an
    /// empty selection. Otherwise the returned future runs all downloads to
    /// completion; it resolves to the first error, and every later error goes
    /// to the handler's error reporter.
    pub fn download_impls<'a>(
        &'a self,
        implementations: &'a [Implementation],
        force: bool,
    ) -> Result<Option<impl Future<Output = Result<()>> + 'a>> {
        if implementations.is_empty() {
            return Ok(None);
        }

        let mut jobs = Vec::with_capacity(implementations.len());
        for implementation in implementations {
            let method = implementation.best_method().ok_or_else(|| {
                FetchError::NoDownloadLocations {
                    id: implementation.id.clone(),
                    interface: implementation.feed.clone(),
                }
            })?;
            jobs.push((implementation, method));
        }

        Ok(Some(async move {
            let mut running: FuturesUnordered<_> = jobs
                .into_iter()
                .map(|(implementation, method)| self.download_impl(implementation, method, force))
                .collect();

            let mut first = FirstError::new();
            while let Some(outcome) = running.next().await {
                if let Err(e) = outcome {
                    first.record(e, |later| self.ctx.handler.report_error(later));
                }
            }
            first.into_result()
        }))
    }
}
