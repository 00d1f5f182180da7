use std::io::Cursor;
use std::path::PathBuf;

use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use zinject_archive::unpack_archive_over;
use zinject_store::ImplDigest;

use crate::data::Recipe;
use crate::effects::fetcher::{Fetcher, archive_type};
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Build an implementation from a recipe and commit it under `digest`.
    ///
    /// All steps download in parallel; once every download has finished,
    /// they are unpacked in declared order into one staging directory, which
    /// is then verified and committed. The staging directory is removed on
    /// every failure.
    pub async fn cook(&self, digest: &ImplDigest, recipe: &Recipe, force: bool) -> Result<PathBuf> {
        // Validate every step before any download starts.
        for step in &recipe.steps {
            archive_type(step)?;
        }
        let downloads = recipe
            .steps
            .iter()
            .map(|step| self.download_archive(step, force))
            .collect::<Result<Vec<_>>>()?;

        let mut pending: FuturesUnordered<_> = downloads
            .iter()
            .enumerate()
            .map(|(index, download)| async move { (index, download.transfer.wait().await) })
            .collect();

        let mut bodies = vec![None; downloads.len()];
        let mut first_error: Option<FetchError> = None;
        while let Some((index, outcome)) = pending.next().await {
            match outcome {
                Ok(body) => bodies[index] = Some(body),
                Err(e) => {
                    tracing::debug!("recipe step {} failed: {}", index, e);
                    first_error.get_or_insert(e);
                }
            }
        }
        drop(pending);
        if let Some(e) = first_error {
            return Err(e);
        }

        let steps: Vec<_> = recipe
            .steps
            .iter()
            .zip(&downloads)
            .zip(bodies)
            .map(|((step, download), body)| {
                (
                    step.url.clone(),
                    step.unpack_options(&download.mime_type),
                    body.unwrap_or_default(),
                )
            })
            .collect();

        let store = self.ctx.store.clone();
        let digest = digest.clone();
        tokio::task::spawn_blocking(move || -> Result<PathBuf> {
            let staging = store.staging_dir(&digest)?;
            for (url, options, body) in &steps {
                unpack_archive_over(url, Cursor::new(body), staging.path(), options)?;
            }
            Ok(store.verify_and_commit(&digest, staging)?)
        })
        .await?
    }
}
