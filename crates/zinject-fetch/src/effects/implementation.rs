use std::path::PathBuf;

use crate::data::{Implementation, RetrievalMethod};
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::{FetchError, Result};

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Fetch one implementation with the given retrieval method and add it
    /// to the store.
    ///
    /// The digest algorithm is checked before anything is downloaded. Errors
    /// name the implementation's feed and version.
    pub async fn download_impl(
        &self,
        implementation: &Implementation,
        method: &RetrievalMethod,
        force: bool,
    ) -> Result<PathBuf> {
        self.fetch_impl(implementation, method, force)
            .await
            .map_err(|e| e.for_implementation(&implementation.feed, &implementation.version))
    }

    async fn fetch_impl(
        &self,
        implementation: &Implementation,
        method: &RetrievalMethod,
        force: bool,
    ) -> Result<PathBuf> {
        let digest = implementation.digest()?;

        let path = match method {
            RetrievalMethod::Archive(source) => {
                let download = self.download_archive(source, force)?;
                let body = download.transfer.wait().await?;
                self.add_archive_to_cache(&digest, source, &download.mime_type, body)
                    .await?
            }
            RetrievalMethod::Recipe(recipe) => self.cook(&digest, recipe, force).await?,
            RetrievalMethod::Package(package) => {
                return Err(FetchError::UnsupportedRetrievalMethod {
                    method: package.to_string(),
                });
            }
        };

        self.ctx.handler.impl_added_to_store(implementation, &path);
        Ok(path)
    }
}
