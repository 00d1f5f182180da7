use std::path::PathBuf;

use bytes::Bytes;
use zinject_store::ImplDigest;

use crate::core::check_scheme;
use crate::data::{DownloadSource, FetcherConfig};
use crate::effects::context::FetchContext;
use crate::effects::http::HttpClient;
use crate::effects::transfer::{Downloads, Transfer};
use crate::error::{FetchError, Result};

/// Downloads feeds and implementations.
pub struct Fetcher<C: HttpClient> {
    pub(crate) downloads: Downloads<C>,
    pub(crate) ctx: FetchContext,
    pub(crate) config: FetcherConfig,
}

/// An archive download that has passed validation and is in progress.
#[derive(Clone, Debug)]
pub struct ArchiveDownload {
    pub transfer: Transfer,
    /// The declared type, or the one guessed from the URL.
    pub mime_type: String,
}

impl<C: HttpClient + 'static> Fetcher<C> {
    pub fn new(client: C, ctx: FetchContext, config: FetcherConfig) -> Self {
        Self {
            downloads: Downloads::new(client, config.headers.clone()),
            ctx,
            config,
        }
    }

    pub fn downloads(&self) -> &Downloads<C> {
        &self.downloads
    }

    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Start downloading one archive.
    ///
    /// The scheme and archive type are checked before anything is fetched.
    /// With `force`, a download of the same URL already in progress is
    /// aborted and restarted.
    ///
    /// # Panics
    ///
    /// Panics if the download has to be started outside a Tokio runtime.
    pub fn download_archive(&self, source: &DownloadSource, force: bool) -> Result<ArchiveDownload> {
        let mime_type = archive_type(source)?;
        let transfer = self
            .downloads
            .get(&source.url, source.expected_size(), force);
        Ok(ArchiveDownload {
            transfer,
            mime_type,
        })
    }

    /// Unpack a downloaded archive into the store under `digest`.
    pub(crate) async fn add_archive_to_cache(
        &self,
        digest: &ImplDigest,
        source: &DownloadSource,
        mime_type: &str,
        body: Bytes,
    ) -> Result<PathBuf> {
        let store = self.ctx.store.clone();
        let digest = digest.clone();
        let url = source.url.clone();
        let options = source.unpack_options(mime_type);

        tokio::task::spawn_blocking(move || {
            store
                .add_archive(&digest, &url, &body, &options)
                .map_err(FetchError::from)
        })
        .await?
    }
}

/// Validate `source` and settle its MIME type.
pub(crate) fn archive_type(source: &DownloadSource) -> Result<String> {
    check_scheme(&source.url)?;
    let mime_type = match &source.mime_type {
        Some(t) => t.clone(),
        None => zinject_archive::type_from_url(&source.url)
            .ok_or_else(|| FetchError::UnknownArchiveType {
                url: source.url.clone(),
            })?
            .to_string(),
    };
    zinject_archive::check_type_supported(&mime_type)?;
    Ok(mime_type)
}
