use std::path::PathBuf;

use zinject_fs::{AtomicWriteOptions, atomic_write};

use crate::core::{check_scheme, escape_uri};
use crate::data::Interface;
use crate::effects::fetcher::Fetcher;
use crate::effects::http::HttpClient;
use crate::error::Result;

const ICON_TYPE: &str = "image/png";

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Download the interface's PNG icon into the icon cache.
    ///
    /// Returns the cached path, or `None` if there is no icon cache, the
    /// interface has no PNG icon, or the download failed. Download failures
    /// go to the handler's error reporter rather than the caller.
    pub async fn download_icon(&self, iface: &Interface, force: bool) -> Result<Option<PathBuf>> {
        let Some(cache_dir) = self.config.icon_cache.clone() else {
            tracing::debug!("no icon cache configured; not fetching icon for {}", iface.uri);
            return Ok(None);
        };

        let mut href = None;
        for icon in &iface.icons {
            if icon.mime_type.as_deref() != Some(ICON_TYPE) {
                tracing::debug!("skipping non-PNG icon for {}", iface.uri);
                continue;
            }
            match &icon.href {
                Some(h) => {
                    href = Some(h.clone());
                    break;
                }
                None => tracing::warn!("missing href attribute on PNG icon for {}", iface.uri),
            }
        }
        let Some(href) = href else {
            tracing::info!("no PNG icons found in {}", iface.uri);
            return Ok(None);
        };

        check_scheme(&href)?;
        let body = match self.downloads.get(&href, None, force).wait().await {
            Ok(body) => body,
            Err(e) => {
                self.ctx.handler.report_error(&e);
                return Ok(None);
            }
        };

        let path = cache_dir.join(escape_uri(&iface.uri));
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            std::fs::create_dir_all(&cache_dir)?;
            atomic_write(&target, &body, AtomicWriteOptions::default())?;
            Ok(())
        })
        .await??;

        tracing::info!("saved icon for {} to {}", iface.uri, path.display());
        Ok(Some(path))
    }
}
