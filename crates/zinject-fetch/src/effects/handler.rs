use std::path::Path;

use async_trait::async_trait;

use crate::data::{Implementation, Interface, PendingFeed};
use crate::error::{FetchError, Result};

/// Callbacks into the user-facing side of the installer.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Ask whether any of `fingerprints` should be trusted to sign
    /// `pending`. Returns the approved fingerprints.
    async fn confirm_trust_keys(
        &self,
        iface: &Interface,
        pending: &PendingFeed,
        fingerprints: &[String],
    ) -> Result<Vec<String>>;

    fn impl_added_to_store(&self, implementation: &Implementation, path: &Path) {
        tracing::debug!(
            "{} version {} is now at {}",
            implementation.feed,
            implementation.version,
            path.display()
        );
    }

    /// Report an error that is not being propagated to the caller.
    fn report_error(&self, error: &FetchError) {
        tracing::warn!("{}", error);
    }
}

/// A [`Handler`] for contexts with nobody to ask: unknown keys are never
/// trusted.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnattendedHandler;

#[async_trait]
impl Handler for UnattendedHandler {
    async fn confirm_trust_keys(
        &self,
        _iface: &Interface,
        pending: &PendingFeed,
        fingerprints: &[String],
    ) -> Result<Vec<String>> {
        Err(FetchError::NoTrustedKeys {
            url: pending.url.clone(),
            fingerprints: fingerprints.to_vec(),
        })
    }
}
