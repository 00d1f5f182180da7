use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{FetchError, Result};

pub const DEFAULT_FEED_MIRROR: &str = "http://roscidus.com/0mirror";

/// Fetcher configuration.
///
/// # Examples
///
/// ```
/// use zinject_fetch::FetcherConfig;
///
/// let config = FetcherConfig::from_toml_str(r#"
///     feed_mirror = "https://mirror.example.com/0mirror"
///     mirror_timeout_secs = 10
///     headers = [["User-Agent", "zinject/0.1"]]
/// "#).unwrap();
/// assert_eq!(config.mirror_timeout().as_secs(), 10);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FetcherConfig {
    /// Base URL of the feed and key mirror; `None` or an empty string
    /// disables the mirror.
    pub feed_mirror: Option<String>,
    /// How long the primary feed download may take before the mirror is tried.
    pub mirror_timeout_secs: u64,
    /// Extra headers sent with every request.
    pub headers: Vec<(String, String)>,
    /// Directory for downloaded interface icons.
    pub icon_cache: Option<PathBuf>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            feed_mirror: Some(DEFAULT_FEED_MIRROR.to_string()),
            mirror_timeout_secs: 5,
            headers: Vec::new(),
            icon_cache: None,
        }
    }
}

impl FetcherConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FetchError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| FetchError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn mirror(&self) -> Option<&str> {
        self.feed_mirror.as_deref().filter(|m| !m.is_empty())
    }

    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_secs(self.mirror_timeout_secs)
    }

    #[must_use]
    pub fn feed_mirror(mut self, mirror: Option<String>) -> Self {
        self.feed_mirror = mirror;
        self
    }

    #[must_use]
    pub fn mirror_timeout_secs(mut self, secs: u64) -> Self {
        self.mirror_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn icon_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.icon_cache = Some(dir.into());
        self
    }
}
