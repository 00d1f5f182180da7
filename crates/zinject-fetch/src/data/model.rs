use std::fmt;

use zinject_archive::UnpackOptions;
use zinject_store::ImplDigest;

use crate::error::Result;

/// One downloadable version of a program, as described by its feed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Implementation {
    /// Content digest, `algorithm=value`.
    pub id: String,
    /// URL of the feed this implementation belongs to.
    pub feed: String,
    pub version: String,
    /// Retrieval methods in order of preference.
    pub retrieval_methods: Vec<RetrievalMethod>,
}

impl Implementation {
    pub fn new(id: impl Into<String>, feed: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            feed: feed.into(),
            version: version.into(),
            retrieval_methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: RetrievalMethod) -> Self {
        self.retrieval_methods.push(method);
        self
    }

    /// Parse the id as a store digest, checking the algorithm is registered.
    pub fn digest(&self) -> Result<ImplDigest> {
        Ok(self.id.parse::<ImplDigest>()?)
    }

    /// The preferred retrieval method: always the first one listed.
    pub fn best_method(&self) -> Option<&RetrievalMethod> {
        self.retrieval_methods.first()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RetrievalMethod {
    Archive(DownloadSource),
    Recipe(Recipe),
    /// A package from the host's native package manager.
    Package(PackageRef),
}

/// A single archive on the network.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadSource {
    pub url: String,
    /// Size of the archive data, not counting `start_offset`.
    pub size: Option<u64>,
    pub mime_type: Option<String>,
    /// Directory inside the archive to use as the root.
    pub extract: Option<String>,
    /// Bytes of leading junk before the archive data.
    pub start_offset: u64,
}

impl DownloadSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    #[must_use]
    pub fn extract(mut self, extract: impl Into<String>) -> Self {
        self.extract = Some(extract.into());
        self
    }

    #[must_use]
    pub fn start_offset(mut self, start_offset: u64) -> Self {
        self.start_offset = start_offset;
        self
    }

    /// Number of bytes the whole download should contain.
    pub fn expected_size(&self) -> Option<u64> {
        self.size.map(|s| s + self.start_offset)
    }

    pub(crate) fn unpack_options(&self, mime_type: &str) -> UnpackOptions {
        let options = UnpackOptions::new()
            .mime_type(mime_type)
            .start_offset(self.start_offset);
        match &self.extract {
            Some(extract) => options.extract(extract),
            None => options,
        }
    }
}

/// Several archives unpacked over each other, in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recipe {
    pub steps: Vec<DownloadSource>,
}

impl Recipe {
    pub fn new(steps: Vec<DownloadSource>) -> Self {
        Self { steps }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageRef {
    pub distribution: String,
    pub package: String,
}

impl fmt::Display for PackageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} package '{}'", self.distribution, self.package)
    }
}

/// The parts of an interface the fetcher needs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Interface {
    pub uri: String,
    pub name: String,
    pub icons: Vec<Icon>,
}

impl Interface {
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            name: uri.clone(),
            uri,
            icons: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: Icon) -> Self {
        self.icons.push(icon);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Icon {
    pub mime_type: Option<String>,
    pub href: Option<String>,
}
