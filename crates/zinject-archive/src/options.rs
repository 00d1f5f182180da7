use std::path::PathBuf;

/// How one archive is laid over a destination directory.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnpackOptions {
    /// Explicit MIME type; guessed from the URL when absent.
    pub mime_type: Option<String>,
    /// Only unpack this directory of the archive, as the new root.
    pub extract: Option<PathBuf>,
    /// Bytes to skip before the archive data begins.
    pub start_offset: u64,
}

impl UnpackOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    #[must_use]
    pub fn extract(mut self, extract: impl Into<PathBuf>) -> Self {
        self.extract = Some(extract.into());
        self
    }

    #[must_use]
    pub fn start_offset(mut self, start_offset: u64) -> Self {
        self.start_offset = start_offset;
        self
    }
}

/// Summary of one unpack operation.
#[derive(Clone, Debug)]
pub struct ArchiveReport {
    pub format: crate::ArchiveFormat,
    pub entry_count: usize,
    pub total_bytes: u64,
}
