use std::io::Cursor;
use std::path::{Path, PathBuf};

use zinject_archive::{UnpackOptions, unpack_archive_over};
use zinject_fs::Workspace;

use crate::manifest::manifest_digest;
use crate::{Error, ImplDigest, Result};

/// A content-addressed store of unpacked implementations.
///
/// Content only becomes visible under its digest after it has been staged
/// privately and its manifest checked.
pub trait Store: Send + Sync {
    /// A fresh private staging directory for content expected to hash to
    /// `digest`. Dropping it without committing removes it.
    fn staging_dir(&self, digest: &ImplDigest) -> Result<Workspace>;

    /// Check the staged tree against `digest` and publish it.
    ///
    /// If another writer published the same digest first, the staged copy is
    /// discarded and the existing path returned.
    fn verify_and_commit(&self, digest: &ImplDigest, staging: Workspace) -> Result<PathBuf>;

    /// Path of the first of `digests` already present.
    fn lookup_any(&self, digests: &[ImplDigest]) -> Option<PathBuf>;

    /// Unpack one archive into a fresh staging area and commit it.
    fn add_archive(
        &self,
        digest: &ImplDigest,
        url: &str,
        body: &[u8],
        options: &UnpackOptions,
    ) -> Result<PathBuf> {
        let staging = self.staging_dir(digest)?;
        unpack_archive_over(url, Cursor::new(body), staging.path(), options)?;
        self.verify_and_commit(digest, staging)
    }
}

/// A [`Store`] backed by one directory: `<root>/<algorithm>=<value>` for
/// implementations, `<root>/.tmp` for staging.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, digest: &ImplDigest) -> PathBuf {
        self.root.join(digest.dir_name())
    }

    fn staging_root(&self) -> PathBuf {
        self.root.join(".tmp")
    }
}

impl Store for DirStore {
    fn staging_dir(&self, digest: &ImplDigest) -> Result<Workspace> {
        Ok(Workspace::unique_in(
            self.staging_root(),
            "tmp-",
            self.path_for(digest),
        )?)
    }

    fn verify_and_commit(&self, digest: &ImplDigest, staging: Workspace) -> Result<PathBuf> {
        let actual = manifest_digest(staging.path(), digest.algorithm())?;
        if actual != digest.value() {
            tracing::warn!("manifest digest mismatch for {}: got {}", digest, actual);
            return Err(Error::DigestMismatch {
                expected: digest.to_string(),
                actual: format!("{}={}", digest.algorithm(), actual),
            });
        }

        match staging.commit() {
            Ok(path) => {
                tracing::info!("added {} to store", digest);
                Ok(path)
            }
            Err(zinject_fs::Error::AlreadyExists(path)) => {
                tracing::debug!("{} already in store; discarding duplicate", digest);
                Ok(path)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn lookup_any(&self, digests: &[ImplDigest]) -> Option<PathBuf> {
        digests
            .iter()
            .map(|d| self.path_for(d))
            .find(|p| p.is_dir())
    }
}
