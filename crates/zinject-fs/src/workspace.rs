use std::path::{Path, PathBuf};

use crate::primitives::{ReplaceDirOptions, remove_dir_all_force, rename_dir};
use crate::{Error, Result};

/// An exclusively owned staging directory that is either committed to its
/// destination with a single rename or removed when dropped.
pub struct Workspace {
    staging_path: PathBuf,
    destination_path: PathBuf,
    committed: bool,
}

impl Workspace {
    pub fn new(staging_dir: impl AsRef<Path>, destination: impl AsRef<Path>) -> Result<Self> {
        let staging_path = staging_dir.as_ref().to_path_buf();
        let destination_path = destination.as_ref().to_path_buf();

        if !staging_path.exists() {
            std::fs::create_dir_all(&staging_path).map_err(|e| Error::Write {
                path: staging_path.clone(),
                source: e,
            })?;
        }

        Ok(Self {
            staging_path,
            destination_path,
            committed: false,
        })
    }

    /// Create a fresh, uniquely named staging directory inside `parent`.
    ///
    /// Two workspaces created with the same prefix never share a directory.
    pub fn unique_in(
        parent: impl AsRef<Path>,
        prefix: &str,
        destination: impl AsRef<Path>,
    ) -> Result<Self> {
        let parent = parent.as_ref();
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;

        let staging = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir_in(parent)
            .map_err(|e| Error::Write {
                path: parent.to_path_buf(),
                source: e,
            })?
            .keep();

        Self::new(staging, destination)
    }

    pub fn path(&self) -> &Path {
        &self.staging_path
    }

    pub fn destination(&self) -> &Path {
        &self.destination_path
    }

    /// Move the staged tree to the destination.
    ///
    /// Fails with [`Error::AlreadyExists`] if the destination is already
    /// present; the staging directory is removed in every failure case.
    pub fn commit(mut self) -> Result<PathBuf> {
        rename_dir(
            &self.staging_path,
            &self.destination_path,
            ReplaceDirOptions::default(),
        )?;
        self.committed = true;
        Ok(self.destination_path.clone())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.committed
            && let Err(e) = remove_dir_all_force(&self.staging_path)
        {
            tracing::warn!("failed to clean up staging directory: {e}");
        }
    }
}
