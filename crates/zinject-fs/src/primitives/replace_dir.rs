use std::path::Path;
use std::time::Duration;

use crate::{Error, Result};

#[derive(Clone, Copy, Debug)]
pub struct ReplaceDirOptions {
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl Default for ReplaceDirOptions {
    fn default() -> Self {
        Self {
            retry_count: 5,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl ReplaceDirOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Atomically move the directory `src` to `dest`.
///
/// `dest` is never replaced: if another writer got there first the call fails
/// with [`Error::AlreadyExists`] and `src` is left untouched.
pub fn rename_dir(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    options: ReplaceDirOptions,
) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if dest.exists() {
        return Err(Error::AlreadyExists(dest.to_path_buf()));
    }

    let mut attempts = 0;
    loop {
        match std::fs::rename(src, dest) {
            Ok(()) => return Ok(()),
            // A concurrent writer committed between the check and the rename.
            Err(_) if dest.exists() => return Err(Error::AlreadyExists(dest.to_path_buf())),
            Err(e) => {
                attempts += 1;
                // Only Windows has transient sharing violations worth retrying.
                if cfg!(not(windows)) || attempts >= options.retry_count {
                    return Err(Error::ReplaceDir {
                        src: src.to_path_buf(),
                        path: dest.to_path_buf(),
                        source: e,
                    });
                }
                std::thread::sleep(options.retry_delay * attempts);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_rename_dir() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("file.txt"), "data").unwrap();

        rename_dir(&src, &dest, ReplaceDirOptions::new()).unwrap();
        assert!(!src.exists());
        assert!(dest.join("file.txt").exists());
    }

    #[test]
    fn test_rename_dir_keeps_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::write(dest.join("first.txt"), "first").unwrap();

        let err = rename_dir(&src, &dest, ReplaceDirOptions::new()).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(src.exists());
        assert!(dest.join("first.txt").exists());
    }
}
