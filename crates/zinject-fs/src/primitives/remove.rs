use std::path::Path;

use crate::{Error, Result};

/// Recursively remove `path`, first making every directory in the tree
/// writable so that read-only content unpacked from archives can be deleted.
///
/// A missing `path` is not an error.
pub fn remove_dir_all_force(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let remove_err = |source| Error::Remove {
        path: path.to_path_buf(),
        source,
    };

    match std::fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => return std::fs::remove_file(path).map_err(remove_err),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(remove_err(e)),
    }

    make_writable(path).map_err(remove_err)?;
    std::fs::remove_dir_all(path).map_err(remove_err)
}

fn make_writable(dir: &Path) -> std::io::Result<()> {
    let meta = std::fs::symlink_metadata(dir)?;
    let mut perms = meta.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o700);
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
    }
    std::fs::set_permissions(dir, perms)?;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            make_writable(&entry.path())?;
        }
    }
    Ok(())
}
