use std::fs;
use std::path::Path;

use zinject_verify::{Algorithm, Hasher};

use crate::{Error, Result};

/// Build the manifest of the tree rooted at `root`.
///
/// One line per entry, depth first, names in byte order:
///
/// ```text
/// D /dir
/// F <hash> <size> /dir/file
/// X <hash> <size> /dir/tool
/// S <hash> <len> /dir/link
/// ```
///
/// The root itself is not listed; modification times are not recorded.
pub fn manifest(root: &Path, algorithm: Algorithm) -> Result<String> {
    let mut out = String::new();
    walk(root, "", algorithm, &mut out)?;
    Ok(out)
}

/// Hex digest of the manifest of `root`.
pub fn manifest_digest(root: &Path, algorithm: Algorithm) -> Result<String> {
    Ok(algorithm.hex_digest(manifest(root, algorithm)?.as_bytes()))
}

fn walk(dir: &Path, prefix: &str, algorithm: Algorithm, out: &mut String) -> Result<()> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_err)?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let name = format!("{}/{}", prefix, entry.file_name().to_string_lossy());
        let meta = fs::symlink_metadata(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(&path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            let target = target.to_string_lossy();
            let hash = algorithm.hex_digest(target.as_bytes());
            out.push_str(&format!("S {} {} {}\n", hash, target.len(), name));
        } else if file_type.is_dir() {
            out.push_str(&format!("D {}\n", name));
            walk(&path, &name, algorithm, out)?;
        } else if file_type.is_file() {
            let file = fs::File::open(&path).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            let mut hasher = algorithm.hasher();
            let size = hasher.update_reader(file).map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            let kind = if is_executable(&meta) { 'X' } else { 'F' };
            out.push_str(&format!(
                "{} {} {} {}\n",
                kind,
                hex::encode(hasher.finalize()),
                size,
                name
            ));
        } else {
            return Err(Error::UnsupportedFileType(path));
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}
