use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Map an archive entry path to its location relative to the unpack root.
///
/// With `extract` set, only entries below that directory are kept and the
/// prefix is removed; everything else yields `None`. The extract directory
/// itself maps to the empty path.
pub fn entry_relative_path(entry: &Path, extract: Option<&Path>) -> Result<Option<PathBuf>> {
    let normalized = normalize_relative(entry).ok_or_else(|| Error::ZipSlip {
        entry: entry.to_path_buf(),
    })?;

    match extract {
        None => Ok(Some(normalized)),
        Some(prefix) => Ok(normalized.strip_prefix(prefix).ok().map(Path::to_path_buf)),
    }
}

/// Normalize an `extract` attribute so it can be compared with entry paths.
pub fn normalize_extract(extract: &Path) -> Result<PathBuf> {
    match normalize_relative(extract) {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        _ => Err(Error::InvalidPath(format!(
            "illegal extract directory '{}'",
            extract.display()
        ))),
    }
}

/// Check that a symlink at `link` (relative to the unpack root) pointing at
/// `target` stays inside the root.
pub fn check_symlink_target(target: &Path, link: &Path) -> Result<()> {
    if target.has_root() {
        return Err(Error::AbsoluteSymlinkTarget {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
        });
    }

    let resolved = link.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
    if normalize_relative(&resolved).is_none() {
        return Err(Error::SymlinkEscape {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
        });
    }
    Ok(())
}

/// Resolve `.` and `..` lexically. Returns `None` for absolute paths and
/// for paths that climb above their starting point.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !result.pop() {
                    return None;
                }
            }
            Component::Normal(part) => result.push(part),
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(result)
}
