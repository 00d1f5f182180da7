use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::format::{self, ArchiveFormat};
use crate::options::{ArchiveReport, UnpackOptions};
use crate::sanitize::{check_symlink_target, entry_relative_path, normalize_extract};

#[cfg(feature = "tar")]
mod tar;
#[cfg(feature = "zip")]
mod zip;

/// An entry as produced by an archive reader, before it touches the disk.
pub struct PendingEntry<'a> {
    pub path: PathBuf,
    pub mode: Option<u32>,
    pub kind: PendingEntryKind<'a>,
}

pub enum PendingEntryKind<'a> {
    File(&'a mut dyn Read),
    Directory,
    Symlink { target: PathBuf },
    /// Another entry of the same archive, named by its path in the archive.
    HardLink { target: PathBuf },
}

/// A streaming source of archive entries.
pub trait EntrySource {
    fn for_each_entry(
        &mut self,
        visit: &mut dyn FnMut(PendingEntry<'_>) -> Result<()>,
    ) -> Result<()>;
}

/// Unpack the archive in `reader` over whatever `destination` already holds.
///
/// The MIME type comes from `options` or is guessed from `url`. Files replace
/// files; a directory is never replaced by a non-directory or vice versa, and
/// nothing is written through a symlink, which fail with
/// [`Error::UnsafeUnpack`].
pub fn unpack_archive_over<R: Read + Seek>(
    url: &str,
    reader: R,
    destination: &Path,
    options: &UnpackOptions,
) -> Result<ArchiveReport> {
    let mime_type = match options.mime_type.as_deref() {
        Some(t) => t,
        None => format::type_from_url(url).ok_or_else(|| Error::UnknownType {
            url: url.to_string(),
        })?,
    };
    let archive_format = format::format_for(mime_type)?;
    let extract = options.extract.as_deref().map(normalize_extract).transpose()?;

    let reader = OffsetReader::new(reader, options.start_offset)?;
    let mut writer = OverlayWriter::new(destination, extract.as_deref());

    tracing::debug!(
        "unpacking {} ({}) into {}",
        url,
        mime_type,
        destination.display()
    );

    match archive_format {
        #[cfg(feature = "tar")]
        ArchiveFormat::Tar(codec) => {
            let mut source = tar::TarSource::new(reader, codec)?;
            source.for_each_entry(&mut |entry| writer.write(entry))?;
        }
        #[cfg(feature = "zip")]
        ArchiveFormat::Zip => {
            let mut source = zip::ZipSource::new(reader)?;
            source.for_each_entry(&mut |entry| writer.write(entry))?;
        }
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedType {
                mime_type: mime_type.to_string(),
            });
        }
    }

    let report = ArchiveReport {
        format: archive_format,
        entry_count: writer.entry_count,
        total_bytes: writer.total_bytes,
    };
    let matched_extract = writer.matched_extract;

    match extract {
        Some(extract) if !matched_extract => Err(Error::ExtractNotFound { extract }),
        _ => Ok(report),
    }
}

/// Presents `inner` from `start` onwards as a stream beginning at zero.
struct OffsetReader<R> {
    inner: R,
    start: u64,
}

impl<R: Seek> OffsetReader<R> {
    fn new(mut inner: R, start: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self { inner, start })
    }
}

impl<R: Read> Read for OffsetReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for OffsetReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let pos = match pos {
            SeekFrom::Start(n) => SeekFrom::Start(self.start + n),
            other => other,
        };
        let absolute = self.inner.seek(pos)?;
        absolute.checked_sub(self.start).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of archive")
        })
    }
}

struct OverlayWriter<'a> {
    root: &'a Path,
    extract: Option<&'a Path>,
    matched_extract: bool,
    entry_count: usize,
    total_bytes: u64,
}

impl<'a> OverlayWriter<'a> {
    fn new(root: &'a Path, extract: Option<&'a Path>) -> Self {
        Self {
            root,
            extract,
            matched_extract: false,
            entry_count: 0,
            total_bytes: 0,
        }
    }

    fn write(&mut self, entry: PendingEntry<'_>) -> Result<()> {
        let Some(relative) = entry_relative_path(&entry.path, self.extract)? else {
            return Ok(());
        };
        self.matched_extract = true;
        if relative.as_os_str().is_empty() {
            return Ok(());
        }

        self.check_ancestors(&relative)?;
        let target = self.root.join(&relative);
        let existing = fs::symlink_metadata(&target).ok();

        match entry.kind {
            PendingEntryKind::Directory => match existing {
                Some(meta) if meta.is_dir() => {}
                Some(_) => {
                    return Err(Error::UnsafeUnpack {
                        path: relative,
                        reason: "directory would replace an existing file or symlink",
                    });
                }
                None => fs::create_dir_all(&target).map_err(|e| {
                    Error::DirectoryCreationFailed {
                        path: target.clone(),
                        source: e,
                    }
                })?,
            },
            PendingEntryKind::File(reader) => {
                self.prepare_leaf(&relative, &target, existing)?;
                let mut out = fs::File::create(&target).map_err(|e| Error::ExtractionFailed {
                    path: target.clone(),
                    source: e,
                })?;
                let written = io::copy(reader, &mut out).map_err(|e| Error::ExtractionFailed {
                    path: target.clone(),
                    source: e,
                })?;
                self.total_bytes += written;
                set_file_mode(&target, entry.mode)?;
            }
            PendingEntryKind::Symlink { target: link_target } => {
                check_symlink_target(&link_target, &relative)?;
                self.prepare_leaf(&relative, &target, existing)?;
                create_symlink(&link_target, &target)?;
            }
            PendingEntryKind::HardLink { target: link_target } => {
                let source = self.hard_link_source(&link_target, &relative)?;
                if source != target {
                    self.prepare_leaf(&relative, &target, existing)?;
                    self.total_bytes += fs::copy(&source, &target).map_err(|e| {
                        Error::ExtractionFailed {
                            path: target.clone(),
                            source: e,
                        }
                    })?;
                }
            }
        }

        self.entry_count += 1;
        Ok(())
    }

    /// Refuse to write through a symlinked parent directory.
    fn check_ancestors(&self, relative: &Path) -> Result<()> {
        let mut current = self.root.to_path_buf();
        let Some(parent) = relative.parent() else {
            return Ok(());
        };
        for component in parent.components() {
            current.push(component);
            match fs::symlink_metadata(&current) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(Error::UnsafeUnpack {
                        path: relative.to_path_buf(),
                        reason: "parent directory is a symlink",
                    });
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        Ok(())
    }

    /// The already-unpacked regular file a hard link entry refers to.
    fn hard_link_source(&self, link_target: &Path, link: &Path) -> Result<PathBuf> {
        let missing = || Error::HardLinkTargetMissing {
            target: link_target.to_path_buf(),
            link: link.to_path_buf(),
        };
        let Some(relative) = entry_relative_path(link_target, self.extract)? else {
            return Err(missing());
        };
        if relative.as_os_str().is_empty() {
            return Err(missing());
        }
        self.check_ancestors(&relative)?;

        let source = self.root.join(&relative);
        match fs::symlink_metadata(&source) {
            Ok(meta) if meta.is_file() => Ok(source),
            _ => Err(missing()),
        }
    }

    /// Make room for a file or symlink: existing files and links are
    /// replaced, existing directories are not.
    fn prepare_leaf(
        &self,
        relative: &Path,
        target: &Path,
        existing: Option<fs::Metadata>,
    ) -> Result<()> {
        match existing {
            Some(meta) if meta.is_dir() => {
                return Err(Error::UnsafeUnpack {
                    path: relative.to_path_buf(),
                    reason: "entry would replace an existing directory",
                });
            }
            Some(_) => fs::remove_file(target).map_err(|e| Error::ExtractionFailed {
                path: target.to_path_buf(),
                source: e,
            })?,
            None => {}
        }

        if let Some(parent) = target.parent()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn set_file_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let executable = mode.is_some_and(|m| m & 0o111 != 0);
    let perms = fs::Permissions::from_mode(if executable { 0o755 } else { 0o644 });
    fs::set_permissions(path, perms).map_err(|e| Error::ExtractionFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let result = std::os::windows::fs::symlink_file(target, link);

    result.map_err(|e| Error::SymlinkCreationFailed {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn offset_reader_rebases_positions() {
        let data = b"JUNKhello".to_vec();
        let mut reader = OffsetReader::new(Cursor::new(data), 4).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "hello");
        assert_eq!(reader.seek(SeekFrom::Start(1)).unwrap(), 1);
        assert_eq!(reader.seek(SeekFrom::End(0)).unwrap(), 5);
        assert!(reader.seek(SeekFrom::Current(-10)).is_err());
    }

    #[test]
    fn unknown_type_without_hint() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack_archive_over(
            "http://example.com/download",
            Cursor::new(Vec::new()),
            dir.path(),
            &UnpackOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownType { .. }));
    }

    #[test]
    fn unsupported_explicit_type() {
        let dir = tempfile::tempdir().unwrap();
        let err = unpack_archive_over(
            "http://example.com/a.deb",
            Cursor::new(Vec::new()),
            dir.path(),
            &UnpackOptions::new().mime_type("application/x-deb"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedType { .. }));
    }
}
