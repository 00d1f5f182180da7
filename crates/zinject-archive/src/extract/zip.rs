use std::io::{Read, Seek};
use std::path::PathBuf;

use crate::error::Error;
use crate::extract::{EntrySource, PendingEntry, PendingEntryKind};
use crate::Result;

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

pub struct ZipSource<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let archive =
            zip::ZipArchive::new(reader).map_err(|e| Error::Corrupted(e.to_string()))?;
        Ok(Self { archive })
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn for_each_entry(
        &mut self,
        visit: &mut dyn FnMut(PendingEntry<'_>) -> Result<()>,
    ) -> Result<()> {
        for index in 0..self.archive.len() {
            let mut file = self
                .archive
                .by_index(index)
                .map_err(|e| Error::Corrupted(e.to_string()))?;

            let path = PathBuf::from(file.name());
            let mode = file.unix_mode();

            let kind = if file.is_dir() {
                PendingEntryKind::Directory
            } else if mode.is_some_and(|m| m & S_IFMT == S_IFLNK) {
                let mut target = String::new();
                file.read_to_string(&mut target)
                    .map_err(|e| Error::Corrupted(e.to_string()))?;
                PendingEntryKind::Symlink {
                    target: target.into(),
                }
            } else {
                PendingEntryKind::File(&mut file)
            };

            visit(PendingEntry { path, mode, kind })?;
        }
        Ok(())
    }
}
