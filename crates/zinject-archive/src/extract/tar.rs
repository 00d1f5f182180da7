use std::io::Read;

use crate::error::Error;
use crate::extract::{EntrySource, PendingEntry, PendingEntryKind};
use crate::format::{Decoder, TarCompress};
use crate::Result;

pub struct TarSource<R: Read> {
    archive: tar::Archive<Decoder<R>>,
}

impl<R: Read> TarSource<R> {
    pub fn new(reader: R, codec: TarCompress) -> Result<Self> {
        let reader = codec.decoder(reader)?;
        Ok(Self {
            archive: tar::Archive::new(reader),
        })
    }
}

impl<R: Read> EntrySource for TarSource<R> {
    fn for_each_entry(
        &mut self,
        visit: &mut dyn FnMut(PendingEntry<'_>) -> Result<()>,
    ) -> Result<()> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| Error::Corrupted(e.to_string()))?;

        for entry in entries {
            let mut entry = entry.map_err(|e| Error::Corrupted(e.to_string()))?;

            let path = entry
                .path()
                .map_err(|e| Error::InvalidPath(e.to_string()))?
                .into_owned();
            let mode = entry.header().mode().ok();
            let entry_type = entry.header().entry_type();

            let kind = if entry_type.is_dir() {
                PendingEntryKind::Directory
            } else if entry_type.is_symlink() {
                let target = match entry.link_name() {
                    Ok(Some(t)) => t.into_owned(),
                    _ => {
                        return Err(Error::InvalidPath(format!(
                            "symlink '{}' has no target",
                            path.display()
                        )));
                    }
                };
                PendingEntryKind::Symlink { target }
            } else if entry_type.is_hard_link() {
                let target = match entry.link_name() {
                    Ok(Some(t)) => t.into_owned(),
                    _ => {
                        return Err(Error::InvalidPath(format!(
                            "hard link '{}' has no target",
                            path.display()
                        )));
                    }
                };
                PendingEntryKind::HardLink { target }
            } else if entry_type.is_file() {
                PendingEntryKind::File(&mut entry)
            } else {
                tracing::debug!(
                    "skipping tar entry '{}' of type {:?}",
                    path.display(),
                    entry_type
                );
                continue;
            };

            visit(PendingEntry { path, mode, kind })?;
        }
        Ok(())
    }
}
