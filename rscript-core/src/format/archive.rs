//! The engine's flat chunk-table archive.
//!
//! Layout: a 12-byte header (magic, chunk-table byte size, entry count),
//! then `count` fixed 40-byte entries (32-byte NUL-padded name, offset,
//! size). Sub-file data is stored contiguously after the table; entry
//! offsets are relative to the table end. Extraction only; repacking an
//! archive is out of scope.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use byteorder::{LittleEndian, ReadBytesExt};
use thiserror::Error;

pub const ARCHIVE_MAGIC: u32 = 0x0001_424c;

const HEADER_SIZE: usize = 12;
const ENTRY_SIZE: usize = 40;
const NAME_SIZE: usize = 32;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive read: {0}")]
    Io(#[from] std::io::Error),
    #[error("chunk table truncated: need {need} bytes, have {have}")]
    TruncatedTable { need: usize, have: usize },
    #[error("entry {name:?} data [{start:#x}, {end:#x}) out of bounds (archive is {len:#x} bytes)")]
    EntryOutOfBounds {
        name: String,
        start: usize,
        end: usize,
        len: usize,
    },
}

#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub name: String,
    /// Relative to the end of the chunk table.
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug)]
pub struct Archive {
    bytes: Vec<u8>,
    entries: Vec<ArchiveEntry>,
    /// Absolute offset the entry offsets are relative to.
    post_offset: usize,
}

impl Archive {
    pub fn parse(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        let mut rdr = Cursor::new(bytes.as_slice());
        let magic = rdr.read_u32::<LittleEndian>()?;
        let table_size = rdr.read_u32::<LittleEndian>()? as usize;
        let count = rdr.read_u32::<LittleEndian>()? as usize;

        // Some shipped archives carry a different magic; treat it as a
        // warning, not a failure.
        if magic != ARCHIVE_MAGIC {
            log::warn!(
                "unexpected archive magic {:#010x} (expected {:#010x})",
                magic,
                ARCHIVE_MAGIC
            );
        }

        let need = count
            .checked_mul(ENTRY_SIZE)
            .filter(|&need| need <= table_size)
            .ok_or(ArchiveError::TruncatedTable {
                need: count.saturating_mul(ENTRY_SIZE),
                have: table_size,
            })?;
        let have = bytes.len().saturating_sub(HEADER_SIZE);
        if table_size > have {
            return Err(ArchiveError::TruncatedTable { need, have });
        }

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let mut name = [0u8; NAME_SIZE];
            rdr.read_exact(&mut name)?;
            let offset = rdr.read_u32::<LittleEndian>()?;
            let size = rdr.read_u32::<LittleEndian>()?;
            let name_len = name.iter().position(|&b| b == 0).unwrap_or(NAME_SIZE);
            entries.push(ArchiveEntry {
                name: String::from_utf8_lossy(&name[..name_len]).into_owned(),
                offset,
                size,
            });
        }

        Ok(Self {
            bytes,
            entries,
            post_offset: HEADER_SIZE + table_size,
        })
    }

    #[inline]
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// The raw bytes of one sub-file.
    pub fn data(&self, entry: &ArchiveEntry) -> Result<&[u8], ArchiveError> {
        let start = self.post_offset + entry.offset as usize;
        let end = start + entry.size as usize;
        if end > self.bytes.len() {
            return Err(ArchiveError::EntryOutOfBounds {
                name: entry.name.clone(),
                start,
                end,
                len: self.bytes.len(),
            });
        }
        Ok(&self.bytes[start..end])
    }

    /// Extract every sub-file under `out_dir`, creating parent directories
    /// as needed. A failing entry is reported and skipped; the rest of the
    /// archive still extracts. Returns the number of files written.
    pub fn extract_all(&self, out_dir: &Path) -> usize {
        let mut written = 0;
        for entry in &self.entries {
            match self.extract_entry(entry, out_dir) {
                Ok(path) => {
                    log::info!("extracted {} ({} bytes)", path.display(), entry.size);
                    written += 1;
                }
                Err(err) => log::error!("failed to extract {:?}: {:#}", entry.name, err),
            }
        }
        written
    }

    fn extract_entry(&self, entry: &ArchiveEntry, out_dir: &Path) -> anyhow::Result<PathBuf> {
        let data = self.data(entry)?;
        let dest = out_dir.join(&entry.name);
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        std::fs::write(&dest, data).with_context(|| format!("write {}", dest.display()))?;
        Ok(dest)
    }
}
