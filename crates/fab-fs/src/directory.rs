//! Directory records: the fixed 128-entry file table and its on-disk codec.
//!
//! Each record is 38 packed bytes, little-endian:
//!
//! ```text
//! 0..29   name, NUL-terminated (at most 28 name bytes)
//! 29..33  size: u32            (0xFFFFFFFF = size sentinel)
//! 33..37  head index block: u32 (0xFFFFFFFF = none)
//! 37      used flag: u8
//! ```
//!
//! 13 records fit in a sector; the trailing 18 bytes stay zero. Ten
//! directory sectors cover the 128-entry table.

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::{DIR_ENTRIES_MAX, FILENAME_LEN_MAX, NO_BLOCK};

pub(crate) const DIR_RECORD_SIZE: usize = 38;
pub(crate) const RECORDS_PER_SECTOR: usize = crate::SECTOR_SIZE / DIR_RECORD_SIZE;
pub(crate) const DIR_SECTORS: u32 =
    DIR_ENTRIES_MAX.div_ceil(RECORDS_PER_SECTOR) as u32;

/// On-disk size field sentinel for sizes that do not fit in 32 bits.
const SIZE_SENTINEL: u32 = 0xFFFF_FFFF;

/// One directory slot, as kept in memory while mounted.
///
/// `sectors` is the file's data-sector list in file order; it is rebuilt
/// from the index-block chain at mount and re-persisted as a fresh chain at
/// unmount.
#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub name: String,
    pub size: u64,
    pub sectors: Vec<u32>,
    pub head_index_block: u32,
    pub used: bool,
}

impl Default for FileEntry {
    fn default() -> Self {
        FileEntry {
            name: String::new(),
            size: 0,
            sectors: Vec::new(),
            head_index_block: NO_BLOCK,
            used: false,
        }
    }
}

impl FileEntry {
    pub fn clear(&mut self) {
        *self = FileEntry::default();
    }

    /// Encode into one 38-byte directory record.
    ///
    /// `head` is passed in rather than taken from the entry because unmount
    /// assigns chain heads while it writes.
    pub fn encode_record(&self, head: u32, out: &mut [u8]) {
        out[..DIR_RECORD_SIZE].fill(0);
        if !self.used {
            LittleEndian::write_u32(&mut out[33..37], NO_BLOCK);
            return;
        }
        let name = self.name.as_bytes();
        let n = name.len().min(FILENAME_LEN_MAX);
        out[..n].copy_from_slice(&name[..n]);

        let size = if self.size > u64::from(SIZE_SENTINEL) {
            SIZE_SENTINEL
        } else {
            self.size as u32
        };
        LittleEndian::write_u32(&mut out[29..33], size);
        LittleEndian::write_u32(&mut out[33..37], head);
        out[37] = 1;
    }

    /// Decode one record. The sector list stays empty; mount fills it by
    /// walking the index-block chain.
    pub fn decode_record(buf: &[u8]) -> Self {
        if buf[37] == 0 {
            return FileEntry::default();
        }
        let name_len = buf[..FILENAME_LEN_MAX + 1]
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(FILENAME_LEN_MAX + 1);
        let size = LittleEndian::read_u32(&buf[29..33]);
        FileEntry {
            name: String::from_utf8_lossy(&buf[..name_len]).into_owned(),
            size: if size == SIZE_SENTINEL {
                u64::MAX
            } else {
                u64::from(size)
            },
            sectors: Vec::new(),
            head_index_block: LittleEndian::read_u32(&buf[33..37]),
            used: true,
        }
    }
}

/// A directory listing item, as yielded by `find_first`/`find_next`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub size: u64,
}

/// Clip a file name to the 28-byte on-disk limit, respecting character
/// boundaries.
pub(crate) fn clip_name(name: &str) -> String {
    if name.len() <= FILENAME_LEN_MAX {
        return name.to_string();
    }
    let mut end = FILENAME_LEN_MAX;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name[..end].to_string()
}
