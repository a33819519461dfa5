//! Index blocks: one sector linking up to 127 data sectors into a file.
//!
//! Layout of one index block (little-endian):
//!
//! ```text
//! 0..4      next index-block sector, 0xFFFFFFFF terminates the chain
//! 4..512    127 data-sector numbers; a zero entry ends the list
//! ```
//!
//! Sector 0 always holds the superblock, so zero is free to act as the
//! in-block list terminator.

use byteorder::{ByteOrder, LittleEndian};

use crate::{NO_BLOCK, SECTOR_SIZE};

/// Data-sector slots per index block.
pub(crate) const ENTRIES_PER_BLOCK: usize = (SECTOR_SIZE - 4) / 4;

/// Decoded index block.
#[derive(Debug, Clone)]
pub(crate) struct IndexBlock {
    pub next: u32,
    pub sectors: [u32; ENTRIES_PER_BLOCK],
}

impl IndexBlock {
    /// Build a terminal block from a slice of at most 127 data sectors.
    pub fn from_sectors(data: &[u32]) -> Self {
        debug_assert!(data.len() <= ENTRIES_PER_BLOCK);
        let mut sectors = [0u32; ENTRIES_PER_BLOCK];
        sectors[..data.len()].copy_from_slice(data);
        Self {
            next: NO_BLOCK,
            sectors,
        }
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut sectors = [0u32; ENTRIES_PER_BLOCK];
        LittleEndian::read_u32_into(&buf[4..SECTOR_SIZE], &mut sectors);
        Self {
            next: LittleEndian::read_u32(&buf[0..4]),
            sectors,
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        LittleEndian::write_u32(&mut out[0..4], self.next);
        LittleEndian::write_u32_into(&self.sectors, &mut out[4..SECTOR_SIZE]);
    }

    /// The block's data sectors, up to the first zero entry.
    pub fn data_sectors(&self) -> impl Iterator<Item = u32> + '_ {
        self.sectors.iter().copied().take_while(|&s| s != 0)
    }
}
