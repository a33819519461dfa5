//! Block devices used by the integration suites.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::{Arc, Mutex};

use fab_fs::{BlockDevice, SECTOR_SIZE};

/// Sectors of an 8 MiB device, the smallest supported geometry.
pub const SMALL_DEVICE_SECTORS: u32 = (8 * 1024 * 1024 / SECTOR_SIZE) as u32;

/// In-memory device. Clones share the same storage, so a device handed to
/// `FileSystem::mount` can be "re-inserted" later from a clone.
#[derive(Clone)]
pub struct MemDevice {
    sectors: u32,
    data: Arc<Mutex<Vec<u8>>>,
}

impl MemDevice {
    pub fn new(sectors: u32) -> Self {
        Self {
            sectors,
            data: Arc::new(Mutex::new(vec![0; sectors as usize * SECTOR_SIZE])),
        }
    }
}

impl BlockDevice for MemDevice {
    fn sector_count(&self) -> u32 {
        self.sectors
    }

    fn read_sectors(&mut self, sector: u32, buf: &mut [u8]) -> usize {
        let n = buf.len() / SECTOR_SIZE;
        let start = sector as usize * SECTOR_SIZE;
        let end = start + n * SECTOR_SIZE;
        let data = self.data.lock().unwrap();
        if end > data.len() {
            return 0;
        }
        buf[..n * SECTOR_SIZE].copy_from_slice(&data[start..end]);
        n
    }

    fn write_sectors(&mut self, sector: u32, buf: &[u8]) -> usize {
        let n = buf.len() / SECTOR_SIZE;
        let start = sector as usize * SECTOR_SIZE;
        let end = start + n * SECTOR_SIZE;
        let mut data = self.data.lock().unwrap();
        if end > data.len() {
            return 0;
        }
        data[start..end].copy_from_slice(&buf[..n * SECTOR_SIZE]);
        n
    }
}

/// Fault-injection wrapper: passes through `ops_before_failure` sector
/// transfers, then fails every one after that.
pub struct FlakyDevice<D> {
    inner: D,
    ops_left: usize,
}

impl<D> FlakyDevice<D> {
    pub fn new(inner: D, ops_before_failure: usize) -> Self {
        Self {
            inner,
            ops_left: ops_before_failure,
        }
    }

    fn tick(&mut self) -> bool {
        if self.ops_left == 0 {
            return false;
        }
        self.ops_left -= 1;
        true
    }
}

impl<D: BlockDevice> BlockDevice for FlakyDevice<D> {
    fn sector_count(&self) -> u32 {
        self.inner.sector_count()
    }

    fn read_sectors(&mut self, sector: u32, buf: &mut [u8]) -> usize {
        if !self.tick() {
            return 0;
        }
        self.inner.read_sectors(sector, buf)
    }

    fn write_sectors(&mut self, sector: u32, buf: &[u8]) -> usize {
        if !self.tick() {
            return 0;
        }
        self.inner.write_sectors(sector, buf)
    }
}

/// Device backed by a real file, for persistence tests across re-opens.
pub struct FileDevice {
    file: File,
    sectors: u32,
}

impl FileDevice {
    pub fn new(file: File, sectors: u32) -> std::io::Result<Self> {
        file.set_len(sectors as u64 * SECTOR_SIZE as u64)?;
        Ok(Self { file, sectors })
    }
}

impl BlockDevice for FileDevice {
    fn sector_count(&self) -> u32 {
        self.sectors
    }

    fn read_sectors(&mut self, sector: u32, buf: &mut [u8]) -> usize {
        let n = buf.len() / SECTOR_SIZE;
        let offset = sector as u64 * SECTOR_SIZE as u64;
        if self.file.seek(SeekFrom::Start(offset)).is_err() {
            return 0;
        }
        match self.file.read_exact(&mut buf[..n * SECTOR_SIZE]) {
            Ok(()) => n,
            Err(_) => 0,
        }
    }

    fn write_sectors(&mut self, sector: u32, buf: &[u8]) -> usize {
        let n = buf.len() / SECTOR_SIZE;
        let offset = sector as u64 * SECTOR_SIZE as u64;
        if self.file.seek(SeekFrom::Start(offset)).is_err() {
            return 0;
        }
        match self.file.write_all(&buf[..n * SECTOR_SIZE]) {
            Ok(()) => n,
            Err(_) => 0,
        }
    }
}
