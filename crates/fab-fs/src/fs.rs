//! Mounted-filesystem state and the public operations.

use tracing::debug;

use crate::bitmap::SectorBitmap;
use crate::directory::{clip_name, FileEntry, FileInfo, DIR_RECORD_SIZE, RECORDS_PER_SECTOR};
use crate::index::{IndexBlock, ENTRIES_PER_BLOCK};
use crate::layout::Layout;
use crate::{BlockDevice, FsError, DIR_ENTRIES_MAX, NO_BLOCK, OPEN_FILES_MAX, SECTOR_SIZE};

/// One open-file slot: which directory entry, where the cursor is, and
/// whether writes are allowed.
#[derive(Debug, Clone, Copy)]
struct OpenFile {
    slot: usize,
    cursor: u64,
    write_mode: bool,
}

/// A mounted filesystem over one block device.
///
/// Single-threaded by contract: at most one filesystem is mounted on a
/// device at a time, and all calls come from one thread. [`Self::unmount`]
/// consumes the value and hands the device back, so no operation can follow
/// an unmount.
pub struct FileSystem<D: BlockDevice> {
    device: D,
    layout: Layout,
    bitmap: SectorBitmap,
    files: Vec<FileEntry>,
    open_files: [Option<OpenFile>; OPEN_FILES_MAX],
    scan_position: usize,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Write an empty filesystem onto the device.
    ///
    /// Fails on out-of-range geometry or any device write failure. The
    /// device is left with a valid superblock, an empty directory, and a
    /// bitmap claiming exactly the metadata sectors.
    pub fn format(device: &mut D) -> Result<(), FsError> {
        let layout = Layout::for_device(device.sector_count())?;
        let mut bitmap = SectorBitmap::new(layout.sector_count);
        for sector in 0..layout.data_start() {
            bitmap.mark_used(sector);
        }

        let mut sector_buf = [0u8; SECTOR_SIZE];
        layout.encode_superblock(&mut sector_buf);
        write_sector(device, 0, &sector_buf)?;

        let empty = FileEntry::default();
        for sec in 0..layout.dir_sectors {
            sector_buf.fill(0);
            for rec in 0..RECORDS_PER_SECTOR {
                if sec as usize * RECORDS_PER_SECTOR + rec >= DIR_ENTRIES_MAX {
                    break;
                }
                let off = rec * DIR_RECORD_SIZE;
                empty.encode_record(NO_BLOCK, &mut sector_buf[off..off + DIR_RECORD_SIZE]);
            }
            write_sector(device, 1 + sec, &sector_buf)?;
        }

        for i in 0..layout.bitmap_sectors {
            bitmap.encode_sector(i, &mut sector_buf);
            write_sector(device, layout.bitmap_start() + i, &sector_buf)?;
        }

        debug!(
            "formatted filesystem: {} sectors, data region starts at {}",
            layout.sector_count,
            layout.data_start()
        );
        Ok(())
    }

    /// Mount a previously formatted device.
    ///
    /// Rebuilds every file's data-sector list by walking its index-block
    /// chain, ORs the persisted bitmap in, then releases the chain sectors
    /// themselves: chains live only between unmount and the next mount,
    /// and fresh ones are allocated when this filesystem is unmounted.
    pub fn mount(mut device: D) -> Result<Self, FsError> {
        let mut sector_buf = [0u8; SECTOR_SIZE];
        read_sector(&mut device, 0, &mut sector_buf)?;
        let layout = Layout::decode_superblock(device.sector_count(), &sector_buf)?;

        let mut bitmap = SectorBitmap::new(layout.sector_count);
        let mut files: Vec<FileEntry> = Vec::with_capacity(DIR_ENTRIES_MAX);
        let mut chain_sectors: Vec<u32> = Vec::new();

        for sec in 0..layout.dir_sectors {
            read_sector(&mut device, 1 + sec, &mut sector_buf)?;
            for rec in 0..RECORDS_PER_SECTOR {
                if files.len() >= DIR_ENTRIES_MAX {
                    break;
                }
                let off = rec * DIR_RECORD_SIZE;
                let mut entry =
                    FileEntry::decode_record(&sector_buf[off..off + DIR_RECORD_SIZE]);

                let mut block_sector = entry.head_index_block;
                let mut block_buf = [0u8; SECTOR_SIZE];
                while entry.used && block_sector != NO_BLOCK {
                    chain_sectors.push(block_sector);
                    read_sector(&mut device, block_sector, &mut block_buf)?;
                    let block = IndexBlock::decode(&block_buf);
                    for data_sector in block.data_sectors() {
                        bitmap.mark_used(data_sector);
                        entry.sectors.push(data_sector);
                    }
                    block_sector = block.next;
                }
                // The chain is now fully represented by the sector list.
                entry.head_index_block = NO_BLOCK;
                files.push(entry);
            }
        }

        for i in 0..layout.bitmap_sectors {
            read_sector(&mut device, layout.bitmap_start() + i, &mut sector_buf)?;
            bitmap.or_encoded_sector(i, &sector_buf);
        }
        for sector in chain_sectors {
            bitmap.release(sector);
        }
        for sector in 0..layout.data_start() {
            bitmap.mark_used(sector);
        }
        bitmap.set_hint(layout.data_start());

        debug!(
            "mounted filesystem: {} sectors, {} files",
            layout.sector_count,
            files.iter().filter(|f| f.used).count()
        );
        Ok(Self {
            device,
            layout,
            bitmap,
            files,
            open_files: [None; OPEN_FILES_MAX],
            scan_position: 0,
        })
    }

    /// Persist all state and give the device back.
    ///
    /// Open files are closed first so their cursors settle into sizes.
    /// Each used file gets a freshly allocated index-block chain. Fails iff
    /// any device write fails.
    pub fn unmount(mut self) -> Result<D, FsError> {
        for fd in 0..OPEN_FILES_MAX {
            if self.open_files[fd].is_some() {
                let _ = self.close(fd);
            }
        }

        let mut sector_buf = [0u8; SECTOR_SIZE];
        self.layout.encode_superblock(&mut sector_buf);
        write_sector(&mut self.device, 0, &sector_buf)?;

        let mut heads = [NO_BLOCK; DIR_ENTRIES_MAX];
        for i in 0..DIR_ENTRIES_MAX {
            if self.files[i].used {
                heads[i] =
                    write_chain(&mut self.device, &mut self.bitmap, &self.files[i].sectors)?;
            }
        }

        for sec in 0..self.layout.dir_sectors {
            sector_buf.fill(0);
            for rec in 0..RECORDS_PER_SECTOR {
                let fi = sec as usize * RECORDS_PER_SECTOR + rec;
                if fi >= DIR_ENTRIES_MAX {
                    break;
                }
                let off = rec * DIR_RECORD_SIZE;
                self.files[fi]
                    .encode_record(heads[fi], &mut sector_buf[off..off + DIR_RECORD_SIZE]);
            }
            write_sector(&mut self.device, 1 + sec, &sector_buf)?;
        }

        for i in 0..self.layout.bitmap_sectors {
            self.bitmap.encode_sector(i, &mut sector_buf);
            write_sector(&mut self.device, self.layout.bitmap_start() + i, &sector_buf)?;
        }

        debug!("unmounted filesystem");
        Ok(self.device)
    }

    /// Open a file and return its descriptor.
    ///
    /// Read mode requires the file to exist. Write mode creates a missing
    /// file, and **truncates** an existing one: its data sectors are
    /// released and its size reset before the descriptor is handed out.
    /// Names longer than 28 bytes are clipped.
    pub fn open(&mut self, name: &str, write_mode: bool) -> Result<usize, FsError> {
        if name.is_empty() {
            return Err(FsError::InvalidName);
        }
        let name = clip_name(name);

        let existing = self.find_slot(&name);
        let (slot, created) = match (existing, write_mode) {
            (Some(slot), _) => (slot, false),
            (None, false) => return Err(FsError::NotFound(name)),
            (None, true) => {
                let slot = self
                    .files
                    .iter()
                    .position(|f| !f.used)
                    .ok_or(FsError::DirectoryFull)?;
                let entry = &mut self.files[slot];
                entry.clear();
                entry.used = true;
                entry.name = name;
                (slot, true)
            }
        };

        if write_mode && !created {
            let sectors = std::mem::take(&mut self.files[slot].sectors);
            for sector in sectors {
                self.bitmap.release(sector);
            }
            self.files[slot].size = 0;
            self.files[slot].head_index_block = NO_BLOCK;
        }

        match self.open_files.iter().position(Option::is_none) {
            Some(fd) => {
                self.open_files[fd] = Some(OpenFile {
                    slot,
                    cursor: 0,
                    write_mode,
                });
                Ok(fd)
            }
            None => {
                if created {
                    self.files[slot].clear();
                }
                Err(FsError::TooManyOpenFiles)
            }
        }
    }

    /// Close a descriptor. The file's size grows to the cursor if writes
    /// moved it past the old end.
    pub fn close(&mut self, fd: usize) -> Result<(), FsError> {
        let open = self
            .open_files
            .get_mut(fd)
            .ok_or(FsError::BadDescriptor(fd))?
            .take()
            .ok_or(FsError::BadDescriptor(fd))?;

        let entry = &mut self.files[open.slot];
        if open.cursor > entry.size {
            entry.size = open.cursor;
        }
        Ok(())
    }

    /// Read from the cursor into `buf`.
    ///
    /// Returns the byte count actually read: at most `buf.len()`, clamped
    /// to the bytes left before end-of-file, and short if the device fails
    /// mid-transfer. A closed or unknown descriptor reads zero bytes.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> usize {
        let mut open = match self.open_files.get(fd).copied().flatten() {
            Some(open) => open,
            None => return 0,
        };
        let entry = &self.files[open.slot];

        let mut to_read =
            (buf.len() as u64).min(entry.size.saturating_sub(open.cursor)) as usize;
        let mut total = 0;
        let mut sector_buf = [0u8; SECTOR_SIZE];

        while to_read > 0 {
            let sector_idx = (open.cursor / SECTOR_SIZE as u64) as usize;
            if sector_idx >= entry.sectors.len() {
                break;
            }
            let offset = (open.cursor % SECTOR_SIZE as u64) as usize;
            if read_sector(&mut self.device, entry.sectors[sector_idx], &mut sector_buf)
                .is_err()
            {
                break;
            }
            let n = (SECTOR_SIZE - offset).min(to_read);
            buf[total..total + n].copy_from_slice(&sector_buf[offset..offset + n]);
            open.cursor += n as u64;
            total += n;
            to_read -= n;
        }

        self.open_files[fd] = Some(open);
        total
    }

    /// Write `buf` at the cursor.
    ///
    /// Grows the file by allocating data sectors as the cursor crosses the
    /// current end. Unaligned or short spans read-modify-write their
    /// sector; aligned full-sector spans overwrite it directly. Returns the
    /// byte count actually written, short on allocation or device failure.
    /// A descriptor not open for writing writes zero bytes.
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> usize {
        let mut open = match self.open_files.get(fd).copied().flatten() {
            Some(open) if open.write_mode => open,
            _ => return 0,
        };

        let mut total = 0;
        let mut sector_buf = [0u8; SECTOR_SIZE];

        while total < buf.len() {
            let sector_idx = (open.cursor / SECTOR_SIZE as u64) as usize;
            let offset = (open.cursor % SECTOR_SIZE as u64) as usize;

            if sector_idx >= self.files[open.slot].sectors.len() {
                match self.bitmap.allocate() {
                    Some(sector) => self.files[open.slot].sectors.push(sector),
                    None => break,
                }
                continue;
            }

            let phys = self.files[open.slot].sectors[sector_idx];
            let remaining = buf.len() - total;
            let partial = offset != 0 || remaining < SECTOR_SIZE;
            if partial
                && read_sector(&mut self.device, phys, &mut sector_buf).is_err()
            {
                break;
            }

            let n = (SECTOR_SIZE - offset).min(remaining);
            sector_buf[offset..offset + n].copy_from_slice(&buf[total..total + n]);
            if write_sector(&mut self.device, phys, &sector_buf).is_err() {
                break;
            }
            open.cursor += n as u64;
            total += n;
        }

        let entry = &mut self.files[open.slot];
        if open.cursor > entry.size {
            entry.size = open.cursor;
        }
        self.open_files[fd] = Some(open);
        total
    }

    /// Remove a file and release its data sectors.
    ///
    /// Invalidates any directory scan in progress; `find_first` restarts
    /// one.
    pub fn delete(&mut self, name: &str) -> Result<(), FsError> {
        let slot = self
            .find_slot(name)
            .ok_or_else(|| FsError::NotFound(name.to_string()))?;

        let sectors = std::mem::take(&mut self.files[slot].sectors);
        for sector in sectors {
            self.bitmap.release(sector);
        }
        self.files[slot].clear();
        self.scan_position = DIR_ENTRIES_MAX;
        Ok(())
    }

    /// Size of the named file, `None` when it does not exist.
    pub fn file_size(&self, name: &str) -> Option<u64> {
        self.find_slot(name).map(|slot| self.files[slot].size)
    }

    /// Start a directory scan and yield the first used entry.
    pub fn find_first(&mut self) -> Option<FileInfo> {
        self.scan_position = 0;
        self.find_next()
    }

    /// Yield the next used entry of the scan started by [`Self::find_first`],
    /// in slot order.
    pub fn find_next(&mut self) -> Option<FileInfo> {
        while self.scan_position < DIR_ENTRIES_MAX {
            let entry = &self.files[self.scan_position];
            self.scan_position += 1;
            if entry.used {
                return Some(FileInfo {
                    name: entry.name.clone(),
                    size: entry.size,
                });
            }
        }
        None
    }

    fn find_slot(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|f| f.used && f.name == name)
    }
}

/// Persist one file's data-sector list as a fresh index-block chain.
///
/// All chain sectors are allocated up front so each block can be written
/// once with its final `next` link. Returns the head sector, [`NO_BLOCK`]
/// for an empty file.
fn write_chain<D: BlockDevice>(
    device: &mut D,
    bitmap: &mut SectorBitmap,
    data_sectors: &[u32],
) -> Result<u32, FsError> {
    if data_sectors.is_empty() {
        return Ok(NO_BLOCK);
    }

    let chunks: Vec<&[u32]> = data_sectors.chunks(ENTRIES_PER_BLOCK).collect();
    let mut block_sectors = Vec::with_capacity(chunks.len());
    for _ in &chunks {
        block_sectors.push(bitmap.allocate().ok_or(FsError::NoSpace)?);
    }

    let mut buf = [0u8; SECTOR_SIZE];
    for (i, chunk) in chunks.iter().enumerate() {
        let mut block = IndexBlock::from_sectors(chunk);
        if i + 1 < block_sectors.len() {
            block.next = block_sectors[i + 1];
        }
        block.encode(&mut buf);
        write_sector(device, block_sectors[i], &buf)?;
    }
    Ok(block_sectors[0])
}

fn read_sector<D: BlockDevice>(
    device: &mut D,
    sector: u32,
    buf: &mut [u8],
) -> Result<(), FsError> {
    if device.read_sectors(sector, buf) == 1 {
        Ok(())
    } else {
        Err(FsError::DeviceRead(sector))
    }
}

fn write_sector<D: BlockDevice>(
    device: &mut D,
    sector: u32,
    buf: &[u8],
) -> Result<(), FsError> {
    if device.write_sectors(sector, buf) == 1 {
        Ok(())
    } else {
        Err(FsError::DeviceWrite(sector))
    }
}
