//! # fab-fs: Block-Device Mini Filesystem
//!
//! A single-volume, single-threaded filesystem over a raw sector device.
//! All persistent state lives in 512-byte sectors behind the [`BlockDevice`]
//! trait; everything else is rebuilt in memory at mount time.
//!
//! ## On-disk layout
//!
//! | Sectors | Content |
//! |---------|---------|
//! | 0 | Superblock: magic `"MYFS000\0"`, directory/bitmap sector counts |
//! | 1 .. dir | Directory: 128 fixed 38-byte records, 13 per sector |
//! | next bmp | Allocation bitmap: one byte per device sector |
//! | rest | Data sectors and index blocks, interleaved |
//!
//! A file's data sectors are recorded in a singly linked chain of **index
//! blocks**: each index block is one sector holding a `next` pointer and up
//! to 127 data-sector numbers. The chain is only materialized on unmount;
//! while mounted, each file carries its sector list in memory.
//!
//! ## Limits
//!
//! Device size 8 MiB to 1 GiB, file names 1 to 28 bytes, at most 128 files and
//! 8 simultaneously open handles. There is no seek: a handle's cursor moves
//! only through reads and writes, and opening an existing file for writing
//! truncates it.
//!
//! ## Error surfacing
//!
//! Structural failures (bad magic, full directory, unknown names) are typed
//! [`FsError`] values. Data-path reads and writes instead return the byte
//! count actually transferred; a device failure mid-transfer shows up as a
//! short count, never as a panic.

mod bitmap;
mod device;
mod directory;
mod error;
mod fs;
mod index;
mod layout;

pub use device::BlockDevice;
pub use directory::FileInfo;
pub use error::FsError;
pub use fs::FileSystem;

/// Sector size in bytes. Every device transfer is a whole number of sectors.
pub const SECTOR_SIZE: usize = 512;

/// Maximum file-name length in bytes, excluding the NUL terminator.
pub const FILENAME_LEN_MAX: usize = 28;

/// Capacity of the directory table.
pub const DIR_ENTRIES_MAX: usize = 128;

/// Maximum number of simultaneously open files.
pub const OPEN_FILES_MAX: usize = 8;

/// Smallest supported device, in bytes.
pub const DEVICE_SIZE_MIN: u64 = 8 * 1024 * 1024;

/// Largest supported device, in bytes.
pub const DEVICE_SIZE_MAX: u64 = 1024 * 1024 * 1024;

/// Sentinel sector number: "no block" in directory records and index-block
/// chain links.
pub const NO_BLOCK: u32 = 0xFFFF_FFFF;

pub(crate) const MIN_SECTORS: u32 = (DEVICE_SIZE_MIN / SECTOR_SIZE as u64) as u32;
pub(crate) const MAX_SECTORS: u32 = (DEVICE_SIZE_MAX / SECTOR_SIZE as u64) as u32;
