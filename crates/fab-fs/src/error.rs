//! Typed failures of the filesystem's structural operations.

use thiserror::Error;

/// Errors surfaced by format, mount, unmount and the name-based operations.
///
/// The data path (`read`/`write`) does not use this type; it reports device
/// trouble as short byte counts instead.
#[derive(Debug, Error)]
pub enum FsError {
    /// Device sector count outside the supported 8 MiB to 1 GiB range.
    #[error("unsupported device geometry: {sectors} sectors")]
    InvalidGeometry { sectors: u32 },

    /// Superblock magic did not match; the device holds no filesystem.
    #[error("superblock magic mismatch")]
    BadMagic,

    /// A device read transferred fewer sectors than requested.
    #[error("device read failed at sector {0}")]
    DeviceRead(u32),

    /// A device write transferred fewer sectors than requested.
    #[error("device write failed at sector {0}")]
    DeviceWrite(u32),

    /// Name lookup failed.
    #[error("no such file: {0:?}")]
    NotFound(String),

    /// All 128 directory slots are in use.
    #[error("directory is full")]
    DirectoryFull,

    /// All 8 open-file slots are in use.
    #[error("too many open files")]
    TooManyOpenFiles,

    /// The descriptor does not refer to an open file.
    #[error("invalid file descriptor {0}")]
    BadDescriptor(usize),

    /// File names must be 1 to 28 bytes.
    #[error("invalid file name")]
    InvalidName,

    /// The allocator found no free sector.
    #[error("device is full")]
    NoSpace,
}
