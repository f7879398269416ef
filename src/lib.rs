//! FAT12/16 disk-image codec and read-only volume reader.
//!
//! The on-disk structures of the FAT family (the boot sector's BIOS
//! Parameter Block, 32-byte 8.3 directory entries and the packed DOS time
//! and date fields) decoded from and encoded to their byte-exact
//! little-endian wire form, plus a small read-only volume layer that
//! mounts a disk image and reads its directories and files by following
//! FAT12/16 cluster chains.
//!
//! The codecs are pure functions over fixed-size buffers and perform no
//! I/O of their own; sectors reach them through the [`BlockDevice`] trait.

use std::fmt;

pub mod block;
pub mod fat;
pub mod logging;

pub use fat::{BootSector, DirEntry83, DosDate, EntryKind, FatEntry, FatKind, Timestamp, Volume};

/// Errors returned by the codecs and the volume reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatError {
    /// Buffer length does not match the fixed record size.
    InvalidLength { expected: usize, found: usize },
    /// Boot sector does not end with the 0xAA55 marker.
    InvalidSignature { found: u16 },
    /// A geometry field holds a value outside its allowed set.
    InvalidGeometry { field: &'static str, value: u32 },
    /// A packed time component is out of range.
    InvalidTime { field: &'static str, value: u16 },
    /// The device could not satisfy a read, or an on-disk structure points
    /// outside the image.
    Io,
    /// No directory entry with the requested name.
    NotFound,
    /// A path component resolved to a file where a directory was needed.
    NotADirectory,
    /// The entry is a directory where a file was needed.
    IsADirectory,
}

impl fmt::Display for FatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatError::InvalidLength { expected, found } => {
                write!(f, "buffer is {} bytes, expected exactly {}", found, expected)
            }
            FatError::InvalidSignature { found } => {
                write!(f, "boot signature is {:#06x}, expected 0xaa55", found)
            }
            FatError::InvalidGeometry { field, value } => {
                write!(f, "{} holds invalid value {}", field, value)
            }
            FatError::InvalidTime { field, value } => {
                write!(f, "{} out of range in packed value {:#06x}", field, value)
            }
            FatError::Io => write!(f, "read failed or ran outside the image"),
            FatError::NotFound => write!(f, "no such entry"),
            FatError::NotADirectory => write!(f, "not a directory"),
            FatError::IsADirectory => write!(f, "is a directory"),
        }
    }
}

impl std::error::Error for FatError {}

/// A source of fixed-size blocks, typically a disk image.
///
/// The volume layer addresses blocks as FAT sectors, so implementations
/// should present the volume's logical sector size as their block size.
pub trait BlockDevice: Send + Sync {
    /// Reads one block into `buf`, which must be exactly `block_size` long.
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FatError>;

    /// Size of each block in bytes.
    fn block_size(&self) -> usize;

    /// Total number of blocks on the device.
    fn total_blocks(&self) -> u64;
}
