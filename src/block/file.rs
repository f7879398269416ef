//! File-backed block device for reading disk images

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::{BlockDevice, FatError};

/// Block device reading sectors straight from a disk-image file
pub struct FileBlockDevice {
    /// Open image file
    file: File,

    /// Size of each block in bytes
    block_size: usize,

    /// Number of whole blocks in the image
    total_blocks: u64,
}

impl FileBlockDevice {
    /// Opens a disk image for sector reads. A trailing partial block is
    /// not addressable.
    pub fn open<P: AsRef<Path>>(path: P, block_size: usize) -> Result<Self, FatError> {
        if block_size == 0 {
            return Err(FatError::Io);
        }
        let file = File::open(path).map_err(|_| FatError::Io)?;
        let len = file.metadata().map_err(|_| FatError::Io)?.len();
        Ok(Self {
            file,
            block_size,
            total_blocks: len / block_size as u64,
        })
    }
}

impl BlockDevice for FileBlockDevice {
    /// Reads block into buffer
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FatError> {
        if buf.len() != self.block_size || block_num >= self.total_blocks {
            return Err(FatError::Io);
        }
        self.file
            .seek(SeekFrom::Start(block_num * self.block_size as u64))
            .map_err(|_| FatError::Io)?;
        self.file.read_exact(buf).map_err(|_| FatError::Io)?;
        Ok(())
    }

    /// Returns size of each block
    fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns total number of blocks
    fn total_blocks(&self) -> u64 {
        self.total_blocks
    }
}
