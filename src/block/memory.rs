//! In-memory block device implementation

use crate::{BlockDevice, FatError};

/// Block device serving sectors out of a disk image held in memory
pub struct MemoryBlockDevice {
    /// Raw image bytes
    image: Vec<u8>,

    /// Size of each block in bytes
    block_size: usize,
}

impl MemoryBlockDevice {
    /// Wraps a whole disk image. The image length must be a nonzero
    /// multiple of the block size.
    pub fn from_image(image: Vec<u8>, block_size: usize) -> Result<Self, FatError> {
        if block_size == 0 || image.is_empty() || image.len() % block_size != 0 {
            return Err(FatError::Io);
        }
        Ok(Self { image, block_size })
    }
}

impl BlockDevice for MemoryBlockDevice {
    /// Reads block into buffer
    fn read_block(&mut self, block_num: u64, buf: &mut [u8]) -> Result<(), FatError> {
        if buf.len() != self.block_size {
            return Err(FatError::Io);
        }
        let start = block_num as usize * self.block_size;
        let end = start + self.block_size;
        if end > self.image.len() {
            return Err(FatError::Io);
        }
        buf.copy_from_slice(&self.image[start..end]);
        Ok(())
    }

    /// Returns size of each block
    fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns total number of blocks
    fn total_blocks(&self) -> u64 {
        (self.image.len() / self.block_size) as u64
    }
}
