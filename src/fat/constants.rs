//! FAT on-disk format constants

/// Size of a disk sector in bytes
pub const SECTOR_SIZE: usize = 512;

/// Size of a directory entry slot in bytes
pub const DIR_ENTRY_SIZE: usize = 32;

/// Trailing marker a valid boot sector must carry at offset 510
pub const BOOT_SIGNATURE: u16 = 0xAA55;

/// File attribute: read-only file
pub const ATTR_READ_ONLY: u8 = 0x01;

/// File attribute: hidden file
pub const ATTR_HIDDEN: u8 = 0x02;

/// File attribute: system file
pub const ATTR_SYSTEM: u8 = 0x04;

/// File attribute: volume label pseudo-entry
pub const ATTR_VOLUME_ID: u8 = 0x08;

/// File attribute: subdirectory
pub const ATTR_DIRECTORY: u8 = 0x10;

/// File attribute: archive (modified since backup)
pub const ATTR_ARCHIVE: u8 = 0x20;

/// Attribute value marking a VFAT long-filename entry
pub const ATTR_LONG_NAME: u8 = 0x0F;

/// Marker for deleted directory entries
pub const DELETED_ENTRY_MARKER: u8 = 0xE5;

/// Largest data-cluster count a FAT12 table can address
pub const FAT12_MAX_CLUSTERS: u32 = 4085;

/// End-of-chain threshold for FAT12 entries
pub const FAT12_EOC: u16 = 0x0FF8;

/// End-of-chain threshold for FAT16 entries
pub const FAT16_EOC: u16 = 0xFFF8;
