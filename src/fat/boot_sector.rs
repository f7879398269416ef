//! FAT12/16 boot sector codec

use byteorder::{ByteOrder, LittleEndian};
use log::warn;

use super::constants::{BOOT_SIGNATURE, DIR_ENTRY_SIZE, SECTOR_SIZE};
use crate::FatError;

/// Boot sector of a FAT12/16 volume: the BIOS Parameter Block plus the
/// extended boot record, with every opaque byte region carried verbatim so
/// a decode/encode pass reproduces the sector bit for bit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootSector {
    /// Jump instruction to boot code
    pub jump_boot: [u8; 3],

    /// Name of the system that formatted the volume
    pub oem_name: [u8; 8],

    /// Number of bytes per sector
    pub bytes_per_sector: u16,

    /// Number of sectors per cluster
    pub sectors_per_cluster: u8,

    /// Number of reserved sectors at start of volume, including this one
    pub reserved_sectors: u16,

    /// Number of FAT copies
    pub fat_count: u8,

    /// Maximum number of root directory entries
    pub root_dir_entries: u16,

    /// Total number of sectors (16-bit)
    /// Zero when the volume needs total_sectors_32
    pub total_sectors_16: u16,

    /// Media type descriptor
    pub media_type: u8,

    /// Size of each FAT copy in sectors
    pub sectors_per_fat: u16,

    /// Sectors per track for interrupt 0x13
    pub sectors_per_track: u16,

    /// Number of heads for interrupt 0x13
    pub head_count: u16,

    /// Number of hidden sectors preceding the partition
    pub hidden_sectors: u32,

    /// Total number of sectors (32-bit)
    /// Authoritative when the 16-bit field is zero
    pub total_sectors_32: u32,

    /// INT 13h drive number
    pub drive_number: u8,

    /// Reserved byte
    pub reserved1: u8,

    /// Extended boot signature
    pub boot_signature: u8,

    /// Volume serial number
    pub volume_id: u32,

    /// Volume label, space padded
    pub volume_label: [u8; 11],

    /// Filesystem type string, advisory only
    pub fs_type: [u8; 8],

    /// Bootstrap code region, preserved verbatim
    pub boot_code: [u8; 448],
}

impl BootSector {
    /// Decodes a raw 512-byte boot sector.
    ///
    /// The buffer must be exactly one sector long. The trailing 0xAA55
    /// marker is checked first, then the geometry fields: bytes per sector
    /// must be one of 512/1024/2048/4096 and sectors per cluster a power
    /// of two no larger than 128. A volume where both total-sector fields
    /// are set (or neither is) only draws a warning, since real images
    /// honor that convention loosely.
    pub fn decode(buf: &[u8]) -> Result<Self, FatError> {
        if buf.len() != SECTOR_SIZE {
            return Err(FatError::InvalidLength {
                expected: SECTOR_SIZE,
                found: buf.len(),
            });
        }

        let sig = LittleEndian::read_u16(&buf[510..512]);
        if sig != BOOT_SIGNATURE {
            return Err(FatError::InvalidSignature { found: sig });
        }

        let mut jump_boot = [0u8; 3];
        jump_boot.copy_from_slice(&buf[0..3]);
        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&buf[3..11]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&buf[43..54]);
        let mut fs_type = [0u8; 8];
        fs_type.copy_from_slice(&buf[54..62]);
        let mut boot_code = [0u8; 448];
        boot_code.copy_from_slice(&buf[62..510]);

        let sector = Self {
            jump_boot,
            oem_name,
            bytes_per_sector: LittleEndian::read_u16(&buf[11..13]),
            sectors_per_cluster: buf[13],
            reserved_sectors: LittleEndian::read_u16(&buf[14..16]),
            fat_count: buf[16],
            root_dir_entries: LittleEndian::read_u16(&buf[17..19]),
            total_sectors_16: LittleEndian::read_u16(&buf[19..21]),
            media_type: buf[21],
            sectors_per_fat: LittleEndian::read_u16(&buf[22..24]),
            sectors_per_track: LittleEndian::read_u16(&buf[24..26]),
            head_count: LittleEndian::read_u16(&buf[26..28]),
            hidden_sectors: LittleEndian::read_u32(&buf[28..32]),
            total_sectors_32: LittleEndian::read_u32(&buf[32..36]),
            drive_number: buf[36],
            reserved1: buf[37],
            boot_signature: buf[38],
            volume_id: LittleEndian::read_u32(&buf[39..43]),
            volume_label,
            fs_type,
            boot_code,
        };

        if !matches!(sector.bytes_per_sector, 512 | 1024 | 2048 | 4096) {
            return Err(FatError::InvalidGeometry {
                field: "bytes_per_sector",
                value: sector.bytes_per_sector as u32,
            });
        }
        if !sector.sectors_per_cluster.is_power_of_two() || sector.sectors_per_cluster > 128 {
            return Err(FatError::InvalidGeometry {
                field: "sectors_per_cluster",
                value: sector.sectors_per_cluster as u32,
            });
        }

        if (sector.total_sectors_16 != 0) == (sector.total_sectors_32 != 0) {
            warn!(
                "total-sector fields disagree: 16-bit={} 32-bit={}",
                sector.total_sectors_16, sector.total_sectors_32
            );
        }

        Ok(sector)
    }

    /// Encodes the record back into a raw sector.
    ///
    /// The trailing signature bytes are always written as 0x55 0xAA, so
    /// the output is a structurally valid boot sector even for values
    /// built by hand. Encoding never fails; geometry is only checked when
    /// decoding.
    pub fn encode(&self) -> [u8; SECTOR_SIZE] {
        let mut buf = [0u8; SECTOR_SIZE];
        buf[0..3].copy_from_slice(&self.jump_boot);
        buf[3..11].copy_from_slice(&self.oem_name);
        LittleEndian::write_u16(&mut buf[11..13], self.bytes_per_sector);
        buf[13] = self.sectors_per_cluster;
        LittleEndian::write_u16(&mut buf[14..16], self.reserved_sectors);
        buf[16] = self.fat_count;
        LittleEndian::write_u16(&mut buf[17..19], self.root_dir_entries);
        LittleEndian::write_u16(&mut buf[19..21], self.total_sectors_16);
        buf[21] = self.media_type;
        LittleEndian::write_u16(&mut buf[22..24], self.sectors_per_fat);
        LittleEndian::write_u16(&mut buf[24..26], self.sectors_per_track);
        LittleEndian::write_u16(&mut buf[26..28], self.head_count);
        LittleEndian::write_u32(&mut buf[28..32], self.hidden_sectors);
        LittleEndian::write_u32(&mut buf[32..36], self.total_sectors_32);
        buf[36] = self.drive_number;
        buf[37] = self.reserved1;
        buf[38] = self.boot_signature;
        LittleEndian::write_u32(&mut buf[39..43], self.volume_id);
        buf[43..54].copy_from_slice(&self.volume_label);
        buf[54..62].copy_from_slice(&self.fs_type);
        buf[62..510].copy_from_slice(&self.boot_code);
        LittleEndian::write_u16(&mut buf[510..512], BOOT_SIGNATURE);
        buf
    }

    /// Total sector count, taking the 16-bit field unless it is zero.
    pub fn total_sectors(&self) -> u32 {
        if self.total_sectors_16 != 0 {
            self.total_sectors_16 as u32
        } else {
            self.total_sectors_32
        }
    }

    /// First sector of the FAT region.
    pub fn fat_start(&self) -> u32 {
        self.reserved_sectors as u32
    }

    /// First sector of the root directory region, right after the FATs.
    pub fn root_dir_start(&self) -> u32 {
        self.fat_start() + self.fat_count as u32 * self.sectors_per_fat as u32
    }

    /// Size of the root directory region in sectors.
    pub fn root_dir_sectors(&self) -> u32 {
        (self.root_dir_entries as u32 * DIR_ENTRY_SIZE as u32)
            .div_ceil(self.bytes_per_sector as u32)
    }

    /// First sector of the data region.
    pub fn data_start(&self) -> u32 {
        self.root_dir_start() + self.root_dir_sectors()
    }

    /// First sector of a data cluster. Clusters are numbered from 2.
    pub fn cluster_start(&self, cluster: u16) -> u32 {
        self.data_start() + (cluster as u32 - 2) * self.sectors_per_cluster as u32
    }

    /// Size of one cluster in bytes.
    pub fn cluster_size(&self) -> usize {
        self.sectors_per_cluster as usize * self.bytes_per_sector as usize
    }

    /// Number of data clusters on the volume.
    pub fn cluster_count(&self) -> u32 {
        self.total_sectors().saturating_sub(self.data_start()) / self.sectors_per_cluster as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BootSector {
        BootSector {
            jump_boot: [0xEB, 0x3C, 0x90],
            oem_name: *b"MSDOS5.0",
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            fat_count: 2,
            root_dir_entries: 224,
            total_sectors_16: 2880,
            media_type: 0xF0,
            sectors_per_fat: 9,
            sectors_per_track: 18,
            head_count: 2,
            hidden_sectors: 0,
            total_sectors_32: 0,
            drive_number: 0x00,
            reserved1: 0,
            boot_signature: 0x29,
            volume_id: 0x1234_ABCD,
            volume_label: *b"FLOPPY     ",
            fs_type: *b"FAT12   ",
            boot_code: [0u8; 448],
        }
    }

    #[test]
    fn round_trips_through_bytes() {
        let sector = sample();
        let bytes = sector.encode();
        assert_eq!(BootSector::decode(&bytes).unwrap(), sector);
    }

    #[test]
    fn byte_round_trip_is_lossless() {
        let mut bytes = sample().encode();
        // bootstrap code region is opaque and must survive untouched
        bytes[62] = 0xFA;
        bytes[300] = 0x77;
        bytes[509] = 0x19;
        let decoded = BootSector::decode(&bytes).unwrap();
        assert_eq!(decoded.encode(), bytes);
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            BootSector::decode(&[0u8; 511]),
            Err(FatError::InvalidLength {
                expected: 512,
                found: 511
            })
        );
        assert_eq!(
            BootSector::decode(&[0u8; 513]),
            Err(FatError::InvalidLength {
                expected: 512,
                found: 513
            })
        );
    }

    #[test]
    fn rejects_missing_signature() {
        let mut bytes = sample().encode();
        bytes[510] = 0x34;
        bytes[511] = 0x12;
        assert_eq!(
            BootSector::decode(&bytes),
            Err(FatError::InvalidSignature { found: 0x1234 })
        );
    }

    #[test]
    fn rejects_zeroed_geometry_even_with_signature() {
        let mut bytes = [0u8; 512];
        bytes[510] = 0x55;
        bytes[511] = 0xAA;
        assert_eq!(
            BootSector::decode(&bytes),
            Err(FatError::InvalidGeometry {
                field: "bytes_per_sector",
                value: 0
            })
        );
    }

    #[test]
    fn rejects_non_power_of_two_cluster_size() {
        let mut sector = sample();
        sector.sectors_per_cluster = 3;
        assert_eq!(
            BootSector::decode(&sector.encode()),
            Err(FatError::InvalidGeometry {
                field: "sectors_per_cluster",
                value: 3
            })
        );
        sector.sectors_per_cluster = 0;
        assert_eq!(
            BootSector::decode(&sector.encode()),
            Err(FatError::InvalidGeometry {
                field: "sectors_per_cluster",
                value: 0
            })
        );
    }

    #[test]
    fn encode_always_emits_signature() {
        let bytes = sample().encode();
        assert_eq!(&bytes[510..], &[0x55, 0xAA]);
    }

    #[test]
    fn derives_region_layout() {
        // 1.44MB floppy layout
        let sector = sample();
        assert_eq!(sector.fat_start(), 1);
        assert_eq!(sector.root_dir_start(), 19);
        assert_eq!(sector.root_dir_sectors(), 14);
        assert_eq!(sector.data_start(), 33);
        assert_eq!(sector.cluster_start(2), 33);
        assert_eq!(sector.cluster_start(3), 34);
        assert_eq!(sector.cluster_size(), 512);
        assert_eq!(sector.total_sectors(), 2880);
        assert_eq!(sector.cluster_count(), 2847);
    }

    #[test]
    fn large_volume_uses_32_bit_count() {
        let mut sector = sample();
        sector.total_sectors_16 = 0;
        sector.total_sectors_32 = 131_072;
        assert_eq!(sector.total_sectors(), 131_072);
    }
}
