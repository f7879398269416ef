//! FAT12/16 on-disk structures and read-only volume access

use log::{debug, warn};

mod boot_sector;
mod constants;
mod dir_entry;
mod fat_entry;
mod timestamp;

pub use boot_sector::BootSector;
pub use constants::*;
pub use dir_entry::{DirEntry83, EntryKind};
pub use fat_entry::{FatEntry, FatKind};
pub use timestamp::{DosDate, Timestamp};

use crate::{BlockDevice, FatError};

/// Read-only FAT12/16 volume on top of a block device.
///
/// Mounting decodes the boot sector and pulls the first FAT copy into
/// memory; everything else is read from the device on demand. Nothing is
/// ever written back.
pub struct Volume {
    /// Underlying block device
    device: Box<dyn BlockDevice>,
    /// Boot sector containing the volume geometry
    boot_sector: BootSector,
    /// First FAT copy, kept in memory for chain walks
    fat: Vec<u8>,
    /// Entry width of the FAT
    fat_kind: FatKind,
}

impl Volume {
    /// Mounts a volume from a device whose block size matches the
    /// volume's logical sector size.
    pub fn mount(mut device: Box<dyn BlockDevice>) -> Result<Self, FatError> {
        let mut sector = vec![0u8; device.block_size()];
        if sector.len() < SECTOR_SIZE {
            return Err(FatError::Io);
        }
        device.read_block(0, &mut sector)?;
        let boot_sector = BootSector::decode(&sector[..SECTOR_SIZE])?;

        let sector_size = boot_sector.bytes_per_sector as usize;
        if sector_size != device.block_size() {
            warn!(
                "volume sector size {} does not match device block size {}",
                sector_size,
                device.block_size()
            );
            return Err(FatError::Io);
        }

        let fat_kind = FatKind::from_cluster_count(boot_sector.cluster_count());
        debug!(
            "mounted {:?} volume: {} sectors, {} clusters of {} bytes",
            fat_kind,
            boot_sector.total_sectors(),
            boot_sector.cluster_count(),
            boot_sector.cluster_size()
        );

        let mut fat = vec![0u8; boot_sector.sectors_per_fat as usize * sector_size];
        for i in 0..boot_sector.sectors_per_fat as u32 {
            let offset = i as usize * sector_size;
            device.read_block(
                (boot_sector.fat_start() + i) as u64,
                &mut fat[offset..offset + sector_size],
            )?;
        }

        Ok(Self {
            device,
            boot_sector,
            fat,
            fat_kind,
        })
    }

    /// The decoded boot sector.
    pub fn boot_sector(&self) -> &BootSector {
        &self.boot_sector
    }

    /// The FAT entry width detected at mount time.
    pub fn fat_kind(&self) -> FatKind {
        self.fat_kind
    }

    /// Reads the directory at `cluster`; cluster 0 means the fixed root
    /// directory region. Deleted and long-filename slots are skipped and
    /// the scan stops at the first end-of-directory slot.
    pub fn read_dir(&mut self, cluster: u16) -> Result<Vec<DirEntry83>, FatError> {
        let raw = if cluster == 0 {
            let start = self.boot_sector.root_dir_start();
            let count = self.boot_sector.root_dir_sectors();
            self.read_sectors(start, count)?
        } else {
            self.read_chain(cluster)?
        };

        let mut entries = Vec::new();
        for slot in raw.chunks_exact(DIR_ENTRY_SIZE) {
            let entry = DirEntry83::decode(slot)?;
            match entry.classify() {
                EntryKind::EndOfDirectory => break,
                EntryKind::Deleted | EntryKind::LongNameFragment => continue,
                _ => entries.push(entry),
            }
        }
        Ok(entries)
    }

    /// Reads the root directory.
    pub fn read_root_dir(&mut self) -> Result<Vec<DirEntry83>, FatError> {
        self.read_dir(0)
    }

    /// Finds a live entry in a directory by its rendered 8.3 name,
    /// case-insensitively.
    pub fn find_entry(&mut self, dir_cluster: u16, name: &str) -> Result<DirEntry83, FatError> {
        for entry in self.read_dir(dir_cluster)? {
            if entry.short_name().eq_ignore_ascii_case(name) {
                return Ok(entry);
            }
        }
        Err(FatError::NotFound)
    }

    /// Resolves a `/`-separated path starting at the root directory.
    pub fn lookup(&mut self, path: &str) -> Result<DirEntry83, FatError> {
        let mut dir_cluster = 0u16;
        let mut current: Option<DirEntry83> = None;
        for component in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(parent) = current {
                if !parent.is_directory() {
                    return Err(FatError::NotADirectory);
                }
                dir_cluster = parent.start_cluster;
            }
            current = Some(self.find_entry(dir_cluster, component)?);
        }
        current.ok_or(FatError::NotFound)
    }

    /// Reads a file's content by following its cluster chain. The chain
    /// carries whole clusters; the tail past `file_size` is cut off. An
    /// entry with no starting cluster is an empty file.
    pub fn read_file(&mut self, entry: &DirEntry83) -> Result<Vec<u8>, FatError> {
        if entry.is_directory() {
            return Err(FatError::IsADirectory);
        }
        if entry.start_cluster == 0 {
            return Ok(Vec::new());
        }
        let mut data = self.read_chain(entry.start_cluster)?;
        data.truncate(entry.file_size as usize);
        Ok(data)
    }

    /// Reads every cluster of a chain in order. Walks are capped at the
    /// volume's cluster count so a corrupt cyclic chain terminates.
    fn read_chain(&mut self, start: u16) -> Result<Vec<u8>, FatError> {
        let sectors_per_cluster = self.boot_sector.sectors_per_cluster as u32;
        let max_links = self.boot_sector.cluster_count() as u64 + 2;
        let mut data = Vec::new();
        let mut cluster = start;
        let mut links = 0u64;
        loop {
            if cluster < 2 || links >= max_links {
                return Err(FatError::Io);
            }
            links += 1;

            let first = self.boot_sector.cluster_start(cluster);
            let mut chunk = self.read_sectors(first, sectors_per_cluster)?;
            data.append(&mut chunk);

            let entry = FatEntry::read(&self.fat, self.fat_kind, cluster)?;
            if entry.is_end_of_chain(self.fat_kind) {
                break;
            }
            if entry.is_free() {
                warn!(
                    "chain from cluster {} runs into a free entry after {}",
                    start, cluster
                );
                break;
            }
            cluster = entry.cluster;
        }
        Ok(data)
    }

    fn read_sectors(&mut self, start: u32, count: u32) -> Result<Vec<u8>, FatError> {
        let sector_size = self.boot_sector.bytes_per_sector as usize;
        let mut buf = vec![0u8; count as usize * sector_size];
        for i in 0..count {
            let offset = i as usize * sector_size;
            self.device
                .read_block((start + i) as u64, &mut buf[offset..offset + sector_size])?;
        }
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::MemoryBlockDevice;

    /// Writes a 12-bit entry into a raw FAT12 table.
    fn set_fat12(fat: &mut [u8], cluster: u16, value: u16) {
        let offset = cluster as usize * 3 / 2;
        if cluster & 1 == 0 {
            fat[offset] = (value & 0xFF) as u8;
            fat[offset + 1] = (fat[offset + 1] & 0xF0) | ((value >> 8) as u8 & 0x0F);
        } else {
            fat[offset] = (fat[offset] & 0x0F) | (((value & 0x0F) as u8) << 4);
            fat[offset + 1] = (value >> 4) as u8;
        }
    }

    /// Builds a 64-sector FAT12 image: boot sector, two FAT copies, a one
    /// sector root directory and a data area starting at sector 4.
    ///
    /// Root holds HELLO.TXT (clusters 2-3, 600 bytes), a deleted slot, the
    /// SUB directory (cluster 4, containing NESTED.TXT at cluster 5) and
    /// EMPTY.TXT with no data.
    fn build_test_image() -> Vec<u8> {
        let boot = BootSector {
            jump_boot: [0xEB, 0x3C, 0x90],
            oem_name: *b"FATIMG  ",
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 1,
            fat_count: 2,
            root_dir_entries: 16,
            total_sectors_16: 64,
            media_type: 0xF8,
            sectors_per_fat: 1,
            sectors_per_track: 18,
            head_count: 2,
            hidden_sectors: 0,
            total_sectors_32: 0,
            drive_number: 0x80,
            reserved1: 0,
            boot_signature: 0x29,
            volume_id: 0xC0FFEE00,
            volume_label: *b"TESTVOL    ",
            fs_type: *b"FAT12   ",
            boot_code: [0u8; 448],
        };

        let mut image = vec![0u8; 64 * 512];
        image[..512].copy_from_slice(&boot.encode());

        let mut fat = [0u8; 512];
        set_fat12(&mut fat, 0, 0xFF8);
        set_fat12(&mut fat, 1, 0xFFF);
        set_fat12(&mut fat, 2, 3);
        set_fat12(&mut fat, 3, 0xFFF);
        set_fat12(&mut fat, 4, 0xFFF);
        set_fat12(&mut fat, 5, 0xFFF);
        image[512..1024].copy_from_slice(&fat);
        image[1024..1536].copy_from_slice(&fat);

        let mut hello = DirEntry83::new_file("HELLO", "TXT", 2);
        hello.file_size = 600;
        let mut deleted = DirEntry83::new_file("OLD", "TXT", 6);
        deleted.name[0] = DELETED_ENTRY_MARKER;
        let sub = DirEntry83::new_directory("SUB", 4);
        let empty = DirEntry83::new_file("EMPTY", "TXT", 0);

        let root = 3 * 512;
        image[root..root + 32].copy_from_slice(&hello.encode());
        image[root + 32..root + 64].copy_from_slice(&deleted.encode());
        image[root + 64..root + 96].copy_from_slice(&sub.encode());
        image[root + 96..root + 128].copy_from_slice(&empty.encode());

        // HELLO.TXT content spans clusters 2 and 3 (sectors 4 and 5)
        let data = 4 * 512;
        for i in 0..600 {
            image[data + i] = (i % 251) as u8;
        }

        // SUB directory at cluster 4 (sector 6)
        let mut nested = DirEntry83::new_file("NESTED", "TXT", 5);
        nested.file_size = 11;
        let sub_sector = 6 * 512;
        image[sub_sector..sub_sector + 32]
            .copy_from_slice(&DirEntry83::new_directory(".", 4).encode());
        image[sub_sector + 32..sub_sector + 64]
            .copy_from_slice(&DirEntry83::new_directory("..", 0).encode());
        image[sub_sector + 64..sub_sector + 96].copy_from_slice(&nested.encode());

        // NESTED.TXT content at cluster 5 (sector 7)
        let nested_data = 7 * 512;
        image[nested_data..nested_data + 11].copy_from_slice(b"hello world");

        image
    }

    fn mount_test_volume() -> Volume {
        let device = MemoryBlockDevice::from_image(build_test_image(), 512).unwrap();
        Volume::mount(Box::new(device)).unwrap()
    }

    #[test]
    fn mounts_and_detects_fat12() {
        let volume = mount_test_volume();
        assert_eq!(volume.fat_kind(), FatKind::Fat12);
        assert_eq!(volume.boot_sector().data_start(), 4);
        assert_eq!(volume.boot_sector().cluster_count(), 60);
    }

    #[test]
    fn scans_root_skipping_deleted_and_stopping_at_free() {
        let mut volume = mount_test_volume();
        let names: Vec<String> = volume
            .read_root_dir()
            .unwrap()
            .iter()
            .map(|e| e.short_name().to_string())
            .collect();
        assert_eq!(names, ["HELLO.TXT", "SUB", "EMPTY.TXT"]);
    }

    #[test]
    fn reads_a_file_across_clusters() {
        let mut volume = mount_test_volume();
        let entry = volume.lookup("HELLO.TXT").unwrap();
        let data = volume.read_file(&entry).unwrap();
        assert_eq!(data.len(), 600);
        assert!(data.iter().enumerate().all(|(i, &b)| b == (i % 251) as u8));
    }

    #[test]
    fn resolves_nested_paths_case_insensitively() {
        let mut volume = mount_test_volume();
        let entry = volume.lookup("/sub/nested.txt").unwrap();
        assert_eq!(volume.read_file(&entry).unwrap(), b"hello world");
    }

    #[test]
    fn empty_file_reads_empty() {
        let mut volume = mount_test_volume();
        let entry = volume.lookup("EMPTY.TXT").unwrap();
        assert_eq!(entry.start_cluster, 0);
        assert_eq!(volume.read_file(&entry).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn reports_lookup_failures() {
        let mut volume = mount_test_volume();
        assert_eq!(volume.lookup("NOPE.TXT"), Err(FatError::NotFound));
        assert_eq!(volume.lookup("HELLO.TXT/X"), Err(FatError::NotADirectory));

        let dir = volume.lookup("SUB").unwrap();
        assert_eq!(volume.read_file(&dir), Err(FatError::IsADirectory));
    }

    #[test]
    fn rejects_images_without_boot_signature() {
        let mut image = build_test_image();
        image[510] = 0;
        image[511] = 0;
        let device = MemoryBlockDevice::from_image(image, 512).unwrap();
        let err = Volume::mount(Box::new(device)).err().unwrap();
        assert_eq!(err, FatError::InvalidSignature { found: 0 });
    }

    #[test]
    fn cyclic_chains_terminate_with_an_error() {
        let mut image = build_test_image();
        // point cluster 3 back at cluster 2
        let mut fat = [0u8; 512];
        fat.copy_from_slice(&image[512..1024]);
        set_fat12(&mut fat, 3, 2);
        image[512..1024].copy_from_slice(&fat);

        let device = MemoryBlockDevice::from_image(image, 512).unwrap();
        let mut volume = Volume::mount(Box::new(device)).unwrap();
        let entry = volume.lookup("HELLO.TXT").unwrap();
        assert_eq!(volume.read_file(&entry), Err(FatError::Io));
    }
}
