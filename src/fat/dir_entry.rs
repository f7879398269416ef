//! FAT directory entry structure and operations

use arrayvec::ArrayString;
use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;
use crate::FatError;

/// 8.3 format directory entry (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry83 {
    /// 8 character filename, space padded
    pub name: [u8; 8],

    /// 3 character extension, space padded
    pub ext: [u8; 3],

    /// File attributes (read-only, directory, etc)
    pub attributes: u8,

    /// Reserved region, preserved verbatim across decode/encode
    pub reserved: [u8; 10],

    /// Modification time, packed DOS format
    pub time: u16,

    /// Modification date, packed DOS format
    pub date: u16,

    /// First cluster number, 0 for an empty file
    pub start_cluster: u16,

    /// File size in bytes
    pub file_size: u32,
}

/// What a directory slot holds, in the order a scanner must test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// First name byte 0x00: nothing here or in any later slot
    EndOfDirectory,
    /// First name byte 0xE5: slot freed by deletion, keep scanning
    Deleted,
    /// VFAT long-filename continuation slot
    LongNameFragment,
    /// Volume label pseudo-entry
    VolumeLabel,
    Directory,
    File,
}

impl DirEntry83 {
    /// Decodes one 32-byte directory slot.
    ///
    /// Only the buffer length can be rejected. Every 32-byte input is a
    /// structurally valid entry; the sentinel first-byte values are
    /// semantic and left to [`DirEntry83::classify`].
    pub fn decode(buf: &[u8]) -> Result<Self, FatError> {
        if buf.len() != DIR_ENTRY_SIZE {
            return Err(FatError::InvalidLength {
                expected: DIR_ENTRY_SIZE,
                found: buf.len(),
            });
        }
        let mut name = [0u8; 8];
        name.copy_from_slice(&buf[0..8]);
        let mut ext = [0u8; 3];
        ext.copy_from_slice(&buf[8..11]);
        let mut reserved = [0u8; 10];
        reserved.copy_from_slice(&buf[12..22]);
        Ok(Self {
            name,
            ext,
            attributes: buf[11],
            reserved,
            time: LittleEndian::read_u16(&buf[22..24]),
            date: LittleEndian::read_u16(&buf[24..26]),
            start_cluster: LittleEndian::read_u16(&buf[26..28]),
            file_size: LittleEndian::read_u32(&buf[28..32]),
        })
    }

    /// Encodes the entry back into a 32-byte slot. The reserved region is
    /// written back as read, so vendor use of those bytes survives a
    /// round trip.
    pub fn encode(&self) -> [u8; DIR_ENTRY_SIZE] {
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        buf[0..8].copy_from_slice(&self.name);
        buf[8..11].copy_from_slice(&self.ext);
        buf[11] = self.attributes;
        buf[12..22].copy_from_slice(&self.reserved);
        LittleEndian::write_u16(&mut buf[22..24], self.time);
        LittleEndian::write_u16(&mut buf[24..26], self.date);
        LittleEndian::write_u16(&mut buf[26..28], self.start_cluster);
        LittleEndian::write_u32(&mut buf[28..32], self.file_size);
        buf
    }

    /// Classifies the slot. The sentinel first-byte checks take precedence
    /// over the attribute bits.
    pub fn classify(&self) -> EntryKind {
        if self.name[0] == 0x00 {
            return EntryKind::EndOfDirectory;
        }
        if self.name[0] == DELETED_ENTRY_MARKER {
            return EntryKind::Deleted;
        }
        if self.attributes == ATTR_LONG_NAME {
            return EntryKind::LongNameFragment;
        }
        if self.attributes & ATTR_VOLUME_ID != 0 {
            return EntryKind::VolumeLabel;
        }
        if self.attributes & ATTR_DIRECTORY != 0 {
            return EntryKind::Directory;
        }
        EntryKind::File
    }

    /// Creates a file entry with given name and starting cluster. Name and
    /// extension are truncated to 8 and 3 bytes and space padded.
    pub fn new_file(name: &str, ext: &str, start_cluster: u16) -> Self {
        let mut entry = Self {
            name: [0x20; 8],
            ext: [0x20; 3],
            attributes: ATTR_ARCHIVE,
            reserved: [0; 10],
            time: 0,
            date: 0,
            start_cluster,
            file_size: 0,
        };

        let name_bytes = name.as_bytes();
        entry.name[..name_bytes.len().min(8)]
            .copy_from_slice(&name_bytes[..name_bytes.len().min(8)]);

        let ext_bytes = ext.as_bytes();
        entry.ext[..ext_bytes.len().min(3)].copy_from_slice(&ext_bytes[..ext_bytes.len().min(3)]);

        entry
    }

    /// Creates a subdirectory entry with given name and starting cluster.
    /// Directories carry a zero size.
    pub fn new_directory(name: &str, start_cluster: u16) -> Self {
        let mut entry = Self::new_file(name, "", start_cluster);
        entry.attributes = ATTR_DIRECTORY;
        entry
    }

    /// Returns true if entry is empty/unused (a scan stops here)
    pub fn is_free(&self) -> bool {
        self.name[0] == 0x00
    }

    /// Returns true if entry is marked as deleted
    pub fn is_deleted(&self) -> bool {
        self.name[0] == DELETED_ENTRY_MARKER
    }

    /// Returns true if entry is a subdirectory
    pub fn is_directory(&self) -> bool {
        self.attributes & ATTR_DIRECTORY != 0
    }

    /// Returns true if the read-only attribute is set
    pub fn is_read_only(&self) -> bool {
        self.attributes & ATTR_READ_ONLY != 0
    }

    /// Returns the filename as `NAME.EXT` with the padding removed, or
    /// just `NAME` when the extension field is all padding. The rendered
    /// form fits 12 bytes; bytes outside printable ASCII come out as `?`.
    pub fn short_name(&self) -> ArrayString<12> {
        let mut out = ArrayString::new();
        push_printable(&mut out, trim_padding(&self.name));
        let ext = trim_padding(&self.ext);
        if !ext.is_empty() {
            out.push('.');
            push_printable(&mut out, ext);
        }
        out
    }
}

/// Strips the trailing space padding. NUL fill, which some formatters use
/// instead of spaces, is stripped the same way.
fn trim_padding(field: &[u8]) -> &[u8] {
    let mut end = field.len();
    while end > 0 && (field[end - 1] == b' ' || field[end - 1] == 0) {
        end -= 1;
    }
    &field[..end]
}

fn push_printable(out: &mut ArrayString<12>, field: &[u8]) {
    for &b in field {
        out.push(if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '?'
        });
    }
}
