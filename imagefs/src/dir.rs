use std::fmt;

use byteorder::LittleEndian;
use zerocopy::byteorder::U32;
use zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned};

use crate::config::FILE_NAME_LEN_MAX;
use crate::error::{ImageError, Result};

/// Size of one serialized [`DirEntry`].
pub const DIR_ENTRY_SIZE: usize = std::mem::size_of::<DirEntry>();

/// First name byte the kernel writes over a deleted entry.
const TOMBSTONE: u8 = b'#';

/// A name accepted for a directory entry: non-empty, at most
/// `FILE_NAME_LEN_MAX - 1` bytes so a NUL terminator always fits, and not
/// starting with a byte that marks a slot as unused.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileName(String);

impl FileName {
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.as_bytes()[0] == TOMBSTONE {
            return Err(ImageError::InvalidName(name));
        }
        if name.len() >= FILE_NAME_LEN_MAX {
            return Err(ImageError::NameTooLong {
                name,
                max: FILE_NAME_LEN_MAX - 1,
            });
        }
        Ok(Self(name))
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 32-byte root directory entry.
///
/// The all-zero entry marks an unused slot: its name is empty and its inode
/// number points at the free map, which is never a directory target.
#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct DirEntry {
    name: [u8; FILE_NAME_LEN_MAX],
    inum: U32<LittleEndian>,
}

impl DirEntry {
    pub fn new(name: &FileName, inum: u32) -> Self {
        let mut entry = Self::unused();
        entry.name[..name.0.len()].copy_from_slice(name.0.as_bytes());
        entry.inum = U32::new(inum);
        entry
    }

    pub fn unused() -> Self {
        Self {
            name: [0; FILE_NAME_LEN_MAX],
            inum: U32::new(0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.name[0] != 0 && self.name[0] != TOMBSTONE
    }

    pub fn inum(&self) -> u32 {
        self.inum.get()
    }

    /// Name up to the first NUL. Invalid UTF-8 is replaced rather than
    /// rejected since the kernel may have written the entry.
    pub fn name(&self) -> String {
        let end = self
            .name
            .iter()
            .position(|b| *b == 0)
            .unwrap_or(FILE_NAME_LEN_MAX);
        String::from_utf8_lossy(&self.name[..end]).into_owned()
    }
}

/// Serializes a complete root directory: the given entries followed by
/// `reserved` unused slots.
pub fn serialize_entries(entries: &[DirEntry], reserved: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity((entries.len() + reserved) * DIR_ENTRY_SIZE);
    for entry in entries {
        buf.extend_from_slice(entry.as_bytes());
    }
    for _ in 0..reserved {
        buf.extend_from_slice(DirEntry::unused().as_bytes());
    }
    buf
}

/// Splits root directory content into entries. Trailing bytes that do not
/// form a whole entry are ignored.
pub fn parse_entries(buf: &[u8]) -> Vec<DirEntry> {
    buf.chunks_exact(DIR_ENTRY_SIZE)
        .filter_map(|chunk| LayoutVerified::<_, DirEntry>::new_unaligned(chunk))
        .map(|entry| *entry)
        .collect()
}
