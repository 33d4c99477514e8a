use byteorder::LittleEndian;
use zerocopy::byteorder::U32;
use zerocopy::{AsBytes, FromBytes, LayoutVerified, Unaligned};

use crate::config::{INODE_MAGIC, SECTOR_SIZE};

/// An inode on the disk. Each inode occupies a whole sector; only the first
/// 12 bytes are meaningful and the rest of the sector is zero.
///
/// The inode number and the sector holding the inode are the same value.
#[repr(C)]
#[derive(AsBytes, FromBytes, Unaligned, Clone, Copy)]
pub struct DiskInode {
    /// First sector of the content region.
    start: U32<LittleEndian>,
    /// Length of the content in bytes.
    len: U32<LittleEndian>,
    magic: U32<LittleEndian>,
}

impl DiskInode {
    pub fn new(start: u32, len: u32) -> Self {
        Self {
            start: U32::new(start),
            len: U32::new(len),
            magic: U32::new(INODE_MAGIC),
        }
    }

    /// Reads an inode from the head of a sector buffer. Does not check the
    /// magic, see [`DiskInode::is_valid`].
    pub fn parse(buf: &[u8]) -> Option<Self> {
        let (inode, _) = LayoutVerified::<_, DiskInode>::new_unaligned_from_prefix(buf)?;
        Some(*inode)
    }

    /// Serializes the inode padded to a full sector.
    pub fn serialize(&self) -> [u8; SECTOR_SIZE] {
        let mut sector = [0; SECTOR_SIZE];
        let bytes = self.as_bytes();
        sector[..bytes.len()].copy_from_slice(bytes);
        sector
    }

    pub fn start(&self) -> u32 {
        self.start.get()
    }

    pub fn len(&self) -> u32 {
        self.len.get()
    }

    pub fn magic(&self) -> u32 {
        self.magic.get()
    }

    pub fn is_valid(&self) -> bool {
        self.magic() == INODE_MAGIC
    }
}

impl std::fmt::Debug for DiskInode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskInode")
            .field("start", &self.start())
            .field("len", &self.len())
            .field("magic", &format_args!("{:#x}", self.magic()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_one_little_endian_sector() {
        let sector = DiskInode::new(0x0102_0304, 600).serialize();

        assert_eq!(sector.len(), 512);
        assert_eq!(&sector[0..4], &[0x04, 0x03, 0x02, 0x01]);
        assert_eq!(&sector[4..8], &600u32.to_le_bytes());
        assert_eq!(&sector[8..12], b"DONI");
        assert!(sector[12..].iter().all(|b| *b == 0));
    }

    #[test]
    fn parse_reads_back_fields() {
        let sector = DiskInode::new(9, 352).serialize();
        let inode = DiskInode::parse(&sector).unwrap();

        assert_eq!(inode.start(), 9);
        assert_eq!(inode.len(), 352);
        assert!(inode.is_valid());
    }

    #[test]
    fn zeroed_sector_is_not_a_valid_inode() {
        let inode = DiskInode::parse(&[0; 512]).unwrap();
        assert!(!inode.is_valid());
    }

    #[test]
    fn short_buffer_fails_to_parse() {
        assert!(DiskInode::parse(&[0; 8]).is_none());
    }
}
