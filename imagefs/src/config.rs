/// Disks are addressed in 512 byte sectors. Every region of the image starts
/// on a sector boundary.
pub const SECTOR_SIZE: usize = 512;

/// Every image is exactly 10MiB.
pub const DISK_SIZE: usize = 10 << 20;
pub const SECTOR_COUNT: u32 = bytes_to_sectors(DISK_SIZE);

/// Inode magic number ("INOD").
pub const INODE_MAGIC: u32 = 0x494e_4f44;

/// Known locations.
pub const FREE_MAP_INUM: u32 = 0;
pub const ROOT_DIR_INUM: u32 = 1;
pub const FIRST_FILE_INUM: u32 = 2;

/// Upper bound on embedded files. Inodes are stored one per sector ahead of
/// the free map, so this also bounds the inode table.
pub const MAX_FILES: usize = 200;

/// Width of the name field of a directory entry. Names are stored NUL
/// terminated, leaving one byte less for the name itself.
pub const FILE_NAME_LEN_MAX: usize = 28;

/// Blank directory entries appended after the embedded files so the kernel
/// can create new files without growing the root directory.
pub const RESERVED_SLOTS: usize = 10;

/// 4MiB of zeroed swap.
pub const SWAP_SIZE: usize = 4 << 20;
pub const SWAP_NAME: &str = ".glbswap";

pub const DEFAULT_SOURCE_DIR: &str = "user";
pub const DEFAULT_IMAGE_NAME: &str = "disk.img";

/// Number of sectors needed to hold `bytes`.
pub const fn bytes_to_sectors(bytes: usize) -> u32 {
    ((bytes + SECTOR_SIZE - 1) / SECTOR_SIZE) as u32
}

/// Size parameters of an image. The default matches what the kernel expects;
/// other values are only useful for planning against smaller disks in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub disk_size: usize,
    pub swap_size: usize,
    pub reserved_slots: usize,
    pub max_files: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            disk_size: DISK_SIZE,
            swap_size: SWAP_SIZE,
            reserved_slots: RESERVED_SLOTS,
            max_files: MAX_FILES,
        }
    }
}

impl Geometry {
    pub fn sector_count(&self) -> u32 {
        bytes_to_sectors(self.disk_size)
    }

    /// Length in bytes of the free map, one bit per sector.
    pub fn free_map_len(&self) -> usize {
        (self.sector_count() as usize + 7) / 8
    }
}
