use crate::alloc::{FreeMap, State};
use crate::config::{bytes_to_sectors, FREE_MAP_INUM, ROOT_DIR_INUM, SECTOR_SIZE};
use crate::dir::{self, DirEntry};
use crate::error::{ImageError, Result};
use crate::io::BlockStorage;
use crate::node::DiskInode;

/// Read-only view of a built image, the way the kernel mounts it.
pub struct Image<T: BlockStorage> {
    dev: T,
    free_map: FreeMap,
    entries: Vec<DirEntry>,
}

impl<T: BlockStorage> Image<T> {
    /// Loads the free map and root directory. Fails if either inode has a bad
    /// magic or the free map does not cover the device exactly.
    pub fn open(mut dev: T) -> Result<Self> {
        let sector_count = dev.sector_count();

        let free_map_inode = read_inode(&mut dev, FREE_MAP_INUM)?;
        let bits = read_content(&mut dev, &free_map_inode)?;
        let free_map = FreeMap::parse(sector_count, &bits).ok_or(ImageError::CorruptFreeMap {
            expected: (sector_count as usize + 7) / 8,
            found: bits.len(),
        })?;

        let root_inode = read_inode(&mut dev, ROOT_DIR_INUM)?;
        let entries = dir::parse_entries(&read_content(&mut dev, &root_inode)?);

        Ok(Self {
            dev,
            free_map,
            entries,
        })
    }

    /// Used directory entries, in on-disk order.
    pub fn entries(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().filter(|e| e.is_valid())
    }

    /// Number of slots still free for new files.
    pub fn free_slots(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_valid()).count()
    }

    pub fn lookup(&self, name: &str) -> Result<u32> {
        self.entries()
            .find(|e| e.name() == name)
            .map(|e| e.inum())
            .ok_or_else(|| ImageError::NotFound(name.to_string()))
    }

    pub fn inode(&mut self, inum: u32) -> Result<DiskInode> {
        read_inode(&mut self.dev, inum)
    }

    /// Logical contents of the file named `name`.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let inum = self.lookup(name)?;
        let inode = self.inode(inum)?;
        read_content(&mut self.dev, &inode)
    }

    /// Whether the free map marks `sector` as in use. `None` for sectors
    /// past the end of the disk.
    pub fn is_allocated(&self, sector: u32) -> Option<bool> {
        self.free_map.get(sector).map(|state| state == State::Used)
    }

    pub fn free_map(&self) -> &FreeMap {
        &self.free_map
    }

    /// Returns ownership of the device to the caller.
    pub fn into_inner(self) -> T {
        self.dev
    }
}

fn read_inode<T: BlockStorage>(dev: &mut T, sector: u32) -> Result<DiskInode> {
    let mut buf = [0; SECTOR_SIZE];
    dev.read_sector(sector, &mut buf)?;
    match DiskInode::parse(&buf) {
        Some(inode) if inode.is_valid() => Ok(inode),
        Some(inode) => Err(ImageError::InvalidInode {
            sector,
            magic: inode.magic(),
        }),
        None => unreachable!("a sector always holds an inode"),
    }
}

fn read_content<T: BlockStorage>(dev: &mut T, inode: &DiskInode) -> Result<Vec<u8>> {
    let len = inode.len() as usize;
    let sectors = bytes_to_sectors(len);
    let mut content = vec![0; sectors as usize * SECTOR_SIZE];
    for (i, chunk) in content.chunks_mut(SECTOR_SIZE).enumerate() {
        dev.read_sector(inode.start() + i as u32, chunk)?;
    }
    content.truncate(len);
    Ok(content)
}
