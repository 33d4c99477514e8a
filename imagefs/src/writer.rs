use log::{debug, info};

use crate::alloc::FreeMap;
use crate::collect::FileTable;
use crate::config::{FREE_MAP_INUM, ROOT_DIR_INUM, SECTOR_SIZE, SWAP_NAME};
use crate::dir::{self, DirEntry, FileName};
use crate::error::{ImageError, Result};
use crate::io::{BlockStorage, SectorNumber};
use crate::layout::{Extent, Layout};
use crate::node::DiskInode;

/// What a finished build put on the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub file_count: usize,
    /// Every sector below this one is allocated.
    pub first_free_sector: u32,
    pub free_sectors: u32,
}

/// Writes a planned layout onto a freshly truncated device.
///
/// Regions go out in increasing sector order, except for the free map: its
/// content depends on everything else, so its inode and bits are written
/// last even though its region comes first.
pub struct ImageWriter<T: BlockStorage> {
    dev: T,
}

impl<T: BlockStorage> ImageWriter<T> {
    pub fn new(dev: T) -> Self {
        Self { dev }
    }

    /// Returns ownership of the device to the caller.
    pub fn into_inner(self) -> T {
        self.dev
    }

    pub fn write(&mut self, table: &FileTable, layout: &Layout) -> Result<BuildSummary> {
        debug_assert_eq!(table.len(), layout.file_count());
        let available = self.dev.sector_count();
        if available < layout.first_free_sector() {
            return Err(ImageError::DiskFull {
                needed: layout.first_free_sector() as u64,
                available,
            });
        }

        info!(
            "Make a disk with {}KiB, inode range = [{}, {})",
            available as usize * SECTOR_SIZE / 1024,
            FREE_MAP_INUM,
            layout.swap_inum() + 1
        );

        self.write_root_dir(table, layout)?;

        for (i, (file, extent)) in table.iter().zip(&layout.files).enumerate() {
            let contents = file.read_contents()?;
            self.write_region(extent.start, &contents)?;
            let inum = Layout::file_inum(i);
            self.write_inode(inum, extent)?;
            debug!(
                "File {}: [{}, {}), inum = {}, size = {}",
                file.name,
                extent.start,
                extent.end(),
                inum,
                extent.len
            );
        }

        self.write_swap(layout)?;

        let mut free_map = FreeMap::new(&layout.geometry);
        free_map.reserve_prefix(layout.first_free_sector());
        self.write_inode(FREE_MAP_INUM, &layout.free_map)?;
        self.write_region(layout.free_map.start, free_map.serialize())?;
        debug!(
            "Free map: [{}, {}), len = {}",
            layout.free_map.start,
            layout.free_map.end(),
            layout.free_map.len
        );

        self.dev.sync_disk()?;
        let summary = BuildSummary {
            file_count: table.len(),
            first_free_sector: layout.first_free_sector(),
            free_sectors: free_map.free_count(),
        };
        info!(
            "Wrote {} files, {} of {} sectors free",
            summary.file_count, summary.free_sectors, available
        );
        Ok(summary)
    }

    fn write_root_dir(&mut self, table: &FileTable, layout: &Layout) -> Result<()> {
        self.write_inode(ROOT_DIR_INUM, &layout.root_dir)?;

        let mut entries: Vec<DirEntry> = table
            .iter()
            .enumerate()
            .map(|(i, file)| DirEntry::new(&file.name, Layout::file_inum(i)))
            .collect();
        entries.push(DirEntry::new(&FileName::new(SWAP_NAME)?, layout.swap_inum()));
        let content = dir::serialize_entries(&entries, layout.geometry.reserved_slots);
        debug_assert_eq!(content.len(), layout.root_dir.len as usize);

        self.write_region(layout.root_dir.start, &content)?;
        debug!(
            "Root dir: [{}, {}), len = {}, {} reserved slots",
            layout.root_dir.start,
            layout.root_dir.end(),
            layout.root_dir.len,
            layout.geometry.reserved_slots
        );
        Ok(())
    }

    fn write_swap(&mut self, layout: &Layout) -> Result<()> {
        let zeros = [0; SECTOR_SIZE];
        for sector in layout.swap.start..layout.swap.end() {
            self.dev.write_sector(sector, &zeros)?;
        }
        self.write_inode(layout.swap_inum(), &layout.swap)?;
        debug!(
            "File {}: [{}, {}), inum = {}, size = {}KiB",
            SWAP_NAME,
            layout.swap.start,
            layout.swap.end(),
            layout.swap_inum(),
            layout.swap.len / 1024
        );
        Ok(())
    }

    fn write_inode(&mut self, inum: u32, extent: &Extent) -> Result<()> {
        let inode = DiskInode::new(extent.start, extent.len);
        self.dev.write_sector(inum, &inode.serialize())?;
        Ok(())
    }

    /// Writes `bytes` sector by sector from `start`. The tail of the last
    /// sector is zero filled.
    fn write_region(&mut self, start: SectorNumber, bytes: &[u8]) -> Result<()> {
        for (i, chunk) in bytes.chunks(SECTOR_SIZE).enumerate() {
            self.dev.write_sector(start + i as u32, chunk)?;
        }
        Ok(())
    }
}
