use std::convert::TryFrom;

use crate::config::{bytes_to_sectors, Geometry, FIRST_FILE_INUM};
use crate::dir::DIR_ENTRY_SIZE;
use crate::error::{ImageError, Result};

/// A contiguous, sector aligned region of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// First sector of the region.
    pub start: u32,
    /// Logical length in bytes, as recorded in the inode.
    pub len: u32,
}

impl Extent {
    /// Sectors reserved for the region, the length rounded up.
    pub fn sectors(&self) -> u32 {
        bytes_to_sectors(self.len as usize)
    }

    /// First sector after the region.
    pub fn end(&self) -> u32 {
        self.start + self.sectors()
    }
}

/// Sector assignment for every object on the disk.
///
/// # Layout
/// ==========================================================================
/// | Inodes (one per sector) | Free map | Root dir | File 0 .. File n | Swap |
/// ==========================================================================
///
/// Inode `i` sits at sector `i`: the free map at 0, the root directory at 1,
/// file `k` at `k + 2` and the swap file right after the last file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub free_map: Extent,
    pub root_dir: Extent,
    pub files: Vec<Extent>,
    pub swap: Extent,
    /// Geometry the plan was made for. The writer sizes the free map and the
    /// reserved directory slots from it.
    pub geometry: Geometry,
}

impl Layout {
    /// Plans an image holding files of the given sizes, in order. Regions
    /// are placed back to back starting right after the inode table.
    pub fn plan(geometry: &Geometry, sizes: &[u64]) -> Result<Self> {
        let file_count = sizes.len();
        if file_count > geometry.max_files {
            return Err(ImageError::CapacityExceeded {
                max: geometry.max_files,
            });
        }

        // Free map, root dir and swap share the table with the files.
        let inode_count = file_count as u64 + 3;
        let free_map = Extent {
            start: checked_sector(geometry, inode_count)?,
            len: geometry.free_map_len() as u32,
        };

        let root_dir = Extent {
            start: free_map.end(),
            len: ((file_count + 1 + geometry.reserved_slots) * DIR_ENTRY_SIZE) as u32,
        };

        let mut files = Vec::with_capacity(file_count);
        let mut current = root_dir.end();
        for (i, &size) in sizes.iter().enumerate() {
            let len = u32::try_from(size)
                .map_err(|_| ImageError::FileTooLarge { index: i, size })?;
            let extent = Extent {
                start: current,
                len,
            };
            current = checked_sector(geometry, current as u64 + extent.sectors() as u64)?;
            files.push(extent);
        }

        let swap = Extent {
            start: current,
            len: geometry.swap_size as u32,
        };
        checked_sector(geometry, current as u64 + swap.sectors() as u64)?;

        Ok(Self {
            free_map,
            root_dir,
            files,
            swap,
            geometry: *geometry,
        })
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Inode number, and so inode sector, of file `index`.
    pub fn file_inum(index: usize) -> u32 {
        FIRST_FILE_INUM + index as u32
    }

    pub fn swap_inum(&self) -> u32 {
        Self::file_inum(self.files.len())
    }

    /// First sector not claimed by any region. Everything below it is in use.
    pub fn first_free_sector(&self) -> u32 {
        self.swap.end()
    }
}

/// Fails when `sector` lies past the end of the disk.
fn checked_sector(geometry: &Geometry, sector: u64) -> Result<u32> {
    let available = geometry.sector_count();
    if sector > available as u64 {
        return Err(ImageError::DiskFull {
            needed: sector,
            available,
        });
    }
    Ok(sector as u32)
}
