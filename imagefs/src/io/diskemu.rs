use std::fs::File;
use std::io::prelude::*;
use std::io::{ErrorKind, SeekFrom};

use super::block::{BlockStorage, SectorNumber};
use crate::config::{bytes_to_sectors, DISK_SIZE, SECTOR_SIZE};

/// Emulates a sector addressed disk in userspace using a regular file as the
/// backing store. The image produced is exactly what the kernel's virtio
/// block device will see.
pub struct FileBlockEmulator {
    /// The file must be a fixed-size file some exact multiple of the size of a sector.
    fd: File,
    /// The total number of sectors available in the file store.
    sector_count: u32,
}

impl FileBlockEmulator {
    /// Returns ownership of the underlying file descriptor to the caller.
    pub fn into_file(self) -> File {
        self.fd
    }

    fn check_range(&self, sector: SectorNumber) -> std::io::Result<()> {
        if sector >= self.sector_count {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "sector out of range",
            ));
        }
        Ok(())
    }
}

impl BlockStorage for FileBlockEmulator {
    fn sector_count(&self) -> u32 {
        self.sector_count
    }

    fn read_sector(&mut self, sector: SectorNumber, buf: &mut [u8]) -> std::io::Result<()> {
        self.check_range(sector)?;
        if buf.len() < SECTOR_SIZE {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "buffer does not contain enough space to read sector",
            ));
        }
        self.fd
            .seek(SeekFrom::Start(sector as u64 * SECTOR_SIZE as u64))?;
        self.fd.read_exact(&mut buf[..SECTOR_SIZE])
    }

    fn write_sector(&mut self, sector: SectorNumber, buf: &[u8]) -> std::io::Result<()> {
        self.check_range(sector)?;
        if buf.len() > SECTOR_SIZE {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "buffer exceeds sector size",
            ));
        }
        let mut sector_buf = [0; SECTOR_SIZE];
        sector_buf[..buf.len()].copy_from_slice(buf);
        self.fd
            .seek(SeekFrom::Start(sector as u64 * SECTOR_SIZE as u64))?;
        self.fd.write_all(&sector_buf)
    }

    fn sync_disk(&mut self) -> std::io::Result<()> {
        self.fd.sync_all()?;
        Ok(())
    }
}

pub struct FileBlockEmulatorBuilder {
    fd: File,
    disk_size: usize,
    clear: bool,
}

impl From<File> for FileBlockEmulatorBuilder {
    fn from(fd: File) -> Self {
        FileBlockEmulatorBuilder {
            fd,
            disk_size: DISK_SIZE,
            clear: true,
        }
    }
}

impl FileBlockEmulatorBuilder {
    /// Sets the size of the emulated disk in bytes. Partial trailing sectors
    /// are rounded up.
    pub fn with_disk_size(mut self, bytes: usize) -> Self {
        self.disk_size = bytes;
        self
    }

    /// Whether to discard existing contents of the file. Defaults to true;
    /// disable it to reopen an image that was already written, in which case
    /// the file is left untouched and may be opened read-only.
    pub fn clear_medium(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }

    /// This builder assumed ownership of the file descriptor used and does
    /// destructive things to prepare the file for use. Unless clearing is
    /// disabled, the file ends up exactly `disk_size` bytes long.
    pub fn build(self) -> std::io::Result<FileBlockEmulator> {
        debug_assert!(self.disk_size > 0);
        if self.clear {
            // Truncating to zero first drops any stale bytes, extending again
            // reads back as zeros.
            self.fd.set_len(0)?;
            self.fd.set_len(self.disk_size as u64)?;
        }
        Ok(FileBlockEmulator {
            fd: self.fd,
            sector_count: bytes_to_sectors(self.disk_size),
        })
    }
}
