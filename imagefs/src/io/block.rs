/// The sector number to access ranging from 0 (the first sector) to n - 1 (the
/// last sector) where n is number of sectors available.
pub type SectorNumber = u32;

/// Sector addressed storage holding a disk image.
///
/// Buffers passed to `write_sector` may be shorter than a sector; the rest of
/// the sector is left as zeros. Reads always fill a whole sector.
pub trait BlockStorage {
    /// Number of sectors on the device.
    fn sector_count(&self) -> u32;
    /// Reads sector number into provided buffer.
    ///
    /// # Errors
    ///
    /// Attempting to read a sector out of range, or into a buffer smaller than
    /// a sector, will return an error.
    fn read_sector(&mut self, sector: SectorNumber, buf: &mut [u8]) -> std::io::Result<()>;
    /// Writes provided buffer into the specified sector number.
    ///
    /// # Errors
    ///
    /// Attempting to write a sector out of range, or a buffer larger than a
    /// sector, will return an error.
    fn write_sector(&mut self, sector: SectorNumber, buf: &[u8]) -> std::io::Result<()>;
    /// Flush any buffered disk IO from memory. This is useful if it must guaranteed
    /// the disk writes actually occurred, for instance, if being re-read from
    /// disk.
    fn sync_disk(&mut self) -> std::io::Result<()>;
}
