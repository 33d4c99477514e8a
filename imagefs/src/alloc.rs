use crate::config::Geometry;

#[derive(Debug, PartialEq)]
pub enum State {
    Free,
    Used,
}

/// Disk sector free bitmap.
///
/// Bit `n % 8` of byte `n / 8` tracks sector `n`. A set bit means the sector
/// is allocated, which is how the kernel reads the map back when it mounts
/// the image.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeMap {
    /// Number of sectors tracked.
    size: u32,
    bits: Vec<u8>,
}

impl FreeMap {
    /// Creates an all-free map covering every sector of the disk.
    pub fn new(geometry: &Geometry) -> Self {
        Self {
            size: geometry.sector_count(),
            bits: vec![0; geometry.free_map_len()],
        }
    }

    /// Wraps the bytes read back from an image. Returns `None` when the length
    /// does not cover `size` sectors exactly.
    pub fn parse(size: u32, buf: &[u8]) -> Option<Self> {
        if buf.len() != (size as usize + 7) / 8 {
            return None;
        }
        Some(Self {
            size,
            bits: buf.to_vec(),
        })
    }

    pub fn serialize(&self) -> &[u8] {
        &self.bits
    }

    /// State of `sector`, or `None` if the map does not cover it.
    pub fn get(&self, sector: u32) -> Option<State> {
        if sector >= self.size {
            return None;
        }
        let mask = 1 << (sector % 8);
        match self.bits[sector as usize / 8] & mask {
            0 => Some(State::Free),
            _ => Some(State::Used),
        }
    }

    pub fn set_reserved(&mut self, sector: u32) {
        assert!(sector < self.size, "sector {} outside free map", sector);
        self.bits[sector as usize / 8] |= 1 << (sector % 8);
    }

    /// Claims every sector in `0..end`.
    pub fn reserve_prefix(&mut self, end: u32) {
        for sector in 0..end {
            self.set_reserved(sector);
        }
    }

    pub fn free_count(&self) -> u32 {
        (0..self.size)
            .filter(|&sector| self.get(sector) == Some(State::Free))
            .count() as u32
    }
}
