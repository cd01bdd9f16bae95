//! Block-device geometry handed to the filesystem

use crate::error::{Error, Result};
use crate::flash::{EraseUnit, FlashGeometry};

/// Static geometry and tuning values for a littlefs-style filesystem
///
/// One filesystem block maps onto one erase unit of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockDeviceConfig {
    /// Minimum read size in bytes
    pub read_size: u32,
    /// Minimum program size in bytes
    pub prog_size: u32,
    /// Erase block size in bytes
    pub block_size: u32,
    /// Number of erase blocks
    pub block_count: u32,
    /// Filesystem cache size in bytes
    pub cache_size: u32,
    /// Lookahead buffer size in bytes
    pub lookahead_size: u32,
    /// Erase cycles before the filesystem relocates a metadata block
    pub block_cycles: i32,
}

impl BlockDeviceConfig {
    /// Derive the configuration for a chip
    ///
    /// Reads and programs are page-sized, blocks are sectors, and the whole
    /// chip is handed to the filesystem.
    pub const fn from_geometry(geometry: &FlashGeometry) -> Self {
        Self {
            read_size: geometry.page_size,
            prog_size: geometry.page_size,
            block_size: geometry.sector_size,
            block_count: geometry.total_size / geometry.sector_size,
            cache_size: 1024,
            lookahead_size: 32,
            block_cycles: 100,
        }
    }

    /// Bytes covered by all blocks
    pub fn total_size(&self) -> u64 {
        self.block_size as u64 * self.block_count as u64
    }

    /// Check the filesystem's sizing rules against the chip
    pub fn validate(&self, geometry: &FlashGeometry) -> Result<()> {
        let nonzero = [
            self.read_size,
            self.prog_size,
            self.block_size,
            self.block_count,
            self.cache_size,
            self.lookahead_size,
        ];
        if nonzero.contains(&0) {
            return Err(Error::InvalidGeometry);
        }

        let ok = self.cache_size % self.read_size == 0
            && self.cache_size % self.prog_size == 0
            && self.block_size % self.cache_size == 0
            && self.block_size % self.prog_size == 0
            && self.lookahead_size % 8 == 0
            && self.total_size() <= geometry.total_size as u64
            && EraseUnit::for_size(self.block_size, geometry).is_some();
        if !ok {
            return Err(Error::InvalidGeometry);
        }
        Ok(())
    }
}

impl Default for BlockDeviceConfig {
    fn default() -> Self {
        Self::from_geometry(&FlashGeometry::W25Q64JV)
    }
}
