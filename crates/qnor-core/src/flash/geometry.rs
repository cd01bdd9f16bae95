//! Flash geometry and erase units

use crate::error::{Error, Result};
use crate::spi::opcodes;

/// Size of the intermediate (32 KiB) block erase
pub const BLOCK_32K: u32 = 32 * 1024;

/// Physical layout of a NOR flash chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct FlashGeometry {
    /// Total chip size in bytes
    pub total_size: u32,
    /// Program page size in bytes
    pub page_size: u32,
    /// Smallest erase unit in bytes
    pub sector_size: u32,
    /// Large block erase unit in bytes
    pub block_size: u32,
}

impl FlashGeometry {
    /// Winbond W25Q64JV: 8 MiB, 256 B pages, 4 KiB sectors, 64 KiB blocks
    pub const W25Q64JV: Self = Self {
        total_size: 8 * 1024 * 1024,
        page_size: 256,
        sector_size: 4096,
        block_size: 64 * 1024,
    };

    /// Check the size relationships NOR flash relies on
    ///
    /// All sizes must be non-zero powers of two, pages must tile sectors,
    /// sectors must tile blocks and the chip.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            self.total_size,
            self.page_size,
            self.sector_size,
            self.block_size,
        ];
        if !sizes.iter().all(|s| s.is_power_of_two()) {
            return Err(Error::InvalidGeometry);
        }
        if self.total_size % self.sector_size != 0
            || self.sector_size % self.page_size != 0
            || self.block_size % self.sector_size != 0
            || self.block_size > self.total_size
        {
            return Err(Error::InvalidGeometry);
        }
        Ok(())
    }

    /// Number of pages on the chip
    pub fn page_count(&self) -> u32 {
        self.total_size / self.page_size
    }

    /// Number of sectors on the chip
    pub fn sector_count(&self) -> u32 {
        self.total_size / self.sector_size
    }
}

impl Default for FlashGeometry {
    fn default() -> Self {
        Self::W25Q64JV
    }
}

/// Erase granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum EraseUnit {
    /// Sector erase (0x20)
    Sector,
    /// 32 KiB block erase (0x52)
    Block32K,
    /// Block erase (0xD8)
    Block64K,
}

impl EraseUnit {
    /// Instruction for this unit
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Sector => opcodes::SE_20,
            Self::Block32K => opcodes::BE_52,
            Self::Block64K => opcodes::BE_D8,
        }
    }

    /// Unit size in bytes on a chip with this geometry
    pub const fn size(&self, geometry: &FlashGeometry) -> u32 {
        match self {
            Self::Sector => geometry.sector_size,
            Self::Block32K => BLOCK_32K,
            Self::Block64K => geometry.block_size,
        }
    }

    /// The unit whose size is exactly `size`, if any
    pub fn for_size(size: u32, geometry: &FlashGeometry) -> Option<Self> {
        [Self::Sector, Self::Block32K, Self::Block64K]
            .into_iter()
            .find(|unit| unit.size(geometry) == size)
    }
}
