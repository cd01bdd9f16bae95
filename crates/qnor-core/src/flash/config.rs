//! Driver configuration
//!
//! Defaults follow the W25Q64JV datasheet maximums with some headroom.
//! With the `std` feature every type here can be loaded from a config file;
//! fields left out keep their default.

use super::geometry::FlashGeometry;
use crate::error::{Error, Result};
use crate::protocol::PollTiming;
use crate::spi::AddressWidth;

/// Poll interval and timeout for each kind of wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct PollTimings {
    /// WEL latch after WREN
    pub write_enable: PollTiming,
    /// Page program (tPP max 3 ms)
    pub page_program: PollTiming,
    /// 4 KiB sector erase (tSE max 400 ms)
    pub sector_erase: PollTiming,
    /// 32 KiB block erase (tBE1 max 1.6 s)
    pub block32_erase: PollTiming,
    /// 64 KiB block erase (tBE2 max 2 s)
    pub block64_erase: PollTiming,
    /// Chip erase (tCE max 100 s)
    pub chip_erase: PollTiming,
    /// Status register write and the ready wait during bring-up
    pub status_write: PollTiming,
    /// Delay after a software reset (tRST)
    pub reset_settle_us: u32,
    /// Delay between reset and the first ready poll in `init`
    pub init_delay_us: u32,
}

impl PollTimings {
    /// Every poll budget, for checks that apply to all of them
    fn polls(&self) -> [PollTiming; 7] {
        [
            self.write_enable,
            self.page_program,
            self.sector_erase,
            self.block32_erase,
            self.block64_erase,
            self.chip_erase,
            self.status_write,
        ]
    }
}

impl Default for PollTimings {
    fn default() -> Self {
        Self {
            write_enable: PollTiming::new(1, 1_000),
            page_program: PollTiming::new(10, 5_000),
            sector_erase: PollTiming::new(1_000, 500_000),
            block32_erase: PollTiming::new(10_000, 2_000_000),
            block64_erase: PollTiming::new(10_000, 3_000_000),
            chip_erase: PollTiming::new(100_000, 200_000_000),
            status_write: PollTiming::new(1_000, 20_000),
            reset_settle_us: 30,
            init_delay_us: 1_000,
        }
    }
}

/// Read-back checking after program and erase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum VerifyPolicy {
    /// Trust the chip
    #[default]
    None,
    /// Read every programmed or erased range back and compare
    ReadBack,
}

/// Everything [`super::NorFlash`] needs besides the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "std", serde(default))]
pub struct FlashConfig {
    /// Chip layout
    pub geometry: FlashGeometry,
    /// Poll budgets
    pub timings: PollTimings,
    /// Read-back policy
    pub verify: VerifyPolicy,
    /// Address phase width for array commands
    pub address_width: AddressWidth,
}

impl Default for FlashConfig {
    fn default() -> Self {
        Self {
            geometry: FlashGeometry::W25Q64JV,
            timings: PollTimings::default(),
            verify: VerifyPolicy::None,
            address_width: AddressWidth::ThreeByte,
        }
    }
}

impl FlashConfig {
    /// Check the geometry, that the address width reaches the whole chip,
    /// and that every poll budget spans at least one interval
    pub fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if (self.geometry.total_size as u64) > self.address_width.max_size() {
            return Err(Error::InvalidGeometry);
        }
        if self.timings.polls().iter().any(|t| t.timeout_us < t.interval_us) {
            return Err(Error::InvalidTiming);
        }
        Ok(())
    }

    /// Poll timing for an erase unit
    pub fn erase_timing(&self, unit: super::EraseUnit) -> PollTiming {
        match unit {
            super::EraseUnit::Sector => self.timings.sector_erase,
            super::EraseUnit::Block32K => self.timings.block32_erase,
            super::EraseUnit::Block64K => self.timings.block64_erase,
        }
    }
}
