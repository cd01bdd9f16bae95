//! The block device the filesystem talks to

use super::config::BlockDeviceConfig;
use crate::bus::QspiBus;
use crate::error::{Error, Result};
use crate::flash::{EraseUnit, NorFlash};
use core::fmt;

/// littlefs status code for success
pub const LFS_ERR_OK: i32 = 0;
/// littlefs status code for an I/O failure
pub const LFS_ERR_IO: i32 = -5;

/// Failure reported upward to the filesystem
///
/// The filesystem only distinguishes success from I/O error; the underlying
/// [`Error`] is logged when it is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockDeviceError {
    /// Bus failure, poll timeout, or verification mismatch
    Io,
}

impl BlockDeviceError {
    /// Negative littlefs status code
    pub const fn code(&self) -> i32 {
        match self {
            Self::Io => LFS_ERR_IO,
        }
    }
}

impl fmt::Display for BlockDeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io => write!(f, "block device I/O error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for BlockDeviceError {}

/// Convert an operation result to a littlefs status code
pub fn status_code(result: core::result::Result<(), BlockDeviceError>) -> i32 {
    match result {
        Ok(()) => LFS_ERR_OK,
        Err(e) => e.code(),
    }
}

fn to_io(op: &str, err: Error) -> BlockDeviceError {
    log::warn!("block device {} failed: {}", op, err);
    BlockDeviceError::Io
}

/// Four-operation block-device contract
///
/// Addresses are `(block, offset)` pairs. Out-of-range arguments are caller
/// bugs and panic.
pub trait BlockDevice {
    /// Static geometry
    fn config(&self) -> &BlockDeviceConfig;

    /// Read `buf.len()` bytes at `offset` inside `block`
    fn read(
        &mut self,
        block: u32,
        offset: u32,
        buf: &mut [u8],
    ) -> core::result::Result<(), BlockDeviceError>;

    /// Program `data` at `offset` inside an erased `block`
    fn prog(
        &mut self,
        block: u32,
        offset: u32,
        data: &[u8],
    ) -> core::result::Result<(), BlockDeviceError>;

    /// Erase `block`
    fn erase(&mut self, block: u32) -> core::result::Result<(), BlockDeviceError>;

    /// Flush pending writes
    fn sync(&mut self) -> core::result::Result<(), BlockDeviceError>;
}

/// [`BlockDevice`] backed by a [`NorFlash`]
pub struct FlashBlockDevice<B> {
    flash: NorFlash<B>,
    config: BlockDeviceConfig,
    erase_unit: EraseUnit,
}

impl<B: QspiBus> FlashBlockDevice<B> {
    /// Wrap a chip with the configuration derived from its geometry
    pub fn new(flash: NorFlash<B>) -> Result<Self> {
        let config = BlockDeviceConfig::from_geometry(flash.geometry());
        Self::with_config(flash, config)
    }

    /// Wrap a chip with an explicit configuration
    pub fn with_config(flash: NorFlash<B>, config: BlockDeviceConfig) -> Result<Self> {
        let geometry = *flash.geometry();
        config.validate(&geometry)?;
        let erase_unit =
            EraseUnit::for_size(config.block_size, &geometry).ok_or(Error::InvalidGeometry)?;
        Ok(Self {
            flash,
            config,
            erase_unit,
        })
    }

    /// Borrow the underlying driver
    pub fn flash_mut(&mut self) -> &mut NorFlash<B> {
        &mut self.flash
    }

    /// Give the driver back
    pub fn release(self) -> NorFlash<B> {
        self.flash
    }

    fn linear(&self, block: u32, offset: u32, len: usize) -> u32 {
        assert!(
            block < self.config.block_count,
            "block {} out of range (count {})",
            block,
            self.config.block_count
        );
        assert!(
            offset as u64 + len as u64 <= self.config.block_size as u64,
            "offset {} + size {} exceeds block size {}",
            offset,
            len,
            self.config.block_size
        );
        block * self.config.block_size + offset
    }
}

impl<B: QspiBus> BlockDevice for FlashBlockDevice<B> {
    fn config(&self) -> &BlockDeviceConfig {
        &self.config
    }

    fn read(
        &mut self,
        block: u32,
        offset: u32,
        buf: &mut [u8],
    ) -> core::result::Result<(), BlockDeviceError> {
        let addr = self.linear(block, offset, buf.len());
        log::trace!("bd read block {} off {} len {}", block, offset, buf.len());
        self.flash.read(addr, buf).map_err(|e| to_io("read", e))
    }

    fn prog(
        &mut self,
        block: u32,
        offset: u32,
        data: &[u8],
    ) -> core::result::Result<(), BlockDeviceError> {
        let addr = self.linear(block, offset, data.len());
        log::trace!("bd prog block {} off {} len {}", block, offset, data.len());
        self.flash.program(addr, data).map_err(|e| to_io("prog", e))
    }

    fn erase(&mut self, block: u32) -> core::result::Result<(), BlockDeviceError> {
        let start = self.linear(block, 0, 0);
        let end = start + (self.config.block_size - 1);
        log::trace!("bd erase block {}", block);
        self.flash
            .erase(start, end, self.erase_unit)
            .map_err(|e| to_io("erase", e))
    }

    fn sync(&mut self) -> core::result::Result<(), BlockDeviceError> {
        Ok(())
    }
}
