//! NOR flash driver over an owned bus
//!
//! [`NorFlash`] owns the bus handle for its whole lifetime. Every operation
//! takes `&mut self`, so there is never more than one command in flight.

use super::chunks::{EraseUnits, PageChunks};
use super::config::{FlashConfig, VerifyPolicy};
use super::geometry::{EraseUnit, FlashGeometry};
use crate::bus::{BusFeatures, QspiBus};
use crate::error::{Error, Result};
use crate::protocol::w25q;
use crate::protocol::{JedecId, MemoryMappedMode};
use crate::sfdp::{self, SfdpInfo, SFDP_PROBE_LEN};
use crate::spi::{opcodes, AddressWidth, Status2, Status3};

/// Size of the stack buffer used for read-back verification
const VERIFY_CHUNK: usize = 256;

/// The erased value for NOR flash (all bits set)
const ERASED_VALUE: u8 = 0xFF;

/// A W25Qxx chip on a quad-SPI bus
pub struct NorFlash<B> {
    bus: B,
    config: FlashConfig,
}

impl<B: QspiBus> NorFlash<B> {
    /// Take ownership of the bus
    ///
    /// Fails if the configuration is inconsistent or the bus cannot drive
    /// the address width it asks for. No command is sent.
    pub fn new(bus: B, config: FlashConfig) -> Result<Self> {
        config.validate()?;
        if config.address_width == AddressWidth::FourByte
            && !bus.features().contains(BusFeatures::FOUR_BYTE_ADDR)
        {
            return Err(Error::Unsupported);
        }
        Ok(Self { bus, config })
    }

    /// Give the bus back
    pub fn release(self) -> B {
        self.bus
    }

    /// Borrow the bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Active configuration
    pub fn config(&self) -> &FlashConfig {
        &self.config
    }

    /// Chip layout
    pub fn geometry(&self) -> &FlashGeometry {
        &self.config.geometry
    }

    fn check_range(&self, addr: u32, len: usize) -> Result<()> {
        if addr as u64 + len as u64 > self.config.geometry.total_size as u64 {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }

    // ========================================================================
    // Bring-up and identification
    // ========================================================================

    /// Software reset, then sleep for the configured settle time
    pub fn reset(&mut self) -> Result<()> {
        log::debug!("software reset");
        w25q::software_reset(&mut self.bus, self.config.timings.reset_settle_us)
    }

    /// Enable quad mode and set full output driver strength
    ///
    /// Both registers are updated read-modify-write through their volatile
    /// copies; every other bit is written back as read. QE is rewritten even
    /// when it is already set.
    pub fn configure(&mut self) -> Result<()> {
        let sr2 = w25q::read_status2(&mut self.bus)?;
        w25q::write_status2_volatile(&mut self.bus, sr2 | Status2::QE)?;

        let sr3 = w25q::read_status3(&mut self.bus)?;
        w25q::write_status3_volatile(&mut self.bus, sr3 - Status3::DRV)?;

        log::debug!(
            "configured SR2 0x{:02X} -> 0x{:02X}, SR3 0x{:02X} -> 0x{:02X}",
            sr2.bits(),
            (sr2 | Status2::QE).bits(),
            sr3.bits(),
            (sr3 - Status3::DRV).bits()
        );
        Ok(())
    }

    /// Full bring-up: reset, wait for ready, configure, check quad enable
    pub fn init(&mut self) -> Result<()> {
        let timings = self.config.timings;

        self.reset()?;
        self.bus.delay_us(timings.init_delay_us);
        w25q::wait_ready(&mut self.bus, timings.status_write)?;
        w25q::write_enable(&mut self.bus, timings.write_enable)?;
        self.configure()?;

        if self.config.address_width == AddressWidth::FourByte {
            w25q::enter_4byte_mode(&mut self.bus)?;
        }

        if !w25q::read_status2(&mut self.bus)?.quad_enabled() {
            log::warn!("QE still clear after configuration");
            return Err(Error::QuadEnableFailed);
        }
        log::debug!("flash initialised");
        Ok(())
    }

    /// Read the JEDEC manufacturer and device ID
    pub fn read_id(&mut self) -> Result<JedecId> {
        w25q::read_jedec_id(&mut self.bus)
    }

    /// Read the 64-bit factory unique ID
    pub fn read_unique_id(&mut self) -> Result<[u8; opcodes::UNIQUE_ID_LEN]> {
        w25q::read_unique_id(&mut self.bus)
    }

    /// Raw read from the SFDP area
    pub fn read_sfdp(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        w25q::read_sfdp(&mut self.bus, addr, buf)
    }

    /// Read and decode the start of the SFDP area
    pub fn probe_sfdp(&mut self) -> Result<SfdpInfo> {
        let mut buf = [0u8; SFDP_PROBE_LEN];
        self.read_sfdp(0, &mut buf)?;
        sfdp::parse(&buf)
    }

    /// Hand the chip to the peripheral's memory-mapped read mode
    pub fn enable_memory_mapped(&mut self, mode: MemoryMappedMode) -> Result<()> {
        w25q::enable_memory_mapped(&mut self.bus, mode, self.config.address_width)
    }

    // ========================================================================
    // Array access
    // ========================================================================

    /// Read `buf.len()` bytes starting at `addr` with quad I/O fast read
    pub fn read(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        self.check_range(addr, buf.len())?;
        if buf.is_empty() {
            return Ok(());
        }
        log::trace!("read 0x{:08X} len {}", addr, buf.len());
        w25q::fast_read_quad_io(&mut self.bus, addr, self.config.address_width, buf)
    }

    /// Program `data` at `addr`, one page-bounded command at a time
    ///
    /// The target range must already be erased; NOR programming can only
    /// clear bits.
    pub fn program(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.check_range(addr, data.len())?;
        log::debug!("program 0x{:08X} len {}", addr, data.len());

        let timings = self.config.timings;
        let width = self.config.address_width;
        for chunk in PageChunks::new(addr, data.len(), self.config.geometry.page_size) {
            let bytes = &data[chunk.offset..chunk.offset + chunk.len];
            w25q::program_page(
                &mut self.bus,
                chunk.addr,
                width,
                bytes,
                timings.write_enable,
                timings.page_program,
            )?;
            if self.config.verify == VerifyPolicy::ReadBack {
                self.verify_program(chunk.addr, bytes)?;
            }
        }
        Ok(())
    }

    fn verify_program(&mut self, addr: u32, expected: &[u8]) -> Result<()> {
        let mut buf = [0u8; VERIFY_CHUNK];
        for (i, want) in expected.chunks(VERIFY_CHUNK).enumerate() {
            let at = addr + (i * VERIFY_CHUNK) as u32;
            let have = &mut buf[..want.len()];
            self.read(at, have)?;
            if let Some(pos) = have.iter().zip(want).position(|(h, w)| h != w) {
                let bad = at + pos as u32;
                log::warn!("program verify mismatch at 0x{:08X}", bad);
                return Err(Error::VerifyFailed { addr: bad });
            }
        }
        Ok(())
    }

    /// Erase every `unit` that overlaps `[start, end]`
    ///
    /// `start` is rounded down to the unit size; `end` is inclusive.
    /// An `end` below `start` erases nothing.
    pub fn erase(&mut self, start: u32, end: u32, unit: EraseUnit) -> Result<()> {
        if end >= self.config.geometry.total_size {
            return Err(Error::AddressOutOfBounds);
        }
        let size = unit.size(&self.config.geometry);
        let timing = self.config.erase_timing(unit);
        log::debug!("erase 0x{:08X}..=0x{:08X} with {:?}", start, end, unit);

        for addr in EraseUnits::new(start, end, size) {
            w25q::erase_unit(
                &mut self.bus,
                unit.opcode(),
                addr,
                self.config.address_width,
                self.config.timings.write_enable,
                timing,
            )?;
            if self.config.verify == VerifyPolicy::ReadBack {
                self.verify_erased(addr, size)?;
            }
        }
        Ok(())
    }

    /// Erase the whole chip
    pub fn erase_chip(&mut self) -> Result<()> {
        log::debug!("chip erase");
        let timings = self.config.timings;
        w25q::chip_erase(&mut self.bus, timings.write_enable, timings.chip_erase)?;
        if self.config.verify == VerifyPolicy::ReadBack {
            self.verify_erased(0, self.config.geometry.total_size)?;
        }
        Ok(())
    }

    fn verify_erased(&mut self, addr: u32, len: u32) -> Result<()> {
        let mut buf = [0u8; VERIFY_CHUNK];
        let mut offset = 0u32;
        while offset < len {
            let n = (len - offset).min(VERIFY_CHUNK as u32) as usize;
            let at = addr + offset;
            self.read(at, &mut buf[..n])?;
            if let Some(pos) = buf[..n].iter().position(|&b| b != ERASED_VALUE) {
                let found = buf[pos];
                let bad = at + pos as u32;
                log::warn!("erase verify found 0x{:02X} at 0x{:08X}", found, bad);
                return Err(Error::EraseVerifyFailed { addr: bad, found });
            }
            offset += n as u32;
        }
        Ok(())
    }
}
