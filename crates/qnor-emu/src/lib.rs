//! qnor-emu - In-memory W25Qxx emulator
//!
//! [`EmulatedFlash`] implements [`QspiBus`] by decoding every transaction the
//! way a W25Q64JV would. It is used by the integration tests and by the
//! `qnor` CLI, which backs it with an image file.
//!
//! Beyond array contents it models the parts of the chip the driver depends
//! on: the write enable latch, a BUSY window after program and erase,
//! volatile and non-volatile status registers, the software reset handshake,
//! page wrap-around, and the quad-enable bit gating every quad command.
//! Line configuration and dummy cycles are checked per opcode, so a driver
//! that builds a command wrong gets a bus error rather than silent success.
//!
//! For tests it also keeps a transaction log, per-sector erase counts, and
//! simple fault injection.

mod config;
mod image;
mod record;
mod sfdp;

pub use config::EmulatorConfig;
pub use image::ImageError;
pub use record::Transaction;

use qnor_core::bus::{BusFeatures, QspiBus};
use qnor_core::error::{BusFailure, Error, Result};
use qnor_core::flash::BLOCK_32K;
use qnor_core::protocol::{self, PollCondition};
use qnor_core::spi::{opcodes, AddressWidth, IoMode, QspiCommand, Status1, Status2, Status3};

/// The erased value for NOR flash (all bits set)
const ERASED: u8 = 0xFF;

/// Emulated W25Qxx chip behind a quad-SPI bus
pub struct EmulatedFlash {
    config: EmulatorConfig,
    data: Vec<u8>,
    sfdp: Vec<u8>,

    // Volatile status registers as the host sees them
    sr1: Status1,
    sr2: Status2,
    sr3: Status3,
    // Non-volatile copies, reloaded on reset
    nv_sr1: u8,
    nv_sr2: u8,
    nv_sr3: u8,

    volatile_write_armed: bool,
    reset_armed: bool,
    busy_remaining: u32,
    four_byte: bool,
    cs_high_cycles: u8,
    memory_mapped: bool,

    erase_counts: Vec<u32>,
    transactions: Vec<Transaction>,
    recording: bool,
    status_samples: u64,
    elapsed_us: u64,

    fail_on: Option<(u8, BusFailure)>,
    stuck_busy: bool,
}

impl EmulatedFlash {
    /// Create an erased chip
    pub fn new(config: EmulatorConfig) -> Self {
        let size = config.geometry.total_size as usize;
        let sectors = config.geometry.sector_count() as usize;
        Self {
            data: vec![ERASED; size],
            sfdp: sfdp::build_table(&config.geometry),
            sr1: Status1::from_bits_retain(config.status1 & !0x03),
            sr2: Status2::from_bits_retain(config.status2),
            sr3: Status3::from_bits_retain(config.status3),
            nv_sr1: config.status1 & !0x03,
            nv_sr2: config.status2,
            nv_sr3: config.status3,
            volatile_write_armed: false,
            reset_armed: false,
            busy_remaining: 0,
            four_byte: false,
            cs_high_cycles: opcodes::CS_HIGH_CYCLES_DEFAULT,
            memory_mapped: false,
            erase_counts: vec![0; sectors],
            transactions: Vec::new(),
            recording: true,
            status_samples: 0,
            elapsed_us: 0,
            fail_on: None,
            stuck_busy: false,
            config,
        }
    }

    /// Create an erased W25Q64JV
    pub fn new_default() -> Self {
        Self::new(EmulatorConfig::default())
    }

    /// Create a chip with pre-filled contents
    pub fn with_data(config: EmulatorConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = initial_data.len().min(flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Array contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable array contents, bypassing the command interface
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Emulator configuration
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Current (volatile) status registers
    pub fn status(&self) -> (Status1, Status2, Status3) {
        let mut sr1 = self.sr1;
        sr1.set(Status1::BUSY, self.is_busy());
        (sr1, self.sr2, self.sr3)
    }

    /// Non-volatile status register values
    pub fn nonvolatile_status(&self) -> (u8, u8, u8) {
        (self.nv_sr1, self.nv_sr2, self.nv_sr3)
    }

    /// Every transaction executed so far
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Opcodes of every transaction executed so far
    pub fn opcodes(&self) -> Vec<u8> {
        self.transactions.iter().map(|t| t.opcode).collect()
    }

    /// Turn the transaction log on or off
    ///
    /// Counters such as [`status_samples`](Self::status_samples) keep running
    /// either way.
    pub fn set_recording(&mut self, recording: bool) {
        self.recording = recording;
    }

    /// Forget the transaction log
    pub fn clear_log(&mut self) {
        self.transactions.clear();
        self.status_samples = 0;
    }

    /// Number of SR1 samples taken, by software or auto polling
    pub fn status_samples(&self) -> u64 {
        self.status_samples
    }

    /// Total time spent in `delay_us`
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    /// Number of times sector `index` has been erased
    pub fn erase_count(&self, index: usize) -> u32 {
        self.erase_counts.get(index).copied().unwrap_or(0)
    }

    /// Highest erase count of any sector
    pub fn max_erase_count(&self) -> u32 {
        self.erase_counts.iter().copied().max().unwrap_or(0)
    }

    /// Chip-select high time currently configured on the bus
    pub fn cs_high_cycles(&self) -> u8 {
        self.cs_high_cycles
    }

    /// True if the chip is in 4-byte address mode
    pub fn four_byte_mode(&self) -> bool {
        self.four_byte
    }

    /// True once the bus has been switched to memory-mapped mode
    pub fn is_memory_mapped(&self) -> bool {
        self.memory_mapped
    }

    /// Leave memory-mapped mode so commands are accepted again
    pub fn disable_memory_mapped(&mut self) {
        self.memory_mapped = false;
    }

    /// Read through the memory-mapped window
    pub fn mapped_read(&self, addr: u32, buf: &mut [u8]) -> Result<()> {
        if !self.memory_mapped {
            return Err(Error::Unsupported);
        }
        self.read_array(addr, buf);
        Ok(())
    }

    /// Fail every future transaction with `opcode`
    pub fn fail_on(&mut self, opcode: u8, failure: BusFailure) {
        self.fail_on = Some((opcode, failure));
    }

    /// Keep BUSY set regardless of what the chip is doing
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Remove all injected faults
    pub fn clear_faults(&mut self) {
        self.fail_on = None;
        self.stuck_busy = false;
    }

    /// Reload everything a power cycle would
    pub fn power_cycle(&mut self) {
        self.reset_state();
        self.memory_mapped = false;
        self.cs_high_cycles = opcodes::CS_HIGH_CYCLES_DEFAULT;
    }

    // ========================================================================
    // Internal state machine
    // ========================================================================

    fn record(&mut self, cmd: &QspiCommand<'_>) {
        if self.recording {
            self.transactions
                .push(Transaction::capture(cmd, self.cs_high_cycles));
        }
    }

    fn is_busy(&self) -> bool {
        self.stuck_busy || self.busy_remaining > 0
    }

    fn start_busy(&mut self) {
        self.busy_remaining = self.config.busy_polls;
        if self.busy_remaining == 0 {
            self.finish_busy();
        }
    }

    fn finish_busy(&mut self) {
        self.sr1.remove(Status1::WEL);
    }

    fn sample_status1(&mut self) -> u8 {
        self.status_samples += 1;
        if self.stuck_busy {
            return (self.sr1 | Status1::BUSY).bits();
        }
        if self.busy_remaining > 0 {
            let value = self.sr1 | Status1::BUSY;
            self.busy_remaining -= 1;
            if self.busy_remaining == 0 {
                self.finish_busy();
            }
            return value.bits();
        }
        self.sr1.bits()
    }

    fn reset_state(&mut self) {
        self.sr1 = Status1::from_bits_retain(self.nv_sr1);
        self.sr2 = Status2::from_bits_retain(self.nv_sr2);
        self.sr3 = Status3::from_bits_retain(self.nv_sr3);
        self.volatile_write_armed = false;
        self.reset_armed = false;
        self.busy_remaining = 0;
        self.four_byte = false;
    }

    fn array_width(&self) -> AddressWidth {
        if self.four_byte {
            AddressWidth::FourByte
        } else {
            AddressWidth::ThreeByte
        }
    }

    fn read_array(&self, addr: u32, buf: &mut [u8]) {
        let size = self.data.len();
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.data[(addr as usize + i) % size];
        }
    }

    /// Check the line configuration, dummy cycles and address width of `cmd`
    fn expect(
        &self,
        cmd: &QspiCommand<'_>,
        io_mode: IoMode,
        dummy_cycles: u8,
        width: AddressWidth,
    ) -> Result<()> {
        let ok = cmd.io_mode == io_mode
            && cmd.dummy_cycles == dummy_cycles
            && cmd.address_width == width
            && (width == AddressWidth::None) != cmd.address.is_some();
        if !ok {
            log::warn!(
                "malformed 0x{:02X}: mode {:?} dummy {} width {:?}",
                cmd.opcode,
                cmd.io_mode,
                cmd.dummy_cycles,
                cmd.address_width
            );
            return Err(Error::Bus(BusFailure::Command));
        }
        if io_mode.requires_quad() && !self.sr2.quad_enabled() {
            log::warn!("quad command 0x{:02X} with QE clear", cmd.opcode);
            return Err(Error::Bus(BusFailure::Command));
        }
        Ok(())
    }

    fn handle_read(&mut self, cmd: &mut QspiCommand<'_>, io_mode: IoMode, dummy: u8) -> Result<()> {
        self.expect(cmd, io_mode, dummy, self.array_width())?;
        let addr = cmd.address.unwrap_or(0);
        if let Some(buf) = cmd.receive_buf() {
            self.read_array(addr, buf);
        }
        Ok(())
    }

    fn handle_program(&mut self, cmd: &QspiCommand<'_>, io_mode: IoMode) -> Result<()> {
        self.expect(cmd, io_mode, 0, self.array_width())?;
        if !self.sr1.write_enabled() {
            log::trace!("program 0x{:02X} ignored: WEL clear", cmd.opcode);
            return Ok(());
        }
        let data = cmd.transmit_data().unwrap_or(&[]);
        let page = self.config.geometry.page_size as usize;
        let addr = cmd.address.unwrap_or(0) as usize % self.data.len();
        let base = addr - addr % page;

        // The page buffer wraps, later bytes replace earlier ones
        let mut latch: Vec<Option<u8>> = vec![None; page];
        for (i, &byte) in data.iter().enumerate() {
            latch[(addr - base + i) % page] = Some(byte);
        }
        for (i, byte) in latch.into_iter().enumerate() {
            if let Some(byte) = byte {
                self.data[base + i] &= byte;
            }
        }
        self.start_busy();
        Ok(())
    }

    fn handle_erase(&mut self, cmd: &QspiCommand<'_>, size: usize) -> Result<()> {
        self.expect(cmd, IoMode::Single, 0, self.array_width())?;
        if !self.sr1.write_enabled() {
            log::trace!("erase 0x{:02X} ignored: WEL clear", cmd.opcode);
            return Ok(());
        }
        let addr = cmd.address.unwrap_or(0) as usize % self.data.len();
        let start = addr - addr % size;
        let end = (start + size).min(self.data.len());
        self.erase_range(start, end);
        self.start_busy();
        Ok(())
    }

    fn erase_range(&mut self, start: usize, end: usize) {
        self.data[start..end].fill(ERASED);
        let sector = self.config.geometry.sector_size as usize;
        for count in &mut self.erase_counts[start / sector..end / sector] {
            *count += 1;
        }
    }

    fn handle_chip_erase(&mut self, cmd: &QspiCommand<'_>) -> Result<()> {
        self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
        if !self.sr1.write_enabled() {
            return Ok(());
        }
        self.erase_range(0, self.data.len());
        self.start_busy();
        Ok(())
    }

    fn handle_status_write(&mut self, cmd: &QspiCommand<'_>) -> Result<()> {
        self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
        let Some(&value) = cmd.transmit_data().and_then(|d| d.first()) else {
            return Ok(());
        };

        let volatile = std::mem::take(&mut self.volatile_write_armed);
        if !volatile && !self.sr1.write_enabled() {
            log::trace!("status write 0x{:02X} ignored: not enabled", cmd.opcode);
            return Ok(());
        }

        match cmd.opcode {
            opcodes::WRSR => {
                // BUSY and WEL are read-only
                let keep = self.sr1.bits() & 0x03;
                self.sr1 = Status1::from_bits_retain((value & !0x03) | keep);
                if !volatile {
                    self.nv_sr1 = value & !0x03;
                }
            }
            opcodes::WRSR2 => {
                // SUS is read-only; the security lock bits are one-time programmable
                let sus = self.sr2.bits() & Status2::SUS.bits();
                let locks = self.nv_sr2 & (Status2::LB1 | Status2::LB2 | Status2::LB3).bits();
                let value = (value & !Status2::SUS.bits()) | sus | locks;
                self.sr2 = Status2::from_bits_retain(value);
                if !volatile {
                    self.nv_sr2 = value & !Status2::SUS.bits();
                }
            }
            _ => {
                self.sr3 = Status3::from_bits_retain(value);
                if !volatile {
                    self.nv_sr3 = value;
                }
            }
        }

        if !volatile {
            self.start_busy();
        }
        Ok(())
    }

    fn reply(cmd: &mut QspiCommand<'_>, bytes: &[u8]) {
        if let Some(buf) = cmd.receive_buf() {
            for (i, byte) in buf.iter_mut().enumerate() {
                *byte = bytes.get(i).copied().unwrap_or(ERASED);
            }
        }
    }

    fn decode(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
        match cmd.opcode {
            // Status registers; readable while busy
            opcodes::RDSR => {
                self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
                let status = self.sample_status1();
                if let Some(buf) = cmd.receive_buf() {
                    buf.fill(status);
                }
                Ok(())
            }
            opcodes::RDSR2 => {
                self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
                let sr2 = self.sr2.bits();
                if let Some(buf) = cmd.receive_buf() {
                    buf.fill(sr2);
                }
                Ok(())
            }
            opcodes::RDSR3 => {
                self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
                let sr3 = self.sr3.bits();
                if let Some(buf) = cmd.receive_buf() {
                    buf.fill(sr3);
                }
                Ok(())
            }

            _ if self.is_busy() => {
                log::trace!("0x{:02X} ignored while busy", cmd.opcode);
                Self::reply(cmd, &[]);
                Ok(())
            }

            opcodes::WREN => {
                self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
                self.sr1.insert(Status1::WEL);
                Ok(())
            }
            opcodes::WRDI => {
                self.sr1.remove(Status1::WEL);
                Ok(())
            }
            opcodes::VWREN => {
                self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
                self.volatile_write_armed = true;
                Ok(())
            }
            opcodes::WRSR | opcodes::WRSR2 | opcodes::WRSR3 => self.handle_status_write(cmd),

            // Identification
            opcodes::RDID => {
                self.expect(cmd, IoMode::Single, 0, AddressWidth::None)?;
                let id = self.config.jedec_id;
                Self::reply(cmd, &[id.manufacturer, id.memory_type, id.capacity]);
                Ok(())
            }
            opcodes::RDUID => {
                // Dummy bytes clocked out as an address phase of the same length
                if cmd.address_width.bytes() != opcodes::UNIQUE_ID_DUMMY_BYTES {
                    log::warn!("RDUID with {:?} dummy phase", cmd.address_width);
                    return Err(Error::Bus(BusFailure::Command));
                }
                self.expect(cmd, IoMode::Single, 0, cmd.address_width)?;
                let id = self.config.unique_id;
                Self::reply(cmd, &id);
                Ok(())
            }
            opcodes::RDSFDP => {
                self.expect(
                    cmd,
                    IoMode::Single,
                    opcodes::DUMMY_CYCLES_FAST_READ,
                    AddressWidth::ThreeByte,
                )?;
                let addr = cmd.address.unwrap_or(0) as usize;
                Self::reply(cmd, self.sfdp.get(addr..).unwrap_or(&[]));
                Ok(())
            }

            // Array reads
            opcodes::READ => self.handle_read(cmd, IoMode::Single, 0),
            opcodes::FAST_READ => {
                self.handle_read(cmd, IoMode::Single, opcodes::DUMMY_CYCLES_FAST_READ)
            }
            opcodes::QOR => self.handle_read(cmd, IoMode::QuadOut, opcodes::DUMMY_CYCLES_FAST_READ),
            opcodes::QIOR => self.handle_read(cmd, IoMode::QuadIo, opcodes::DUMMY_CYCLES_QUAD_IO),

            // Program
            opcodes::PP => self.handle_program(cmd, IoMode::Single),
            opcodes::QPP => self.handle_program(cmd, IoMode::QuadOut),

            // Erase
            opcodes::SE_20 => {
                let size = self.config.geometry.sector_size as usize;
                self.handle_erase(cmd, size)
            }
            opcodes::BE_52 => self.handle_erase(cmd, BLOCK_32K as usize),
            opcodes::BE_D8 => {
                let size = self.config.geometry.block_size as usize;
                self.handle_erase(cmd, size)
            }
            opcodes::CE_C7 | opcodes::CE_60 => self.handle_chip_erase(cmd),

            // Address mode
            opcodes::EN4B => {
                self.four_byte = true;
                Ok(())
            }
            opcodes::EX4B => {
                self.four_byte = false;
                Ok(())
            }

            _ => {
                log::warn!("unsupported opcode 0x{:02X}", cmd.opcode);
                Err(Error::Unsupported)
            }
        }
    }
}

impl std::fmt::Debug for EmulatedFlash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulatedFlash")
            .field("size", &self.data.len())
            .field("status", &self.status())
            .field("four_byte", &self.four_byte)
            .field("memory_mapped", &self.memory_mapped)
            .field("transactions", &self.transactions.len())
            .finish_non_exhaustive()
    }
}

impl QspiBus for EmulatedFlash {
    fn features(&self) -> BusFeatures {
        self.config.features
    }

    fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
        self.record(cmd);

        if let Some((opcode, failure)) = self.fail_on {
            if opcode == cmd.opcode {
                return Err(Error::Bus(failure));
            }
        }
        if self.memory_mapped {
            log::warn!("indirect command 0x{:02X} while memory-mapped", cmd.opcode);
            return Err(Error::Bus(BusFailure::Config));
        }

        // 0x50 only applies to the status write directly after it
        if !matches!(
            cmd.opcode,
            opcodes::VWREN | opcodes::WRSR | opcodes::WRSR2 | opcodes::WRSR3
        ) {
            self.volatile_write_armed = false;
        }

        // The reset handshake only works if 0x99 directly follows 0x66
        let armed = std::mem::take(&mut self.reset_armed);
        match cmd.opcode {
            opcodes::RSTEN => {
                self.reset_armed = true;
                Ok(())
            }
            opcodes::RST => {
                if armed {
                    log::trace!("software reset");
                    self.reset_state();
                }
                Ok(())
            }
            _ => self.decode(cmd),
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_us += us as u64;
    }

    fn poll_status(&mut self, opcode: u8, cond: &PollCondition) -> Result<u8> {
        if !self.config.features.contains(BusFeatures::AUTO_POLL) {
            return protocol::software_poll(self, opcode, cond);
        }

        // Hardware engine: one logged command, samples taken internally
        let mut reg = [0u8; 1];
        let cmd = QspiCommand::read_reg(opcode, &mut reg);
        self.record(&cmd);
        if let Some((failing, failure)) = self.fail_on {
            if failing == opcode {
                return Err(Error::Bus(failure));
            }
        }
        // Without auto-stop the engine runs the whole budget and the host
        // reads the final sample
        let mut last = None;
        for _ in 0..cond.max_polls() {
            let status = match opcode {
                opcodes::RDSR => self.sample_status1(),
                opcodes::RDSR2 => self.sr2.bits(),
                _ => self.sr3.bits(),
            };
            last = Some(status);
            if cond.auto_stop && cond.matches(status) {
                return Ok(status);
            }
            self.elapsed_us += cond.interval_us as u64;
        }
        match last {
            Some(status) if cond.matches(status) => Ok(status),
            _ => Err(Error::Timeout),
        }
    }

    fn set_cs_high_cycles(&mut self, cycles: u8) {
        self.cs_high_cycles = cycles;
    }

    fn enable_memory_mapped(&mut self, cmd: &QspiCommand<'_>) -> Result<()> {
        if !self.config.features.contains(BusFeatures::MEMORY_MAPPED) {
            return Err(Error::Unsupported);
        }
        let width = self.array_width();
        match cmd.opcode {
            opcodes::QOR => {
                self.expect(cmd, IoMode::QuadOut, opcodes::DUMMY_CYCLES_FAST_READ, width)?
            }
            opcodes::QIOR => {
                self.expect(cmd, IoMode::QuadIo, opcodes::DUMMY_CYCLES_QUAD_IO, width)?
            }
            opcodes::READ => self.expect(cmd, IoMode::Single, 0, width)?,
            _ => return Err(Error::Bus(BusFailure::Config)),
        }
        self.memory_mapped = true;
        Ok(())
    }
}
