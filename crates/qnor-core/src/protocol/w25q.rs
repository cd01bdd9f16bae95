//! W25Qxx command sequences
//!
//! Every function here builds one or more [`QspiCommand`]s and hands them to
//! [`issue`]. None of them knows about geometry; range splitting lives in
//! [`crate::flash`].

use super::poll::{PollCondition, PollTiming};
use crate::bus::QspiBus;
use crate::error::Result;
use crate::spi::{
    check_io_mode_supported, opcodes, AddressWidth, IoMode, QspiCommand, Status1, Status2,
    Status3,
};

/// JEDEC manufacturer ID assigned to Winbond
pub const MANUFACTURER_WINBOND: u8 = 0xEF;

/// Manufacturer and device identification returned by RDID (0x9F)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct JedecId {
    /// JEDEC manufacturer ID
    pub manufacturer: u8,
    /// Memory type (0x40 = W25Q..IQ/JQ, 0x70 = W25Q..IM/JM)
    pub memory_type: u8,
    /// Capacity code, log2 of the size in bytes
    pub capacity: u8,
}

impl JedecId {
    /// Chip size in bytes implied by the capacity code
    pub fn size_bytes(&self) -> Option<u32> {
        match self.capacity {
            0x10..=0x1F => Some(1 << self.capacity),
            _ => None,
        }
    }

    /// Combined 16-bit device ID (memory type and capacity)
    pub fn device_id(&self) -> u16 {
        ((self.memory_type as u16) << 8) | (self.capacity as u16)
    }
}

/// Read command replayed by the peripheral in memory-mapped mode
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryMappedMode {
    /// Fast Read Quad Output (0x6B, 1-1-4, 8 dummy cycles)
    QuadOutput,
    /// Fast Read Quad I/O (0xEB, 1-4-4, 6 dummy cycles)
    #[default]
    QuadIo,
}

/// Issue a single transaction
///
/// The one place a command reaches the bus. Refuses line configurations the
/// bus does not advertise.
pub fn issue<B: QspiBus + ?Sized>(bus: &mut B, cmd: &mut QspiCommand<'_>) -> Result<()> {
    check_io_mode_supported(cmd.io_mode, bus.features())?;
    log::trace!(
        "issue 0x{:02X} addr={:?} mode={:?} dummy={} len={}",
        cmd.opcode,
        cmd.address,
        cmd.io_mode,
        cmd.dummy_cycles,
        cmd.payload_len()
    );
    bus.execute(cmd)
}

fn read_register<B: QspiBus + ?Sized>(bus: &mut B, opcode: u8) -> Result<u8> {
    let mut buf = [0u8; 1];
    let mut cmd = QspiCommand::read_reg(opcode, &mut buf);
    issue(bus, &mut cmd)?;
    Ok(buf[0])
}

/// Read status register 1
pub fn read_status1<B: QspiBus + ?Sized>(bus: &mut B) -> Result<Status1> {
    read_register(bus, opcodes::RDSR).map(Status1::from_bits_retain)
}

/// Read status register 2
pub fn read_status2<B: QspiBus + ?Sized>(bus: &mut B) -> Result<Status2> {
    read_register(bus, opcodes::RDSR2).map(Status2::from_bits_retain)
}

/// Read status register 3
pub fn read_status3<B: QspiBus + ?Sized>(bus: &mut B) -> Result<Status3> {
    read_register(bus, opcodes::RDSR3).map(Status3::from_bits_retain)
}

/// Write a status register through its volatile copy
///
/// Sends the volatile write enable (0x50) followed by the register write.
/// Volatile writes complete immediately so there is no busy poll.
fn write_status_volatile<B: QspiBus + ?Sized>(bus: &mut B, opcode: u8, value: u8) -> Result<()> {
    issue(bus, &mut QspiCommand::simple(opcodes::VWREN))?;
    let data = [value];
    issue(bus, &mut QspiCommand::write_reg(opcode, &data))
}

/// Write status register 2 (volatile)
pub fn write_status2_volatile<B: QspiBus + ?Sized>(bus: &mut B, value: Status2) -> Result<()> {
    write_status_volatile(bus, opcodes::WRSR2, value.bits())
}

/// Write status register 3 (volatile)
pub fn write_status3_volatile<B: QspiBus + ?Sized>(bus: &mut B, value: Status3) -> Result<()> {
    write_status_volatile(bus, opcodes::WRSR3, value.bits())
}

/// Send Write Enable and wait for WEL to latch
pub fn write_enable<B: QspiBus + ?Sized>(bus: &mut B, timing: PollTiming) -> Result<()> {
    issue(bus, &mut QspiCommand::simple(opcodes::WREN))?;
    bus.poll_status(opcodes::RDSR, &PollCondition::wel_set(timing))?;
    Ok(())
}

/// Wait for the BUSY bit to clear
pub fn wait_ready<B: QspiBus + ?Sized>(bus: &mut B, timing: PollTiming) -> Result<()> {
    bus.poll_status(opcodes::RDSR, &PollCondition::busy_clear(timing))?;
    Ok(())
}

/// Program up to one page with Quad Input Page Program (0x32)
///
/// The caller guarantees `data` does not cross a page boundary; the chip
/// would otherwise wrap within the page.
pub fn program_page<B: QspiBus + ?Sized>(
    bus: &mut B,
    addr: u32,
    width: AddressWidth,
    data: &[u8],
    wel: PollTiming,
    timing: PollTiming,
) -> Result<()> {
    write_enable(bus, wel)?;
    let mut cmd =
        QspiCommand::write(opcodes::QPP, addr, width, data).with_io_mode(IoMode::QuadOut);
    issue(bus, &mut cmd)?;
    wait_ready(bus, timing)
}

/// Erase one unit (sector or block) starting at `addr`
pub fn erase_unit<B: QspiBus + ?Sized>(
    bus: &mut B,
    opcode: u8,
    addr: u32,
    width: AddressWidth,
    wel: PollTiming,
    timing: PollTiming,
) -> Result<()> {
    write_enable(bus, wel)?;
    issue(bus, &mut QspiCommand::addressed(opcode, addr, width))?;
    wait_ready(bus, timing)
}

/// Erase the whole chip (0xC7)
pub fn chip_erase<B: QspiBus + ?Sized>(
    bus: &mut B,
    wel: PollTiming,
    timing: PollTiming,
) -> Result<()> {
    write_enable(bus, wel)?;
    issue(bus, &mut QspiCommand::simple(opcodes::CE_C7))?;
    wait_ready(bus, timing)
}

/// Software reset: Reset Enable (0x66) then Reset Device (0x99)
///
/// The chip ignores commands for a short time afterwards. It cannot be
/// polled during that window, so the caller's settle delay is slept instead.
pub fn software_reset<B: QspiBus + ?Sized>(bus: &mut B, settle_us: u32) -> Result<()> {
    issue(bus, &mut QspiCommand::simple(opcodes::RSTEN))?;
    issue(bus, &mut QspiCommand::simple(opcodes::RST))?;
    bus.delay_us(settle_us);
    Ok(())
}

/// Switch the chip to 4-byte addressing
pub fn enter_4byte_mode<B: QspiBus + ?Sized>(bus: &mut B) -> Result<()> {
    issue(bus, &mut QspiCommand::simple(opcodes::EN4B))
}

/// Read the JEDEC ID
pub fn read_jedec_id<B: QspiBus + ?Sized>(bus: &mut B) -> Result<JedecId> {
    let mut buf = [0u8; 3];
    issue(bus, &mut QspiCommand::read_reg(opcodes::RDID, &mut buf))?;
    Ok(JedecId {
        manufacturer: buf[0],
        memory_type: buf[1],
        capacity: buf[2],
    })
}

/// Address phase standing in for the RDUID dummy bytes
const UNIQUE_ID_DUMMY_WIDTH: AddressWidth = AddressWidth::FourByte;
const _: () = assert!(UNIQUE_ID_DUMMY_WIDTH.bytes() == opcodes::UNIQUE_ID_DUMMY_BYTES);

/// Read the 64-bit factory unique ID
///
/// The four dummy bytes RDUID expects are sent as a zero 32-bit address.
pub fn read_unique_id<B: QspiBus + ?Sized>(bus: &mut B) -> Result<[u8; opcodes::UNIQUE_ID_LEN]> {
    let mut id = [0u8; opcodes::UNIQUE_ID_LEN];
    let mut cmd = QspiCommand::read(opcodes::RDUID, 0, UNIQUE_ID_DUMMY_WIDTH, &mut id);
    issue(bus, &mut cmd)?;
    Ok(id)
}

/// Issue a read with the shortened chip-select high time
///
/// The default is restored afterwards, including when the read fails.
fn issue_read<B: QspiBus + ?Sized>(bus: &mut B, cmd: &mut QspiCommand<'_>) -> Result<()> {
    bus.set_cs_high_cycles(opcodes::CS_HIGH_CYCLES_READ);
    let result = issue(bus, cmd);
    bus.set_cs_high_cycles(opcodes::CS_HIGH_CYCLES_DEFAULT);
    result
}

/// Read from the SFDP area (0x5A, 24-bit address, 8 dummy cycles)
pub fn read_sfdp<B: QspiBus + ?Sized>(bus: &mut B, addr: u32, buf: &mut [u8]) -> Result<()> {
    let mut cmd = QspiCommand::read(opcodes::RDSFDP, addr, AddressWidth::ThreeByte, buf)
        .with_dummy_cycles(opcodes::DUMMY_CYCLES_FAST_READ);
    issue_read(bus, &mut cmd)
}

/// Read with Fast Read Quad I/O (0xEB, 1-4-4, 6 dummy cycles)
pub fn fast_read_quad_io<B: QspiBus + ?Sized>(
    bus: &mut B,
    addr: u32,
    width: AddressWidth,
    buf: &mut [u8],
) -> Result<()> {
    let mut cmd = QspiCommand::read(opcodes::QIOR, addr, width, buf)
        .with_io_mode(IoMode::QuadIo)
        .with_dummy_cycles(opcodes::DUMMY_CYCLES_QUAD_IO);
    issue_read(bus, &mut cmd)
}

/// Build the read template for memory-mapped mode
pub fn memory_mapped_command(mode: MemoryMappedMode, width: AddressWidth) -> QspiCommand<'static> {
    match mode {
        MemoryMappedMode::QuadOutput => QspiCommand::addressed(opcodes::QOR, 0, width)
            .with_io_mode(IoMode::QuadOut)
            .with_dummy_cycles(opcodes::DUMMY_CYCLES_FAST_READ),
        MemoryMappedMode::QuadIo => QspiCommand::addressed(opcodes::QIOR, 0, width)
            .with_io_mode(IoMode::QuadIo)
            .with_dummy_cycles(opcodes::DUMMY_CYCLES_QUAD_IO),
    }
}

/// Put the bus into memory-mapped mode with the given read command
pub fn enable_memory_mapped<B: QspiBus + ?Sized>(
    bus: &mut B,
    mode: MemoryMappedMode,
    width: AddressWidth,
) -> Result<()> {
    let cmd = memory_mapped_command(mode, width);
    check_io_mode_supported(cmd.io_mode, bus.features())?;
    log::debug!("enabling memory-mapped mode with 0x{:02X}", cmd.opcode);
    bus.enable_memory_mapped(&cmd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::BusFeatures;
    use crate::error::{BusFailure, Error};
    use crate::spi::Direction;
    use heapless::Vec;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Seen {
        opcode: u8,
        address: Option<u32>,
        io_mode: IoMode,
        dummy: u8,
        len: usize,
        dir: Direction,
    }

    /// Records every command; answers reads with `fill`
    struct Recorder {
        features: BusFeatures,
        seen: Vec<Seen, 32>,
        cs_high: Vec<u8, 8>,
        fill: u8,
        fail_on: Option<u8>,
    }

    impl Recorder {
        fn new(features: BusFeatures) -> Self {
            Self {
                features,
                seen: Vec::new(),
                cs_high: Vec::new(),
                fill: 0x02,
                fail_on: None,
            }
        }

        fn opcodes(&self) -> Vec<u8, 32> {
            self.seen.iter().map(|s| s.opcode).collect()
        }
    }

    impl QspiBus for Recorder {
        fn features(&self) -> BusFeatures {
            self.features
        }

        fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
            let _ = self.seen.push(Seen {
                opcode: cmd.opcode,
                address: cmd.address,
                io_mode: cmd.io_mode,
                dummy: cmd.dummy_cycles,
                len: cmd.payload_len(),
                dir: cmd.direction(),
            });
            if self.fail_on == Some(cmd.opcode) {
                return Err(Error::Bus(BusFailure::Receive));
            }
            if let Some(buf) = cmd.receive_buf() {
                buf.fill(self.fill);
            }
            Ok(())
        }

        fn delay_us(&mut self, _us: u32) {}

        fn set_cs_high_cycles(&mut self, cycles: u8) {
            let _ = self.cs_high.push(cycles);
        }
    }

    const T: PollTiming = PollTiming::new(1, 10);

    #[test]
    fn test_reset_sequence() {
        let mut bus = Recorder::new(BusFeatures::QUAD);
        software_reset(&mut bus, 100).unwrap();
        assert_eq!(&bus.opcodes()[..], &[opcodes::RSTEN, opcodes::RST]);
    }

    #[test]
    fn test_program_page_sequence() {
        let mut bus = Recorder::new(BusFeatures::QUAD);
        // 0x02: WEL set and BUSY clear, so both polls pass on the first sample.
        program_page(&mut bus, 0x100, AddressWidth::ThreeByte, &[0u8; 16], T, T).unwrap();
        assert_eq!(
            &bus.opcodes()[..],
            &[opcodes::WREN, opcodes::RDSR, opcodes::QPP, opcodes::RDSR]
        );
        let pp = bus.seen[2];
        assert_eq!(pp.address, Some(0x100));
        assert_eq!(pp.io_mode, IoMode::QuadOut);
        assert_eq!(pp.len, 16);
        assert_eq!(pp.dir, Direction::Transmit);
    }

    #[test]
    fn test_quad_requires_bus_support() {
        let mut bus = Recorder::new(BusFeatures::empty());
        let result = program_page(&mut bus, 0, AddressWidth::ThreeByte, &[0u8; 4], T, T);
        assert_eq!(result, Err(Error::Unsupported));
    }

    #[test]
    fn test_fast_read_restores_cs_high_time_on_error() {
        let mut bus = Recorder::new(BusFeatures::QUAD);
        bus.fail_on = Some(opcodes::QIOR);
        let mut buf = [0u8; 8];
        let result = fast_read_quad_io(&mut bus, 0, AddressWidth::ThreeByte, &mut buf);
        assert_eq!(result, Err(Error::Bus(BusFailure::Receive)));
        assert_eq!(&bus.cs_high[..], &[5, 6]);
        assert_eq!(bus.seen[0].dummy, 6);
        assert_eq!(bus.seen[0].io_mode, IoMode::QuadIo);
    }

    #[test]
    fn test_sfdp_read_shortens_cs_high_time() {
        let mut bus = Recorder::new(BusFeatures::QUAD);
        let mut buf = [0u8; 16];
        read_sfdp(&mut bus, 0, &mut buf).unwrap();
        assert_eq!(&bus.cs_high[..], &[5, 6]);

        bus.fail_on = Some(opcodes::RDSFDP);
        assert_eq!(
            read_sfdp(&mut bus, 0, &mut buf),
            Err(Error::Bus(BusFailure::Receive))
        );
        assert_eq!(&bus.cs_high[..], &[5, 6, 5, 6]);
    }

    #[test]
    fn test_volatile_status_write_has_no_poll() {
        let mut bus = Recorder::new(BusFeatures::QUAD);
        write_status2_volatile(&mut bus, Status2::QE).unwrap();
        assert_eq!(&bus.opcodes()[..], &[opcodes::VWREN, opcodes::WRSR2]);
    }

    #[test]
    fn test_identification_commands() {
        let mut bus = Recorder::new(BusFeatures::QUAD);
        bus.fill = 0xEF;
        let id = read_jedec_id(&mut bus).unwrap();
        assert_eq!(id.manufacturer, MANUFACTURER_WINBOND);

        read_unique_id(&mut bus).unwrap();
        assert_eq!(bus.seen[1].address, Some(0));
        assert_eq!(bus.seen[1].len, 8);

        let mut sfdp = [0u8; 16];
        read_sfdp(&mut bus, 0, &mut sfdp).unwrap();
        assert_eq!(bus.seen[2].dummy, 8);
    }

    #[test]
    fn test_jedec_size() {
        let id = JedecId {
            manufacturer: 0xEF,
            memory_type: 0x40,
            capacity: 0x17,
        };
        assert_eq!(id.size_bytes(), Some(8 * 1024 * 1024));
        assert_eq!(id.device_id(), 0x4017);
    }

    #[test]
    fn test_memory_mapped_templates() {
        let cmd = memory_mapped_command(MemoryMappedMode::QuadOutput, AddressWidth::ThreeByte);
        assert_eq!(cmd.opcode, opcodes::QOR);
        assert_eq!(cmd.dummy_cycles, 8);
        let cmd = memory_mapped_command(MemoryMappedMode::QuadIo, AddressWidth::ThreeByte);
        assert_eq!(cmd.opcode, opcodes::QIOR);
        assert_eq!(cmd.dummy_cycles, 6);

        let mut bus = Recorder::new(BusFeatures::QUAD);
        assert_eq!(
            enable_memory_mapped(&mut bus, MemoryMappedMode::QuadIo, AddressWidth::ThreeByte),
            Err(Error::Unsupported)
        );
    }
}
