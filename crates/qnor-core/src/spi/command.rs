//! Quad-SPI command structure

use super::{AddressWidth, IoMode};

/// Data phase of a transaction
///
/// Borrowing the caller's buffer keeps a transaction allocation-free.
#[derive(Debug)]
pub enum DataPhase<'a> {
    /// No data phase
    None,
    /// Bytes clocked out to the chip
    Transmit(&'a [u8]),
    /// Bytes clocked in from the chip
    Receive(&'a mut [u8]),
}

/// Direction of the data phase
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Instruction (and optional address) only
    None,
    /// Host to chip
    Transmit,
    /// Chip to host
    Receive,
}

/// A single quad-SPI transaction
///
/// Built fresh for every call and handed to [`crate::bus::QspiBus::execute`];
/// never retained. The lifetime ties the command to the buffer it borrows.
#[derive(Debug)]
pub struct QspiCommand<'a> {
    /// The instruction byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Line configuration
    pub io_mode: IoMode,

    /// Number of dummy cycles between address and data
    pub dummy_cycles: u8,

    /// Data phase
    pub data: DataPhase<'a>,
}

impl<'a> QspiCommand<'a> {
    /// Create a bare instruction with no address or data (e.g., WREN, RSTEN)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            io_mode: IoMode::Single,
            dummy_cycles: 0,
            data: DataPhase::None,
        }
    }

    /// Create a register read with no address (e.g., RDSR, RDID)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            data: DataPhase::Receive(buf),
            ..Self::simple(opcode)
        }
    }

    /// Create a register write with no address (e.g., WRSR2)
    pub fn write_reg(opcode: u8, data: &'a [u8]) -> Self {
        Self {
            data: DataPhase::Transmit(data),
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed read
    pub fn read(opcode: u8, addr: u32, width: AddressWidth, buf: &'a mut [u8]) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            data: DataPhase::Receive(buf),
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed write (e.g., page program)
    pub fn write(opcode: u8, addr: u32, width: AddressWidth, data: &'a [u8]) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            data: DataPhase::Transmit(data),
            ..Self::simple(opcode)
        }
    }

    /// Create an addressed command without data (e.g., sector erase)
    pub fn addressed(opcode: u8, addr: u32, width: AddressWidth) -> Self {
        Self {
            address: Some(addr),
            address_width: width,
            ..Self::simple(opcode)
        }
    }

    /// Set the line configuration for this command
    pub fn with_io_mode(mut self, mode: IoMode) -> Self {
        self.io_mode = mode;
        self
    }

    /// Set the number of dummy cycles
    pub fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Returns true if this command has an address phase
    pub fn has_address(&self) -> bool {
        self.address.is_some() && self.address_width != AddressWidth::None
    }

    /// Direction of the data phase
    pub fn direction(&self) -> Direction {
        match self.data {
            DataPhase::None => Direction::None,
            DataPhase::Transmit(_) => Direction::Transmit,
            DataPhase::Receive(_) => Direction::Receive,
        }
    }

    /// Number of bytes in the data phase
    pub fn payload_len(&self) -> usize {
        match &self.data {
            DataPhase::None => 0,
            DataPhase::Transmit(data) => data.len(),
            DataPhase::Receive(buf) => buf.len(),
        }
    }

    /// Lines driven during the address phase (0 if there is none)
    pub fn address_lines(&self) -> u8 {
        if self.has_address() {
            self.io_mode.address_lines()
        } else {
            0
        }
    }

    /// Lines driven during the data phase (0 if there is none)
    ///
    /// A command with no buffer but a quad mode still reports its data lines;
    /// that is how a memory-mapped read template describes an unbounded
    /// data phase.
    pub fn data_lines(&self) -> u8 {
        match self.data {
            DataPhase::None if self.io_mode == IoMode::Single => 0,
            _ => self.io_mode.data_lines(),
        }
    }

    /// Bytes to transmit, if this is a write
    pub fn transmit_data(&self) -> Option<&[u8]> {
        match &self.data {
            DataPhase::Transmit(data) => Some(data),
            _ => None,
        }
    }

    /// Buffer to receive into, if this is a read
    pub fn receive_buf(&mut self) -> Option<&mut [u8]> {
        match &mut self.data {
            DataPhase::Receive(buf) => Some(buf),
            _ => None,
        }
    }
}
