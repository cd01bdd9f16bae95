//! Transaction log

use qnor_core::spi::{AddressWidth, Direction, IoMode, QspiCommand};

/// One transaction as seen on the emulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    /// Instruction byte
    pub opcode: u8,
    /// Address, if the command had an address phase
    pub address: Option<u32>,
    /// Address width
    pub address_width: AddressWidth,
    /// Line configuration
    pub io_mode: IoMode,
    /// Dummy cycles
    pub dummy_cycles: u8,
    /// Data phase direction
    pub direction: Direction,
    /// Data phase length in bytes
    pub len: usize,
    /// Chip-select high time in force when the command ran
    pub cs_high_cycles: u8,
}

impl Transaction {
    pub(crate) fn capture(cmd: &QspiCommand<'_>, cs_high_cycles: u8) -> Self {
        Self {
            opcode: cmd.opcode,
            address: cmd.address,
            address_width: cmd.address_width,
            io_mode: cmd.io_mode,
            dummy_cycles: cmd.dummy_cycles,
            direction: cmd.direction(),
            len: cmd.payload_len(),
            cs_high_cycles,
        }
    }
}
