//! Physical bus abstraction
//!
//! The platform provides a [`QspiBus`] for its quad-SPI peripheral. Everything
//! above this trait is chip logic; everything below is peripheral plumbing.

use crate::error::{Error, Result};
use crate::protocol::{self, PollCondition};
use crate::spi::QspiCommand;
use bitflags::bitflags;

bitflags! {
    /// Quad-SPI bus feature flags
    ///
    /// Reported by [`QspiBus::features`] so callers can refuse line
    /// configurations the peripheral cannot drive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFeatures: u32 {
        /// Can read or write four bits at once on the data phase (1-1-4)
        const QUAD_OUT       = 1 << 0;
        /// Can drive address and data on four lines (1-4-4)
        const QUAD_IO        = 1 << 1;
        /// Supports a 32-bit address phase
        const FOUR_BYTE_ADDR = 1 << 2;
        /// Has a hardware status auto-polling engine
        const AUTO_POLL      = 1 << 3;
        /// Can map the chip into the host address space
        const MEMORY_MAPPED  = 1 << 4;

        /// Shorthand for both quad modes
        const QUAD = Self::QUAD_OUT.bits() | Self::QUAD_IO.bits();
    }
}

impl Default for BusFeatures {
    fn default() -> Self {
        BusFeatures::empty()
    }
}

/// Quad-SPI bus master
///
/// One transaction per [`execute`](QspiBus::execute) call. The bus is owned by
/// the flash driver for its whole lifetime, so implementations need no
/// internal locking.
///
/// ## Example: peripheral with an auto-polling engine
///
/// ```ignore
/// impl QspiBus for Stm32Qspi {
///     fn features(&self) -> BusFeatures {
///         BusFeatures::QUAD | BusFeatures::AUTO_POLL | BusFeatures::MEMORY_MAPPED
///     }
///
///     fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
///         self.command(cmd)?;
///         match &mut cmd.data {
///             DataPhase::None => Ok(()),
///             DataPhase::Transmit(data) => self.transmit(data),
///             DataPhase::Receive(buf) => self.receive(buf),
///         }
///     }
///
///     fn poll_status(&mut self, opcode: u8, cond: &PollCondition) -> Result<u8> {
///         self.auto_polling(opcode, cond)
///     }
///
///     fn delay_us(&mut self, us: u32) {
///         self.timer.delay_us(us)
///     }
/// }
/// ```
pub trait QspiBus {
    /// Get the features supported by this bus
    fn features(&self) -> BusFeatures;

    /// Execute a single transaction
    ///
    /// Instruction, optional address, dummy cycles and data phase are all
    /// described by `cmd`. A receive phase fills the borrowed buffer.
    /// Any peripheral failure is reported as [`Error::Bus`].
    fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()>;

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);

    /// Sample a one-byte status register until `cond` matches
    ///
    /// Returns the last status value read. The default is a software loop
    /// built on [`execute`](QspiBus::execute) and [`delay_us`](QspiBus::delay_us);
    /// peripherals with an auto-polling engine should override it.
    fn poll_status(&mut self, opcode: u8, cond: &PollCondition) -> Result<u8> {
        protocol::software_poll(self, opcode, cond)
    }

    /// Set the minimum chip-select high time between commands, in clock cycles
    fn set_cs_high_cycles(&mut self, _cycles: u8) {}

    /// Switch the peripheral into memory-mapped read mode
    ///
    /// `cmd` is the read template (opcode, address width, line
    /// configuration, dummy cycles) the peripheral replays on every access.
    fn enable_memory_mapped(&mut self, _cmd: &QspiCommand<'_>) -> Result<()> {
        Err(Error::Unsupported)
    }
}

impl<B: QspiBus + ?Sized> QspiBus for &mut B {
    fn features(&self) -> BusFeatures {
        (**self).features()
    }

    fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }

    fn poll_status(&mut self, opcode: u8, cond: &PollCondition) -> Result<u8> {
        (**self).poll_status(opcode, cond)
    }

    fn set_cs_high_cycles(&mut self, cycles: u8) {
        (**self).set_cs_high_cycles(cycles)
    }

    fn enable_memory_mapped(&mut self, cmd: &QspiCommand<'_>) -> Result<()> {
        (**self).enable_memory_mapped(cmd)
    }
}
