//! Status register polling
//!
//! NOR flash has no completion interrupt, so every program, erase and status
//! write ends with a bounded poll of status register 1.

use crate::bus::QspiBus;
use crate::error::{Error, Result};
use crate::spi::{QspiCommand, Status1};

/// How masked status bits are compared against the match value
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Every masked bit must equal its match bit
    #[default]
    And,
    /// At least one masked bit must equal its match bit
    Or,
}

/// Poll interval and overall budget for one kind of wait
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PollTiming {
    /// Delay between samples in microseconds
    pub interval_us: u32,
    /// Maximum total wait in microseconds
    pub timeout_us: u32,
}

impl PollTiming {
    /// Create a timing pair
    pub const fn new(interval_us: u32, timeout_us: u32) -> Self {
        Self {
            interval_us,
            timeout_us,
        }
    }
}

/// Target bit pattern for a status poll
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollCondition {
    /// Expected value of the masked bits
    pub match_value: u8,
    /// Bits that take part in the comparison
    pub mask: u8,
    /// Comparison rule
    pub match_mode: MatchMode,
    /// Delay between samples in microseconds
    pub interval_us: u32,
    /// Maximum total wait in microseconds
    pub timeout_us: u32,
    /// Stop the hardware poller on the first match
    ///
    /// When clear, an auto-polling engine keeps sampling for the whole budget
    /// and reports the last sample. Software polling always stops on a match.
    pub auto_stop: bool,
}

impl PollCondition {
    /// Wait until BUSY reads back as 0
    pub fn busy_clear(timing: PollTiming) -> Self {
        Self {
            match_value: 0,
            mask: Status1::BUSY.bits(),
            match_mode: MatchMode::And,
            interval_us: timing.interval_us,
            timeout_us: timing.timeout_us,
            auto_stop: true,
        }
    }

    /// Wait until WEL reads back as 1
    pub fn wel_set(timing: PollTiming) -> Self {
        Self {
            match_value: Status1::WEL.bits(),
            mask: Status1::WEL.bits(),
            match_mode: MatchMode::And,
            interval_us: timing.interval_us,
            timeout_us: timing.timeout_us,
            auto_stop: true,
        }
    }

    /// Maximum number of status samples before giving up
    ///
    /// A zero interval falls back to one sample per microsecond of budget.
    /// At least one sample is always taken, so a budget shorter than the
    /// interval still sees a chip that is already ready.
    pub fn max_polls(&self) -> u32 {
        let polls = if self.interval_us > 0 {
            self.timeout_us / self.interval_us
        } else {
            self.timeout_us
        };
        polls.max(1)
    }

    /// Check a status sample against the condition
    pub fn matches(&self, status: u8) -> bool {
        match self.match_mode {
            MatchMode::And => (status & self.mask) == (self.match_value & self.mask),
            MatchMode::Or => !(status ^ self.match_value) & self.mask != 0,
        }
    }
}

/// Software status poll loop
///
/// Reads the register with `opcode`, returns the sample once it matches and
/// otherwise sleeps `interval_us` before retrying. After `max_polls` samples
/// without a match the wait fails with [`Error::Timeout`]. Bus errors abort
/// the loop immediately.
pub fn software_poll<B: QspiBus + ?Sized>(
    bus: &mut B,
    opcode: u8,
    cond: &PollCondition,
) -> Result<u8> {
    let max_polls = cond.max_polls();

    for poll in 0..max_polls {
        let mut buf = [0u8; 1];
        let mut cmd = QspiCommand::read_reg(opcode, &mut buf);
        bus.execute(&mut cmd)?;

        if cond.matches(buf[0]) {
            log::trace!(
                "poll 0x{:02X}: matched 0x{:02X} after {} sample(s)",
                opcode,
                buf[0],
                poll + 1
            );
            return Ok(buf[0]);
        }
        if cond.interval_us > 0 {
            bus.delay_us(cond.interval_us);
        }
    }

    log::trace!("poll 0x{:02X}: no match in {} samples", opcode, max_polls);
    Err(Error::Timeout)
}
