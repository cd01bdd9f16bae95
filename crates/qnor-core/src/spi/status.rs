//! Status register bit definitions
//!
//! W25Qxx status registers, one `bitflags` type per register. Registers are
//! always converted with `from_bits_retain` so that reserved and factory bits
//! survive a read-modify-write untouched.
//!
//! | Register | Bit | Name | Meaning |
//! |---|---|---|---|
//! | SR1 | 0 | BUSY | Program, erase or status write in progress |
//! | SR1 | 1 | WEL  | Write enable latch; cleared by the chip after each write |
//! | SR1 | 2-4 | BP0-BP2 | Block protect |
//! | SR1 | 5 | TB   | Top/bottom protect |
//! | SR1 | 6 | SEC  | Sector/block protect |
//! | SR1 | 7 | SRP  | Status register protect |
//! | SR2 | 0 | SRL  | Status register lock |
//! | SR2 | 1 | QE   | Quad enable; IO2/IO3 become data lines |
//! | SR2 | 3-5 | LB1-LB3 | Security register lock bits (OTP) |
//! | SR2 | 6 | CMP  | Complement protect |
//! | SR2 | 7 | SUS  | Erase/program suspended |
//! | SR3 | 2 | WPS  | Write protect selection |
//! | SR3 | 5-6 | DRV0-DRV1 | Output driver strength (00 = 100%) |

use bitflags::bitflags;

bitflags! {
    /// Status Register 1 (read 0x05, write 0x01)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status1: u8 {
        /// Write/erase in progress
        const BUSY = 1 << 0;
        /// Write enable latch
        const WEL  = 1 << 1;
        /// Block protect bit 0
        const BP0  = 1 << 2;
        /// Block protect bit 1
        const BP1  = 1 << 3;
        /// Block protect bit 2
        const BP2  = 1 << 4;
        /// Top/bottom protect
        const TB   = 1 << 5;
        /// Sector/block protect
        const SEC  = 1 << 6;
        /// Status register protect
        const SRP  = 1 << 7;
    }
}

bitflags! {
    /// Status Register 2 (read 0x35, write 0x31)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status2: u8 {
        /// Status register lock
        const SRL = 1 << 0;
        /// Quad enable
        const QE  = 1 << 1;
        /// Security register lock 1
        const LB1 = 1 << 3;
        /// Security register lock 2
        const LB2 = 1 << 4;
        /// Security register lock 3
        const LB3 = 1 << 5;
        /// Complement protect
        const CMP = 1 << 6;
        /// Suspend status
        const SUS = 1 << 7;
    }
}

bitflags! {
    /// Status Register 3 (read 0x15, write 0x11)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status3: u8 {
        /// Write protect selection
        const WPS  = 1 << 2;
        /// Output driver strength bit 0
        const DRV0 = 1 << 5;
        /// Output driver strength bit 1
        const DRV1 = 1 << 6;

        /// Both driver strength bits
        const DRV = Self::DRV0.bits() | Self::DRV1.bits();
    }
}

impl Status1 {
    /// True while a program, erase or status write is running
    pub fn is_busy(&self) -> bool {
        self.contains(Self::BUSY)
    }

    /// True if the write enable latch is set
    pub fn write_enabled(&self) -> bool {
        self.contains(Self::WEL)
    }
}

impl Status2 {
    /// True if IO2/IO3 are configured as data lines
    pub fn quad_enabled(&self) -> bool {
        self.contains(Self::QE)
    }
}
