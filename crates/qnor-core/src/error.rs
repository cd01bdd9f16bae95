//! Error types for qnor-core
//!
//! A single `no_std`, `Copy` error type shared by every layer. Failures are
//! reported immediately and never retried here; retry policy belongs to the
//! filesystem above the block device.

use core::fmt;

/// Which phase of a bus transaction failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusFailure {
    /// Instruction/address/dummy phase could not be issued
    Command,
    /// Data transmit phase failed
    Transmit,
    /// Data receive phase failed
    Receive,
    /// Peripheral configuration (timing, mapped mode) failed
    Config,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The physical bus reported a failure
    Bus(BusFailure),
    /// A status poll loop exhausted its retry budget
    Timeout,

    /// Address range extends past the end of the chip
    AddressOutOfBounds,
    /// Geometry or block-device configuration violates its invariants
    InvalidGeometry,
    /// A poll budget is shorter than its own sampling interval
    InvalidTiming,
    /// Operation not supported by the bus or the chip
    Unsupported,
    /// Quad-enable bit still clear after configuration
    QuadEnableFailed,

    /// Read-back after program did not match the written data
    VerifyFailed {
        /// First mismatching address
        addr: u32,
    },
    /// Read-back after erase found a byte that is not 0xFF
    EraseVerifyFailed {
        /// First non-erased address
        addr: u32,
        /// Value found there
        found: u8,
    },

    /// SFDP signature or revision not recognised
    SfdpInvalid,
}

impl fmt::Display for BusFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => write!(f, "command phase"),
            Self::Transmit => write!(f, "transmit phase"),
            Self::Receive => write!(f, "receive phase"),
            Self::Config => write!(f, "bus configuration"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(phase) => write!(f, "bus error during {}", phase),
            Self::Timeout => write!(f, "timed out waiting for flash status"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidGeometry => write!(f, "invalid flash geometry"),
            Self::InvalidTiming => write!(f, "poll timeout shorter than its interval"),
            Self::Unsupported => write!(f, "operation not supported"),
            Self::QuadEnableFailed => write!(f, "quad enable bit could not be set"),
            Self::VerifyFailed { addr } => {
                write!(f, "program verify failed at address 0x{:08X}", addr)
            }
            Self::EraseVerifyFailed { addr, found } => write!(
                f,
                "erase verify failed at 0x{:08X}: expected 0xFF, found 0x{:02X}",
                addr, found
            ),
            Self::SfdpInvalid => write!(f, "SFDP header invalid"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
