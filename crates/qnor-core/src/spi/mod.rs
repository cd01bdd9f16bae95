//! Bus transaction model
//!
//! Types describing a single quad-SPI transaction, the W25Qxx opcode set,
//! and the status register bit layout.

mod address;
mod command;
mod io_mode;
pub mod opcodes;
mod status;

pub use address::AddressWidth;
pub use command::{DataPhase, Direction, QspiCommand};
pub use io_mode::{check_io_mode_supported, IoMode};
pub use status::{Status1, Status2, Status3};
