//! qnor-core - Quad-SPI NOR flash command sequencer and block-device adapter
//!
//! This crate drives a W25Qxx-style serial NOR flash over a quad-capable bus
//! and presents it to a log-structured filesystem as a four-operation block
//! device (read, prog, erase, sync). It is `no_std` and never allocates.
//!
//! # Layers
//!
//! - [`spi`] - bus transaction model, opcodes and status register bits
//! - [`bus`] - the [`bus::QspiBus`] trait implemented by the platform
//! - [`protocol`] - command sequencer and status poller
//! - [`flash`] - program/erase engines and bring-up on an owned bus
//! - [`sfdp`] - SFDP header and basic parameter table decoding
//! - [`blockdev`] - block-device adapter consumed by the filesystem
//!
//! # Features
//!
//! - `std` - `std::error::Error` impls and serde derives for configuration types
//!
//! # Example
//!
//! ```ignore
//! use qnor_core::blockdev::{BlockDevice, FlashBlockDevice};
//! use qnor_core::flash::{FlashConfig, NorFlash};
//!
//! fn mount<B: qnor_core::bus::QspiBus>(bus: B) -> qnor_core::Result<()> {
//!     let mut flash = NorFlash::new(bus, FlashConfig::default())?;
//!     flash.init()?;
//!     let mut dev = FlashBlockDevice::new(flash)?;
//!     let mut buf = [0u8; 256];
//!     dev.read(0, 0, &mut buf).ok();
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "std")]
extern crate std;

pub mod blockdev;
pub mod bus;
pub mod error;
pub mod flash;
pub mod protocol;
pub mod sfdp;
pub mod spi;

pub use error::{BusFailure, Error, Result};
