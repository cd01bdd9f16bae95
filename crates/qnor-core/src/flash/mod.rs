//! Program and erase engines, bring-up, and the driver that owns the bus

mod chunks;
mod config;
mod device;
mod geometry;

pub use chunks::{EraseUnits, PageChunk, PageChunks};
pub use config::{FlashConfig, PollTimings, VerifyPolicy};
pub use device::NorFlash;
pub use geometry::{EraseUnit, FlashGeometry, BLOCK_32K};
