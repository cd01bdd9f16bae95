//! Block-device adapter
//!
//! Translates `(block, offset)` requests from a littlefs-style filesystem
//! into linear flash operations and collapses every failure to the single
//! I/O status the filesystem understands.

mod adapter;
mod config;

pub use adapter::{
    status_code, BlockDevice, BlockDeviceError, FlashBlockDevice, LFS_ERR_IO, LFS_ERR_OK,
};
pub use config::BlockDeviceConfig;
