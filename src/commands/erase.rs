//! Erase command implementation

use super::{block_range, progress_bar, spinner};
use crate::device::Session;
use crate::error::Result;
use qnor_core::blockdev::BlockDevice;

/// Erase `count` blocks from `first`, or the whole chip when `first` is `None`
pub fn run_erase(session: &mut Session, first: Option<u32>, count: u32) -> Result<()> {
    {
        let mut dev = session.block_device()?;
        match first {
            Some(first) => {
                let config = *dev.config();
                let blocks = block_range(first, count, config.block_count)?;
                let pb = progress_bar(blocks.len() as u64 * config.block_size as u64, "Erasing");
                for block in blocks {
                    dev.erase(block)?;
                    pb.inc(config.block_size as u64);
                }
                pb.finish_with_message("Erase complete");
                println!("Erased {} block(s) starting at {}", count, first);
            }
            None => {
                let total = dev.flash_mut().geometry().total_size;
                let pb = spinner(format!(
                    "Erasing {} bytes (this may take a while)...",
                    total
                ));
                dev.flash_mut().erase_chip()?;
                pb.finish_with_message(format!("Erased {} bytes", total));
            }
        }
    }

    session.save()
}
