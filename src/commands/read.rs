//! Read command implementation

use super::{block_range, progress_bar};
use crate::device::Session;
use crate::error::{CliError, Result};
use qnor_core::blockdev::BlockDevice;
use std::fs;
use std::path::Path;

/// Read `count` blocks starting at `first` into `output`
pub fn run_read(
    session: &mut Session,
    output: &Path,
    first: u32,
    count: Option<u32>,
) -> Result<()> {
    let mut dev = session.block_device()?;
    let config = *dev.config();
    let count = count.unwrap_or(config.block_count.saturating_sub(first));
    let blocks = block_range(first, count, config.block_count)?;

    let block_size = config.block_size as usize;
    let mut data = vec![0u8; blocks.len() * block_size];
    let pb = progress_bar(data.len() as u64, "Reading");

    for (block, chunk) in blocks.zip(data.chunks_mut(block_size)) {
        dev.read(block, 0, chunk)?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_with_message("Read complete");

    fs::write(output, &data).map_err(|source| CliError::Io {
        path: output.to_path_buf(),
        source,
    })?;
    println!("Wrote {} bytes to {:?}", data.len(), output);
    Ok(())
}
