//! Write command implementation

use super::{block_range, progress_bar};
use crate::device::Session;
use crate::error::{CliError, Result};
use qnor_core::blockdev::BlockDevice;
use qnor_core::flash::VerifyPolicy;
use std::fs;
use std::path::Path;

/// Erase and program the blocks covered by `input`, starting at `first`
///
/// The tail of the last block keeps the erased value.
pub fn run_write(session: &mut Session, input: &Path, first: u32, verify: bool) -> Result<()> {
    let data = fs::read(input).map_err(|source| CliError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    println!("Read {} bytes from {:?}", data.len(), input);
    if data.is_empty() {
        return Err(CliError::Usage(format!("{:?} is empty", input)));
    }

    if verify {
        session.settings_mut().flash.verify = VerifyPolicy::ReadBack;
    }

    {
        let mut dev = session.block_device()?;
        let config = *dev.config();
        let block_size = config.block_size as usize;
        let prog_size = config.prog_size as usize;
        let count = data.len().div_ceil(block_size);
        let count = u32::try_from(count)
            .map_err(|_| CliError::Usage(format!("{:?} is larger than the device", input)))?;
        let blocks = block_range(first, count, config.block_count)?;

        let pb = progress_bar(data.len() as u64, "Writing");
        for (block, chunk) in blocks.zip(data.chunks(block_size)) {
            dev.erase(block)?;
            // Programs must be whole prog_size units
            let padded = chunk.len().next_multiple_of(prog_size);
            if padded == chunk.len() {
                dev.prog(block, 0, chunk)?;
            } else {
                let mut buf = chunk.to_vec();
                buf.resize(padded, 0xFF);
                dev.prog(block, 0, &buf)?;
            }
            pb.inc(chunk.len() as u64);
        }
        dev.sync()?;
        pb.finish_with_message(if verify {
            "Write and verify complete"
        } else {
            "Write complete"
        });
    }

    session.save()?;
    let (elapsed_us, wear) = session.stats();
    log::info!(
        "Bus time {} ms, highest erase count {}",
        elapsed_us / 1000,
        wear
    );
    Ok(())
}
