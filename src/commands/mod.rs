//! CLI command implementations
//!
//! Every command opens a [`Session`](crate::device::Session), goes through the
//! block-device adapter, and saves the image when it changed the array.

mod erase;
mod info;
mod read;
mod write;

pub use erase::run_erase;
pub use info::run_info;
pub use read::run_read;
pub use write::run_write;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Byte progress bar with a phase label
fn progress_bar(total: u64, phase: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
            phase
        ))
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Spinner for operations without intermediate progress
fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Blocks `[first, first + count)` checked against the device
fn block_range(
    first: u32,
    count: u32,
    block_count: u32,
) -> crate::error::Result<std::ops::Range<u32>> {
    let end = first
        .checked_add(count)
        .filter(|&end| end <= block_count)
        .ok_or_else(|| {
            crate::error::CliError::Usage(format!(
                "blocks {}..{} exceed the device ({} blocks)",
                first,
                first as u64 + count as u64,
                block_count
            ))
        })?;
    Ok(first..end)
}
