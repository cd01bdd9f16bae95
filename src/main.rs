//! qnor - W25Qxx quad-SPI NOR image tool
//!
//! Drives a chip image through the same code path a firmware would use: the
//! `qnor-core` command sequencer brings the chip up over a quad-SPI bus, and
//! every read, write and erase goes through the littlefs block-device adapter.
//!
//! The bus is the `qnor-emu` emulator, backed by an image file that is created
//! erased on first use and saved after every command that modifies it.

mod cli;
mod commands;
mod config;
mod device;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use config::Settings;
use device::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, -v/-vv override the environment
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match cli.verbose {
        0 => {} // default (info)
        1 => {
            logger.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            logger.filter_level(log::LevelFilter::Trace);
        }
    }
    logger.init();

    let settings = Settings::load(cli.config.as_deref())?;
    let mut session = Session::open(&cli.image, settings)?;
    log::debug!(
        "block device: {} x {} bytes",
        session.settings().block_device().block_count,
        session.settings().block_device().block_size
    );

    match cli.command {
        Commands::Info => commands::run_info(&mut session)?,
        Commands::Read {
            output,
            block,
            count,
        } => commands::run_read(&mut session, &output, block, count)?,
        Commands::Write {
            input,
            block,
            verify,
        } => commands::run_write(&mut session, &input, block, verify)?,
        Commands::Erase { block, count, chip } => {
            let first = if chip { None } else { block };
            commands::run_erase(&mut session, first, count)?
        }
    }

    Ok(())
}
