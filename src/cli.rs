//! CLI argument parsing

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Parse a number that may carry a `0x` prefix
pub fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>()
            .map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "qnor")]
#[command(author, version, about = "W25Qxx quad-SPI NOR image tool", long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for per-transaction trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Chip image file (created erased if it does not exist)
    #[arg(long, global = true, default_value = "flash.bin")]
    pub image: PathBuf,

    /// RON file overriding the flash and block-device configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bring the chip up and print its identification and layout
    Info,

    /// Read blocks to a file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// First block to read
        #[arg(short, long, value_parser = parse_u32, default_value = "0")]
        block: u32,

        /// Number of blocks (default: through the last block)
        #[arg(short = 'n', long, value_parser = parse_u32)]
        count: Option<u32>,
    },

    /// Erase and program blocks from a file
    Write {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// First block to write
        #[arg(short, long, value_parser = parse_u32, default_value = "0")]
        block: u32,

        /// Read every programmed range back and compare
        #[arg(long)]
        verify: bool,
    },

    /// Erase blocks or the whole chip
    #[command(group(ArgGroup::new("target").required(true).args(["block", "chip"])))]
    Erase {
        /// First block to erase
        #[arg(short, long, value_parser = parse_u32)]
        block: Option<u32>,

        /// Number of blocks
        #[arg(short = 'n', long, value_parser = parse_u32, default_value = "1", requires = "block")]
        count: u32,

        /// Erase the entire chip
        #[arg(long, conflicts_with = "block")]
        chip: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32() {
        assert_eq!(parse_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_u32("0X1f"), Ok(0x1F));
        assert_eq!(parse_u32("42"), Ok(42));
        assert!(parse_u32("0xZZ").is_err());
        assert!(parse_u32("-1").is_err());
    }

    #[test]
    fn test_erase_needs_a_target() {
        assert!(Cli::try_parse_from(["qnor", "erase"]).is_err());
        assert!(Cli::try_parse_from(["qnor", "erase", "--chip"]).is_ok());
        assert!(Cli::try_parse_from(["qnor", "erase", "--chip", "--block", "3"]).is_err());

        let cli = Cli::try_parse_from(["qnor", "erase", "-b", "0x10", "-n", "2"]).unwrap();
        match cli.command {
            Commands::Erase { block, count, chip } => {
                assert_eq!(block, Some(0x10));
                assert_eq!(count, 2);
                assert!(!chip);
            }
            _ => panic!("expected erase"),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "qnor", "read", "-o", "out.bin", "-vv", "--image", "chip.img",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.image, PathBuf::from("chip.img"));
        assert!(cli.config.is_none());
    }
}
