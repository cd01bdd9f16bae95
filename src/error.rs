//! CLI error type

use qnor_core::blockdev::BlockDeviceError;
use qnor_emu::ImageError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("flash error: {0}")]
    Flash(#[from] qnor_core::Error),

    #[error("block device error: {0}")]
    BlockDevice(#[from] BlockDeviceError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },

    #[error("{0}")]
    Usage(String),
}

pub type Result<T> = std::result::Result<T, CliError>;
