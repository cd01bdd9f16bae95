//! RON configuration file
//!
//! Every field is optional. A file overriding only the erase timeout and the
//! read-back policy looks like:
//!
//! ```ron
//! (
//!     flash: (
//!         verify: ReadBack,
//!         timings: (sector_erase: (interval_us: 500, timeout_us: 800000)),
//!     ),
//! )
//! ```

use crate::error::{CliError, Result};
use qnor_core::blockdev::BlockDeviceConfig;
use qnor_core::flash::FlashConfig;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Driver configuration
    pub flash: FlashConfig,
    /// Filesystem geometry, derived from the chip when absent
    pub block_device: Option<BlockDeviceConfig>,
}

impl Settings {
    /// Load settings from `path`, or the defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::parse(&text).map_err(|source| CliError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded configuration from {}", path.display());
        Ok(settings)
    }

    fn parse(text: &str) -> std::result::Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    /// Block-device geometry in effect
    pub fn block_device(&self) -> BlockDeviceConfig {
        self.block_device
            .unwrap_or_else(|| BlockDeviceConfig::from_geometry(&self.flash.geometry))
    }
}
