//! Quad-SPI line configurations

use crate::bus::BusFeatures;
use crate::error::{Error, Result};

/// Line configuration for the instruction, address and data phases
///
/// Written as instruction-address-data line counts. A phase that a
/// transaction does not have uses zero lines regardless of the mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IoMode {
    /// Standard SPI: 1-1-1
    #[default]
    Single,
    /// Quad Output: 1-1-4 (data phase on 4 lines)
    QuadOut,
    /// Quad I/O: 1-4-4 (address and data on 4 lines)
    QuadIo,
}

impl IoMode {
    /// Number of lines used by the address phase
    pub const fn address_lines(&self) -> u8 {
        match self {
            Self::Single | Self::QuadOut => 1,
            Self::QuadIo => 4,
        }
    }

    /// Number of lines used by the data phase
    pub const fn data_lines(&self) -> u8 {
        match self {
            Self::Single => 1,
            Self::QuadOut | Self::QuadIo => 4,
        }
    }

    /// Returns true if the chip must have its quad-enable bit set
    pub const fn requires_quad(&self) -> bool {
        !matches!(self, Self::Single)
    }
}

/// Check that a bus can drive the requested line configuration
pub fn check_io_mode_supported(mode: IoMode, features: BusFeatures) -> Result<()> {
    let required = match mode {
        IoMode::Single => return Ok(()),
        IoMode::QuadOut => BusFeatures::QUAD_OUT,
        IoMode::QuadIo => BusFeatures::QUAD_IO,
    };
    if features.contains(required) {
        Ok(())
    } else {
        Err(Error::Unsupported)
    }
}
