//! Backing image files

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::{EmulatedFlash, EmulatorConfig};

/// Errors loading or saving a chip image
#[derive(Debug, Error)]
pub enum ImageError {
    /// The file could not be read or written
    #[error("image I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file size does not match the chip
    #[error("image is {actual} bytes but the chip holds {expected}")]
    SizeMismatch {
        /// Chip size in bytes
        expected: usize,
        /// File size in bytes
        actual: usize,
    },
}

impl EmulatedFlash {
    /// Open an image file, or start from an erased chip if it does not exist
    pub fn open_image(path: &Path, config: EmulatorConfig) -> Result<Self, ImageError> {
        if !path.exists() {
            log::info!("{} not found, starting from an erased chip", path.display());
            return Ok(Self::new(config));
        }

        let data = fs::read(path)?;
        let expected = config.geometry.total_size as usize;
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        log::debug!("loaded {} bytes from {}", data.len(), path.display());
        Ok(Self::with_data(config, &data))
    }

    /// Write the array contents to an image file
    pub fn save_image(&self, path: &Path) -> Result<(), ImageError> {
        fs::write(path, self.data())?;
        log::debug!("saved {} bytes to {}", self.data().len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("qnor-emu-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_image_is_erased() {
        let path = temp_path("missing.bin");
        let flash = EmulatedFlash::open_image(&path, EmulatorConfig::default()).unwrap();
        assert!(flash.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_save_and_reopen() {
        let path = temp_path("roundtrip.bin");
        let mut flash = EmulatedFlash::new_default();
        flash.data_mut()[0x1000..0x1004].copy_from_slice(&[1, 2, 3, 4]);
        flash.save_image(&path).unwrap();

        let reopened = EmulatedFlash::open_image(&path, EmulatorConfig::default()).unwrap();
        assert_eq!(&reopened.data()[0x1000..0x1004], &[1, 2, 3, 4]);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_size_mismatch() {
        let path = temp_path("short.bin");
        fs::write(&path, [0u8; 16]).unwrap();
        let Err(err) = EmulatedFlash::open_image(&path, EmulatorConfig::default()) else {
            panic!("short image must be rejected");
        };
        assert!(matches!(err, ImageError::SizeMismatch { actual: 16, .. }));
        let _ = fs::remove_file(&path);
    }
}
