//! Image-backed chip session
//!
//! Opens the image into an emulated chip, brings the driver up on it, and
//! writes the array back when a command changed it.

use crate::config::Settings;
use crate::error::Result;
use qnor_core::blockdev::FlashBlockDevice;
use qnor_core::flash::NorFlash;
use qnor_emu::{EmulatedFlash, EmulatorConfig};
use std::path::{Path, PathBuf};

pub type Device<'a> = FlashBlockDevice<&'a mut EmulatedFlash>;

pub struct Session {
    image: PathBuf,
    emu: EmulatedFlash,
    settings: Settings,
}

impl Session {
    pub fn open(image: &Path, settings: Settings) -> Result<Self> {
        let config = EmulatorConfig {
            geometry: settings.flash.geometry,
            ..Default::default()
        };
        let mut emu = EmulatedFlash::open_image(image, config)?;
        // Whole-chip commands would otherwise log every transaction
        emu.set_recording(false);
        Ok(Self {
            image: image.to_path_buf(),
            emu,
            settings,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Reset and configure the chip, then wrap it as a block device
    pub fn block_device(&mut self) -> Result<Device<'_>> {
        let mut flash = NorFlash::new(&mut self.emu, self.settings.flash)?;
        flash.init()?;
        Ok(FlashBlockDevice::with_config(
            flash,
            self.settings.block_device(),
        )?)
    }

    /// Simulated bus time and worst-case wear since the image was opened
    pub fn stats(&self) -> (u64, u32) {
        (self.emu.elapsed_us(), self.emu.max_erase_count())
    }

    pub fn save(&self) -> Result<()> {
        self.emu.save_image(&self.image)?;
        log::info!("Saved image to {}", self.image.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qnor_core::blockdev::BlockDevice;

    #[test]
    fn test_session_persists_writes() {
        let path = std::env::temp_dir().join(format!("qnor-session-{}.bin", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut session = Session::open(&path, Settings::default()).unwrap();
        {
            let mut dev = session.block_device().unwrap();
            dev.erase(3).unwrap();
            dev.prog(3, 0, &[0xA5; 256]).unwrap();
        }
        session.save().unwrap();

        let mut reopened = Session::open(&path, Settings::default()).unwrap();
        let mut buf = [0u8; 257];
        reopened.block_device().unwrap().read(3, 0, &mut buf).unwrap();
        assert!(buf[..256].iter().all(|&b| b == 0xA5));
        assert_eq!(buf[256], 0xFF);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_session_does_not_log_transactions() {
        let path = std::env::temp_dir().join(format!("qnor-nolog-{}.bin", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let mut session = Session::open(&path, Settings::default()).unwrap();
        {
            let mut dev = session.block_device().unwrap();
            dev.erase(0).unwrap();
            dev.prog(0, 0, &[0x11; 512]).unwrap();
        }
        assert!(session.emu.transactions().is_empty());
        assert!(session.emu.status_samples() > 0);

        let _ = std::fs::remove_file(&path);
    }
}
