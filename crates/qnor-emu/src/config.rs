//! Emulator configuration

use qnor_core::bus::BusFeatures;
use qnor_core::flash::FlashGeometry;
use qnor_core::protocol::JedecId;

/// Configuration for the emulated chip and the bus in front of it
#[derive(Debug, Clone)]
pub struct EmulatorConfig {
    /// Identification returned by RDID
    pub jedec_id: JedecId,
    /// Factory unique ID returned by RDUID
    pub unique_id: [u8; 8],
    /// Chip layout
    pub geometry: FlashGeometry,
    /// Power-on value of status register 1
    pub status1: u8,
    /// Power-on value of status register 2
    pub status2: u8,
    /// Power-on value of status register 3
    pub status3: u8,
    /// Number of status samples that read BUSY after each program or erase
    pub busy_polls: u32,
    /// Capabilities advertised by the emulated bus
    pub features: BusFeatures,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            jedec_id: JedecId {
                manufacturer: 0xEF, // Winbond
                memory_type: 0x40,
                capacity: 0x17, // 64 Mbit
            },
            unique_id: [0xD2, 0x66, 0xB4, 0x21, 0x83, 0x1F, 0x49, 0x2C],
            geometry: FlashGeometry::W25Q64JV,
            status1: 0x00,
            status2: 0x00,
            // DRV1:0 = 11 (25 % drive strength) from the factory
            status3: 0x60,
            busy_polls: 2,
            features: BusFeatures::QUAD | BusFeatures::FOUR_BYTE_ADDR | BusFeatures::MEMORY_MAPPED,
        }
    }
}

impl EmulatorConfig {
    /// Default W25Q64JV with a hardware auto-polling engine on the bus
    pub fn with_auto_poll() -> Self {
        let mut config = Self::default();
        config.features |= BusFeatures::AUTO_POLL;
        config
    }
}
