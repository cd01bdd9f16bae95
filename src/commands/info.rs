//! Info command implementation

use crate::device::Session;
use crate::error::Result;
use qnor_core::blockdev::BlockDevice;
use qnor_core::protocol::w25q::MANUFACTURER_WINBOND;

/// Bring the chip up and print what it reports about itself
pub fn run_info(session: &mut Session) -> Result<()> {
    let mut dev = session.block_device()?;
    let config = *dev.config();
    let flash = dev.flash_mut();

    let id = flash.read_id()?;
    let vendor = if id.manufacturer == MANUFACTURER_WINBOND {
        "Winbond"
    } else {
        "unknown vendor"
    };
    println!(
        "JEDEC ID: {:02X} {:04X} ({})",
        id.manufacturer,
        id.device_id(),
        vendor
    );
    match id.size_bytes() {
        Some(size) => println!("Capacity code: {} bytes ({} KiB)", size, size / 1024),
        None => println!("Capacity code: 0x{:02X} (unrecognised)", id.capacity),
    }

    let uid = flash.read_unique_id()?;
    let uid_hex: Vec<String> = uid.iter().map(|b| format!("{:02X}", b)).collect();
    println!("Unique ID: {}", uid_hex.join(""));

    match flash.probe_sfdp() {
        Ok(sfdp) => {
            println!("SFDP: revision {}", sfdp.revision());
            if let Some(density) = sfdp.density_bytes {
                println!("  Density: {} bytes", density);
            }
            if let Some(page) = sfdp.page_size {
                println!("  Page size: {} bytes", page);
            }
            println!(
                "  Fast read 1-1-4: {}, 1-4-4: {}",
                sfdp.fast_read_114, sfdp.fast_read_144
            );
            for erase in sfdp.erase_types.iter().flatten() {
                println!("  Erase 0x{:02X}: {} bytes", erase.opcode, erase.size);
            }
        }
        Err(e) => log::warn!("SFDP unavailable: {}", e),
    }

    let geometry = *flash.geometry();
    println!(
        "Geometry: {} bytes, {} pages of {}, {} sectors of {}, blocks of {}",
        geometry.total_size,
        geometry.page_count(),
        geometry.page_size,
        geometry.sector_count(),
        geometry.sector_size,
        geometry.block_size
    );
    println!(
        "Block device: {} x {} bytes (read {}, prog {}, cache {}, lookahead {}, cycles {})",
        config.block_count,
        config.block_size,
        config.read_size,
        config.prog_size,
        config.cache_size,
        config.lookahead_size,
        config.block_cycles
    );
    Ok(())
}
