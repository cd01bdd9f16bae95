//! Reset, configuration and identification against the emulated chip

use qnor_core::bus::{BusFeatures, QspiBus};
use qnor_core::error::{Error, Result};
use qnor_core::flash::{FlashConfig, NorFlash};
use qnor_core::protocol::MemoryMappedMode;
use qnor_core::spi::{opcodes, AddressWidth, QspiCommand, Status2, Status3};
use qnor_emu::{EmulatedFlash, EmulatorConfig};

fn flash(emu: &mut EmulatedFlash) -> NorFlash<&mut EmulatedFlash> {
    NorFlash::new(emu, FlashConfig::default()).unwrap()
}

#[test]
fn init_runs_the_full_sequence() {
    let mut emu = EmulatedFlash::new_default();
    flash(&mut emu).init().unwrap();

    let ops = emu.opcodes();
    let expected_prefix = [
        opcodes::RSTEN,
        opcodes::RST,
        opcodes::RDSR, // ready
        opcodes::WREN,
        opcodes::RDSR, // WEL
        opcodes::RDSR2,
        opcodes::VWREN,
        opcodes::WRSR2,
        opcodes::RDSR3,
        opcodes::VWREN,
        opcodes::WRSR3,
        opcodes::RDSR2, // QE check
    ];
    assert_eq!(ops, expected_prefix);

    let (_, sr2, sr3) = emu.status();
    assert!(sr2.quad_enabled());
    assert!(!sr3.intersects(Status3::DRV));
    // Reset settle plus the bring-up delay
    assert_eq!(emu.elapsed_us(), 30 + 1_000);
}

#[test]
fn configure_preserves_unrelated_bits() {
    let mut emu = EmulatedFlash::new(EmulatorConfig {
        status2: (Status2::CMP | Status2::LB1).bits(),
        status3: (Status3::WPS | Status3::DRV).bits() | 0x80,
        ..Default::default()
    });
    flash(&mut emu).configure().unwrap();

    let (_, sr2, sr3) = emu.status();
    assert_eq!(sr2.bits(), (Status2::CMP | Status2::LB1 | Status2::QE).bits());
    assert_eq!(sr3.bits(), Status3::WPS.bits() | 0x80);
}

#[test]
fn configure_rewrites_qe_when_already_set() {
    let mut emu = EmulatedFlash::new(EmulatorConfig {
        status2: Status2::QE.bits(),
        ..Default::default()
    });
    flash(&mut emu).configure().unwrap();
    assert!(emu.opcodes().contains(&opcodes::WRSR2));
    assert!(emu.status().1.quad_enabled());
}

#[test]
fn configure_only_touches_volatile_registers() {
    let mut emu = EmulatedFlash::new_default();
    flash(&mut emu).configure().unwrap();
    assert_eq!(emu.nonvolatile_status(), (0x00, 0x00, 0x60));

    emu.power_cycle();
    assert!(!emu.status().1.quad_enabled());
}

/// Swallows writes to status register 2
struct IgnoreSr2Writes<'a>(&'a mut EmulatedFlash);

impl QspiBus for IgnoreSr2Writes<'_> {
    fn features(&self) -> BusFeatures {
        self.0.features()
    }

    fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
        if cmd.opcode == opcodes::WRSR2 {
            return Ok(());
        }
        self.0.execute(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us)
    }
}

#[test]
fn init_fails_when_qe_does_not_stick() {
    let mut emu = EmulatedFlash::new_default();
    let mut flash = NorFlash::new(IgnoreSr2Writes(&mut emu), FlashConfig::default()).unwrap();
    assert_eq!(flash.init(), Err(Error::QuadEnableFailed));
}

#[test]
fn reset_is_not_followed_by_a_poll() {
    let mut emu = EmulatedFlash::new_default();
    flash(&mut emu).reset().unwrap();
    assert_eq!(emu.opcodes(), vec![opcodes::RSTEN, opcodes::RST]);
    assert_eq!(emu.status_samples(), 0);
    assert_eq!(emu.elapsed_us(), 30);
}

#[test]
fn reset_clears_volatile_quad_enable() {
    let mut emu = EmulatedFlash::new_default();
    {
        let mut flash = flash(&mut emu);
        flash.configure().unwrap();
        flash.reset().unwrap();
    }
    assert!(!emu.status().1.quad_enabled());
}

#[test]
fn identification() {
    let mut emu = EmulatedFlash::new_default();
    let mut flash = flash(&mut emu);

    let id = flash.read_id().unwrap();
    assert_eq!(id.manufacturer, 0xEF);
    assert_eq!(id.memory_type, 0x40);
    assert_eq!(id.capacity, 0x17);
    assert_eq!(id.size_bytes(), Some(flash.geometry().total_size));

    let uid = flash.read_unique_id().unwrap();
    assert_eq!(uid, EmulatorConfig::default().unique_id);

    let info = flash.probe_sfdp().unwrap();
    assert_eq!(info.revision().major, 1);
    assert_eq!(info.density_bytes, Some(8 * 1024 * 1024));
    assert_eq!(info.page_size, Some(256));
    assert_eq!(info.erase_opcode_for(4096), Some(opcodes::SE_20));

    let mut header = [0u8; 4];
    flash.read_sfdp(0, &mut header).unwrap();
    assert_eq!(&header, b"SFDP");
}

#[test]
fn unique_id_uses_four_dummy_bytes() {
    let mut emu = EmulatedFlash::new_default();
    flash(&mut emu).read_unique_id().unwrap();
    let t = emu.transactions()[0];
    assert_eq!(t.opcode, opcodes::RDUID);
    assert_eq!(t.address, Some(0));
    assert_eq!(t.address_width, AddressWidth::FourByte);
    assert_eq!(t.len, 8);
}

#[test]
fn reads_shorten_cs_high_time() {
    let mut emu = EmulatedFlash::new_default();
    {
        let mut flash = flash(&mut emu);
        flash.init().unwrap();
        let mut buf = [0u8; 64];
        flash.read(0x100, &mut buf).unwrap();
    }
    let read = emu
        .transactions()
        .iter()
        .find(|t| t.opcode == opcodes::QIOR)
        .copied()
        .unwrap();
    assert_eq!(read.cs_high_cycles, 5);
    assert_eq!(read.dummy_cycles, 6);
    assert_eq!(emu.cs_high_cycles(), 6);
}

#[test]
fn memory_mapped_modes() {
    for (mode, opcode) in [
        (MemoryMappedMode::QuadOutput, opcodes::QOR),
        (MemoryMappedMode::QuadIo, opcodes::QIOR),
    ] {
        let mut emu = EmulatedFlash::new_default();
        emu.data_mut()[0x400] = 0x42;
        {
            let mut flash = flash(&mut emu);
            flash.init().unwrap();
            flash.enable_memory_mapped(mode).unwrap();
        }
        assert!(emu.is_memory_mapped(), "{:?} via 0x{:02X}", mode, opcode);
        let mut buf = [0u8; 1];
        emu.mapped_read(0x400, &mut buf).unwrap();
        assert_eq!(buf[0], 0x42);
    }
}

#[test]
fn memory_mapped_needs_bus_support() {
    let mut emu = EmulatedFlash::new(EmulatorConfig {
        features: BusFeatures::QUAD,
        ..Default::default()
    });
    let mut flash = flash(&mut emu);
    flash.init().unwrap();
    assert_eq!(
        flash.enable_memory_mapped(MemoryMappedMode::QuadIo),
        Err(Error::Unsupported)
    );
}

#[test]
fn four_byte_mode_is_entered_during_init() {
    let mut emu = EmulatedFlash::new_default();
    let config = FlashConfig {
        address_width: AddressWidth::FourByte,
        ..Default::default()
    };
    {
        let mut flash = NorFlash::new(&mut emu, config).unwrap();
        flash.init().unwrap();
        flash.program(0x10, &[1, 2, 3]).unwrap();
        let mut buf = [0u8; 3];
        flash.read(0x10, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
    }
    assert!(emu.four_byte_mode());
}
