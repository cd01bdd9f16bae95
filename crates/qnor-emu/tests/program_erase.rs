//! Program and erase engines against the emulated chip

use qnor_core::bus::{BusFeatures, QspiBus};
use qnor_core::error::{Error, Result};
use qnor_core::flash::{EraseUnit, FlashConfig, NorFlash, VerifyPolicy};
use qnor_core::spi::{opcodes, Direction, IoMode, QspiCommand, Status2};
use qnor_emu::{EmulatedFlash, EmulatorConfig};

fn chip() -> EmulatedFlash {
    EmulatedFlash::new(EmulatorConfig {
        status2: Status2::QE.bits(),
        ..Default::default()
    })
}

fn flash(emu: &mut EmulatedFlash, verify: VerifyPolicy) -> NorFlash<&mut EmulatedFlash> {
    let config = FlashConfig {
        verify,
        ..Default::default()
    };
    NorFlash::new(emu, config).unwrap()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect()
}

#[test]
fn write_then_read_returns_data() {
    let mut emu = chip();
    let mut flash = flash(&mut emu, VerifyPolicy::None);
    let data = pattern(1000, 7);

    flash.program(0x1_2345, &data).unwrap();
    let mut buf = vec![0u8; data.len()];
    flash.read(0x1_2345, &mut buf).unwrap();
    assert_eq!(buf, data);
}

#[test]
fn erase_then_read_returns_erased() {
    let mut emu = chip();
    let mut flash = flash(&mut emu, VerifyPolicy::None);
    flash.program(0x3000, &[0u8; 4096]).unwrap();

    flash.erase(0x3000, 0x3FFF, EraseUnit::Sector).unwrap();
    let mut buf = [0u8; 4096];
    flash.read(0x3000, &mut buf).unwrap();
    assert!(buf.iter().all(|&b| b == 0xFF));
}

#[test]
fn program_commands_never_cross_a_page() {
    let mut emu = chip();
    {
        let mut flash = flash(&mut emu, VerifyPolicy::None);
        flash.program(0xFF, &pattern(257, 1)).unwrap();
    }
    let programs: Vec<_> = emu
        .transactions()
        .iter()
        .filter(|t| t.opcode == opcodes::QPP)
        .map(|t| (t.address, t.len))
        .collect();
    assert_eq!(programs, vec![(Some(0xFF), 1), (Some(0x100), 256)]);
}

#[test]
fn aligned_page_is_one_command() {
    let mut emu = chip();
    {
        let mut flash = flash(&mut emu, VerifyPolicy::None);
        flash.program(0x4200, &pattern(256, 3)).unwrap();
    }
    let programs: Vec<_> = emu
        .transactions()
        .iter()
        .filter(|t| t.opcode == opcodes::QPP)
        .collect();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0].len, 256);
    assert_eq!(programs[0].io_mode, IoMode::QuadOut);
    assert_eq!(programs[0].direction, Direction::Transmit);
}

#[test]
fn two_blocks_program_as_32_pages_in_order() {
    let mut emu = chip();
    {
        let mut flash = flash(&mut emu, VerifyPolicy::None);
        flash.program(0, &pattern(8192, 9)).unwrap();
    }
    let addrs: Vec<u32> = emu
        .transactions()
        .iter()
        .filter(|t| t.opcode == opcodes::QPP)
        .map(|t| {
            assert_eq!(t.len, 256);
            t.address.unwrap()
        })
        .collect();
    let expected: Vec<u32> = (0..32).map(|i| i * 256).collect();
    assert_eq!(addrs, expected);
}

#[test]
fn each_program_is_wren_then_qpp_then_ready_poll() {
    let mut emu = chip();
    {
        let mut flash = flash(&mut emu, VerifyPolicy::None);
        flash.program(0, &[0x5A; 16]).unwrap();
    }
    let ops = emu.opcodes();
    assert_eq!(ops[0], opcodes::WREN);
    assert_eq!(ops[1], opcodes::RDSR);
    assert_eq!(ops[2], opcodes::QPP);
    assert!(ops[3..].iter().all(|&op| op == opcodes::RDSR));
    assert!(!emu.status().0.write_enabled());
}

#[test]
fn empty_program_is_silent() {
    let mut emu = chip();
    flash(&mut emu, VerifyPolicy::None).program(0x10, &[]).unwrap();
    assert!(emu.transactions().is_empty());
}

#[test]
fn erase_rounds_start_down_and_includes_end() {
    let mut emu = chip();
    {
        let mut flash = flash(&mut emu, VerifyPolicy::None);
        flash.erase(0x1234, 0x3000, EraseUnit::Sector).unwrap();
    }
    let erased: Vec<u32> = emu
        .transactions()
        .iter()
        .filter(|t| t.opcode == opcodes::SE_20)
        .filter_map(|t| t.address)
        .collect();
    assert_eq!(erased, vec![0x1000, 0x2000, 0x3000]);
    assert_eq!(emu.erase_count(0), 0);
    assert_eq!(emu.erase_count(1), 1);
    assert_eq!(emu.erase_count(3), 1);
    assert_eq!(emu.erase_count(4), 0);
}

#[test]
fn erase_end_before_start_does_nothing() {
    let mut emu = chip();
    flash(&mut emu, VerifyPolicy::None)
        .erase(0x2000, 0x1000, EraseUnit::Sector)
        .unwrap();
    assert!(emu.transactions().is_empty());
}

#[test]
fn erase_past_chip_end_is_rejected() {
    let mut emu = chip();
    let mut flash = flash(&mut emu, VerifyPolicy::None);
    let total = flash.geometry().total_size;
    assert_eq!(
        flash.erase(total - 4096, total, EraseUnit::Sector),
        Err(Error::AddressOutOfBounds)
    );
}

#[test]
fn block_erase_units() {
    let mut emu = chip();
    {
        let mut flash = flash(&mut emu, VerifyPolicy::None);
        flash.erase(0x10000, 0x1FFFF, EraseUnit::Block64K).unwrap();
        flash.erase(0x20000, 0x27FFF, EraseUnit::Block32K).unwrap();
    }
    let ops: Vec<(u8, Option<u32>)> = emu
        .transactions()
        .iter()
        .filter(|t| matches!(t.opcode, opcodes::BE_D8 | opcodes::BE_52))
        .map(|t| (t.opcode, t.address))
        .collect();
    assert_eq!(
        ops,
        vec![(opcodes::BE_D8, Some(0x10000)), (opcodes::BE_52, Some(0x20000))]
    );
}

#[test]
fn chip_erase_clears_everything() {
    let mut emu = chip();
    emu.data_mut()[..16].fill(0);
    emu.data_mut()[0x7F_FFF0..].fill(0);
    {
        let mut flash = flash(&mut emu, VerifyPolicy::ReadBack);
        flash.erase_chip().unwrap();
    }
    assert!(emu.data().iter().all(|&b| b == 0xFF));
    assert!(emu.opcodes().contains(&opcodes::CE_C7));
}

#[test]
fn program_verify_reports_first_mismatch() {
    let mut emu = chip();
    // Not erased: programming cannot set these bits back to 1
    emu.data_mut()[0x105] = 0x00;
    let mut flash = flash(&mut emu, VerifyPolicy::ReadBack);
    assert_eq!(
        flash.program(0x100, &[0xAA; 16]),
        Err(Error::VerifyFailed { addr: 0x105 })
    );
}

#[test]
fn program_verify_passes_on_erased_range() {
    let mut emu = chip();
    let mut flash = flash(&mut emu, VerifyPolicy::ReadBack);
    flash.program(0x2000, &pattern(600, 5)).unwrap();
}

/// Forwards everything except sector erases, which silently vanish
struct DropSectorErase<'a>(&'a mut EmulatedFlash);

impl QspiBus for DropSectorErase<'_> {
    fn features(&self) -> BusFeatures {
        self.0.features()
    }

    fn execute(&mut self, cmd: &mut QspiCommand<'_>) -> Result<()> {
        if cmd.opcode == opcodes::SE_20 {
            return Ok(());
        }
        self.0.execute(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        self.0.delay_us(us)
    }
}

#[test]
fn erase_verify_reports_leftover_byte() {
    let mut emu = chip();
    emu.data_mut()[0x5010] = 0x12;
    let config = FlashConfig {
        verify: VerifyPolicy::ReadBack,
        ..Default::default()
    };
    let mut flash = NorFlash::new(DropSectorErase(&mut emu), config).unwrap();
    assert_eq!(
        flash.erase(0x5000, 0x5FFF, EraseUnit::Sector),
        Err(Error::EraseVerifyFailed {
            addr: 0x5010,
            found: 0x12
        })
    );
}
