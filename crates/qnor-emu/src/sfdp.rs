//! SFDP table generation for the emulated chip

use qnor_core::flash::{FlashGeometry, BLOCK_32K};
use qnor_core::sfdp::SFDP_MAGIC;
use qnor_core::spi::opcodes;

/// Offset of the Basic Flash Parameter Table
const BFPT_OFFSET: usize = 0x80;
/// BFPT length in DWORDs (JESD216A)
const BFPT_DWORDS: usize = 16;

/// Build a JESD216A table with a single BFPT describing `geometry`
pub fn build_table(geometry: &FlashGeometry) -> Vec<u8> {
    let mut table = vec![0xFFu8; BFPT_OFFSET + BFPT_DWORDS * 4];

    // SFDP header: signature, revision 1.5, one parameter header
    table[0..4].copy_from_slice(&SFDP_MAGIC.to_le_bytes());
    table[4..8].copy_from_slice(&[0x05, 0x01, 0x00, 0xFF]);
    // BFPT parameter header: ID 0xFF00, revision 1.5, 16 DWORDs, pointer
    table[8..16].copy_from_slice(&[
        0x00,
        0x05,
        0x01,
        BFPT_DWORDS as u8,
        BFPT_OFFSET as u8,
        0x00,
        0x00,
        0xFF,
    ]);

    let log2 = |v: u32| v.trailing_zeros();
    let mut dwords = [0xFFFF_FFFFu32; BFPT_DWORDS];
    // 4 KiB erase with 0x20, 1-1-2 / 1-2-2 / 1-4-4 / 1-1-4 fast reads, 3-byte addressing
    dwords[0] = 0xFFF9_20E5;
    dwords[1] = (geometry.total_size as u64 * 8 - 1) as u32;
    dwords[2] = (opcodes::QOR as u32) << 24
        | (opcodes::DUMMY_CYCLES_FAST_READ as u32) << 16
        | (opcodes::QIOR as u32) << 8
        | 2 << 5
        | (opcodes::DUMMY_CYCLES_QUAD_IO as u32 - 2);
    dwords[7] = (opcodes::BE_52 as u32) << 24
        | log2(BLOCK_32K) << 16
        | (opcodes::SE_20 as u32) << 8
        | log2(geometry.sector_size);
    dwords[8] = (opcodes::BE_D8 as u32) << 8 | log2(geometry.block_size);
    dwords[10] = 0xC914_EA02 | log2(geometry.page_size) << 4;

    for (i, dword) in dwords.iter().enumerate() {
        let at = BFPT_OFFSET + i * 4;
        table[at..at + 4].copy_from_slice(&dword.to_le_bytes());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_table_parses() {
        let geometry = FlashGeometry::W25Q64JV;
        let info = qnor_core::sfdp::parse(&build_table(&geometry)).unwrap();
        assert_eq!(info.density_bytes, Some(geometry.total_size as u64));
        assert_eq!(info.page_size, Some(geometry.page_size));
        assert_eq!(info.erase_opcode_for(geometry.sector_size), Some(opcodes::SE_20));
        assert_eq!(info.erase_opcode_for(BLOCK_32K), Some(opcodes::BE_52));
        assert_eq!(info.erase_opcode_for(geometry.block_size), Some(opcodes::BE_D8));
        assert!(info.fast_read_144);
    }
}
