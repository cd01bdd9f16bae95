//! W25Qxx serial NOR flash opcodes
//!
//! Opcodes follow the JEDEC conventions used by Winbond's W25Q series. On
//! parts larger than 16 MiB the same opcodes take a 4-byte address once the
//! chip has been switched with [`EN4B`].

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - sets WEL, required before program/erase/non-volatile SR write
pub const WREN: u8 = 0x06;
/// Write Disable - clears WEL
pub const WRDI: u8 = 0x04;
/// Write Enable for Volatile Status Register - next SR write goes to the volatile copy
pub const VWREN: u8 = 0x50;

// ============================================================================
// Status register operations
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;
/// Read Status Register 2
pub const RDSR2: u8 = 0x35;
/// Read Status Register 3
pub const RDSR3: u8 = 0x15;
/// Write Status Register 1
pub const WRSR: u8 = 0x01;
/// Write Status Register 2
pub const WRSR2: u8 = 0x31;
/// Write Status Register 3
pub const WRSR3: u8 = 0x11;

// ============================================================================
// Identification
// ============================================================================

/// Read JEDEC ID (manufacturer, memory type, capacity)
pub const RDID: u8 = 0x9F;
/// Read Unique ID (64-bit, after four dummy bytes)
pub const RDUID: u8 = 0x4B;
/// Read SFDP (JEDEC JESD216)
pub const RDSFDP: u8 = 0x5A;

// ============================================================================
// Read commands
// ============================================================================

/// Read Data (single line, no dummy)
pub const READ: u8 = 0x03;
/// Fast Read (single line, 8 dummy cycles)
pub const FAST_READ: u8 = 0x0B;
/// Fast Read Quad Output (1-1-4, 8 dummy cycles)
pub const QOR: u8 = 0x6B;
/// Fast Read Quad I/O (1-4-4, mode byte + 4 dummy = 6 cycles)
pub const QIOR: u8 = 0xEB;

// ============================================================================
// Program commands
// ============================================================================

/// Page Program (1-1-1)
pub const PP: u8 = 0x02;
/// Quad Input Page Program (1-1-4)
pub const QPP: u8 = 0x32;

// ============================================================================
// Erase commands
// ============================================================================

/// Sector Erase (4 KiB)
pub const SE_20: u8 = 0x20;
/// Block Erase (32 KiB)
pub const BE_52: u8 = 0x52;
/// Block Erase (64 KiB)
pub const BE_D8: u8 = 0xD8;
/// Chip Erase
pub const CE_C7: u8 = 0xC7;
/// Chip Erase (alternate opcode)
pub const CE_60: u8 = 0x60;

// ============================================================================
// Address mode
// ============================================================================

/// Enter 4-Byte Address Mode
pub const EN4B: u8 = 0xB7;
/// Exit 4-Byte Address Mode
pub const EX4B: u8 = 0xE9;

// ============================================================================
// Software reset
// ============================================================================

/// Reset Enable
pub const RSTEN: u8 = 0x66;
/// Reset Device (must immediately follow RSTEN)
pub const RST: u8 = 0x99;

// ============================================================================
// Fixed timing parameters
// ============================================================================

/// Dummy cycles for FAST_READ, QOR and RDSFDP
pub const DUMMY_CYCLES_FAST_READ: u8 = 8;
/// Dummy cycles for QIOR (2 mode-bit cycles + 4 dummy)
pub const DUMMY_CYCLES_QUAD_IO: u8 = 6;
/// Dummy bytes RDUID expects after the instruction
pub const UNIQUE_ID_DUMMY_BYTES: u8 = 4;
/// Length of the unique ID in bytes
pub const UNIQUE_ID_LEN: usize = 8;
/// Chip-select high time (cycles) applied during reads
pub const CS_HIGH_CYCLES_READ: u8 = 5;
/// Chip-select high time (cycles) for every other command
pub const CS_HIGH_CYCLES_DEFAULT: u8 = 6;
