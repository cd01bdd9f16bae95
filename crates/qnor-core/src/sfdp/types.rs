//! Decoded SFDP structures
//!
//! Layouts follow JESD216. Only the parts a W25Qxx publishes and this driver
//! reports are kept.

/// "SFDP" read as a little-endian word
pub const SFDP_MAGIC: u32 = u32::from_le_bytes(*b"SFDP");

/// Parameter headers kept per probe
pub const MAX_PARAMETER_HEADERS: usize = 16;

/// Bytes read from the start of the SFDP area when probing
pub const SFDP_PROBE_LEN: usize = 256;

/// ID of the JEDEC basic flash parameter table (BFPT)
pub const BFPT_ID: u16 = 0xFF00;

/// Table revision, printed as `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SfdpRevision {
    #[allow(missing_docs)]
    pub major: u8,
    #[allow(missing_docs)]
    pub minor: u8,
}

impl SfdpRevision {
    /// Build from its two parts
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    fn from_bytes(minor: u8, major: u8) -> Self {
        Self { major, minor }
    }
}

impl core::fmt::Display for SfdpRevision {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// The eight bytes at SFDP address 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SfdpHeader {
    /// Should equal [`SFDP_MAGIC`]
    pub magic: u32,
    /// Overall SFDP revision
    pub revision: SfdpRevision,
    /// Index of the last parameter header (count minus one)
    pub last_header: u8,
    /// 0xFF on every W25Q part
    pub protocol: u8,
}

impl SfdpHeader {
    /// Decode the header bytes
    pub fn parse(raw: &[u8; 8]) -> Self {
        let [m0, m1, m2, m3, minor, major, last_header, protocol] = *raw;
        Self {
            magic: u32::from_le_bytes([m0, m1, m2, m3]),
            revision: SfdpRevision::from_bytes(minor, major),
            last_header,
            protocol,
        }
    }

    /// Whether the magic matches
    pub fn has_magic(&self) -> bool {
        self.magic == SFDP_MAGIC
    }

    /// Parameter headers following this one
    pub fn header_count(&self) -> usize {
        usize::from(self.last_header) + 1
    }
}

/// One parameter header; the first sits at SFDP address 8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParameterHeader {
    /// ID MSB in the high byte, LSB in the low byte
    pub id: u16,
    /// Revision of the table it points to
    pub revision: SfdpRevision,
    /// Table length in 32-bit words
    pub dwords: u8,
    /// Byte offset of the table in the SFDP area
    pub offset: u32,
}

impl ParameterHeader {
    /// Decode the header bytes
    pub fn parse(raw: &[u8; 8]) -> Self {
        let [id_lsb, minor, major, dwords, p0, p1, p2, id_msb] = *raw;
        Self {
            id: u16::from_be_bytes([id_msb, id_lsb]),
            revision: SfdpRevision::from_bytes(minor, major),
            dwords,
            offset: u32::from_le_bytes([p0, p1, p2, 0]),
        }
    }

    /// Table length in bytes
    pub fn len_bytes(&self) -> usize {
        usize::from(self.dwords) * 4
    }

    /// Whether this points at the BFPT
    pub fn is_bfpt(&self) -> bool {
        self.id == BFPT_ID
    }
}

/// An erase size and its opcode, from BFPT words 8 and 9
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SfdpEraseType {
    /// Bytes erased by one command
    pub size: u32,
    #[allow(missing_docs)]
    pub opcode: u8,
}

impl SfdpEraseType {
    /// Decode a (log2 size, opcode) pair; exponent 0 marks an unused slot
    pub fn decode(size_exp: u8, opcode: u8) -> Option<Self> {
        match size_exp {
            1..=31 => Some(Self {
                size: 1 << size_exp,
                opcode,
            }),
            _ => None,
        }
    }
}

/// What a probe learned from the chip
#[derive(Debug, Clone, Default)]
pub struct SfdpInfo {
    /// Top-level header
    pub header: SfdpHeader,
    /// Parameter headers that fit in the probed buffer
    pub params: heapless::Vec<ParameterHeader, MAX_PARAMETER_HEADERS>,
    /// Array size (BFPT word 2)
    pub density_bytes: Option<u64>,
    /// Program page size (BFPT word 11)
    pub page_size: Option<u32>,
    /// Fast Read Quad Output, 1-1-4 (BFPT word 1)
    pub fast_read_114: bool,
    /// Fast Read Quad I/O, 1-4-4 (BFPT word 1)
    pub fast_read_144: bool,
    /// Up to four erase types (BFPT words 8-9)
    pub erase_types: [Option<SfdpEraseType>; 4],
}

impl SfdpInfo {
    /// Overall SFDP revision
    pub fn revision(&self) -> SfdpRevision {
        self.header.revision
    }

    /// Header of the BFPT, if the chip lists one
    pub fn bfpt(&self) -> Option<&ParameterHeader> {
        self.params.iter().find(|p| p.is_bfpt())
    }

    /// Opcode erasing exactly `size` bytes
    pub fn erase_opcode_for(&self, size: u32) -> Option<u8> {
        self.erase_types
            .iter()
            .flatten()
            .find(|et| et.size == size)
            .map(|et| et.opcode)
    }
}
