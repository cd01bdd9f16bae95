//! SFDP table decoding
//!
//! Works on a buffer read from SFDP address 0 so that decoding never touches
//! the bus. Anything the buffer does not cover is reported as unknown.

use super::types::*;
use crate::error::{Error, Result};

fn bytes8(data: &[u8], offset: usize) -> Option<&[u8; 8]> {
    data.get(offset..offset + 8)?.try_into().ok()
}

fn dword(data: &[u8], table: usize, index: usize) -> Option<u32> {
    let start = table + index * 4;
    let raw = data.get(start..start + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Decode BFPT DWORD 2 (density)
///
/// Bit 31 clear: bits 30:0 hold the size in bits minus one.
/// Bit 31 set: bits 30:0 hold N where the size is 2^N bits.
fn density_from_dword2(dword: u32) -> Option<u64> {
    let value = dword & 0x7FFF_FFFF;
    if dword & (1 << 31) == 0 {
        Some((value as u64 + 1) / 8)
    } else if (3..64).contains(&value) {
        Some(1u64 << (value - 3))
    } else {
        None
    }
}

/// Decode BFPT DWORD 11 bits 7:4 (page size exponent)
fn page_size_from_dword11(dword: u32) -> u32 {
    match (dword >> 4) & 0x0F {
        0 => 256,
        exp => 1 << exp,
    }
}

/// Parse an SFDP dump starting at SFDP address 0
///
/// Fails with [`Error::SfdpInvalid`] if the signature is wrong, the major
/// revision is not 1, or the buffer is shorter than the header.
pub fn parse(data: &[u8]) -> Result<SfdpInfo> {
    let header = bytes8(data, 0)
        .map(SfdpHeader::parse)
        .ok_or(Error::SfdpInvalid)?;

    if !header.has_magic() {
        log::debug!("SFDP signature mismatch: 0x{:08X}", header.magic);
        return Err(Error::SfdpInvalid);
    }
    if header.revision.major != 1 {
        log::debug!("unsupported SFDP revision {}", header.revision);
        return Err(Error::SfdpInvalid);
    }

    let mut info = SfdpInfo {
        header,
        ..Default::default()
    };

    let count = header.header_count().min(MAX_PARAMETER_HEADERS);
    for index in 0..count {
        match bytes8(data, 0x08 + index * 8) {
            Some(raw) => {
                let _ = info.params.push(ParameterHeader::parse(raw));
            }
            None => break,
        }
    }

    if let Some(bfpt) = info.bfpt().copied() {
        parse_bfpt(data, &bfpt, &mut info);
    }

    log::debug!(
        "SFDP rev {} with {} parameter header(s), density {:?}",
        info.header.revision,
        info.params.len(),
        info.density_bytes
    );
    Ok(info)
}

fn parse_bfpt(data: &[u8], header: &ParameterHeader, info: &mut SfdpInfo) {
    let table = header.offset as usize;
    let len = header.dwords as usize;
    let get = |index: usize| {
        if index < len {
            dword(data, table, index)
        } else {
            None
        }
    };

    // DWORD 1: fast read support bits
    if let Some(dw1) = get(0) {
        info.fast_read_144 = dw1 & (1 << 21) != 0;
        info.fast_read_114 = dw1 & (1 << 22) != 0;
    }

    info.density_bytes = get(1).and_then(density_from_dword2);

    // DWORDs 8-9: erase types as (size exponent, opcode) pairs
    if let (Some(dw8), Some(dw9)) = (get(7), get(8)) {
        for (slot, word) in [dw8, dw8 >> 16, dw9, dw9 >> 16].into_iter().enumerate() {
            info.erase_types[slot] = SfdpEraseType::decode(word as u8, (word >> 8) as u8);
        }
    }

    // DWORD 11 only exists from JESD216A onwards
    info.page_size = get(10).map(page_size_from_dword11);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// W25Q64JV SFDP: one BFPT of 16 DWORDs at 0x80
    #[rustfmt::skip]
    const W25Q64JV_SFDP: [u8; 0xC0] = {
        let mut t = [0xFFu8; 0xC0];
        let head: [u8; 16] = [
            0x53, 0x46, 0x44, 0x50, // @0x00: "SFDP"
            0x05, 0x01, 0x00, 0xFF, // @0x04: rev 1.5, 1 header
            0x00, 0x05, 0x01, 0x10, // @0x08: BFPT rev 1.5, 16 DWORDs
            0x80, 0x00, 0x00, 0xFF, // @0x0C: PTP = 0x80
        ];
        let bfpt: [u8; 44] = [
            0xE5, 0x20, 0xF9, 0xFF, // DWORD 1
            0xFF, 0xFF, 0xFF, 0x03, // DWORD 2: 64 Mbit
            0x44, 0xEB, 0x08, 0x6B, // DWORD 3
            0x08, 0x3B, 0x42, 0xBB, // DWORD 4
            0xFE, 0xFF, 0xFF, 0xFF, // DWORD 5
            0xFF, 0xFF, 0x00, 0x00, // DWORD 6
            0xFF, 0xFF, 0x40, 0xEB, // DWORD 7
            0x0C, 0x20, 0x0F, 0x52, // DWORD 8: 4K/0x20, 32K/0x52
            0x10, 0xD8, 0x00, 0x00, // DWORD 9: 64K/0xD8
            0x36, 0x02, 0xA6, 0x00, // DWORD 10
            0x82, 0xEA, 0x14, 0xC9, // DWORD 11: page 2^8
        ];
        let mut i = 0;
        while i < head.len() {
            t[i] = head[i];
            i += 1;
        }
        let mut i = 0;
        while i < bfpt.len() {
            t[0x80 + i] = bfpt[i];
            i += 1;
        }
        t
    };

    #[test]
    fn test_sfdp_header_parse() {
        let header = SfdpHeader::parse(&[0x53, 0x46, 0x44, 0x50, 0x06, 0x01, 0x02, 0xFF]);
        assert!(header.has_magic());
        assert_eq!(header.revision, SfdpRevision::new(1, 6));
        assert_eq!(header.header_count(), 3);
    }

    #[test]
    fn test_param_header_parse() {
        let header = ParameterHeader::parse(&[0x00, 0x05, 0x01, 0x10, 0x80, 0x00, 0x00, 0xFF]);
        assert!(header.is_bfpt());
        assert_eq!(header.len_bytes(), 64);
        assert_eq!(header.offset, 0x80);
    }

    #[test]
    fn test_parse_w25q64jv() {
        let info = parse(&W25Q64JV_SFDP).unwrap();
        assert_eq!(info.revision(), SfdpRevision::new(1, 5));
        assert_eq!(info.params.len(), 1);
        assert_eq!(info.density_bytes, Some(8 * 1024 * 1024));
        assert_eq!(info.page_size, Some(256));
        assert!(info.fast_read_114);
        assert!(info.fast_read_144);
        assert_eq!(info.erase_opcode_for(4096), Some(0x20));
        assert_eq!(info.erase_opcode_for(32 * 1024), Some(0x52));
        assert_eq!(info.erase_opcode_for(64 * 1024), Some(0xD8));
        assert_eq!(info.erase_types[3], None);
    }

    #[test]
    fn test_bfpt_outside_buffer_is_unknown() {
        let info = parse(&W25Q64JV_SFDP[..0x40]).unwrap();
        assert_eq!(info.params.len(), 1);
        assert_eq!(info.density_bytes, None);
        assert_eq!(info.page_size, None);
    }

    #[test]
    fn test_invalid_signature() {
        let mut data = W25Q64JV_SFDP;
        data[0] = 0x00;
        assert_eq!(parse(&data).unwrap_err(), Error::SfdpInvalid);
        assert_eq!(parse(&[0x53, 0x46]).unwrap_err(), Error::SfdpInvalid);
    }

    #[test]
    fn test_density_formats() {
        assert_eq!(density_from_dword2(0x03FF_FFFF), Some(8 * 1024 * 1024));
        assert_eq!(density_from_dword2(0x8000_0021), Some(1 << 30));
    }
}
