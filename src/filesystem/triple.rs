//! Three-byte page/offset values used by SAM file entries
//!
//! Byte 0 holds a 16K page number in its low 5 bits and bytes 1-2 hold a
//! little-endian offset. Offsets are stored in the 0x8000-0xBFFF section,
//! so bit 15 is set when encoding and masked when decoding.

/// Value stored when an optional triple is absent
pub const ABSENT: [u8; 3] = [0xff, 0xff, 0xff];

const PAGE_SIZE: u32 = 16384;

/// Split a triple into its page and 15-bit offset
pub fn unpack(data: &[u8]) -> (u32, u32) {
    let page = (data[0] & 0x1f) as u32;
    let offset = (data[2] & 0x7f) as u32 * 256 + data[1] as u32;
    (page, offset)
}

fn pack(page: u32, offset: u32) -> [u8; 3] {
    let offset = offset as u16;
    let [lo, hi] = offset.to_le_bytes();
    [page as u8, lo, hi]
}

/// Decode a start address
pub fn to_addr(data: &[u8]) -> u32 {
    let (page, offset) = unpack(data);
    page * PAGE_SIZE + offset + 0x4000
}

/// Decode a length
pub fn to_len(data: &[u8]) -> u32 {
    let (pages, remain) = unpack(data);
    pages * PAGE_SIZE + remain
}

/// Decode an execute address, absent when byte 0 is 0xFF
pub fn to_exec(data: &[u8]) -> Option<u32> {
    if data[0] == 0xff {
        return None;
    }
    let (page, offset) = unpack(data);
    Some(page * PAGE_SIZE + offset)
}

/// Decode a BASIC auto-start line, absent when byte 0 is 0xFF
pub fn to_line(data: &[u8]) -> Option<u16> {
    if data[0] == 0xff {
        return None;
    }
    Some(u16::from_le_bytes([data[1], data[2]]))
}

/// Encode a start address
pub fn from_addr(addr: u32) -> [u8; 3] {
    let page = ((addr >> 14).wrapping_sub(1)) & 0x1f;
    pack(page, (addr & 0x3fff) + 0x8000)
}

/// Encode a length
pub fn from_len(len: u32) -> [u8; 3] {
    pack((len >> 14) & 0x1f, len & 0x3fff)
}

/// Encode an optional execute address
pub fn from_exec(exec: Option<u32>) -> [u8; 3] {
    match exec {
        Some(exec) => pack((exec >> 14) & 0x1f, (exec & 0x3fff) + 0x8000),
        None => ABSENT,
    }
}

/// Encode an optional auto-start line
///
/// Callers validate the range: lines from 0xFF00 up cannot be told apart
/// from the absent marker by older DOS versions.
pub fn from_line(line: Option<u16>) -> [u8; 3] {
    match line {
        Some(line) => pack(0, line as u32),
        None => ABSENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr() {
        assert_eq!(from_addr(0x8000), [0x01, 0x00, 0x80]);
        assert_eq!(to_addr(&from_addr(0x8000)), 0x8000);
        assert_eq!(to_addr(&from_addr(0x4000)), 0x4000);
        assert_eq!(to_addr(&from_addr(0x12345)), 0x12345);
        assert_eq!(to_addr(&[0x00, 0x00, 0x00]), 0x4000);
    }

    #[test]
    fn test_len() {
        assert_eq!(from_len(0), [0, 0, 0]);
        assert_eq!(from_len(0x4001), [1, 1, 0]);
        assert_eq!(to_len(&from_len(0x7ffff)), 0x7ffff);
        assert_eq!(to_len(&from_len(6912)), 6912);
    }

    #[test]
    fn test_exec() {
        assert_eq!(from_exec(None), ABSENT);
        assert_eq!(to_exec(&[0xff, 0x00, 0x00]), None);
        assert_eq!(to_exec(&from_exec(Some(0x8000))), Some(0x8000));
        assert_eq!(to_exec(&from_exec(Some(0x1234))), Some(0x1234));
    }

    #[test]
    fn test_line() {
        assert_eq!(from_line(None), ABSENT);
        assert_eq!(from_line(Some(10)), [0, 10, 0]);
        assert_eq!(to_line(&from_line(Some(9999))), Some(9999));
        assert_eq!(to_line(&[0xff, 10, 0]), None);
    }
}
