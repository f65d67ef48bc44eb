//! LEB128 (Little Endian Base 128) decoding.
//!
//! DWARF uses LEB128 for variable-length integers. This encoding uses
//! 7 bits per byte, with the high bit indicating continuation.

use crate::ParseError;

/// Decode an unsigned LEB128 value from bytes.
/// Returns the value and the number of bytes consumed.
///
/// Encodings longer than ten bytes are accepted as long as the extra
/// groups are zero padding; set bits beyond 64 are an overflow.
pub fn decode_uleb128(data: &[u8]) -> Result<(u64, usize), ParseError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (index, &byte) in data.iter().enumerate() {
        let low_bits = u64::from(byte & 0x7F);

        if shift < 64 {
            if shift == 63 && low_bits > 1 {
                return Err(ParseError::InvalidValue("ULEB128 overflow"));
            }
            result |= low_bits << shift;
        } else if low_bits != 0 {
            return Err(ParseError::InvalidValue("ULEB128 overflow"));
        }

        // High bit clear means this is the last byte
        if byte & 0x80 == 0 {
            return Ok((result, index + 1));
        }
        shift = shift.saturating_add(7);
    }

    Err(ParseError::TruncatedData {
        expected: data.len() + 1,
        actual: data.len(),
        context: "ULEB128 value",
    })
}

/// Decode a signed LEB128 value from bytes.
/// Returns the value and the number of bytes consumed.
pub fn decode_sleb128(data: &[u8]) -> Result<(i64, usize), ParseError> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    for (index, &byte) in data.iter().enumerate() {
        if shift < 64 {
            result |= i64::from(byte & 0x7F) << shift;
        }
        shift = shift.saturating_add(7);

        if byte & 0x80 == 0 {
            // Sign extend from bit 6 of the final group
            if shift < 64 && (byte & 0x40) != 0 {
                result |= !0i64 << shift;
            }
            return Ok((result, index + 1));
        }
    }

    Err(ParseError::TruncatedData {
        expected: data.len() + 1,
        actual: data.len(),
        context: "SLEB128 value",
    })
}
