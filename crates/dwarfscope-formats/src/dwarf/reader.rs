//! Forward-only cursor over a DWARF section.
//!
//! Reads past the end of the buffer do not fail individually. The first
//! failure is recorded, and from then on every read returns a default value
//! without moving the cursor. Callers decode a batch of fields (say, one
//! DIE's attribute list) and then call [`ByteReader::check`] once.

use super::leb128::{decode_sleb128, decode_uleb128};
use crate::{Endianness, ParseError};

/// Cursor over a byte buffer with LEB128 and fixed-width reads.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    endianness: Endianness,
    error: Option<ParseError>,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            offset: 0,
            endianness,
            error: None,
        }
    }

    /// Create a reader positioned at `offset`.
    ///
    /// Offsets are always relative to the start of `data`, so a reader over
    /// a whole section reports section offsets.
    pub fn at(data: &'a [u8], offset: u64, endianness: Endianness) -> Self {
        let mut reader = Self::new(data, endianness);
        match usize::try_from(offset) {
            Ok(offset) if offset <= data.len() => reader.offset = offset,
            _ => reader.fail(usize::MAX, "reader start offset"),
        }
        reader
    }

    /// Current offset from the start of the buffer.
    pub fn offset(&self) -> u64 {
        self.offset as u64
    }

    /// Number of bytes left before the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Returns true when the cursor has reached the end of the buffer.
    pub fn is_eof(&self) -> bool {
        self.remaining() == 0
    }

    /// Returns true once any read has failed.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the first recorded failure, if any.
    pub fn check(&self) -> Result<(), ParseError> {
        match &self.error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, expected: usize, context: &'static str) {
        if self.error.is_none() {
            self.error = Some(ParseError::TruncatedData {
                expected,
                actual: self.data.len(),
                context,
            });
        }
    }

    fn take(&mut self, len: usize, context: &'static str) -> Option<&'a [u8]> {
        if self.error.is_some() {
            return None;
        }
        match self.offset.checked_add(len) {
            Some(end) if end <= self.data.len() => {
                let bytes = &self.data[self.offset..end];
                self.offset = end;
                Some(bytes)
            }
            _ => {
                self.fail(self.offset.saturating_add(len), context);
                None
            }
        }
    }

    /// Read an unsigned integer of 1 to 8 bytes in the reader's byte order.
    pub fn read_uint(&mut self, width: usize) -> u64 {
        debug_assert!((1..=8).contains(&width));
        let Some(bytes) = self.take(width, "fixed-width integer") else {
            return 0;
        };
        let fold = |acc: u64, &b: &u8| (acc << 8) | u64::from(b);
        match self.endianness {
            Endianness::Little => bytes.iter().rev().fold(0, fold),
            Endianness::Big => bytes.iter().fold(0, fold),
        }
    }

    pub fn read_u8(&mut self) -> u8 {
        self.read_uint(1) as u8
    }

    pub fn read_u16(&mut self) -> u16 {
        self.read_uint(2) as u16
    }

    /// Read a 3-byte integer (`DW_FORM_strx3`, `DW_FORM_addrx3`).
    pub fn read_u24(&mut self) -> u32 {
        self.read_uint(3) as u32
    }

    pub fn read_u32(&mut self) -> u32 {
        self.read_uint(4) as u32
    }

    pub fn read_u64(&mut self) -> u64 {
        self.read_uint(8)
    }

    /// Read a target address of `address_size` bytes.
    pub fn read_address(&mut self, address_size: u8) -> u64 {
        match address_size {
            1 | 2 | 4 | 8 => self.read_uint(address_size as usize),
            _ => {
                if self.error.is_none() {
                    self.error = Some(ParseError::InvalidValue("unsupported address size"));
                }
                0
            }
        }
    }

    /// Read a section offset: 4 bytes in 32-bit DWARF, 8 in 64-bit DWARF.
    pub fn read_offset(&mut self, is_64bit: bool) -> u64 {
        if is_64bit {
            self.read_u64()
        } else {
            u64::from(self.read_u32())
        }
    }

    pub fn read_uleb128(&mut self) -> u64 {
        if self.error.is_some() {
            return 0;
        }
        match decode_uleb128(&self.data[self.offset..]) {
            Ok((value, len)) => {
                self.offset += len;
                value
            }
            Err(error) => {
                self.error = Some(error);
                0
            }
        }
    }

    pub fn read_sleb128(&mut self) -> i64 {
        if self.error.is_some() {
            return 0;
        }
        match decode_sleb128(&self.data[self.offset..]) {
            Ok((value, len)) => {
                self.offset += len;
                value
            }
            Err(error) => {
                self.error = Some(error);
                0
            }
        }
    }

    /// Read `len` raw bytes, borrowed from the underlying buffer.
    pub fn read_bytes(&mut self, len: u64) -> &'a [u8] {
        let Ok(len) = usize::try_from(len) else {
            self.fail(usize::MAX, "byte block");
            return &[];
        };
        self.take(len, "byte block").unwrap_or(&[])
    }

    /// Read a NUL-terminated string; the terminator is consumed but not returned.
    pub fn read_cstr(&mut self) -> &'a [u8] {
        if self.error.is_some() {
            return &[];
        }
        let rest = &self.data[self.offset..];
        match rest.iter().position(|&b| b == 0) {
            Some(len) => {
                self.offset += len + 1;
                &rest[..len]
            }
            None => {
                self.fail(self.data.len() + 1, "null-terminated string");
                &[]
            }
        }
    }

    /// Advance the cursor by `len` bytes.
    pub fn skip(&mut self, len: u64) {
        self.read_bytes(len);
    }
}

/// Borrow the NUL-terminated string starting at `offset` in a string section.
pub(crate) fn cstr_at(data: &[u8], offset: u64) -> Result<&[u8], ParseError> {
    let start = usize::try_from(offset)
        .ok()
        .filter(|&start| start < data.len())
        .ok_or(ParseError::InvalidStringIndex {
            index: offset as usize,
            size: data.len(),
        })?;
    let rest = &data[start..];
    let len = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or(ParseError::TruncatedData {
            expected: data.len() + 1,
            actual: data.len(),
            context: "null-terminated string",
        })?;
    Ok(&rest[..len])
}
