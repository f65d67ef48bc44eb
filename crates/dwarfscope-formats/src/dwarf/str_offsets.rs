//! DWARF5 .debug_str_offsets section support.
//!
//! The .debug_str_offsets section contains a table of offsets into .debug_str,
//! allowing indirect string references via indices (`DW_FORM_strx*`).
//!
//! # Section Format (DWARF5)
//!
//! ```text
//! Header:
//!   unit_length: 4 bytes (or 12 for 64-bit DWARF)
//!   version: 2 bytes (must be 5)
//!   padding: 2 bytes
//!
//! Body:                                  <- DW_AT_str_offsets_base points here
//!   offset[0]: 4/8 bytes (index 0)
//!   offset[1]: 4/8 bytes (index 1)
//!   ...
//! ```
//!
//! Units locate their slice of the table through `DW_AT_str_offsets_base`,
//! which already points past the header, so lookups never parse it.

use super::reader::{cstr_at, ByteReader};
use crate::{Endianness, ParseError};

/// One unit's view of `.debug_str_offsets`.
#[derive(Debug, Clone, Copy)]
pub struct StringOffsetsTable<'data> {
    data: &'data [u8],
    base: u64,
    offset_size: u8,
    endianness: Endianness,
}

impl<'data> StringOffsetsTable<'data> {
    /// Create a view of the entries starting at `base`.
    pub fn new(data: &'data [u8], base: u64, is_64bit: bool, endianness: Endianness) -> Self {
        Self {
            data,
            base,
            offset_size: if is_64bit { 8 } else { 4 },
            endianness,
        }
    }

    /// Get the `.debug_str` offset stored at `index`.
    pub fn get(&self, index: u64) -> Result<u64, ParseError> {
        let position = index
            .checked_mul(u64::from(self.offset_size))
            .and_then(|relative| relative.checked_add(self.base))
            .ok_or(ParseError::Overflow {
                context: "string offsets index",
            })?;

        let mut reader = ByteReader::at(self.data, position, self.endianness);
        let offset = reader.read_offset(self.offset_size == 8);
        reader.check().map_err(|_| ParseError::InvalidStringIndex {
            index: index as usize,
            size: self.len(),
        })?;
        Ok(offset)
    }

    /// Resolve `index` all the way to a string in `.debug_str`.
    pub fn get_string<'s>(&self, debug_str: &'s [u8], index: u64) -> Result<&'s [u8], ParseError> {
        cstr_at(debug_str, self.get(index)?)
    }

    /// Number of entries between `base` and the end of the section.
    pub fn len(&self) -> usize {
        (self.data.len() as u64).saturating_sub(self.base) as usize / self.offset_size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
