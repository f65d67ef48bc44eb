//! DWARF5 .debug_addr section support.
//!
//! The .debug_addr section contains a table of addresses, allowing indirect
//! address references via indices (`DW_FORM_addrx*`, `DW_RLE_*x` range entries).
//!
//! # Section Format (DWARF5)
//!
//! ```text
//! Header:
//!   unit_length: 4 bytes (or 12 for 64-bit DWARF)
//!   version: 2 bytes (must be 5)
//!   address_size: 1 byte
//!   segment_selector_size: 1 byte
//!
//! Body:                                  <- DW_AT_addr_base points here
//!   address[0]: address_size bytes (index 0)
//!   address[1]: address_size bytes (index 1)
//!   ...
//! ```

use super::reader::ByteReader;
use crate::{Endianness, ParseError};

/// One unit's view of `.debug_addr`.
#[derive(Debug, Clone, Copy)]
pub struct AddressTable<'data> {
    data: &'data [u8],
    base: u64,
    address_size: u8,
    endianness: Endianness,
}

impl<'data> AddressTable<'data> {
    /// Create a view of the entries starting at `base`.
    pub fn new(data: &'data [u8], base: u64, address_size: u8, endianness: Endianness) -> Self {
        Self {
            data,
            base,
            address_size,
            endianness,
        }
    }

    /// Get the address at `index`.
    pub fn get(&self, index: u64) -> Result<u64, ParseError> {
        let position = index
            .checked_mul(u64::from(self.address_size))
            .and_then(|relative| relative.checked_add(self.base))
            .ok_or(ParseError::Overflow {
                context: "address table index",
            })?;

        let mut reader = ByteReader::at(self.data, position, self.endianness);
        let address = reader.read_address(self.address_size);
        reader.check().map_err(|_| {
            ParseError::invalid_structure(
                "address table",
                self.base,
                format!("index {index} is past the end of .debug_addr ({} entries)", self.len()),
            )
        })?;
        Ok(address)
    }

    /// Number of entries between `base` and the end of the section.
    pub fn len(&self) -> usize {
        if self.address_size == 0 {
            return 0;
        }
        (self.data.len() as u64).saturating_sub(self.base) as usize / self.address_size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
