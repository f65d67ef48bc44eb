//! DWARF5 .debug_rnglists section support.
//!
//! The .debug_rnglists section contains range lists that describe non-contiguous
//! address ranges. This replaces the DWARF4 .debug_ranges section with a more
//! compact representation.
//!
//! # Range List Entries (RLE)
//!
//! Each entry starts with a 1-byte operator:
//! - `DW_RLE_end_of_list` (0x00): End of list
//! - `DW_RLE_base_addressx` (0x01): Set base address via index
//! - `DW_RLE_startx_endx` (0x02): Range via start/end indices
//! - `DW_RLE_startx_length` (0x03): Range via start index + length
//! - `DW_RLE_offset_pair` (0x04): Offset pair from base
//! - `DW_RLE_base_address` (0x05): Set base address directly
//! - `DW_RLE_start_end` (0x06): Range via start/end addresses
//! - `DW_RLE_start_length` (0x07): Range via start address + length

use super::addr_table::AddressTable;
use super::ranges::AddressRange;
use super::reader::ByteReader;
use crate::{Endianness, ParseError};

/// Range list entry operators (DWARF5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DwRle {
    EndOfList = 0x00,
    BaseAddressx = 0x01,
    StartxEndx = 0x02,
    StartxLength = 0x03,
    OffsetPair = 0x04,
    BaseAddress = 0x05,
    StartEnd = 0x06,
    StartLength = 0x07,
}

impl TryFrom<u8> for DwRle {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, u8> {
        Ok(match value {
            0x00 => DwRle::EndOfList,
            0x01 => DwRle::BaseAddressx,
            0x02 => DwRle::StartxEndx,
            0x03 => DwRle::StartxLength,
            0x04 => DwRle::OffsetPair,
            0x05 => DwRle::BaseAddress,
            0x06 => DwRle::StartEnd,
            0x07 => DwRle::StartLength,
            other => return Err(other),
        })
    }
}

/// One range list in `.debug_rnglists`.
#[derive(Debug, Clone, Copy)]
pub struct RngList<'data> {
    data: &'data [u8],
    offset: u64,
    address_size: u8,
    endianness: Endianness,
    base_address: Option<u64>,
    address_table: Option<AddressTable<'data>>,
    unit_offset: u64,
}

impl<'data> RngList<'data> {
    /// Describe the list at `offset` in `.debug_rnglists`.
    ///
    /// `base_address` is the owning unit's base (its `DW_AT_low_pc`), used by
    /// offset pairs until the list selects its own base. `address_table` is
    /// required only by the indexed entry kinds.
    pub fn new(
        data: &'data [u8],
        offset: u64,
        address_size: u8,
        endianness: Endianness,
        base_address: Option<u64>,
        address_table: Option<AddressTable<'data>>,
        unit_offset: u64,
    ) -> Self {
        Self {
            data,
            offset,
            address_size,
            endianness,
            base_address,
            address_table,
            unit_offset,
        }
    }

    fn address_at(&self, index: u64) -> Result<u64, ParseError> {
        self.address_table
            .ok_or(ParseError::MissingIndexTable {
                table: "address",
                unit_offset: self.unit_offset,
            })?
            .get(index)
    }

    /// Decode the list, calling `f` for every range in stream order.
    pub fn for_each_range<F>(&self, mut f: F) -> Result<(), ParseError>
    where
        F: FnMut(AddressRange),
    {
        let mut reader = ByteReader::at(self.data, self.offset, self.endianness);
        let mut base = self.base_address;

        loop {
            let entry_offset = reader.offset();
            let kind = reader.read_u8();
            reader.check()?;
            let kind = DwRle::try_from(kind).map_err(|kind| ParseError::UnknownRangeListEntry {
                kind,
                offset: entry_offset,
            })?;

            let range = match kind {
                DwRle::EndOfList => return Ok(()),
                DwRle::BaseAddressx => {
                    let index = reader.read_uleb128();
                    reader.check()?;
                    base = Some(self.address_at(index)?);
                    None
                }
                DwRle::BaseAddress => {
                    let address = reader.read_address(self.address_size);
                    reader.check()?;
                    base = Some(address);
                    None
                }
                DwRle::StartxEndx => {
                    let start = reader.read_uleb128();
                    let end = reader.read_uleb128();
                    reader.check()?;
                    Some(AddressRange::new(
                        self.address_at(start)?,
                        self.address_at(end)?,
                    ))
                }
                DwRle::StartxLength => {
                    let start = reader.read_uleb128();
                    let length = reader.read_uleb128();
                    reader.check()?;
                    Some(AddressRange::with_length(self.address_at(start)?, length)?)
                }
                DwRle::OffsetPair => {
                    let start = reader.read_uleb128();
                    let end = reader.read_uleb128();
                    reader.check()?;
                    let base = base.ok_or_else(|| {
                        ParseError::invalid_structure(
                            "range list",
                            entry_offset,
                            "offset pair with no base address",
                        )
                    })?;
                    Some(AddressRange::from_base(base, start, end)?)
                }
                DwRle::StartEnd => {
                    let start = reader.read_address(self.address_size);
                    let end = reader.read_address(self.address_size);
                    reader.check()?;
                    Some(AddressRange::new(start, end))
                }
                DwRle::StartLength => {
                    let start = reader.read_address(self.address_size);
                    let length = reader.read_uleb128();
                    reader.check()?;
                    Some(AddressRange::with_length(start, length)?)
                }
            };

            if let Some(range) = range {
                f(range);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(data: &[u8], base: Option<u64>) -> Result<Vec<AddressRange>, ParseError> {
        let mut ranges = Vec::new();
        RngList::new(data, 0, 4, Endianness::Little, base, None, 0)
            .for_each_range(|range| ranges.push(range))?;
        Ok(ranges)
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(list(&[0x00], None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_start_end() {
        let data = [
            0x06, // DW_RLE_start_end
            0x00, 0x10, 0x00, 0x00, // start = 0x1000
            0x00, 0x20, 0x00, 0x00, // end = 0x2000
            0x00, // DW_RLE_end_of_list
        ];
        assert_eq!(
            list(&data, None).unwrap(),
            vec![AddressRange::new(0x1000, 0x2000)]
        );
    }

    #[test]
    fn test_parse_offset_pair() {
        let data = [
            0x05, // DW_RLE_base_address
            0x00, 0x20, 0x00, 0x00, // base = 0x2000
            0x04, // DW_RLE_offset_pair
            0x10, // start offset
            0x20, // end offset
            0x00,
        ];
        assert_eq!(
            list(&data, None).unwrap(),
            vec![AddressRange::new(0x2010, 0x2020)]
        );
    }

    #[test]
    fn test_offset_pair_uses_unit_base() {
        let data = [0x04, 0x10, 0x20, 0x00];
        assert_eq!(
            list(&data, Some(0x400)).unwrap(),
            vec![AddressRange::new(0x410, 0x420)]
        );
        assert!(matches!(
            list(&data, None),
            Err(ParseError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_parse_start_length() {
        let data = [
            0x07, // DW_RLE_start_length
            0x00, 0x30, 0x00, 0x00, // start = 0x3000
            0x80, 0x01, // length = 128
            0x00,
        ];
        assert_eq!(
            list(&data, None).unwrap(),
            vec![AddressRange::new(0x3000, 0x3080)]
        );
    }

    #[test]
    fn test_indexed_entries() {
        let addresses = [0x00, 0x10, 0x00, 0x00, 0x00, 0x18, 0x00, 0x00];
        let table = AddressTable::new(&addresses, 0, 4, Endianness::Little);
        let data = [
            0x02, 0x00, 0x01, // startx_endx 0, 1
            0x03, 0x01, 0x08, // startx_length 1, 8
            0x01, 0x00, // base_addressx 0
            0x04, 0x02, 0x04, // offset_pair
            0x00,
        ];
        let mut ranges = Vec::new();
        RngList::new(&data, 0, 4, Endianness::Little, None, Some(table), 0)
            .for_each_range(|range| ranges.push(range))
            .unwrap();
        assert_eq!(
            ranges,
            vec![
                AddressRange::new(0x1000, 0x1800),
                AddressRange::new(0x1800, 0x1808),
                AddressRange::new(0x1002, 0x1004),
            ]
        );
    }

    #[test]
    fn test_indexed_entry_without_table() {
        let data = [0x01, 0x00, 0x00];
        assert!(matches!(
            list(&data, None),
            Err(ParseError::MissingIndexTable { table: "address", .. })
        ));
    }

    #[test]
    fn test_unknown_entry_is_fatal() {
        let data = [0x06, 0, 0, 0, 0, 1, 0, 0, 0, 0x09, 0x00];
        assert!(matches!(
            list(&data, None),
            Err(ParseError::UnknownRangeListEntry { kind: 0x09, offset: 9 })
        ));
    }

    #[test]
    fn test_missing_terminator() {
        let data = [0x04, 0x10, 0x20];
        assert!(matches!(
            list(&data, Some(0)),
            Err(ParseError::TruncatedData { .. })
        ));
    }
}
