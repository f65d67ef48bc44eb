//! Address ranges and DWARF4 `.debug_ranges` lists.
//!
//! A DWARF4 range list is a sequence of address-sized pairs:
//!
//! ```text
//! (0, 0)            end of list
//! (max, base)       base address selector, max = all ones for the address size
//! (begin, end)      range [base + begin, base + end)
//! ```

use std::fmt;

use super::reader::ByteReader;
use super::rnglists::RngList;
use crate::{Endianness, ParseError};

/// A half-open address range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    /// Start address of the range.
    pub start: u64,
    /// End address of the range (exclusive).
    pub end: u64,
}

impl AddressRange {
    /// Create a new address range.
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub(crate) fn with_length(start: u64, length: u64) -> Result<Self, ParseError> {
        start
            .checked_add(length)
            .map(|end| Self::new(start, end))
            .ok_or(ParseError::Overflow {
                context: "address range length",
            })
    }

    pub(crate) fn from_base(base: u64, start: u64, end: u64) -> Result<Self, ParseError> {
        match (base.checked_add(start), base.checked_add(end)) {
            (Some(start), Some(end)) => Ok(Self::new(start, end)),
            _ => Err(ParseError::Overflow {
                context: "base-relative address range",
            }),
        }
    }

    /// Returns true if this range contains the given address.
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Returns the size of this range.
    pub fn size(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    /// Returns true if the range covers no addresses.
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:#x}, {:#x})", self.start, self.end)
    }
}

/// One range list in `.debug_ranges` (DWARF4).
#[derive(Debug, Clone, Copy)]
pub struct DebugRangesList<'data> {
    data: &'data [u8],
    offset: u64,
    address_size: u8,
    endianness: Endianness,
    base_address: Option<u64>,
}

impl<'data> DebugRangesList<'data> {
    /// Describe the list at `offset` in `.debug_ranges`.
    ///
    /// Pairs before the first base selector are relative to `base_address`
    /// (the unit's `DW_AT_low_pc`), or to zero when the unit has none.
    pub fn new(
        data: &'data [u8],
        offset: u64,
        address_size: u8,
        endianness: Endianness,
        base_address: Option<u64>,
    ) -> Self {
        Self {
            data,
            offset,
            address_size,
            endianness,
            base_address,
        }
    }

    /// Decode the list, calling `f` for every range in stream order.
    ///
    /// The end of the section at a pair boundary ends the list, so a list
    /// into an empty `.debug_ranges` has no ranges. A pair cut short is
    /// still an error.
    pub fn for_each_range<F>(&self, mut f: F) -> Result<(), ParseError>
    where
        F: FnMut(AddressRange),
    {
        let selector = match self.address_size {
            size @ 1..=7 => (1u64 << (u32::from(size) * 8)) - 1,
            _ => u64::MAX,
        };
        let mut reader = ByteReader::at(self.data, self.offset, self.endianness);
        let mut base = self.base_address.unwrap_or(0);

        reader.check()?;

        while !reader.is_eof() {
            let begin = reader.read_address(self.address_size);
            let end = reader.read_address(self.address_size);
            reader.check()?;

            if begin == 0 && end == 0 {
                return Ok(());
            }
            if begin == selector {
                base = end;
                continue;
            }
            f(AddressRange::from_base(base, begin, end)?);
        }
        Ok(())
    }
}

/// A DIE's non-contiguous address ranges, in either encoding.
#[derive(Debug, Clone, Copy)]
pub enum RangeList<'data> {
    /// DWARF4 `.debug_ranges`.
    Ranges(DebugRangesList<'data>),
    /// DWARF5 `.debug_rnglists`.
    RngLists(RngList<'data>),
}

impl RangeList<'_> {
    /// Decode the list, calling `f` for every range in stream order.
    pub fn for_each_range<F>(&self, f: F) -> Result<(), ParseError>
    where
        F: FnMut(AddressRange),
    {
        match self {
            Self::Ranges(list) => list.for_each_range(f),
            Self::RngLists(list) => list.for_each_range(f),
        }
    }

    /// Decode the whole list into a vector.
    pub fn collect(&self) -> Result<Vec<AddressRange>, ParseError> {
        let mut ranges = Vec::new();
        self.for_each_range(|range| ranges.push(range))?;
        Ok(ranges)
    }
}
