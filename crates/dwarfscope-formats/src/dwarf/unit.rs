//! Compilation units in `.debug_info`.
//!
//! A unit is a header followed by a tree of DIEs. The header layout depends on
//! the DWARF version, so [`CompilationUnitHeader::parse`] branches on the
//! version before reading any field that follows it:
//!
//! ```text
//! v4: unit_length  version  debug_abbrev_offset  address_size
//! v5: unit_length  version  unit_type  address_size  debug_abbrev_offset  [extra]
//! ```
//!
//! `unit_length` is 4 bytes, or `0xffffffff` followed by 8 bytes in the 64-bit
//! format; section offsets in the unit are sized to match.

use std::ops::ControlFlow;
use std::sync::Arc;

use super::abbrev::AbbreviationTable;
use super::addr_table::AddressTable;
use super::attribute::{AttributeValue, FormValue};
use super::die::Die;
use super::ranges::{DebugRangesList, RangeList};
use super::reader::{cstr_at, ByteReader};
use super::rnglists::RngList;
use super::str_offsets::StringOffsetsTable;
use super::types::{DwAt, DwUt};
use super::DwarfSections;
use crate::{Endianness, ParseError};

/// The only address size this reader accepts.
pub const SUPPORTED_ADDRESS_SIZE: u8 = 4;

/// Parsed unit header, normalized across DWARF 4 and 5.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnitHeader {
    /// Offset of this unit in .debug_info.
    pub offset: u64,
    /// Length of the unit, not including the initial length field.
    pub unit_length: u64,
    /// True for the 64-bit DWARF format.
    pub is_64bit: bool,
    /// DWARF version (4 or 5).
    pub version: u16,
    /// Unit type; DWARF 4 units in .debug_info are always compile units.
    pub unit_type: DwUt,
    /// Offset into .debug_abbrev.
    pub debug_abbrev_offset: u64,
    /// Size of an address on the target.
    pub address_size: u8,
    /// Type signature of a type unit.
    pub type_signature: Option<u64>,
    /// Unit-relative offset of the type DIE in a type unit.
    pub type_offset: Option<u64>,
    /// Split-DWARF identifier of a skeleton or split compile unit.
    pub dwo_id: Option<u64>,
}

impl CompilationUnitHeader {
    /// Parse the unit header at `offset` in `.debug_info`.
    pub fn parse(
        debug_info: &[u8],
        offset: u64,
        endianness: Endianness,
    ) -> Result<Self, ParseError> {
        let mut reader = ByteReader::at(debug_info, offset, endianness);

        let (is_64bit, unit_length) = match reader.read_u32() {
            0xffff_ffff => (true, reader.read_u64()),
            0xffff_fff0..=0xffff_fffe => {
                return Err(ParseError::invalid_structure(
                    "compilation unit",
                    offset,
                    "reserved initial length value",
                ))
            }
            length => (false, u64::from(length)),
        };
        let version = reader.read_u16();
        reader.check()?;

        if !(4..=5).contains(&version) {
            return Err(ParseError::UnsupportedVersion {
                format: "DWARF",
                version: u32::from(version),
            });
        }

        let (unit_type, debug_abbrev_offset, address_size) = if version >= 5 {
            let unit_type = DwUt::from(reader.read_u8());
            let address_size = reader.read_u8();
            let abbrev_offset = reader.read_offset(is_64bit);
            (unit_type, abbrev_offset, address_size)
        } else {
            let abbrev_offset = reader.read_offset(is_64bit);
            (DwUt::Compile, abbrev_offset, reader.read_u8())
        };

        let mut header = Self {
            offset,
            unit_length,
            is_64bit,
            version,
            unit_type,
            debug_abbrev_offset,
            address_size,
            type_signature: None,
            type_offset: None,
            dwo_id: None,
        };
        match unit_type {
            DwUt::Type | DwUt::SplitType => {
                header.type_signature = Some(reader.read_u64());
                header.type_offset = Some(reader.read_offset(is_64bit));
            }
            DwUt::Skeleton | DwUt::SplitCompile => header.dwo_id = Some(reader.read_u64()),
            _ => {}
        }
        reader.check()?;

        if address_size != SUPPORTED_ADDRESS_SIZE {
            return Err(ParseError::UnsupportedAddressSize {
                size: address_size,
                unit_offset: offset,
            });
        }

        let end = offset
            .checked_add(header.initial_length_size())
            .and_then(|start| start.checked_add(unit_length))
            .ok_or(ParseError::Overflow {
                context: "unit length",
            })?;
        if end > debug_info.len() as u64 {
            return Err(ParseError::invalid_structure(
                "compilation unit",
                offset,
                format!(
                    "unit ends at {end:#x}, past the end of .debug_info ({:#x})",
                    debug_info.len()
                ),
            ));
        }
        if header.first_die_offset() > end {
            return Err(ParseError::invalid_structure(
                "compilation unit",
                offset,
                format!("unit length {unit_length:#x} is smaller than its header"),
            ));
        }

        Ok(header)
    }

    /// Size of the initial length field: 4, or 12 in the 64-bit format.
    pub fn initial_length_size(&self) -> u64 {
        if self.is_64bit {
            12
        } else {
            4
        }
    }

    /// Size of a section offset in this unit.
    pub fn offset_size(&self) -> u8 {
        if self.is_64bit {
            8
        } else {
            4
        }
    }

    /// Total size of the unit, including the initial length field.
    pub fn size(&self) -> u64 {
        self.unit_length + self.initial_length_size()
    }

    /// Offset one past the last byte of the unit.
    pub fn end(&self) -> u64 {
        self.offset + self.size()
    }

    /// Size of the header, from the initial length up to the first DIE.
    pub fn header_size(&self) -> u64 {
        let offset_size = u64::from(self.offset_size());
        // version
        let mut size = self.initial_length_size() + 2;
        // v4: abbrev offset + address size; v5 adds the unit type byte
        size += offset_size + 1;
        if self.version >= 5 {
            size += 1;
        }
        if self.type_signature.is_some() {
            size += 8;
        }
        if self.type_offset.is_some() {
            size += offset_size;
        }
        if self.dwo_id.is_some() {
            size += 8;
        }
        size
    }

    /// Offset of the root DIE.
    pub fn first_die_offset(&self) -> u64 {
        self.offset + self.header_size()
    }
}

/// A compilation unit and the tables needed to decode its DIEs.
///
/// Units are created by [`DwarfInfo`](super::DwarfInfo) and never change
/// afterwards. DIEs are not stored; [`root_die`](Self::root_die) and
/// [`die_at`](Self::die_at) decode them from the section bytes on demand.
#[derive(Debug, Clone)]
pub struct CompilationUnit<'data> {
    index: usize,
    header: CompilationUnitHeader,
    abbreviations: Arc<AbbreviationTable>,
    sections: DwarfSections<'data>,
    follow_sibling_hints: bool,
    str_offsets_base: Option<u64>,
    addr_base: Option<u64>,
    rnglists_base: Option<u64>,
    base_address: Option<u64>,
}

impl<'data> CompilationUnit<'data> {
    /// Create a unit and read the table bases from its root DIE.
    pub fn new(
        index: usize,
        header: CompilationUnitHeader,
        abbreviations: Arc<AbbreviationTable>,
        sections: DwarfSections<'data>,
        follow_sibling_hints: bool,
    ) -> Result<Self, ParseError> {
        let mut unit = Self {
            index,
            header,
            abbreviations,
            sections,
            follow_sibling_hints,
            str_offsets_base: None,
            addr_base: None,
            rnglists_base: None,
            base_address: None,
        };
        unit.read_bases()?;
        Ok(unit)
    }

    /// Scan the root DIE for the attributes that index forms depend on.
    ///
    /// Only raw values are looked at, so the root DIE may itself use index
    /// forms. A `DW_AT_low_pc` given as an address index is resolved once
    /// the address base is known.
    fn read_bases(&mut self) -> Result<(), ParseError> {
        if self.header.first_die_offset() >= self.header.end() {
            return Ok(());
        }

        let mut str_offsets_base = None;
        let mut addr_base = None;
        let mut rnglists_base = None;
        let mut low_pc = None;
        let mut low_pc_index = None;

        self.root_die()?.walk_raw(|spec, _, value| {
            let number = match value {
                FormValue::Value(value) => value.as_u64(),
                _ => None,
            };
            match spec.name {
                DwAt::StrOffsetsBase => str_offsets_base = number,
                DwAt::AddrBase | DwAt::GnuAddrBase => addr_base = number,
                DwAt::RnglistsBase | DwAt::GnuRangesBase => rnglists_base = number,
                DwAt::LowPc => match value {
                    FormValue::AddrIndex(index) => low_pc_index = Some(index),
                    _ => low_pc = number,
                },
                _ => {}
            }
            ControlFlow::Continue(())
        })?;

        self.str_offsets_base = str_offsets_base;
        self.addr_base = addr_base;
        self.rnglists_base = rnglists_base;
        self.base_address = match low_pc_index {
            Some(index) => Some(self.get_address(index)?),
            None => low_pc,
        };

        log::trace!(
            "unit {:#x}: str_offsets_base={:?} addr_base={:?} rnglists_base={:?} base={:?}",
            self.header.offset,
            self.str_offsets_base,
            self.addr_base,
            self.rnglists_base,
            self.base_address
        );
        Ok(())
    }

    /// Position of this unit in `.debug_info` order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn header(&self) -> &CompilationUnitHeader {
        &self.header
    }

    /// Offset of this unit in `.debug_info`.
    pub fn offset(&self) -> u64 {
        self.header.offset
    }

    pub fn version(&self) -> u16 {
        self.header.version
    }

    /// Total size of the unit, including the initial length field.
    pub fn size(&self) -> u64 {
        self.header.size()
    }

    pub fn abbreviations(&self) -> &AbbreviationTable {
        &self.abbreviations
    }

    /// The shared handle to this unit's abbreviation table.
    pub fn abbreviations_handle(&self) -> &Arc<AbbreviationTable> {
        &self.abbreviations
    }

    pub fn sections(&self) -> &DwarfSections<'data> {
        &self.sections
    }

    /// Whether child iteration trusts `DW_AT_sibling`.
    pub fn follow_sibling_hints(&self) -> bool {
        self.follow_sibling_hints
    }

    /// The unit's base address (`DW_AT_low_pc` of the root DIE).
    pub fn base_address(&self) -> Option<u64> {
        self.base_address
    }

    pub fn str_offsets_base(&self) -> Option<u64> {
        self.str_offsets_base
    }

    pub fn addr_base(&self) -> Option<u64> {
        self.addr_base
    }

    pub fn rnglists_base(&self) -> Option<u64> {
        self.rnglists_base
    }

    /// Returns true if a DIE may start at `offset` in this unit.
    pub fn contains_die_offset(&self, offset: u64) -> bool {
        offset >= self.header.first_die_offset() && offset < self.header.end()
    }

    /// Decode the root DIE.
    pub fn root_die(&self) -> Result<Die<'_>, ParseError> {
        Die::parse(self, self.header.first_die_offset(), None)
    }

    /// Decode the DIE at an absolute `.debug_info` offset in this unit.
    ///
    /// The DIE has no parent offset, since it was not reached from its parent.
    pub fn die_at(&self, offset: u64) -> Result<Die<'_>, ParseError> {
        if !self.contains_die_offset(offset) {
            return Err(ParseError::invalid_structure(
                "DIE",
                offset,
                format!(
                    "offset is outside the unit at {:#x} ({:#x}..{:#x})",
                    self.header.offset,
                    self.header.first_die_offset(),
                    self.header.end()
                ),
            ));
        }
        Die::parse(self, offset, None)
    }

    /// Decode the DIE at `offset` together with its parent offset.
    ///
    /// Walks the unit from the root DIE, decoding every DIE before `offset`.
    /// Returns `None` when no DIE starts at `offset`.
    pub fn die_with_parent(&self, offset: u64) -> Result<Option<Die<'_>>, ParseError> {
        let end = self.header.end();
        let mut current = self.header.first_die_offset();
        let mut parents: Vec<u64> = Vec::new();

        while current < end && current <= offset {
            let die = Die::parse(self, current, parents.last().copied())?;
            if current == offset {
                return Ok(Some(die));
            }
            current += die.size();

            if die.is_null() {
                if parents.pop().is_none() || parents.is_empty() {
                    break;
                }
            } else if die.has_children() {
                parents.push(die.offset());
            } else if parents.is_empty() {
                break;
            }
        }
        Ok(None)
    }

    /// A reader over this unit's bytes, positioned at `offset`.
    ///
    /// Reads stop at the end of the unit rather than the end of the section.
    pub(crate) fn info_reader_at(&self, offset: u64) -> ByteReader<'data> {
        let end = usize::try_from(self.header.end()).unwrap_or(usize::MAX);
        let data = self.sections.debug_info.get(..end).unwrap_or(&[]);
        ByteReader::at(data, offset, self.sections.endianness)
    }

    /// This unit's slice of `.debug_str_offsets`.
    pub fn string_offsets(&self) -> Result<StringOffsetsTable<'data>, ParseError> {
        let base = self.str_offsets_base.ok_or(ParseError::MissingIndexTable {
            table: "string offsets",
            unit_offset: self.header.offset,
        })?;
        Ok(StringOffsetsTable::new(
            self.sections.debug_str_offsets,
            base,
            self.header.is_64bit,
            self.sections.endianness,
        ))
    }

    /// This unit's slice of `.debug_addr`.
    pub fn address_table(&self) -> Result<AddressTable<'data>, ParseError> {
        let base = self.addr_base.ok_or(ParseError::MissingIndexTable {
            table: "address",
            unit_offset: self.header.offset,
        })?;
        Ok(AddressTable::new(
            self.sections.debug_addr,
            base,
            self.header.address_size,
            self.sections.endianness,
        ))
    }

    /// Resolve a `DW_FORM_strx*` index to a string in `.debug_str`.
    pub fn get_string(&self, index: u64) -> Result<&'data [u8], ParseError> {
        self.string_offsets()?
            .get_string(self.sections.debug_str, index)
    }

    /// Resolve a `DW_FORM_addrx*` index to an address.
    pub fn get_address(&self, index: u64) -> Result<u64, ParseError> {
        self.address_table()?.get(index)
    }

    /// Turn a raw form value into its public value.
    pub(crate) fn resolve(
        &self,
        value: FormValue<'data>,
    ) -> Result<AttributeValue<'data>, ParseError> {
        Ok(match value {
            FormValue::Value(value) => value,
            FormValue::StrOffset(offset) => {
                AttributeValue::String(cstr_at(self.sections.debug_str, offset)?)
            }
            FormValue::LineStrOffset(offset) => {
                AttributeValue::String(cstr_at(self.sections.debug_line_str, offset)?)
            }
            FormValue::StrIndex(index) => AttributeValue::String(self.get_string(index)?),
            FormValue::AddrIndex(index) => AttributeValue::Address(self.get_address(index)?),
        })
    }

    /// The range list a `DW_AT_ranges` value refers to.
    ///
    /// DWARF 4 section offsets point into `.debug_ranges`. DWARF 5 offsets
    /// point into `.debug_rnglists`, and `DW_FORM_rnglistx` indices go
    /// through the offset table at `DW_AT_rnglists_base`.
    pub fn range_list(&self, value: &AttributeValue<'_>) -> Result<RangeList<'data>, ParseError> {
        let sections = &self.sections;
        if self.header.version < 5 {
            let AttributeValue::SecOffset(offset) = *value else {
                return Err(ParseError::InvalidValue(
                    "DW_AT_ranges in a DWARF 4 unit must be a section offset",
                ));
            };
            return Ok(RangeList::Ranges(DebugRangesList::new(
                sections.debug_ranges,
                offset,
                self.header.address_size,
                sections.endianness,
                self.base_address,
            )));
        }

        let offset = match *value {
            AttributeValue::SecOffset(offset) => offset,
            AttributeValue::RangeListIndex(index) => self.range_list_offset(index)?,
            _ => {
                return Err(ParseError::InvalidValue(
                    "DW_AT_ranges must be a section offset or a range list index",
                ))
            }
        };
        Ok(RangeList::RngLists(RngList::new(
            sections.debug_rnglists,
            offset,
            self.header.address_size,
            sections.endianness,
            self.base_address,
            self.address_table().ok(),
            self.header.offset,
        )))
    }

    fn range_list_offset(&self, index: u64) -> Result<u64, ParseError> {
        let base = self.rnglists_base.ok_or(ParseError::MissingIndexTable {
            table: "range list offsets",
            unit_offset: self.header.offset,
        })?;
        let position = index
            .checked_mul(u64::from(self.header.offset_size()))
            .and_then(|relative| relative.checked_add(base))
            .ok_or(ParseError::Overflow {
                context: "range list index",
            })?;
        let mut reader = ByteReader::at(
            self.sections.debug_rnglists,
            position,
            self.sections.endianness,
        );
        let relative = reader.read_offset(self.header.is_64bit);
        reader.check()?;
        base.checked_add(relative).ok_or(ParseError::Overflow {
            context: "range list offset",
        })
    }

    /// `DW_AT_name` of the root DIE.
    pub fn name(&self) -> Result<Option<&str>, ParseError> {
        self.root_string(DwAt::Name)
    }

    /// `DW_AT_producer` of the root DIE.
    pub fn producer(&self) -> Result<Option<&str>, ParseError> {
        self.root_string(DwAt::Producer)
    }

    /// `DW_AT_comp_dir` of the root DIE.
    pub fn comp_dir(&self) -> Result<Option<&str>, ParseError> {
        self.root_string(DwAt::CompDir)
    }

    /// `DW_AT_language` of the root DIE (a `DW_LANG_*` code).
    pub fn language(&self) -> Result<Option<u64>, ParseError> {
        Ok(self
            .root_attribute(DwAt::Language)?
            .and_then(|value| value.as_u64()))
    }

    /// `DW_AT_stmt_list`: the offset of this unit's line program in `.debug_line`.
    pub fn stmt_list(&self) -> Result<Option<u64>, ParseError> {
        Ok(self
            .root_attribute(DwAt::StmtList)?
            .and_then(|value| value.as_u64()))
    }

    /// The bytes of `.debug_line` from this unit's line program onwards.
    ///
    /// Line programs are not decoded here; the bytes are handed to a line-table reader.
    pub fn line_program_bytes(&self) -> Result<Option<&'data [u8]>, ParseError> {
        Ok(self.stmt_list()?.and_then(|offset| {
            let offset = usize::try_from(offset).ok()?;
            self.sections.debug_line.get(offset..)
        }))
    }

    fn root_attribute(&self, name: DwAt) -> Result<Option<AttributeValue<'_>>, ParseError> {
        if self.header.first_die_offset() >= self.header.end() {
            return Ok(None);
        }
        self.root_die()?.get_attribute(name)
    }

    fn root_string(&self, name: DwAt) -> Result<Option<&str>, ParseError> {
        Ok(self.root_attribute(name)?.and_then(|value| value.as_str()))
    }
}
