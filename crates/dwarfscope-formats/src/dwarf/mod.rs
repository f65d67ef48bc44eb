//! DWARF debug information parsing.
//!
//! This module reads DWARF 4 and 5 debug information with 4-byte addresses
//! and exposes it as a navigable tree of Debugging Information Entries
//! (DIEs) with an index from addresses to the DIEs that cover them.
//!
//! # Structure
//!
//! DWARF data is organized into several sections:
//! - `.debug_info` - Compilation units and their DIEs
//! - `.debug_abbrev` - Abbreviation tables defining DIE structure
//! - `.debug_str` / `.debug_line_str` - String tables
//! - `.debug_str_offsets` / `.debug_addr` - DWARF 5 index tables
//! - `.debug_ranges` / `.debug_rnglists` - Non-contiguous address ranges
//! - `.debug_line` - Line number programs (handed out as bytes, not decoded)
//!
//! Section bytes are borrowed, never copied. Every [`Die`] and
//! [`AttributeValue`] borrows from the [`DwarfInfo`] it came from.
//!
//! # Example
//!
//! ```ignore
//! use dwarfscope_formats::dwarf::{DwarfConfig, DwarfInfo, DwAt};
//! use dwarfscope_formats::Elf;
//!
//! let elf = Elf::parse(&bytes)?;
//! let dwarf = DwarfInfo::from_provider(&elf, DwarfConfig::default())?;
//!
//! if let Some(die) = dwarf.get_die_at_address(0x401000)? {
//!     println!("{:?} {:?}", die.tag(), die.name()?);
//!     die.for_each_child(|child| {
//!         println!("  {:?}", child.get_attribute(DwAt::Name)?);
//!         Ok(())
//!     })?;
//! }
//! ```

mod abbrev;
pub mod addr_table;
mod attribute;
mod config;
mod die;
mod info;
mod leb128;
mod ranges;
mod reader;
pub mod rnglists;
pub mod str_offsets;
mod types;
mod unit;

pub use abbrev::{Abbreviation, AbbreviationTable, AttributeSpec};
pub use addr_table::AddressTable;
pub use attribute::{Attribute, AttributeValue};
pub use config::DwarfConfig;
pub use die::Die;
pub use info::DwarfInfo;
pub use leb128::{decode_sleb128, decode_uleb128};
pub use ranges::{AddressRange, DebugRangesList, RangeList};
pub use reader::ByteReader;
pub use rnglists::{DwRle, RngList};
pub use str_offsets::StringOffsetsTable;
pub use types::{DwAt, DwForm, DwTag, DwUt};
pub use unit::{CompilationUnit, CompilationUnitHeader, SUPPORTED_ADDRESS_SIZE};

use crate::{Endianness, SectionProvider};

/// Names of the sections the reader looks for.
pub const SECTION_NAMES: [&str; 9] = [
    ".debug_info",
    ".debug_abbrev",
    ".debug_str",
    ".debug_line",
    ".debug_line_str",
    ".debug_ranges",
    ".debug_rnglists",
    ".debug_str_offsets",
    ".debug_addr",
];

/// The raw debug sections of one binary.
///
/// A section the binary does not have is an empty slice; lookups into it
/// fail like lookups past its end.
#[derive(Debug, Clone, Copy, Default)]
pub struct DwarfSections<'data> {
    pub debug_info: &'data [u8],
    pub debug_abbrev: &'data [u8],
    pub debug_str: &'data [u8],
    pub debug_line: &'data [u8],
    pub debug_line_str: &'data [u8],
    pub debug_ranges: &'data [u8],
    pub debug_rnglists: &'data [u8],
    pub debug_str_offsets: &'data [u8],
    pub debug_addr: &'data [u8],
    /// Byte order of multi-byte fields.
    pub endianness: Endianness,
}

impl<'data> DwarfSections<'data> {
    /// Collect the debug sections from a binary.
    pub fn load<P>(provider: &'data P) -> Self
    where
        P: SectionProvider + ?Sized,
    {
        let section = |name: &str| provider.section_bytes(name).unwrap_or(&[]);
        let sections = Self {
            debug_info: section(".debug_info"),
            debug_abbrev: section(".debug_abbrev"),
            debug_str: section(".debug_str"),
            debug_line: section(".debug_line"),
            debug_line_str: section(".debug_line_str"),
            debug_ranges: section(".debug_ranges"),
            debug_rnglists: section(".debug_rnglists"),
            debug_str_offsets: section(".debug_str_offsets"),
            debug_addr: section(".debug_addr"),
            endianness: provider.endianness(),
        };
        log::debug!(
            "loaded debug sections: {}",
            sections
                .iter()
                .filter(|(_, bytes)| !bytes.is_empty())
                .map(|(name, bytes)| format!("{name}={}", bytes.len()))
                .collect::<Vec<_>>()
                .join(" ")
        );
        sections
    }

    /// Iterate over `(name, bytes)` for every section, present or not.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'data [u8])> {
        let bytes = [
            self.debug_info,
            self.debug_abbrev,
            self.debug_str,
            self.debug_line,
            self.debug_line_str,
            self.debug_ranges,
            self.debug_rnglists,
            self.debug_str_offsets,
            self.debug_addr,
        ];
        SECTION_NAMES.into_iter().zip(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeBinary(HashMap<&'static str, Vec<u8>>);

    impl SectionProvider for FakeBinary {
        fn section_bytes(&self, name: &str) -> Option<&[u8]> {
            self.0.get(name).map(Vec::as_slice)
        }

        fn endianness(&self) -> Endianness {
            Endianness::Big
        }
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let binary = FakeBinary(HashMap::from([(".debug_str", b"main\0".to_vec())]));
        let sections = DwarfSections::load(&binary);
        assert_eq!(sections.debug_str, b"main\0");
        assert!(sections.debug_info.is_empty());
        assert!(sections.debug_rnglists.is_empty());
        assert_eq!(sections.endianness, Endianness::Big);
    }

    #[test]
    fn test_iter_names_match_fields() {
        let sections = DwarfSections {
            debug_addr: &[1, 2, 3],
            ..Default::default()
        };
        let (name, bytes) = sections.iter().last().unwrap();
        assert_eq!(name, ".debug_addr");
        assert_eq!(bytes, &[1, 2, 3]);
        assert_eq!(sections.iter().count(), SECTION_NAMES.len());
    }

    #[test]
    fn test_empty_sections_have_no_units() {
        let dwarf = DwarfInfo::new(DwarfSections::default()).unwrap();
        assert!(dwarf.compilation_units().is_empty());
        assert!(dwarf.get_die_at_address(0x1000).unwrap().is_none());
        assert_eq!(dwarf.index_len().unwrap(), 0);
    }
}
