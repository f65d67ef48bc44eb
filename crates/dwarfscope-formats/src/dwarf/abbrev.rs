//! DWARF abbreviation table parsing (.debug_abbrev).
//!
//! The abbreviation table defines the structure of DIEs (Debug Information Entries).
//! Each abbreviation specifies a tag and a list of attribute specifications.

use std::collections::HashMap;

use super::reader::ByteReader;
use super::types::{DwAt, DwForm, DwTag};
use crate::{Endianness, ParseError};

/// An attribute specification in an abbreviation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    /// The attribute name (DW_AT_*).
    pub name: DwAt,
    /// The attribute form (DW_FORM_*).
    pub form: DwForm,
    /// Implicit constant value (for DW_FORM_implicit_const).
    pub implicit_const: Option<i64>,
}

/// An abbreviation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    /// The abbreviation code.
    pub code: u64,
    /// The tag for this abbreviation (DW_TAG_*).
    pub tag: DwTag,
    /// Whether DIEs with this abbreviation have children.
    pub has_children: bool,
    /// The attribute specifications, in stream order.
    pub attributes: Vec<AttributeSpec>,
}

/// A table of abbreviations, as found at one offset of `.debug_abbrev`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AbbreviationTable {
    offset: u64,
    entries: HashMap<u64, Abbreviation>,
}

impl AbbreviationTable {
    /// Parse the abbreviation table starting at `offset` in `.debug_abbrev`.
    ///
    /// The table ends at a zero code. A table that runs off the end of the
    /// section ends there too: complete entries are kept, the partial one is
    /// dropped. A later entry with an already-used code replaces the earlier one.
    pub fn parse(section: &[u8], offset: u64) -> Result<Self, ParseError> {
        if offset > section.len() as u64 {
            return Err(ParseError::invalid_structure(
                "abbreviation table",
                offset,
                format!("offset is past the end of .debug_abbrev ({} bytes)", section.len()),
            ));
        }

        let mut reader = ByteReader::at(section, offset, Endianness::Little);
        let mut table = AbbreviationTable {
            offset,
            entries: HashMap::new(),
        };

        loop {
            let code = reader.read_uleb128();
            if reader.has_error() {
                log::warn!("abbreviation table at {offset:#x} has no terminator");
                break;
            }
            // Code 0 marks end of abbreviation table
            if code == 0 {
                break;
            }

            let tag = DwTag::from_uleb(reader.read_uleb128());
            let has_children = reader.read_u8() == 1;

            let mut attributes = Vec::new();
            loop {
                let name = reader.read_uleb128();
                let form = reader.read_uleb128();
                if reader.has_error() || (name == 0 && form == 0) {
                    break;
                }

                let form = DwForm::from_uleb(form);
                // DWARF 5 stores the value of implicit_const in the abbreviation
                let implicit_const =
                    (form == DwForm::ImplicitConst).then(|| reader.read_sleb128());

                attributes.push(AttributeSpec {
                    name: DwAt::from_uleb(name),
                    form,
                    implicit_const,
                });
            }

            if reader.has_error() {
                log::warn!(
                    "abbreviation table at {offset:#x} truncated inside code {code}; \
                     keeping {} complete entries",
                    table.entries.len()
                );
                break;
            }

            log::trace!("abbrev {code}: {tag} with {} attributes", attributes.len());
            table.entries.insert(
                code,
                Abbreviation {
                    code,
                    tag,
                    has_children,
                    attributes,
                },
            );
        }

        Ok(table)
    }

    /// Get an abbreviation by code.
    pub fn get(&self, code: u64) -> Option<&Abbreviation> {
        self.entries.get(&code)
    }

    /// Offset of this table in `.debug_abbrev`.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the abbreviations in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Abbreviation> {
        self.entries.values()
    }
}
