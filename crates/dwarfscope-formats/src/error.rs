//! Error types for binary format and debug-info parsing.

use thiserror::Error;

/// Error type for binary format and DWARF parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Invalid magic number at start of file.
    #[error("invalid magic number: expected {expected}, got {actual:02x?}")]
    InvalidMagic {
        expected: &'static str,
        actual: Vec<u8>,
    },

    /// File is too short to contain required data.
    #[error("file too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Truncated data while parsing.
    #[error("truncated data: expected {expected} bytes, got {actual} while parsing {context}")]
    TruncatedData {
        expected: usize,
        actual: usize,
        context: &'static str,
    },

    /// Invalid value encountered during parsing.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),

    /// Unsupported format version.
    #[error("unsupported {format} version: {version}")]
    UnsupportedVersion { format: &'static str, version: u32 },

    /// Address size other than the one this reader targets.
    #[error("unsupported address size {size} in unit at {unit_offset:#x}")]
    UnsupportedAddressSize { size: u8, unit_offset: u64 },

    /// Attribute form code with no known encoding width.
    #[error("unknown attribute form {form:#x} at offset {offset:#x}")]
    UnknownForm { form: u64, offset: u64 },

    /// Range-list entry kind with no known encoding.
    #[error("unknown range list entry kind {kind:#x} at offset {offset:#x}")]
    UnknownRangeListEntry { kind: u8, offset: u64 },

    /// A DIE refers to an abbreviation code its table does not define.
    #[error("abbreviation code {code} at DIE offset {offset:#x} is not in the unit's table")]
    UnknownAbbreviation { code: u64, offset: u64 },

    /// An index form was used but the unit has no table for it.
    #[error("unit at {unit_offset:#x} has no {table} table")]
    MissingIndexTable {
        table: &'static str,
        unit_offset: u64,
    },

    /// Invalid section or segment.
    #[error("invalid {kind} at offset {offset:#x}: {reason}")]
    InvalidStructure {
        kind: &'static str,
        offset: u64,
        reason: String,
    },

    /// Invalid string table index or offset.
    #[error("invalid string table index: {index} (table size: {size})")]
    InvalidStringIndex { index: usize, size: usize },

    /// Integer overflow during parsing.
    #[error("integer overflow while parsing {context}")]
    Overflow { context: &'static str },
}

impl ParseError {
    /// Creates a new InvalidMagic error.
    pub fn invalid_magic(expected: &'static str, actual: &[u8]) -> Self {
        Self::InvalidMagic {
            expected,
            actual: actual.to_vec(),
        }
    }

    /// Creates a new TooShort error.
    pub fn too_short(expected: usize, actual: usize) -> Self {
        Self::TooShort { expected, actual }
    }

    /// Creates a new InvalidStructure error.
    pub fn invalid_structure(kind: &'static str, offset: u64, reason: impl Into<String>) -> Self {
        Self::InvalidStructure {
            kind,
            offset,
            reason: reason.into(),
        }
    }
}
