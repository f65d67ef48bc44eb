//! ELF header parsing.

use super::read_uint;
use crate::{Endianness, ParseError};

/// ELF magic bytes.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// ELF class (32-bit or 64-bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfClass {
    Elf32,
    Elf64,
}

impl ElfClass {
    /// Width of address and offset fields for this class.
    pub fn word_size(self) -> usize {
        match self {
            Self::Elf32 => 4,
            Self::Elf64 => 8,
        }
    }
}

/// Parsed ELF header.
///
/// Only the fields the section loader needs are kept.
#[derive(Debug, Clone)]
pub struct ElfHeader {
    /// ELF class (32 or 64 bit).
    pub class: ElfClass,
    /// Endianness.
    pub endianness: Endianness,
    /// Raw `e_type` value (`ET_REL`, `ET_EXEC`, ...).
    pub e_type: u16,
    /// Raw `e_machine` value.
    pub machine: u16,
    /// Entry point virtual address.
    pub e_entry: u64,
    /// Section header table file offset.
    pub e_shoff: u64,
    /// Section header table entry size.
    pub e_shentsize: u16,
    /// Section header table entry count.
    pub e_shnum: u16,
    /// Section name string table index.
    pub e_shstrndx: u16,
}

impl ElfHeader {
    /// Size of the ELF identification bytes.
    const EI_NIDENT: usize = 16;

    /// Parse an ELF header from bytes.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < Self::EI_NIDENT {
            return Err(ParseError::too_short(Self::EI_NIDENT, data.len()));
        }

        if data[0..4] != ELF_MAGIC {
            return Err(ParseError::invalid_magic("ELF", &data[0..4]));
        }

        let class = match data[4] {
            1 => ElfClass::Elf32,
            2 => ElfClass::Elf64,
            other => {
                return Err(ParseError::invalid_structure(
                    "ELF header",
                    4,
                    format!("invalid ELF class: {other}"),
                ))
            }
        };

        let endianness = match data[5] {
            1 => Endianness::Little,
            2 => Endianness::Big,
            other => {
                return Err(ParseError::invalid_structure(
                    "ELF header",
                    5,
                    format!("invalid endianness: {other}"),
                ))
            }
        };

        // Field offsets differ only in where the word-sized fields push the
        // trailing u16 block.
        let (header_size, shoff_at, tail_at) = match class {
            ElfClass::Elf32 => (52, 32, 40),
            ElfClass::Elf64 => (64, 40, 52),
        };
        if data.len() < header_size {
            return Err(ParseError::too_short(header_size, data.len()));
        }

        let word = class.word_size();
        let half = |offset: usize| read_uint(data, offset, 2, endianness) as u16;

        Ok(Self {
            class,
            endianness,
            e_type: half(16),
            machine: half(18),
            e_entry: read_uint(data, 24, word, endianness),
            e_shoff: read_uint(data, shoff_at, word, endianness),
            e_shentsize: half(tail_at + 6),
            e_shnum: half(tail_at + 8),
            e_shstrndx: half(tail_at + 10),
        })
    }
}
