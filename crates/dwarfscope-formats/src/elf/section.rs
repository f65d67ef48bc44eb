//! ELF section header parsing.

use super::header::ElfClass;
use super::read_uint;
use crate::{Endianness, ParseError, Section};

// Section types
pub const SHT_NULL: u32 = 0;
pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_NOBITS: u32 = 8;

// Section flags
pub const SHF_ALLOC: u64 = 0x2;

/// A parsed section header.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    /// Section name (index into string table).
    pub sh_name: u32,
    /// Section type.
    pub sh_type: u32,
    /// Section flags.
    pub sh_flags: u64,
    /// Virtual address in memory.
    pub sh_addr: u64,
    /// Offset in file.
    pub sh_offset: u64,
    /// Size in bytes.
    pub sh_size: u64,
    /// Resolved name, filled in once the name table is known.
    name: String,
}

impl SectionHeader {
    /// Size of one section header entry for the given class.
    pub fn entry_size(class: ElfClass) -> usize {
        match class {
            ElfClass::Elf32 => 40,
            ElfClass::Elf64 => 64,
        }
    }

    /// Parse a section header from bytes.
    pub fn parse(data: &[u8], class: ElfClass, endianness: Endianness) -> Result<Self, ParseError> {
        let size = Self::entry_size(class);
        if data.len() < size {
            return Err(ParseError::too_short(size, data.len()));
        }

        let word = class.word_size();
        let u32_at = |offset: usize| read_uint(data, offset, 4, endianness) as u32;
        let word_at = |offset: usize| read_uint(data, offset, word, endianness);

        // sh_name and sh_type are 4 bytes in both classes; the following
        // flags/addr/offset/size fields are word sized.
        Ok(Self {
            sh_name: u32_at(0),
            sh_type: u32_at(4),
            sh_flags: word_at(8),
            sh_addr: word_at(8 + word),
            sh_offset: word_at(8 + 2 * word),
            sh_size: word_at(8 + 3 * word),
            name: String::new(),
        })
    }

    /// Returns the section type as a string.
    pub fn type_name(&self) -> &'static str {
        match self.sh_type {
            SHT_NULL => "NULL",
            SHT_PROGBITS => "PROGBITS",
            SHT_SYMTAB => "SYMTAB",
            SHT_STRTAB => "STRTAB",
            SHT_NOBITS => "NOBITS",
            _ => "OTHER",
        }
    }

    /// Returns true if the section occupies bytes in the file.
    pub fn has_file_data(&self) -> bool {
        self.sh_type != SHT_NOBITS && self.sh_size > 0
    }

    pub(super) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

impl Section for SectionHeader {
    fn name(&self) -> &str {
        &self.name
    }

    fn virtual_address(&self) -> u64 {
        self.sh_addr
    }

    fn size(&self) -> u64 {
        self.sh_size
    }

    fn is_allocated(&self) -> bool {
        self.sh_flags & SHF_ALLOC != 0
    }
}
