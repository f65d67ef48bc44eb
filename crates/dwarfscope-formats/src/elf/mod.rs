//! ELF (Executable and Linkable Format) section loader.
//!
//! Parses just enough of an ELF image (header, section headers and the
//! section name table) to hand `.debug_*` section contents to the DWARF
//! reader. Both 32-bit and 64-bit classes and both byte orders are accepted.

mod header;
mod section;

pub use header::{ElfClass, ElfHeader, ELF_MAGIC};
pub use section::SectionHeader;

use crate::{Endianness, ParseError, Section, SectionProvider};

/// A parsed ELF binary.
#[derive(Debug)]
pub struct Elf<'a> {
    /// Raw bytes of the file.
    data: &'a [u8],
    /// Parsed ELF header.
    pub header: ElfHeader,
    /// Section headers, with names resolved.
    pub sections: Vec<SectionHeader>,
}

impl<'a> Elf<'a> {
    /// Parse an ELF file from raw bytes.
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        let header = ElfHeader::parse(data)?;
        let mut sections = Self::parse_section_headers(data, &header)?;

        // Resolve names through the section name string table
        let shstrndx = header.e_shstrndx as usize;
        if shstrndx > 0 && shstrndx < sections.len() {
            let names = slice_of(data, &sections[shstrndx]).unwrap_or(&[]);
            for section in &mut sections {
                if let Some(name) = null_terminated_str(names, section.sh_name as usize) {
                    section.set_name(name);
                }
            }
        }

        log::debug!(
            "parsed {:?} ELF with {} sections",
            header.class,
            sections.len()
        );

        Ok(Self {
            data,
            header,
            sections,
        })
    }

    fn parse_section_headers(
        data: &[u8],
        header: &ElfHeader,
    ) -> Result<Vec<SectionHeader>, ParseError> {
        let mut sections = Vec::with_capacity(header.e_shnum as usize);
        let entry_size = header.e_shentsize as usize;
        if header.e_shnum > 0 && entry_size < SectionHeader::entry_size(header.class) {
            return Err(ParseError::invalid_structure(
                "ELF header",
                header.e_shoff,
                format!("section header entry size {entry_size} is too small"),
            ));
        }

        let mut offset = header.e_shoff as usize;
        for _ in 0..header.e_shnum {
            let end = offset
                .checked_add(entry_size)
                .ok_or(ParseError::Overflow {
                    context: "section header table",
                })?;
            if end > data.len() {
                return Err(ParseError::too_short(end, data.len()));
            }

            let section = SectionHeader::parse(&data[offset..], header.class, header.endianness)?;
            sections.push(section);
            offset = end;
        }

        Ok(sections)
    }

    /// Returns the raw data of the ELF file.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the section with the given name.
    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader> {
        self.sections.iter().find(|s| s.name() == name)
    }

    /// Returns the file contents of a section.
    ///
    /// Sections without file data (`SHT_NOBITS`) and sections whose
    /// extent lies outside the file yield `None`.
    pub fn section_data(&self, section: &SectionHeader) -> Option<&'a [u8]> {
        if !section.has_file_data() {
            return None;
        }
        slice_of(self.data, section)
    }
}

impl SectionProvider for Elf<'_> {
    fn section_bytes(&self, name: &str) -> Option<&[u8]> {
        self.section_by_name(name)
            .and_then(|section| self.section_data(section))
    }

    fn endianness(&self) -> Endianness {
        self.header.endianness
    }
}

/// Reads an unsigned integer of `width` bytes (1, 2, 4 or 8).
///
/// Callers bounds-check `data` first.
pub(crate) fn read_uint(data: &[u8], offset: usize, width: usize, endianness: Endianness) -> u64 {
    let bytes = &data[offset..offset + width];
    match endianness {
        Endianness::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
        Endianness::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)),
    }
}

fn slice_of<'a>(data: &'a [u8], section: &SectionHeader) -> Option<&'a [u8]> {
    let start = usize::try_from(section.sh_offset).ok()?;
    let len = usize::try_from(section.sh_size).ok()?;
    data.get(start..start.checked_add(len)?)
}

fn null_terminated_str(data: &[u8], offset: usize) -> Option<&str> {
    let remaining = data.get(offset..)?;
    let end = remaining.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&remaining[..end]).ok()
}
