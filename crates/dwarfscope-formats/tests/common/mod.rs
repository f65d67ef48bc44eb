//! Helpers for assembling synthetic DWARF sections and ELF images.

#![allow(dead_code)]

use dwarfscope_formats::dwarf::{DwAt, DwForm, DwTag, DwarfSections};
use dwarfscope_formats::Endianness;

pub fn uleb(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

pub fn sleb(mut value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

// =============================================================================
// .debug_abbrev
// =============================================================================

/// Writes abbreviation tables; several tables can share one section.
#[derive(Default)]
pub struct AbbrevWriter {
    bytes: Vec<u8>,
}

impl AbbrevWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset where the next table or entry starts.
    pub fn offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn entry(
        &mut self,
        code: u64,
        tag: DwTag,
        has_children: bool,
        attributes: &[(DwAt, DwForm)],
    ) -> &mut Self {
        let specs: Vec<_> = attributes
            .iter()
            .map(|&(name, form)| (name, form, None))
            .collect();
        self.entry_with_consts(code, tag, has_children, &specs)
    }

    pub fn entry_with_consts(
        &mut self,
        code: u64,
        tag: DwTag,
        has_children: bool,
        attributes: &[(DwAt, DwForm, Option<i64>)],
    ) -> &mut Self {
        self.bytes.extend(uleb(code));
        self.bytes.extend(uleb(u64::from(tag.value())));
        self.bytes.push(u8::from(has_children));
        for &(name, form, implicit_const) in attributes {
            self.bytes.extend(uleb(u64::from(name.value())));
            self.bytes.extend(uleb(u64::from(form.value())));
            if let Some(value) = implicit_const {
                self.bytes.extend(sleb(value));
            }
        }
        self.bytes.extend([0, 0]);
        self
    }

    /// Terminate the current table.
    pub fn end_table(&mut self) -> &mut Self {
        self.bytes.push(0);
        self
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

// =============================================================================
// .debug_info
// =============================================================================

/// Writes one unit: DIE bytes are appended, the header is added by `finish`.
pub struct UnitWriter {
    version: u16,
    body: Vec<u8>,
}

impl UnitWriter {
    pub fn v4() -> Self {
        Self {
            version: 4,
            body: Vec::new(),
        }
    }

    pub fn v5() -> Self {
        Self {
            version: 5,
            body: Vec::new(),
        }
    }

    fn header_size(&self) -> u32 {
        if self.version >= 5 {
            12
        } else {
            11
        }
    }

    /// Unit-relative offset of the next byte written.
    pub fn position(&self) -> u32 {
        self.header_size() + self.body.len() as u32
    }

    pub fn code(&mut self, code: u64) -> &mut Self {
        self.body.extend(uleb(code));
        self
    }

    /// The null entry that ends a sibling chain.
    pub fn null(&mut self) -> &mut Self {
        self.code(0)
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.body.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.body.extend(value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.body.extend(value.to_le_bytes());
        self
    }

    pub fn uleb(&mut self, value: u64) -> &mut Self {
        self.body.extend(uleb(value));
        self
    }

    pub fn cstr(&mut self, value: &str) -> &mut Self {
        self.body.extend(value.as_bytes());
        self.body.push(0);
        self
    }

    /// Reserve four bytes to be filled in later with `patch_u32`.
    pub fn placeholder_u32(&mut self) -> usize {
        let at = self.body.len();
        self.body.extend([0; 4]);
        at
    }

    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.body[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Prefix the header and return the unit's bytes.
    pub fn finish(&self, abbrev_offset: u32) -> Vec<u8> {
        let unit_length = self.header_size() - 4 + self.body.len() as u32;
        let mut unit = Vec::new();
        unit.extend(unit_length.to_le_bytes());
        unit.extend(self.version.to_le_bytes());
        if self.version >= 5 {
            unit.push(0x01); // DW_UT_compile
            unit.push(4);
            unit.extend(abbrev_offset.to_le_bytes());
        } else {
            unit.extend(abbrev_offset.to_le_bytes());
            unit.push(4);
        }
        unit.extend(&self.body);
        unit
    }
}

// =============================================================================
// Section bundles
// =============================================================================

/// Owned section contents for building a `DwarfSections`.
#[derive(Default, Clone)]
pub struct OwnedSections {
    pub info: Vec<u8>,
    pub abbrev: Vec<u8>,
    pub str: Vec<u8>,
    pub line: Vec<u8>,
    pub line_str: Vec<u8>,
    pub ranges: Vec<u8>,
    pub rnglists: Vec<u8>,
    pub str_offsets: Vec<u8>,
    pub addr: Vec<u8>,
}

impl OwnedSections {
    pub fn sections(&self) -> DwarfSections<'_> {
        DwarfSections {
            debug_info: &self.info,
            debug_abbrev: &self.abbrev,
            debug_str: &self.str,
            debug_line: &self.line,
            debug_line_str: &self.line_str,
            debug_ranges: &self.ranges,
            debug_rnglists: &self.rnglists,
            debug_str_offsets: &self.str_offsets,
            debug_addr: &self.addr,
            endianness: Endianness::Little,
        }
    }

    /// Named non-empty sections, ready for `build_elf32`.
    pub fn named(&self) -> Vec<(&'static str, &[u8])> {
        [
            (".debug_info", &self.info),
            (".debug_abbrev", &self.abbrev),
            (".debug_str", &self.str),
            (".debug_line", &self.line),
            (".debug_line_str", &self.line_str),
            (".debug_ranges", &self.ranges),
            (".debug_rnglists", &self.rnglists),
            (".debug_str_offsets", &self.str_offsets),
            (".debug_addr", &self.addr),
        ]
        .into_iter()
        .filter(|(_, bytes)| !bytes.is_empty())
        .map(|(name, bytes)| (name, bytes.as_slice()))
        .collect()
    }
}

/// A `.debug_str` section plus the offset of each string added.
#[derive(Default)]
pub struct StringTable {
    bytes: Vec<u8>,
}

impl StringTable {
    pub fn add(&mut self, value: &str) -> u32 {
        let offset = self.bytes.len() as u32;
        self.bytes.extend(value.as_bytes());
        self.bytes.push(0);
        offset
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

// =============================================================================
// ELF
// =============================================================================

/// Build a little-endian ELF32 relocatable image holding the given sections.
pub fn build_elf32(sections: &[(&str, &[u8])]) -> Vec<u8> {
    let mut shstrtab = vec![0u8];
    let mut name_offsets = Vec::new();
    for (name, _) in sections {
        name_offsets.push(shstrtab.len() as u32);
        shstrtab.extend_from_slice(name.as_bytes());
        shstrtab.push(0);
    }
    let shstrtab_name = shstrtab.len() as u32;
    shstrtab.extend_from_slice(b".shstrtab\0");

    let mut image = vec![0u8; 52];
    let mut placed = Vec::new();
    for (_, bytes) in sections {
        placed.push((image.len() as u32, bytes.len() as u32));
        image.extend_from_slice(bytes);
    }
    let shstrtab_offset = image.len() as u32;
    image.extend_from_slice(&shstrtab);
    while image.len() % 4 != 0 {
        image.push(0);
    }

    let shoff = image.len() as u32;
    let shnum = sections.len() as u16 + 2;
    image.extend_from_slice(&[0u8; 40]); // SHT_NULL
    let mut push_header = |name: u32, kind: u32, offset: u32, size: u32| {
        let mut entry = [0u8; 40];
        entry[0..4].copy_from_slice(&name.to_le_bytes());
        entry[4..8].copy_from_slice(&kind.to_le_bytes());
        entry[16..20].copy_from_slice(&offset.to_le_bytes());
        entry[20..24].copy_from_slice(&size.to_le_bytes());
        image.extend_from_slice(&entry);
    };
    for (i, (offset, size)) in placed.iter().enumerate() {
        push_header(name_offsets[i], 1, *offset, *size); // SHT_PROGBITS
    }
    push_header(shstrtab_name, 3, shstrtab_offset, shstrtab.len() as u32); // SHT_STRTAB

    image[0..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
    image[4] = 1; // ELFCLASS32
    image[5] = 1; // ELFDATA2LSB
    image[6] = 1; // EV_CURRENT
    image[16..18].copy_from_slice(&1u16.to_le_bytes()); // ET_REL
    image[18..20].copy_from_slice(&3u16.to_le_bytes()); // EM_386
    image[20..24].copy_from_slice(&1u32.to_le_bytes());
    image[32..36].copy_from_slice(&shoff.to_le_bytes());
    image[40..42].copy_from_slice(&52u16.to_le_bytes());
    image[46..48].copy_from_slice(&40u16.to_le_bytes());
    image[48..50].copy_from_slice(&shnum.to_le_bytes());
    image[50..52].copy_from_slice(&(shnum - 1).to_le_bytes());
    image
}

// =============================================================================
// Canned programs
// =============================================================================

/// A DWARF 4 program with one unit:
///
/// ```text
/// compile_unit "prog.c"   [0x400, 0x500)
///   subprogram "main"     [0x400, 0x420)
///   subprogram "helper"   [0x420, 0x440)
///     variable "count"
/// ```
pub fn simple_program() -> OwnedSections {
    let mut strings = StringTable::default();
    let prog = strings.add("prog.c");
    let main = strings.add("main");
    let helper = strings.add("helper");
    let producer = strings.add("synthetic cc 1.0");

    let mut abbrev = AbbrevWriter::new();
    abbrev
        .entry(
            1,
            DwTag::CompileUnit,
            true,
            &[
                (DwAt::Producer, DwForm::Strp),
                (DwAt::Language, DwForm::Data1),
                (DwAt::Name, DwForm::Strp),
                (DwAt::LowPc, DwForm::Addr),
                (DwAt::HighPc, DwForm::Data4),
                (DwAt::StmtList, DwForm::SecOffset),
            ],
        )
        .entry(
            2,
            DwTag::Subprogram,
            false,
            &[
                (DwAt::Name, DwForm::Strp),
                (DwAt::LowPc, DwForm::Addr),
                (DwAt::HighPc, DwForm::Data4),
            ],
        )
        .entry(
            3,
            DwTag::Subprogram,
            true,
            &[
                (DwAt::Name, DwForm::Strp),
                (DwAt::LowPc, DwForm::Addr),
                (DwAt::HighPc, DwForm::Data4),
            ],
        )
        .entry(4, DwTag::Variable, false, &[(DwAt::Name, DwForm::String)])
        .end_table();

    let mut unit = UnitWriter::v4();
    unit.code(1)
        .u32(producer)
        .u8(0x0c) // DW_LANG_C99
        .u32(prog)
        .u32(0x400)
        .u32(0x100)
        .u32(0);
    unit.code(2).u32(main).u32(0x400).u32(0x20);
    unit.code(3).u32(helper).u32(0x420).u32(0x20);
    unit.code(4).cstr("count");
    unit.null(); // end of helper's children
    unit.null(); // end of the unit's children

    OwnedSections {
        info: unit.finish(0),
        abbrev: abbrev.bytes(),
        str: strings.bytes(),
        line: vec![0xAA; 16],
        ..Default::default()
    }
}
