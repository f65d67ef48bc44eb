#![no_main]

use libfuzzer_sys::fuzz_target;
use dwarfscope_formats::dwarf::{DwarfConfig, DwarfInfo, DwarfSections};
use dwarfscope_formats::{Elf, Section, SectionProvider};

fuzz_target!(|data: &[u8]| {
    // Parse errors are expected for malformed input; panics are not
    let Ok(elf) = Elf::parse(data) else {
        return;
    };

    for section in &elf.sections {
        let _ = section.name().len();
        let _ = section.size();
        let _ = elf.section_data(section);
    }
    let _ = elf.section_bytes(".debug_info");

    let sections = DwarfSections::load(&elf);
    let _ = sections.iter().count();
    if let Ok(dwarf) = DwarfInfo::with_config(sections, DwarfConfig::default()) {
        let _ = dwarf.get_die_at_address(elf.header.e_entry);
    }
});
