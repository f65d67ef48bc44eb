#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use dwarfscope_formats::dwarf::{DwarfConfig, DwarfInfo, DwarfSections};
use dwarfscope_formats::Endianness;

/// Raw section contents plus the queries to run against them.
#[derive(Debug, Arbitrary)]
struct FuzzedDwarf {
    big_endian: bool,
    eager_index: bool,
    follow_sibling_hints: bool,

    debug_info: Vec<u8>,
    debug_abbrev: Vec<u8>,
    debug_str: Vec<u8>,
    debug_ranges: Vec<u8>,
    debug_rnglists: Vec<u8>,
    debug_str_offsets: Vec<u8>,
    debug_addr: Vec<u8>,

    addresses: Vec<u32>,
    offsets: Vec<u16>,
}

fuzz_target!(|input: FuzzedDwarf| {
    let sections = DwarfSections {
        debug_info: &input.debug_info,
        debug_abbrev: &input.debug_abbrev,
        debug_str: &input.debug_str,
        debug_ranges: &input.debug_ranges,
        debug_rnglists: &input.debug_rnglists,
        debug_str_offsets: &input.debug_str_offsets,
        debug_addr: &input.debug_addr,
        endianness: if input.big_endian {
            Endianness::Big
        } else {
            Endianness::Little
        },
        ..Default::default()
    };
    let config = DwarfConfig::default()
        .with_eager_index(input.eager_index)
        .with_sibling_hints(input.follow_sibling_hints);

    let Ok(dwarf) = DwarfInfo::with_config(sections, config) else {
        return;
    };

    for unit in dwarf.compilation_units() {
        let _ = unit.name();
        let _ = unit.line_program_bytes();
        if let Ok(root) = unit.root_die() {
            let _ = root.for_each_child(|child| {
                let _ = child.attributes();
                let _ = child.next_sibling_offset();
                Ok(())
            });
        }
    }
    for address in input.addresses {
        let _ = dwarf.get_die_at_address(u64::from(address));
    }
    for offset in input.offsets {
        let _ = dwarf.die_at_offset(u64::from(offset));
        let _ = dwarf.get_cached_die_at_offset(u64::from(offset));
    }
});
