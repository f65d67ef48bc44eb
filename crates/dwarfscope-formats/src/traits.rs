//! Traits for binary format abstraction.

/// Byte order of multi-byte fields in a binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endianness {
    #[default]
    Little,
    Big,
}

/// Supplies named section contents to the debug-info reader.
///
/// Implemented by the ELF loader; anything else that can hand out
/// `.debug_*` byte spans (a core dump, a split-DWARF package) can
/// implement it too.
pub trait SectionProvider {
    /// Returns the bytes of the named section, if the binary has it.
    fn section_bytes(&self, name: &str) -> Option<&[u8]>;

    /// Returns the byte order used by the section contents.
    fn endianness(&self) -> Endianness {
        Endianness::Little
    }
}

/// A section in a binary.
pub trait Section {
    /// Section name.
    fn name(&self) -> &str;

    /// Virtual address where this section is loaded.
    fn virtual_address(&self) -> u64;

    /// Size in bytes.
    fn size(&self) -> u64;

    /// Returns true if this section is loaded into memory.
    fn is_allocated(&self) -> bool;
}
