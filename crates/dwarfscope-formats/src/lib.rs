//! # dwarfscope-formats
//!
//! Debug-information parsers for dwarfscope. This crate provides:
//! - A minimal ELF loader that hands out section contents
//! - A DWARF 4/5 reader: compilation units, DIE navigation, attribute
//!   decoding, range lists and an address-to-DIE index
//!
//! Everything is read-only and borrows from the caller's file bytes.

pub mod dwarf;
pub mod elf;
pub mod error;
pub mod traits;

pub use elf::{Elf, ElfClass};
pub use error::ParseError;
pub use traits::{Endianness, Section, SectionProvider};
