//! The top-level DWARF reader: all units of a binary and the address index.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

use super::abbrev::AbbreviationTable;
use super::config::DwarfConfig;
use super::die::Die;
use super::ranges::AddressRange;
use super::unit::{CompilationUnit, CompilationUnitHeader};
use super::DwarfSections;
use crate::{ParseError, SectionProvider};

/// Where to find a DIE again: the unit it lives in and its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DieLocation {
    unit: usize,
    offset: u64,
    parent_offset: Option<u64>,
}

/// DIEs with address information, built once on first use.
#[derive(Debug, Default)]
struct DieIndex {
    /// Sorted by range start; entries with equal starts stay in tree order.
    by_address: Vec<(AddressRange, DieLocation)>,
    by_offset: BTreeMap<u64, DieLocation>,
}

/// Parsed DWARF debug information for one binary.
///
/// Unit headers are read when the reader is created. The address index is
/// built the first time it is needed (or during construction with
/// [`DwarfConfig::eager_index`]). Index construction either completes or
/// leaves no index behind, so a failed build is retried by the next query.
#[derive(Debug)]
pub struct DwarfInfo<'data> {
    sections: DwarfSections<'data>,
    config: DwarfConfig,
    units: Vec<CompilationUnit<'data>>,
    index: OnceLock<DieIndex>,
}

impl<'data> DwarfInfo<'data> {
    /// Parse all unit headers with the default configuration.
    pub fn new(sections: DwarfSections<'data>) -> Result<Self, ParseError> {
        Self::with_config(sections, DwarfConfig::default())
    }

    /// Load the debug sections from a binary and parse them.
    pub fn from_provider<P>(provider: &'data P, config: DwarfConfig) -> Result<Self, ParseError>
    where
        P: SectionProvider + ?Sized,
    {
        Self::with_config(DwarfSections::load(provider), config)
    }

    /// Parse all unit headers.
    ///
    /// Fails on the first unit that cannot be read: an unsupported version or
    /// address size, a unit running past the section, or a root DIE that
    /// does not decode.
    pub fn with_config(
        sections: DwarfSections<'data>,
        config: DwarfConfig,
    ) -> Result<Self, ParseError> {
        let mut units = Vec::new();
        let mut tables: HashMap<u64, Arc<AbbreviationTable>> = HashMap::new();
        let mut offset = 0u64;

        while offset < sections.debug_info.len() as u64 {
            let header =
                CompilationUnitHeader::parse(sections.debug_info, offset, sections.endianness)?;

            // Units that share an abbreviation offset share the parsed table
            let abbreviations = match tables.entry(header.debug_abbrev_offset) {
                Entry::Occupied(entry) => Arc::clone(entry.get()),
                Entry::Vacant(entry) => {
                    let table = AbbreviationTable::parse(
                        sections.debug_abbrev,
                        header.debug_abbrev_offset,
                    )?;
                    Arc::clone(entry.insert(Arc::new(table)))
                }
            };

            log::debug!(
                "unit {} at {:#x}: DWARF {} {}, {} bytes, abbrev {:#x}",
                units.len(),
                header.offset,
                header.version,
                header.unit_type,
                header.size(),
                header.debug_abbrev_offset
            );

            offset = header.end();
            let unit = CompilationUnit::new(
                units.len(),
                header,
                abbreviations,
                sections,
                config.follow_sibling_hints,
            )?;
            units.push(unit);
        }

        let info = Self {
            sections,
            config,
            units,
            index: OnceLock::new(),
        };
        if config.eager_index {
            info.index()?;
        }
        Ok(info)
    }

    pub fn sections(&self) -> &DwarfSections<'data> {
        &self.sections
    }

    pub fn config(&self) -> &DwarfConfig {
        &self.config
    }

    /// All units, in `.debug_info` order.
    pub fn compilation_units(&self) -> &[CompilationUnit<'data>] {
        &self.units
    }

    /// Call `f` for each unit in `.debug_info` order, stopping at the first error.
    pub fn for_each_compilation_unit<F>(&self, mut f: F) -> Result<(), ParseError>
    where
        F: FnMut(&CompilationUnit<'data>) -> Result<(), ParseError>,
    {
        self.units.iter().try_for_each(&mut f)
    }

    /// The unit whose bytes include `offset`.
    pub fn unit_containing_offset(&self, offset: u64) -> Option<&CompilationUnit<'data>> {
        let position = self.units.partition_point(|unit| unit.offset() <= offset);
        let unit = self.units.get(position.checked_sub(1)?)?;
        (offset < unit.header().end()).then_some(unit)
    }

    /// Decode the DIE at any offset, whether or not it is indexed.
    ///
    /// Returns `None` when no unit has a DIE area covering `offset`.
    pub fn die_at_offset(&self, offset: u64) -> Result<Option<Die<'_>>, ParseError> {
        match self.unit_containing_offset(offset) {
            Some(unit) if unit.contains_die_offset(offset) => unit.die_at(offset).map(Some),
            _ => Ok(None),
        }
    }

    /// Find the innermost indexed DIE whose range contains `address`.
    ///
    /// Looks at the entry with the largest start address not above
    /// `address`, then walks back towards lower starts until a range
    /// contains it. Nested DIEs (an inlined call inside its caller) are
    /// found before the DIEs that enclose them.
    pub fn get_die_at_address(&self, address: u64) -> Result<Option<Die<'_>>, ParseError> {
        let index = self.index()?;
        let candidates = index
            .by_address
            .partition_point(|(range, _)| range.start <= address);

        index.by_address[..candidates]
            .iter()
            .rev()
            .find(|(range, _)| range.contains(address))
            .map(|(_, location)| self.materialize(*location))
            .transpose()
    }

    /// Look up an indexed DIE by offset.
    ///
    /// Only DIEs that have address information are indexed; use
    /// [`die_at_offset`](Self::die_at_offset) for any other DIE.
    pub fn get_cached_die_at_offset(&self, offset: u64) -> Result<Option<Die<'_>>, ParseError> {
        let index = self.index()?;
        index
            .by_offset
            .get(&offset)
            .map(|location| self.materialize(*location))
            .transpose()
    }

    /// Number of address ranges in the index, building it if needed.
    pub fn index_len(&self) -> Result<usize, ParseError> {
        Ok(self.index()?.by_address.len())
    }

    /// Returns true once the address index has been built.
    pub fn is_index_built(&self) -> bool {
        self.index.get().is_some()
    }

    fn index(&self) -> Result<&DieIndex, ParseError> {
        if let Some(index) = self.index.get() {
            return Ok(index);
        }
        // Build outside the cell so an error leaves it empty
        let index = self.build_index()?;
        Ok(self.index.get_or_init(|| index))
    }

    fn materialize(&self, location: DieLocation) -> Result<Die<'_>, ParseError> {
        let unit = self
            .units
            .get(location.unit)
            .ok_or(ParseError::InvalidValue("index refers to a missing unit"))?;
        Die::parse(unit, location.offset, location.parent_offset)
    }

    fn build_index(&self) -> Result<DieIndex, ParseError> {
        let mut index = DieIndex::default();
        for unit in &self.units {
            index_unit(unit, &mut index)?;
        }
        index.by_address.sort_by_key(|(range, _)| range.start);

        log::debug!(
            "indexed {} address ranges for {} DIEs in {} units",
            index.by_address.len(),
            index.by_offset.len(),
            self.units.len()
        );
        Ok(index)
    }
}

/// Visit the root DIE and all of its descendants in tree order, recording
/// every DIE that has address information.
fn index_unit(unit: &CompilationUnit<'_>, index: &mut DieIndex) -> Result<(), ParseError> {
    let end = unit.header().end();
    let mut offset = unit.header().first_die_offset();
    // Offsets of the DIEs whose child chains are still open
    let mut parents: Vec<u64> = Vec::new();

    while offset < end {
        let die = Die::parse(unit, offset, parents.last().copied())?;
        offset += die.size();

        if die.is_null() {
            if parents.pop().is_none() || parents.is_empty() {
                break;
            }
            continue;
        }

        let location = DieLocation {
            unit: unit.index(),
            offset: die.offset(),
            parent_offset: die.parent_offset(),
        };
        let mut ranges = Vec::new();
        match die.for_each_range(|range| ranges.push(range)) {
            Ok(()) => {}
            // Range data missing from a short or absent section
            Err(error @ ParseError::TruncatedData { .. }) => {
                log::warn!(
                    "skipping address ranges of DIE at {:#x}: {}",
                    die.offset(),
                    error
                );
                ranges.clear();
            }
            Err(error) => return Err(error),
        }
        if !ranges.is_empty() {
            index.by_address.extend(
                ranges
                    .into_iter()
                    .filter(|range| !range.is_empty())
                    .map(|range| (range, location)),
            );
            log::trace!("indexed {:?}", die);
            index.by_offset.insert(die.offset(), location);
        }

        if die.has_children() {
            parents.push(die.offset());
        } else if parents.is_empty() {
            // A root without children
            break;
        }
    }

    if !parents.is_empty() {
        log::warn!(
            "unit at {:#x} ends with {} unterminated child lists",
            unit.offset(),
            parents.len()
        );
    }
    Ok(())
}
