//! DWARF Debug Information Entry (DIE) parsing.
//!
//! DIEs are the fundamental units of DWARF information. Each DIE describes
//! a programming language entity (function, variable, type, etc.).
//!
//! A [`Die`] is a small copyable view: the unit it belongs to, its offset,
//! and what was learned from decoding it once. Nothing links DIEs to each
//! other; children and siblings are found by decoding the bytes that follow.
//!
//! # Cost
//!
//! DWARF does not record how long a DIE is, so [`Die::parse`] decodes every
//! attribute just to find where the entry ends. Attribute queries decode
//! again from the start of the attribute list each time they are called:
//! `get_attribute` is linear in the position of the attribute. Use
//! [`Die::get_attributes`] or [`Die::attributes`] to fetch several in one pass.

use std::fmt;
use std::ops::ControlFlow;

use super::abbrev::{Abbreviation, AttributeSpec};
use super::attribute::{read_form_value, Attribute, AttributeValue, FormValue};
use super::ranges::AddressRange;
use super::types::{DwAt, DwForm, DwTag};
use super::unit::CompilationUnit;
use crate::ParseError;

/// A Debug Information Entry.
#[derive(Clone, Copy)]
pub struct Die<'a> {
    unit: &'a CompilationUnit<'a>,
    /// Absolute offset in .debug_info.
    offset: u64,
    /// Offset of the first attribute, just past the abbreviation code.
    data_offset: u64,
    abbreviation_code: u64,
    /// `None` for the null entry that ends a sibling chain.
    abbreviation: Option<&'a Abbreviation>,
    size: u64,
    parent_offset: Option<u64>,
}

impl<'a> Die<'a> {
    /// Decode the DIE at absolute offset `offset` in `unit`.
    ///
    /// `parent_offset` is recorded as given; it is `Some` for DIEs reached
    /// through their parent's child iteration.
    pub fn parse(
        unit: &'a CompilationUnit<'a>,
        offset: u64,
        parent_offset: Option<u64>,
    ) -> Result<Self, ParseError> {
        let mut reader = unit.info_reader_at(offset);
        let abbreviation_code = reader.read_uleb128();
        reader.check()?;
        let data_offset = reader.offset();

        let abbreviation = if abbreviation_code == 0 {
            None
        } else {
            let abbreviation = unit.abbreviations().get(abbreviation_code).ok_or(
                ParseError::UnknownAbbreviation {
                    code: abbreviation_code,
                    offset,
                },
            )?;
            // Decode and discard every value to find the end of the entry
            for spec in &abbreviation.attributes {
                read_form_value(&mut reader, spec, unit.header())?;
            }
            reader.check()?;
            Some(abbreviation)
        };

        Ok(Self {
            unit,
            offset,
            data_offset,
            abbreviation_code,
            abbreviation,
            size: reader.offset() - offset,
            parent_offset,
        })
    }

    /// The unit this DIE belongs to.
    pub fn unit(&self) -> &'a CompilationUnit<'a> {
        self.unit
    }

    /// Absolute offset in `.debug_info`.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    pub fn abbreviation_code(&self) -> u64 {
        self.abbreviation_code
    }

    pub fn abbreviation(&self) -> Option<&'a Abbreviation> {
        self.abbreviation
    }

    /// The tag, or `None` for a null entry.
    pub fn tag(&self) -> Option<DwTag> {
        self.abbreviation.map(|abbreviation| abbreviation.tag)
    }

    pub fn has_children(&self) -> bool {
        self.abbreviation
            .is_some_and(|abbreviation| abbreviation.has_children)
    }

    /// Returns true for the null entry that ends a sibling chain.
    pub fn is_null(&self) -> bool {
        self.abbreviation.is_none()
    }

    /// Encoded size in bytes, not counting children.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Offset of the parent, when this DIE was reached from it.
    pub fn parent_offset(&self) -> Option<u64> {
        self.parent_offset
    }

    /// Decode raw attribute values in order until `f` breaks.
    pub(crate) fn walk_raw<F>(&self, mut f: F) -> Result<(), ParseError>
    where
        F: FnMut(&'a AttributeSpec, DwForm, FormValue<'a>) -> ControlFlow<()>,
    {
        let Some(abbreviation) = self.abbreviation else {
            return Ok(());
        };
        let mut reader = self.unit.info_reader_at(self.data_offset);
        for spec in &abbreviation.attributes {
            let (form, value) = read_form_value(&mut reader, spec, self.unit.header())?;
            reader.check()?;
            if f(spec, form, value).is_break() {
                break;
            }
        }
        Ok(())
    }

    /// Get the first attribute named `name`, with the form it used.
    pub fn attribute(&self, name: DwAt) -> Result<Option<Attribute<'a>>, ParseError> {
        let mut found = None;
        self.walk_raw(|spec, form, value| {
            if spec.name == name {
                found = Some((form, value));
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;

        found
            .map(|(form, value)| {
                Ok(Attribute {
                    name,
                    form,
                    value: self.unit.resolve(value)?,
                })
            })
            .transpose()
    }

    /// Get the value of the first attribute named `name`.
    pub fn get_attribute(&self, name: DwAt) -> Result<Option<AttributeValue<'a>>, ParseError> {
        Ok(self.attribute(name)?.map(|attribute| attribute.value))
    }

    /// Get several attribute values in one pass over the attribute list.
    ///
    /// ```ignore
    /// let [low, high] = die.get_attributes([DwAt::LowPc, DwAt::HighPc])?;
    /// ```
    pub fn get_attributes<const N: usize>(
        &self,
        names: [DwAt; N],
    ) -> Result<[Option<AttributeValue<'a>>; N], ParseError> {
        let mut raw: [Option<FormValue<'a>>; N] = [None; N];
        let mut remaining = N;
        self.walk_raw(|spec, _, value| {
            for (slot, name) in raw.iter_mut().zip(&names) {
                if *name == spec.name && slot.is_none() {
                    *slot = Some(value);
                    remaining -= 1;
                }
            }
            if remaining == 0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;

        let mut values: [Option<AttributeValue<'a>>; N] = [None; N];
        for (value, raw) in values.iter_mut().zip(raw) {
            if let Some(raw) = raw {
                *value = Some(self.unit.resolve(raw)?);
            }
        }
        Ok(values)
    }

    /// Decode every attribute, in abbreviation order.
    pub fn attributes(&self) -> Result<Vec<Attribute<'a>>, ParseError> {
        let mut raw = Vec::new();
        self.walk_raw(|spec, form, value| {
            raw.push((spec.name, form, value));
            ControlFlow::Continue(())
        })?;
        raw.into_iter()
            .map(|(name, form, value)| {
                Ok(Attribute {
                    name,
                    form,
                    value: self.unit.resolve(value)?,
                })
            })
            .collect()
    }

    /// `DW_AT_name`, if present and valid UTF-8.
    pub fn name(&self) -> Result<Option<&'a str>, ParseError> {
        Ok(self
            .get_attribute(DwAt::Name)?
            .and_then(|value| value.as_str()))
    }

    /// The `[DW_AT_low_pc, DW_AT_high_pc)` range, if both are present.
    pub fn pc_range(&self) -> Result<Option<AddressRange>, ParseError> {
        match self.get_attributes([DwAt::LowPc, DwAt::HighPc])? {
            [Some(low), Some(high)] => pc_range_from(low, high).map(Some),
            _ => Ok(None),
        }
    }

    /// Call `f` for every address range this DIE covers.
    ///
    /// Uses `DW_AT_low_pc`/`DW_AT_high_pc` when both are present, otherwise
    /// the range list named by `DW_AT_ranges`.
    pub fn for_each_range<F>(&self, mut f: F) -> Result<(), ParseError>
    where
        F: FnMut(AddressRange),
    {
        match self.get_attributes([DwAt::LowPc, DwAt::HighPc, DwAt::Ranges])? {
            [Some(low), Some(high), _] => f(pc_range_from(low, high)?),
            [_, _, Some(ranges)] => self.unit.range_list(&ranges)?.for_each_range(f)?,
            _ => {}
        }
        Ok(())
    }

    /// Call `f` for each child, ending with the null entry.
    ///
    /// Does nothing for DIEs without children.
    pub fn for_each_child<F>(&self, mut f: F) -> Result<(), ParseError>
    where
        F: FnMut(&Die<'a>) -> Result<(), ParseError>,
    {
        if !self.has_children() {
            return Ok(());
        }

        let mut offset = self.offset + self.size;
        loop {
            let child = Die::parse(self.unit, offset, Some(self.offset))?;
            f(&child)?;
            if child.is_null() {
                return Ok(());
            }
            offset = child.next_sibling_offset()?;
        }
    }

    /// The non-null children, in order.
    pub fn children(&self) -> Result<Vec<Die<'a>>, ParseError> {
        let mut children = Vec::new();
        self.for_each_child(|child| {
            if !child.is_null() {
                children.push(*child);
            }
            Ok(())
        })?;
        Ok(children)
    }

    /// Offset of the entry that follows this DIE and all of its descendants.
    ///
    /// Uses `DW_AT_sibling` when the unit follows sibling hints and the hint
    /// points forward inside the unit. Otherwise the subtree is decoded entry
    /// by entry: each DIE with children opens a chain that a null entry closes.
    pub fn next_sibling_offset(&self) -> Result<u64, ParseError> {
        let end = self.offset + self.size;
        if !self.has_children() {
            return Ok(end);
        }
        if let Some(target) = self.sibling_hint()? {
            return Ok(target);
        }

        let mut offset = end;
        let mut depth = 1usize;
        while depth > 0 {
            let die = Die::parse(self.unit, offset, None)?;
            offset = die.offset + die.size;
            if die.is_null() {
                depth -= 1;
            } else if die.has_children() {
                match die.sibling_hint()? {
                    Some(target) => offset = target,
                    None => depth += 1,
                }
            }
        }
        Ok(offset)
    }

    fn sibling_hint(&self) -> Result<Option<u64>, ParseError> {
        if !self.unit.follow_sibling_hints() {
            return Ok(None);
        }
        match self.get_attribute(DwAt::Sibling)? {
            Some(AttributeValue::DieReference(target))
                if target > self.offset && self.unit.contains_die_offset(target) =>
            {
                Ok(Some(target))
            }
            Some(other) => {
                log::trace!(
                    "ignoring DW_AT_sibling {} on DIE {:#x}",
                    other,
                    self.offset
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

/// Apply the `DW_AT_high_pc` rule: an address is the end, a constant is a length.
fn pc_range_from(
    low: AttributeValue<'_>,
    high: AttributeValue<'_>,
) -> Result<AddressRange, ParseError> {
    let start = low
        .as_u64()
        .ok_or(ParseError::InvalidValue("DW_AT_low_pc is not an address"))?;
    let end = match high {
        AttributeValue::Address(end) => end,
        length => {
            let length = length.as_u64().ok_or(ParseError::InvalidValue(
                "DW_AT_high_pc is neither an address nor a constant",
            ))?;
            start.checked_add(length).ok_or(ParseError::Overflow {
                context: "DW_AT_high_pc length",
            })?
        }
    };
    Ok(AddressRange::new(start, end))
}

impl fmt::Debug for Die<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Die")
            .field("unit", &self.unit.offset())
            .field("offset", &self.offset)
            .field("tag", &self.tag())
            .field("has_children", &self.has_children())
            .field("size", &self.size)
            .field("parent_offset", &self.parent_offset)
            .finish()
    }
}
