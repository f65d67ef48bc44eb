//! DWARF attribute values and the form decoder.
//!
//! [`read_form_value`] is the only place that knows how many bytes each
//! `DW_FORM_*` occupies. It produces a [`FormValue`], which may still hold an
//! index or offset into an auxiliary section; the owning
//! [`CompilationUnit`](super::CompilationUnit) turns that into the public
//! [`AttributeValue`].

use std::fmt;

use super::abbrev::AttributeSpec;
use super::reader::ByteReader;
use super::types::{DwAt, DwForm};
use super::unit::CompilationUnitHeader;
use crate::ParseError;

/// A decoded attribute value.
///
/// Strings and byte blocks borrow from the section they were read from and
/// live as long as the section bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    /// A target address (`DW_FORM_addr`, `DW_FORM_addrx*`).
    Address(u64),
    /// Unsigned constant up to 4 bytes wide, or ULEB128.
    Unsigned(u64),
    /// 8-byte unsigned constant (`DW_FORM_data8`).
    LongUnsigned(u64),
    /// Signed constant (`DW_FORM_sdata`, `DW_FORM_implicit_const`).
    Signed(i64),
    /// String bytes without the terminator.
    String(&'a [u8]),
    /// Absolute offset of a DIE in `.debug_info`.
    DieReference(u64),
    /// A flag.
    Boolean(bool),
    /// An uninterpreted DWARF expression (`DW_FORM_exprloc`).
    Expression(&'a [u8]),
    /// An offset into another debug section; its meaning depends on the attribute.
    SecOffset(u64),
    /// A length-prefixed block or a 16-byte constant.
    RawBytes(&'a [u8]),
    /// Signature of a type unit (`DW_FORM_ref_sig8`).
    TypeSignature(u64),
    /// Offset into a supplementary object file.
    SupplementaryOffset(u64),
    /// Index into the unit's location-list offset table.
    LocationListIndex(u64),
    /// Index into the unit's range-list offset table.
    RangeListIndex(u64),
}

impl<'a> AttributeValue<'a> {
    /// Returns the value as an unsigned integer when it is numeric.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Address(value)
            | Self::Unsigned(value)
            | Self::LongUnsigned(value)
            | Self::DieReference(value)
            | Self::SecOffset(value)
            | Self::LocationListIndex(value)
            | Self::RangeListIndex(value) => Some(value),
            Self::Signed(value) => u64::try_from(value).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Signed(value) => Some(value),
            Self::Unsigned(value) | Self::LongUnsigned(value) => i64::try_from(value).ok(),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<u64> {
        match *self {
            Self::Address(address) => Some(address),
            _ => None,
        }
    }

    pub fn as_die_reference(&self) -> Option<u64> {
        match *self {
            Self::DieReference(offset) => Some(offset),
            _ => None,
        }
    }

    /// Returns the string bytes, if this is a string.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            Self::String(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the string, if this is a string holding valid UTF-8.
    pub fn as_str(&self) -> Option<&'a str> {
        self.as_bytes()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Boolean(flag) => Some(flag),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address:#x}"),
            Self::Unsigned(value) | Self::LongUnsigned(value) => write!(f, "{value}"),
            Self::Signed(value) => write!(f, "{value}"),
            Self::String(bytes) => write!(f, "\"{}\"", String::from_utf8_lossy(bytes)),
            Self::DieReference(offset) => write!(f, "<{offset:#x}>"),
            Self::Boolean(flag) => write!(f, "{flag}"),
            Self::Expression(bytes) => write!(f, "expr[{}] {bytes:02x?}", bytes.len()),
            Self::SecOffset(offset) => write!(f, "sec+{offset:#x}"),
            Self::RawBytes(bytes) => write!(f, "block[{}] {bytes:02x?}", bytes.len()),
            Self::TypeSignature(signature) => write!(f, "sig {signature:#018x}"),
            Self::SupplementaryOffset(offset) => write!(f, "sup+{offset:#x}"),
            Self::LocationListIndex(index) => write!(f, "loclist[{index}]"),
            Self::RangeListIndex(index) => write!(f, "rnglist[{index}]"),
        }
    }
}

/// A single attribute of a DIE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// The attribute name.
    pub name: DwAt,
    /// The form it was encoded with (after resolving `DW_FORM_indirect`).
    pub form: DwForm,
    /// The decoded value.
    pub value: AttributeValue<'a>,
}

/// A value as it sits in `.debug_info`, before index and offset forms are
/// resolved against the unit's string and address tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormValue<'a> {
    Value(AttributeValue<'a>),
    /// Offset into `.debug_str`.
    StrOffset(u64),
    /// Offset into `.debug_line_str`.
    LineStrOffset(u64),
    /// Index into the unit's `.debug_str_offsets` slice.
    StrIndex(u64),
    /// Index into the unit's `.debug_addr` slice.
    AddrIndex(u64),
}

impl<'a> From<AttributeValue<'a>> for FormValue<'a> {
    fn from(value: AttributeValue<'a>) -> Self {
        Self::Value(value)
    }
}

/// Decode one attribute at the reader's position and advance past it.
///
/// Returns the value together with the form actually used, which differs
/// from `spec.form` only for `DW_FORM_indirect`. Short reads are recorded in
/// `reader`; callers check it once they are done with a batch.
pub(crate) fn read_form_value<'a>(
    reader: &mut ByteReader<'a>,
    spec: &AttributeSpec,
    header: &CompilationUnitHeader,
) -> Result<(DwForm, FormValue<'a>), ParseError> {
    let mut form = spec.form;
    // DW_FORM_indirect stores the real form inline; chains are legal but
    // each link consumes at least one byte.
    while form == DwForm::Indirect {
        let position = reader.offset();
        form = DwForm::from_uleb(reader.read_uleb128());
        reader.check()?;
        if form == DwForm::ImplicitConst {
            return Err(ParseError::invalid_structure(
                "attribute",
                position,
                "DW_FORM_indirect cannot select DW_FORM_implicit_const",
            ));
        }
    }

    use AttributeValue as V;
    let is_64bit = header.is_64bit;
    let value: FormValue<'a> = match form {
        DwForm::Addr => V::Address(reader.read_address(header.address_size)).into(),

        DwForm::Data1 => V::Unsigned(u64::from(reader.read_u8())).into(),
        DwForm::Data2 => V::Unsigned(u64::from(reader.read_u16())).into(),
        DwForm::Data4 => V::Unsigned(u64::from(reader.read_u32())).into(),
        DwForm::Data8 => V::LongUnsigned(reader.read_u64()).into(),
        DwForm::Data16 => V::RawBytes(reader.read_bytes(16)).into(),
        DwForm::Udata => V::Unsigned(reader.read_uleb128()).into(),
        DwForm::Sdata => V::Signed(reader.read_sleb128()).into(),
        DwForm::ImplicitConst => {
            let value = spec.implicit_const.ok_or(ParseError::InvalidValue(
                "missing implicit constant value",
            ))?;
            V::Signed(value).into()
        }

        DwForm::Flag => V::Boolean(reader.read_u8() != 0).into(),
        DwForm::FlagPresent => V::Boolean(true).into(),

        DwForm::String => V::String(reader.read_cstr()).into(),
        DwForm::Strp => FormValue::StrOffset(reader.read_offset(is_64bit)),
        DwForm::LineStrp => FormValue::LineStrOffset(reader.read_offset(is_64bit)),
        DwForm::Strx | DwForm::GnuStrIndex => FormValue::StrIndex(reader.read_uleb128()),
        DwForm::Strx1 => FormValue::StrIndex(u64::from(reader.read_u8())),
        DwForm::Strx2 => FormValue::StrIndex(u64::from(reader.read_u16())),
        DwForm::Strx3 => FormValue::StrIndex(u64::from(reader.read_u24())),
        DwForm::Strx4 => FormValue::StrIndex(u64::from(reader.read_u32())),

        DwForm::Addrx | DwForm::GnuAddrIndex => FormValue::AddrIndex(reader.read_uleb128()),
        DwForm::Addrx1 => FormValue::AddrIndex(u64::from(reader.read_u8())),
        DwForm::Addrx2 => FormValue::AddrIndex(u64::from(reader.read_u16())),
        DwForm::Addrx3 => FormValue::AddrIndex(u64::from(reader.read_u24())),
        DwForm::Addrx4 => FormValue::AddrIndex(u64::from(reader.read_u32())),

        // Unit-relative references are stored as absolute .debug_info offsets
        DwForm::Ref1 => unit_reference(header, u64::from(reader.read_u8()))?,
        DwForm::Ref2 => unit_reference(header, u64::from(reader.read_u16()))?,
        DwForm::Ref4 => unit_reference(header, u64::from(reader.read_u32()))?,
        DwForm::Ref8 => unit_reference(header, reader.read_u64())?,
        DwForm::RefUdata => unit_reference(header, reader.read_uleb128())?,
        DwForm::RefAddr => V::DieReference(reader.read_offset(is_64bit)).into(),
        DwForm::RefSig8 => V::TypeSignature(reader.read_u64()).into(),
        DwForm::RefSup4 => V::SupplementaryOffset(u64::from(reader.read_u32())).into(),
        DwForm::RefSup8 => V::SupplementaryOffset(reader.read_u64()).into(),
        DwForm::StrpSup | DwForm::GnuStrpAlt | DwForm::GnuRefAlt => {
            V::SupplementaryOffset(reader.read_offset(is_64bit)).into()
        }

        DwForm::SecOffset => V::SecOffset(reader.read_offset(is_64bit)).into(),
        DwForm::Loclistx => V::LocationListIndex(reader.read_uleb128()).into(),
        DwForm::Rnglistx => V::RangeListIndex(reader.read_uleb128()).into(),

        DwForm::Exprloc => {
            let len = reader.read_uleb128();
            V::Expression(reader.read_bytes(len)).into()
        }
        DwForm::Block1 => {
            let len = u64::from(reader.read_u8());
            V::RawBytes(reader.read_bytes(len)).into()
        }
        DwForm::Block2 => {
            let len = u64::from(reader.read_u16());
            V::RawBytes(reader.read_bytes(len)).into()
        }
        DwForm::Block4 => {
            let len = u64::from(reader.read_u32());
            V::RawBytes(reader.read_bytes(len)).into()
        }
        DwForm::Block => {
            let len = reader.read_uleb128();
            V::RawBytes(reader.read_bytes(len)).into()
        }

        DwForm::Indirect | DwForm::Unknown(_) => {
            // The width of an unknown form is unknown, so nothing after it
            // in this unit can be decoded.
            return Err(ParseError::UnknownForm {
                form: u64::from(form.value()),
                offset: reader.offset(),
            });
        }
    };

    Ok((form, value))
}

fn unit_reference<'a>(
    header: &CompilationUnitHeader,
    relative: u64,
) -> Result<FormValue<'a>, ParseError> {
    header
        .offset
        .checked_add(relative)
        .map(|absolute| FormValue::Value(AttributeValue::DieReference(absolute)))
        .ok_or(ParseError::Overflow {
            context: "unit-relative DIE reference",
        })
}
