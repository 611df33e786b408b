//! Field value model: kinds, tagged values, catalog bindings.
//!
//! `FieldKind` ist die geschlossene Menge der primitiven Feldtypen mit den
//! klassischen FLD_*-Tag-Werten der Original-API (FLD_SHORT=0 .. FLD_CARRAY=6,
//! FLD_FML32=10). `FieldValue` ist die dazu passende Tagged Union; der
//! Encoder dispatcht ueber ein exhaustives `match`, sodass ein neuer
//! primitiver Typ nicht ohne Dispatcher-Update hinzukommen kann.

use core::fmt;

use crate::buffer::TypedBuffer;

/// Primitive type tag of a field, with its wire tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FieldKind {
    /// Signed 16-bit integer (`FLD_SHORT`).
    Short = 0,
    /// Signed 64-bit integer (`FLD_LONG`; the original stores the C `long`
    /// of 64-bit platforms).
    Long = 1,
    /// Signed 8-bit integer (`FLD_CHAR`).
    Char = 2,
    /// IEEE 754 single precision (`FLD_FLOAT`).
    Float = 3,
    /// IEEE 754 double precision (`FLD_DOUBLE`).
    Double = 4,
    /// Text under the buffer's text encoding, NUL-terminated on the wire
    /// (`FLD_STRING`).
    String = 5,
    /// Raw bytes, length-prefixed (`FLD_CARRAY`).
    Carray = 6,
    /// Nested fielded record; only legal inside FML32 records (`FLD_FML32`).
    Fml32 = 10,
}

impl FieldKind {
    /// Wire tag byte of this kind.
    pub fn wire_tag(self) -> u8 {
        self as u8
    }

    /// Resolves a wire tag byte back to its kind.
    pub fn from_wire_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Short),
            1 => Some(Self::Long),
            2 => Some(Self::Char),
            3 => Some(Self::Float),
            4 => Some(Self::Double),
            5 => Some(Self::String),
            6 => Some(Self::Carray),
            10 => Some(Self::Fml32),
            _ => None,
        }
    }

    /// Fixed payload width in bytes, or `None` for length-prefixed kinds.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Short => Some(2),
            Self::Long => Some(8),
            Self::Char => Some(1),
            Self::Float => Some(4),
            Self::Double => Some(8),
            Self::String | Self::Carray | Self::Fml32 => None,
        }
    }

    /// True for kinds that only exist in the 32-bit record variant.
    pub fn fml32_only(self) -> bool {
        matches!(self, Self::Fml32)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Short => "short",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Carray => "carray",
            Self::Fml32 => "fml32",
        };
        f.write_str(name)
    }
}

/// A single field value. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Short(i16),
    Long(i64),
    Char(i8),
    Float(f32),
    Double(f64),
    String(String),
    Carray(Vec<u8>),
    /// Nested fielded payload. Beim Encoden wird der Quell-Buffer gelesen,
    /// nicht konsumiert; er bleibt danach unabhaengig gueltig.
    Fml32(TypedBuffer),
}

impl FieldValue {
    /// Runtime kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Short(_) => FieldKind::Short,
            Self::Long(_) => FieldKind::Long,
            Self::Char(_) => FieldKind::Char,
            Self::Float(_) => FieldKind::Float,
            Self::Double(_) => FieldKind::Double,
            Self::String(_) => FieldKind::String,
            Self::Carray(_) => FieldKind::Carray,
            Self::Fml32(_) => FieldKind::Fml32,
        }
    }
}

/// Catalog binding of a field name: numeric id plus type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldBinding {
    pub field_id: u32,
    pub kind: FieldKind,
}

impl FieldBinding {
    pub fn new(field_id: u32, kind: FieldKind) -> Self {
        Self { field_id, kind }
    }
}

// ============================================================================
// Packed field ids
// ============================================================================
//
// Kataloge der Original-API praegen Field-Ids mit dem Typ-Tag in den oberen
// Bits: 32-bit Ids als `tag << 24 | number`, 16-bit Ids als
// `tag << 13 | number`. Die Helfer hier sind Aufrufer-Komfort fuer den
// Katalog-Aufbau; der Encoder selbst behandelt Ids als opake Zahlen.

/// Number of id bits below the tag in a 32-bit field id.
pub const FIELD_ID32_NUMBER_BITS: u32 = 24;

/// Number of id bits below the tag in a 16-bit field id.
pub const FIELD_ID16_NUMBER_BITS: u32 = 13;

/// Mints a packed 32-bit field id from kind and field number.
///
/// Returns `None` if `number` does not fit the 24-bit number space or is 0
/// (id 0 is reserved as "bad field" in the original numbering).
pub fn make_field_id32(kind: FieldKind, number: u32) -> Option<u32> {
    if number == 0 || number >= (1 << FIELD_ID32_NUMBER_BITS) {
        return None;
    }
    Some((kind.wire_tag() as u32) << FIELD_ID32_NUMBER_BITS | number)
}

/// Mints a packed 16-bit field id from kind and field number.
///
/// The 16-bit id space has a 3-bit tag, so [`FieldKind::Fml32`] (tag 10)
/// is not representable and yields `None`.
pub fn make_field_id16(kind: FieldKind, number: u16) -> Option<u16> {
    if kind.fml32_only() {
        return None;
    }
    if number == 0 || number >= (1 << FIELD_ID16_NUMBER_BITS) {
        return None;
    }
    Some((kind.wire_tag() as u16) << FIELD_ID16_NUMBER_BITS | number)
}

/// Extracts the kind packed into a 32-bit field id.
pub fn kind_of_field_id32(id: u32) -> Option<FieldKind> {
    FieldKind::from_wire_tag((id >> FIELD_ID32_NUMBER_BITS) as u8)
}

/// Extracts the kind packed into a 16-bit field id.
pub fn kind_of_field_id16(id: u16) -> Option<FieldKind> {
    FieldKind::from_wire_tag((id >> FIELD_ID16_NUMBER_BITS) as u8)
}

/// Extracts the field number of a packed 32-bit field id.
pub fn field_number32(id: u32) -> u32 {
    id & ((1 << FIELD_ID32_NUMBER_BITS) - 1)
}

/// Extracts the field number of a packed 16-bit field id.
pub fn field_number16(id: u16) -> u16 {
    id & ((1 << FIELD_ID16_NUMBER_BITS) - 1)
}
