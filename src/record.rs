//! Fielded record wire layout (FML / FML32 variants).
//!
//! Dieses Modul besitzt das Bit-Layout; nach aussen ist es kein Vertrag.
//! Beide Varianten teilen die Struktur, nur die Id-Breite unterscheidet sich:
//!
//! ```text
//! header:  magic        4 Bytes  ("FB16" | "FB32")
//!          bytes_used   u32 LE   (autoritative codierte Groesse)
//!          field_count  u32 LE
//! entry:   id           u16 LE | u32 LE
//!          tag          u8       (FLD_*-Wert, siehe FieldKind)
//!          payload      fix (short 2, long 8, char 1, float 4, double 8)
//!                       oder u32 LE Laenge + Bytes (string/carray/fml32)
//! ```
//!
//! Alle Operationen arbeiten in-place auf dem Byte-Block eines TypedBuffer
//! und melden Fehler als native Codes; `FNOSPACE` ist das einzige Signal,
//! auf das die Aufrufer mit Wachstum reagieren. Ein Append schreibt erst,
//! wenn der ganze Entry passt — kein partieller Zustand bei `FNOSPACE`.
//! Duplikat-Ids werden angehaengt, nie ersetzt.

use crate::native::{self, NativeCode};
use crate::value::FieldKind;

/// Record header length in bytes (shared by both variants).
pub(crate) const HEADER_LEN: usize = 12;

const MAGIC16: [u8; 4] = *b"FB16";
const MAGIC32: [u8; 4] = *b"FB32";

/// Result alias of the record layer: native codes, not engine errors.
pub(crate) type NResult<T> = core::result::Result<T, NativeCode>;

/// Wire format variant, distinguished by field-id width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordVariant {
    /// 16-bit field identifiers (`FML`).
    Fml,
    /// 32-bit field identifiers (`FML32`).
    Fml32,
}

impl RecordVariant {
    /// Wire type string of a TypedBuffer holding this variant.
    pub fn wire_type(self) -> &'static str {
        match self {
            Self::Fml => "FML",
            Self::Fml32 => "FML32",
        }
    }

    /// Resolves a buffer wire type to its record variant.
    pub fn from_wire_type(wire_type: &str) -> Option<Self> {
        match wire_type {
            "FML" => Some(Self::Fml),
            "FML32" => Some(Self::Fml32),
            _ => None,
        }
    }

    fn magic(self) -> [u8; 4] {
        match self {
            Self::Fml => MAGIC16,
            Self::Fml32 => MAGIC32,
        }
    }

    fn id_len(self) -> usize {
        match self {
            Self::Fml => 2,
            Self::Fml32 => 4,
        }
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw: [u8; 4] = bytes.get(offset..offset + 4)?.try_into().ok()?;
    Some(u32::from_le_bytes(raw))
}

fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Writes a fresh, empty record header for `variant`.
///
/// `FNOSPACE` wenn die Kapazitaet nicht einmal den Header fasst.
pub(crate) fn init(bytes: &mut [u8], variant: RecordVariant) -> NResult<()> {
    if bytes.len() < HEADER_LEN {
        return Err(native::FNOSPACE);
    }
    bytes[..4].copy_from_slice(&variant.magic());
    write_u32(bytes, 4, HEADER_LEN as u32);
    write_u32(bytes, 8, 0);
    Ok(())
}

/// Reads the variant from the magic, or `None` if the block carries none.
pub(crate) fn variant_of(bytes: &[u8]) -> Option<RecordVariant> {
    match bytes.get(..4)? {
        m if m == MAGIC16 => Some(RecordVariant::Fml),
        m if m == MAGIC32 => Some(RecordVariant::Fml32),
        _ => None,
    }
}

/// Authoritative encoded size from the record header.
///
/// `FNOTFLD` wenn der Block kein Record ist oder der Header inkonsistent
/// zur Kapazitaet ist.
pub(crate) fn bytes_used(bytes: &[u8]) -> NResult<usize> {
    if variant_of(bytes).is_none() {
        return Err(native::FNOTFLD);
    }
    let used = read_u32(bytes, 4).ok_or(native::FNOTFLD)? as usize;
    if used < HEADER_LEN || used > bytes.len() {
        return Err(native::FNOTFLD);
    }
    Ok(used)
}

/// Field count from the record header.
pub(crate) fn field_count(bytes: &[u8]) -> NResult<u32> {
    if variant_of(bytes).is_none() {
        return Err(native::FNOTFLD);
    }
    read_u32(bytes, 8).ok_or(native::FNOTFLD)
}

/// Byte length one entry occupies on the wire.
fn entry_len(variant: RecordVariant, kind: FieldKind, payload_len: usize) -> usize {
    let payload_repr = match kind.fixed_width() {
        Some(width) => width,
        None => 4 + payload_len,
    };
    variant.id_len() + 1 + payload_repr
}

/// Appends one field entry at the record's current end.
///
/// Validiert Id, Tag und Payload-Breite, prueft dann die Kapazitaet:
/// passt der ganze Entry nicht, kommt `FNOSPACE` zurueck und der Block
/// bleibt unveraendert. Header-Felder werden nur bei Erfolg fortgeschrieben.
pub(crate) fn append(
    bytes: &mut [u8],
    variant: RecordVariant,
    id: u32,
    tag: u8,
    payload: &[u8],
) -> NResult<()> {
    if variant_of(bytes) != Some(variant) {
        return Err(native::FNOTFLD);
    }
    if id == 0 {
        return Err(native::FBADFLD);
    }
    if variant == RecordVariant::Fml && id > u16::MAX as u32 {
        return Err(native::FBADFLD);
    }
    let kind = FieldKind::from_wire_tag(tag).ok_or(native::FTYPERR)?;
    if variant == RecordVariant::Fml && kind.fml32_only() {
        return Err(native::FTYPERR);
    }
    if let Some(width) = kind.fixed_width() {
        if payload.len() != width {
            return Err(native::FTYPERR);
        }
    } else if u32::try_from(payload.len()).is_err() {
        return Err(native::FBADFLD);
    }

    let used = bytes_used(bytes)?;
    let count = field_count(bytes)?;
    let len = entry_len(variant, kind, payload.len());
    let end = used.checked_add(len).ok_or(native::FNOSPACE)?;
    if end > bytes.len() || u32::try_from(end).is_err() {
        return Err(native::FNOSPACE);
    }

    let mut offset = used;
    match variant {
        RecordVariant::Fml => {
            bytes[offset..offset + 2].copy_from_slice(&(id as u16).to_le_bytes());
            offset += 2;
        }
        RecordVariant::Fml32 => {
            bytes[offset..offset + 4].copy_from_slice(&id.to_le_bytes());
            offset += 4;
        }
    }
    bytes[offset] = tag;
    offset += 1;
    if kind.fixed_width().is_none() {
        write_u32(bytes, offset, payload.len() as u32);
        offset += 4;
    }
    bytes[offset..offset + payload.len()].copy_from_slice(payload);

    write_u32(bytes, 4, end as u32);
    write_u32(bytes, 8, count.wrapping_add(1));
    Ok(())
}

/// One parsed field entry. `payload` excludes any length prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry<'a> {
    pub id: u32,
    pub tag: u8,
    pub payload: &'a [u8],
}

/// Iterator over the entries of an encoded record.
pub(crate) struct EntryIter<'a> {
    bytes: &'a [u8],
    variant: RecordVariant,
    offset: usize,
    end: usize,
    remaining: u32,
    poisoned: bool,
}

impl<'a> Iterator for EntryIter<'a> {
    type Item = NResult<Entry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        if self.remaining == 0 {
            // Der Walk muss genau am autoritativen Ende landen.
            if self.offset != self.end {
                self.poisoned = true;
                return Some(Err(native::FNOTFLD));
            }
            return None;
        }
        self.remaining -= 1;

        match parse_entry(self.bytes, self.variant, self.offset, self.end) {
            Ok((entry, next_offset)) => {
                self.offset = next_offset;
                Some(Ok(entry))
            }
            Err(code) => {
                self.poisoned = true;
                Some(Err(code))
            }
        }
    }
}

fn parse_entry(
    bytes: &[u8],
    variant: RecordVariant,
    offset: usize,
    end: usize,
) -> NResult<(Entry<'_>, usize)> {
    let id_len = variant.id_len();
    if offset + id_len + 1 > end {
        return Err(native::FNOTFLD);
    }
    let id = match variant {
        RecordVariant::Fml => {
            u16::from_le_bytes([bytes[offset], bytes[offset + 1]]) as u32
        }
        RecordVariant::Fml32 => read_u32(bytes, offset).ok_or(native::FNOTFLD)?,
    };
    if id == 0 {
        return Err(native::FBADFLD);
    }
    let tag = bytes[offset + id_len];
    let kind = FieldKind::from_wire_tag(tag).ok_or(native::FTYPERR)?;
    if variant == RecordVariant::Fml && kind.fml32_only() {
        return Err(native::FTYPERR);
    }
    let mut cursor = offset + id_len + 1;
    let payload_len = match kind.fixed_width() {
        Some(width) => width,
        None => {
            if cursor + 4 > end {
                return Err(native::FNOTFLD);
            }
            let len = read_u32(bytes, cursor).ok_or(native::FNOTFLD)? as usize;
            cursor += 4;
            len
        }
    };
    if cursor + payload_len > end {
        return Err(native::FNOTFLD);
    }
    let entry = Entry { id, tag, payload: &bytes[cursor..cursor + payload_len] };
    Ok((entry, cursor + payload_len))
}

/// Iterates the entries of the record in `bytes`.
///
/// `FNOTFLD` wenn der Block kein Record ist. Struktur-Fehler mitten im Walk
/// kommen als Item-Fehler; danach endet die Iteration.
pub(crate) fn entries(bytes: &[u8]) -> NResult<EntryIter<'_>> {
    let variant = variant_of(bytes).ok_or(native::FNOTFLD)?;
    let end = bytes_used(bytes)?;
    let remaining = field_count(bytes)?;
    Ok(EntryIter { bytes, variant, offset: HEADER_LEN, end, remaining, poisoned: false })
}

/// Structure-level validity: magic, header, and a consistent entry walk.
///
/// Unterscheidet ein getaggtes Record von einem unstrukturierten typed
/// buffer gleicher Groesse.
pub(crate) fn is_fielded(bytes: &[u8]) -> bool {
    match entries(bytes) {
        Ok(iter) => {
            for item in iter {
                if item.is_err() {
                    return false;
                }
            }
            true
        }
        Err(_) => false,
    }
}
