//! Field encoder: serializes (name, value) pairs into a fielded record.
//!
//! Der Aufrufer allokiert den Ziel-Buffer mit Wire-Typ `FML` oder `FML32`
//! und einer Start-Kapazitaet; der Encoder initialisiert das Record, haengt
//! jedes Feld in Reihenfolge an und uebernimmt am Ende die autoritative
//! codierte Groesse als logische Buffer-Groesse. Reicht die Kapazitaet fuer
//! einen Append nicht (`FNOSPACE`), waechst der Buffer um
//! `min(Kapazitaet, 64 KiB)` und nur der eine Append wird wiederholt —
//! bereits geschriebene Felder bleiben erhalten.
//!
//! # Beispiel
//!
//! ```
//! use fmlbuf::buffer::TypedBuffer;
//! use fmlbuf::catalog::MapCatalog;
//! use fmlbuf::value::{FieldBinding, FieldKind, FieldValue, make_field_id32};
//!
//! let mut catalog = MapCatalog::new();
//! let id = make_field_id32(FieldKind::Long, 1).unwrap();
//! catalog.insert("T_COUNT", FieldBinding::new(id, FieldKind::Long));
//!
//! let mut buf = TypedBuffer::new();
//! buf.allocate("FML32", "", 64).unwrap();
//! fmlbuf::encoder::encode(&mut buf, &catalog, &[("T_COUNT", FieldValue::Long(7))]).unwrap();
//! assert!(fmlbuf::decoder::validate(&buf, "FML32").is_ok());
//! ```

use log::trace;

use crate::buffer::TypedBuffer;
use crate::catalog::FieldCatalog;
use crate::native;
use crate::record::{self, RecordVariant};
use crate::value::FieldValue;
use crate::{Error, Result};

/// Upper bound of one growth step. Below this the capacity doubles, above
/// it grows linearly — bounded reallocation cost for very large records,
/// steady progress for small ones.
pub const GROW_INCREMENT_MAX: usize = 64 * 1024;

/// Encodes `fields` in order into `buffer`.
///
/// The record variant follows the buffer's wire type (`FML` or `FML32`).
/// Null Felder sind legal und ergeben ein minimales leeres Record;
/// doppelte Feldnamen haengen zwei Entries an (Append, kein Upsert).
pub fn encode(
    buffer: &mut TypedBuffer,
    catalog: &dyn FieldCatalog,
    fields: &[(&str, FieldValue)],
) -> Result<()> {
    if buffer.capacity() == 0 {
        return Err(Error::NotAllocated);
    }
    let variant = RecordVariant::from_wire_type(buffer.wire_type())
        .ok_or(Error::InitFailed(native::FTYPERR))?;

    {
        let bytes = buffer.bytes_mut().ok_or(Error::NotAllocated)?;
        record::init(bytes, variant).map_err(Error::InitFailed)?;
    }

    for (name, value) in fields {
        append_one(buffer, catalog, variant, name, value)?;
    }

    let bytes = buffer.bytes().ok_or(Error::NotAllocated)?;
    let used = record::bytes_used(bytes).map_err(Error::FinalizeFailed)?;
    buffer.set_used(used);
    Ok(())
}

fn append_one(
    buffer: &mut TypedBuffer,
    catalog: &dyn FieldCatalog,
    variant: RecordVariant,
    name: &str,
    value: &FieldValue,
) -> Result<()> {
    let binding = catalog
        .lookup(name)
        .ok_or_else(|| Error::UnknownField(name.to_string()))?;
    if value.kind() != binding.kind {
        return Err(Error::type_mismatch(name, binding.kind, value.kind()));
    }
    if value.kind().fml32_only() && variant == RecordVariant::Fml {
        return Err(Error::UnsupportedNesting(name.to_string()));
    }

    let payload = serialize_payload(buffer, name, value)?;
    let tag = binding.kind.wire_tag();

    // Grow-and-Retry: nur FNOSPACE loest Wachstum aus, alles andere ist
    // terminal. Wiederholt wird nur dieser eine Append.
    loop {
        let bytes = buffer.bytes_mut().ok_or(Error::NotAllocated)?;
        match record::append(bytes, variant, binding.field_id, tag, &payload) {
            Ok(()) => return Ok(()),
            Err(native::FNOSPACE) => {
                let capacity = buffer.capacity();
                let increment = capacity.min(GROW_INCREMENT_MAX);
                trace!(
                    "append '{name}': no space at capacity {capacity}, growing to {}",
                    capacity + increment
                );
                buffer.reallocate(capacity + increment).map_err(|e| match e {
                    Error::AllocationFailed(code) => Error::append_failed(name, code),
                    other => other,
                })?;
            }
            Err(code) => return Err(Error::append_failed(name, code)),
        }
    }
}

/// Serializes one value to its wire payload (ohne Id/Tag/Laengen-Prefix).
fn serialize_payload(buffer: &TypedBuffer, name: &str, value: &FieldValue) -> Result<Vec<u8>> {
    match value {
        FieldValue::Short(v) => Ok(v.to_le_bytes().to_vec()),
        FieldValue::Long(v) => Ok(v.to_le_bytes().to_vec()),
        FieldValue::Char(v) => Ok(vec![*v as u8]),
        FieldValue::Float(v) => Ok(v.to_le_bytes().to_vec()),
        FieldValue::Double(v) => Ok(v.to_le_bytes().to_vec()),
        FieldValue::String(s) => {
            let mut encoded = buffer.text_encoding().encode_str(s)?;
            encoded.push(0);
            if u32::try_from(encoded.len()).is_err() {
                return Err(Error::OutOfRange(name.to_string()));
            }
            Ok(encoded)
        }
        FieldValue::Carray(data) => {
            if u32::try_from(data.len()).is_err() {
                return Err(Error::OutOfRange(name.to_string()));
            }
            Ok(data.clone())
        }
        FieldValue::Fml32(nested) => {
            // Der Quell-Buffer wird gelesen, nicht konsumiert.
            let bytes = nested.bytes().ok_or(Error::NotAllocated)?;
            if nested.wire_type() != "FML32" {
                return Err(Error::wire_type_mismatch("FML32", nested.wire_type()));
            }
            if !record::is_fielded(bytes) {
                return Err(Error::NotFielded);
            }
            let used = record::bytes_used(bytes).map_err(Error::FinalizeFailed)?;
            if u32::try_from(used).is_err() {
                return Err(Error::OutOfRange(name.to_string()));
            }
            Ok(bytes[..used].to_vec())
        }
    }
}
