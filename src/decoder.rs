//! Field decoder: validation of an encoded fielded buffer.
//!
//! Dieses Modul prueft, ob ein TypedBuffer ein dekodierbares Record des
//! erwarteten Formats traegt. Die eigentliche Wert-Extraktion ist bewusst
//! Sache des Aufrufers: eine Projektion auf konkrete Werte sitzt oberhalb
//! von `validate`, nicht hier.

use crate::buffer::TypedBuffer;
use crate::record;
use crate::{Error, Result};

/// Confirms that `buffer` holds a decodable fielded record of
/// `expected_wire_type` (`"FML"` or `"FML32"`).
///
/// Fehlerreihenfolge: leerer Buffer → [`Error::NotAllocated`]; falscher
/// Wire-Typ → [`Error::WireTypeMismatch`]; Inhalt strukturell kein Record →
/// [`Error::NotFielded`]. Malformed Buffer fallen hier auf, nie erst beim
/// spaeteren Feldzugriff.
pub fn validate(buffer: &TypedBuffer, expected_wire_type: &str) -> Result<()> {
    let (wire_type, _, _) = buffer.introspect()?;
    if wire_type != expected_wire_type {
        return Err(Error::wire_type_mismatch(expected_wire_type, wire_type));
    }
    let bytes = buffer.bytes().ok_or(Error::NotAllocated)?;
    if !record::is_fielded(bytes) {
        return Err(Error::NotFielded);
    }
    // Magic und Wire-Typ muessen dieselbe Variante nennen.
    match record::variant_of(bytes) {
        Some(variant) if variant.wire_type() == wire_type => Ok(()),
        _ => Err(Error::NotFielded),
    }
}
