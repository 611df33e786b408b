//! Format conversion between the 16-bit and 32-bit record variants.
//!
//! Spiegel von F16to32/F32to16: der Quell-Record wird Entry fuer Entry in
//! den Ziel-Buffer re-emittiert. Meldet die Record-Schicht `FNOSPACE`, wird
//! der Ziel-Buffer auf das Doppelte vergroessert und der ganze Versuch
//! wiederholt — maximal 5 Versuche, danach [`Error::ConversionOutOfSpace`].
//! Jeder andere Fehler (inklusive einer Allokator-Ablehnung der verdoppelten
//! Groesse) ist sofort terminal als [`Error::ConversionFailed`].
//!
//! Die Quelle wird gelesen, nie konsumiert; sie bleibt nach der Konversion
//! unveraendert gueltig.

use log::{trace, warn};

use crate::buffer::TypedBuffer;
use crate::native;
use crate::record::{self, NResult, RecordVariant};
use crate::{Error, Result};

/// Total attempt budget per conversion (first try plus four doublings).
pub const MAX_ATTEMPTS: u32 = 5;

/// Converts a 16-bit-id record into a 32-bit-id record.
///
/// `src` muss ein gueltiges `FML`-Record sein, `dst` ein allokierter
/// `FML32`-Buffer; dessen Kapazitaet waechst bei Bedarf.
pub fn widen(src: &TypedBuffer, dst: &mut TypedBuffer) -> Result<()> {
    convert(src, dst, RecordVariant::Fml, RecordVariant::Fml32)
}

/// Converts a 32-bit-id record into a 16-bit-id record.
///
/// Ids ausserhalb des 16-bit-Raums und Nested-FML32-Entries sind nicht
/// darstellbar und enden als `ConversionFailed` (FBADFLD bzw. FTYPERR).
pub fn narrow(src: &TypedBuffer, dst: &mut TypedBuffer) -> Result<()> {
    convert(src, dst, RecordVariant::Fml32, RecordVariant::Fml)
}

fn convert(
    src: &TypedBuffer,
    dst: &mut TypedBuffer,
    src_variant: RecordVariant,
    dst_variant: RecordVariant,
) -> Result<()> {
    let src_bytes = src.bytes().ok_or(Error::NotAllocated)?;
    if src.wire_type() != src_variant.wire_type() {
        return Err(Error::wire_type_mismatch(src_variant.wire_type(), src.wire_type()));
    }
    if !record::is_fielded(src_bytes) {
        return Err(Error::NotFielded);
    }
    if dst.capacity() == 0 {
        return Err(Error::NoBuffer);
    }
    if dst.wire_type() != dst_variant.wire_type() {
        return Err(Error::wire_type_mismatch(dst_variant.wire_type(), dst.wire_type()));
    }

    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = {
            let dst_bytes = dst.bytes_mut().ok_or(Error::NoBuffer)?;
            reemit(src_bytes, dst_bytes, dst_variant)
        };
        match outcome {
            Ok(used) => {
                dst.set_used(used);
                return Ok(());
            }
            Err(code) if code == native::FNOSPACE && attempt < MAX_ATTEMPTS => {
                let capacity = dst.capacity();
                trace!(
                    "conversion attempt {attempt}: destination too small, \
                     doubling {capacity} -> {}",
                    capacity * 2
                );
                dst.reallocate(capacity * 2).map_err(|e| match e {
                    Error::AllocationFailed(code) => Error::ConversionFailed(code),
                    other => other,
                })?;
            }
            Err(code) if code == native::FNOSPACE => {
                warn!(
                    "conversion to {} gave up after {MAX_ATTEMPTS} attempts \
                     (destination capacity {})",
                    dst_variant.wire_type(),
                    dst.capacity()
                );
                return Err(Error::ConversionOutOfSpace);
            }
            Err(code) => return Err(Error::ConversionFailed(code)),
        }
    }
    Err(Error::ConversionOutOfSpace)
}

/// One full re-emit of `src` into `dst`'s current capacity.
///
/// Liefert bei Erfolg die autoritative Groesse des Ziel-Records.
fn reemit(src: &[u8], dst: &mut [u8], dst_variant: RecordVariant) -> NResult<usize> {
    record::init(dst, dst_variant)?;
    for item in record::entries(src)? {
        let entry = item?;
        record::append(dst, dst_variant, entry.id, entry.tag, entry.payload)?;
    }
    record::bytes_used(dst)
}
