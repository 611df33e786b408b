//! Typed buffer lifecycle: allocate, grow, read, write, release.
//!
//! `TypedBuffer` ist das owning Gegenstueck zu den rohen tpalloc/tprealloc/
//! tpfree-Handles der Original-API: ein besitzergefuehrter, wachsender
//! Byte-Block mit Wire-Typ/Subtyp-Markierung und Text-Encoding. Der rohe
//! Block verlaesst die Komponente nie; nach aussen gibt es nur die sicheren
//! Lifecycle-Operationen. Drop gibt immer frei.
//!
//! Der Allokator rundet Kapazitaeten auf (8-Byte-Vielfache, plus Typ-Minimum
//! fuer Fielded-Typen); Aufrufer lesen `capacity()` nach einem Resize neu,
//! statt die angefragte Groesse anzunehmen.
//!
//! # Beispiel
//!
//! ```
//! use fmlbuf::buffer::TypedBuffer;
//!
//! let mut buf = TypedBuffer::new();
//! buf.allocate("STRING", "", 100).unwrap();
//! buf.reallocate(300).unwrap();
//! let (wire_type, subtype, size) = buf.introspect().unwrap();
//! assert_eq!(wire_type, "STRING");
//! assert_eq!(subtype, "");
//! assert!(size >= 300);
//! buf.clear();
//! assert!(buf.introspect().is_err());
//! ```

use log::trace;

use crate::encoding::{TextEncoding, default_encoding};
use crate::native::{self, NativeCode};
use crate::record;
use crate::{Error, Result};

/// Wire types known to the allocator.
const KNOWN_WIRE_TYPES: [&str; 4] = ["STRING", "CARRAY", "FML", "FML32"];

/// Hard allocator ceiling (1 GiB). Requests above are refused with `FMALLOC`.
const MAX_ALLOC: usize = 1 << 30;

/// Owned, resizable byte buffer tagged with a wire type and subtype.
///
/// Invarianten: `capacity() == 0` genau dann wenn kein Block gehalten wird;
/// `wire_type` ist gesetzt sobald allokiert wurde; `clear` gibt den Block
/// frei ohne Wire-Typ oder Text-Encoding zu aendern.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedBuffer {
    bytes: Option<Vec<u8>>,
    wire_type: String,
    wire_subtype: String,
    /// Logical content size in bytes (<= capacity). For fielded buffers this
    /// mirrors the record header's authoritative `bytes_used` after finalize.
    used: usize,
    text_encoding: TextEncoding,
}

/// Rounds a requested size to the allocator's granted capacity.
///
/// Fielded-Typen brauchen mindestens den Record-Header; alles wird auf das
/// naechste 8-Byte-Vielfache gerundet.
fn round_capacity(wire_type: &str, size: usize) -> usize {
    let min = match wire_type {
        "FML" | "FML32" => record::HEADER_LEN,
        _ => 1,
    };
    size.max(min).next_multiple_of(8)
}

/// Validates an allocation request, returning the granted capacity or the
/// native refusal code.
fn check_alloc(wire_type: &str, size: usize) -> core::result::Result<usize, NativeCode> {
    if !KNOWN_WIRE_TYPES.contains(&wire_type) {
        return Err(native::TPENOENT);
    }
    if size == 0 {
        return Err(native::TPEINVAL);
    }
    if size > MAX_ALLOC {
        return Err(native::FMALLOC);
    }
    Ok(round_capacity(wire_type, size))
}

impl Default for TypedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TypedBuffer {
    /// Creates an empty, unallocated buffer with the process default
    /// text encoding.
    pub fn new() -> Self {
        Self {
            bytes: None,
            wire_type: String::new(),
            wire_subtype: String::new(),
            used: 0,
            text_encoding: default_encoding(),
        }
    }

    /// Releases any held bytes and resets the logical size to 0.
    ///
    /// Idempotent; Wire-Typ und Text-Encoding bleiben erhalten.
    pub fn clear(&mut self) {
        self.bytes = None;
        self.used = 0;
    }

    /// Current allocated capacity in bytes; 0 when unallocated.
    pub fn capacity(&self) -> usize {
        self.bytes.as_ref().map_or(0, Vec::len)
    }

    /// Logical content size in bytes; 0 when unallocated or empty.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Wire type tag; empty until the first allocation.
    pub fn wire_type(&self) -> &str {
        &self.wire_type
    }

    /// Wire subtype tag; empty when absent.
    pub fn wire_subtype(&self) -> &str {
        &self.wire_subtype
    }

    /// Text encoding applied to string content of this buffer.
    pub fn text_encoding(&self) -> TextEncoding {
        self.text_encoding
    }

    /// Sets the text encoding for subsequent string reads and writes.
    /// Pure metadata mutation; never fails and never touches content.
    pub fn set_text_encoding(&mut self, encoding: TextEncoding) {
        self.text_encoding = encoding;
    }

    /// Releases any previous content, then allocates `size` bytes tagged
    /// with `(wire_type, wire_subtype)` (empty subtype = absent).
    ///
    /// The granted capacity may exceed `size` (allocator rounding); re-read
    /// [`capacity`](Self::capacity) after success. On refusal the buffer is
    /// empty — the previous content is released either way.
    pub fn allocate(&mut self, wire_type: &str, wire_subtype: &str, size: usize) -> Result<()> {
        self.clear();
        let granted = check_alloc(wire_type, size).map_err(Error::AllocationFailed)?;
        self.bytes = Some(vec![0; granted]);
        self.wire_type = wire_type.to_string();
        self.wire_subtype = wire_subtype.to_string();
        trace!("allocate {wire_type}/{wire_subtype}: requested {size}, granted {granted}");
        Ok(())
    }

    /// Resizes the existing allocation to `new_size`, preserving the wire
    /// type/subtype and as much content as fits.
    ///
    /// Fails with [`Error::NoBuffer`] if nothing was allocated. The granted
    /// capacity is rounded like [`allocate`](Self::allocate).
    pub fn reallocate(&mut self, new_size: usize) -> Result<()> {
        let Some(bytes) = self.bytes.as_mut() else {
            return Err(Error::NoBuffer);
        };
        let granted = check_alloc(&self.wire_type, new_size).map_err(Error::AllocationFailed)?;
        trace!(
            "reallocate {}: {} -> {} (requested {new_size})",
            self.wire_type,
            bytes.len(),
            granted
        );
        bytes.resize(granted, 0);
        self.used = self.used.min(granted);
        Ok(())
    }

    /// Returns `(wire_type, wire_subtype, size)` without decoding content;
    /// `size` is the granted capacity.
    ///
    /// Fails with [`Error::NotAllocated`] when the buffer is empty.
    pub fn introspect(&self) -> Result<(&str, &str, usize)> {
        match &self.bytes {
            Some(bytes) => Ok((&self.wire_type, &self.wire_subtype, bytes.len())),
            None => Err(Error::NotAllocated),
        }
    }

    /// Releases any existing allocation, transcodes `s` under the buffer's
    /// text encoding and stores it NUL-terminated.
    ///
    /// Die Allokation ist exakt `len + 1` Bytes (inklusive Terminator),
    /// ohne Rundung — Spiegel der Original-Semantik fuer String-Inhalte.
    pub fn write_string(&mut self, s: &str, wire_type: &str, wire_subtype: &str) -> Result<()> {
        if !KNOWN_WIRE_TYPES.contains(&wire_type) {
            return Err(Error::AllocationFailed(native::TPENOENT));
        }
        self.clear();
        let encoded = self.text_encoding.encode_str(s)?;
        if encoded.len() + 1 > MAX_ALLOC {
            return Err(Error::AllocationFailed(native::FMALLOC));
        }
        let mut block = encoded;
        block.push(0);
        self.used = block.len() - 1;
        self.bytes = Some(block);
        self.wire_type = wire_type.to_string();
        self.wire_subtype = wire_subtype.to_string();
        Ok(())
    }

    /// Decodes the buffer's string content under the configured encoding.
    ///
    /// Fails with [`Error::NotAllocated`] when empty; returns `""` when the
    /// logical size is 0. The content is copied before decoding, so a
    /// decode failure never disturbs the live buffer.
    pub fn read_string(&self) -> Result<String> {
        let Some(bytes) = self.bytes.as_deref() else {
            return Err(Error::NotAllocated);
        };
        let limit = self.used.min(bytes.len());
        if limit == 0 {
            return Ok(String::new());
        }
        // C-String-Semantik: ein frueherer Terminator beendet den Inhalt.
        let end = memchr::memchr(0, &bytes[..limit]).unwrap_or(limit);
        let copy = bytes[..end].to_vec();
        self.text_encoding.decode_bytes(&copy)
    }

    /// Stores raw bytes without transcoding.
    ///
    /// Leerer Input laesst den Buffer unallokiert — null-lange Binaerdaten
    /// fuehren bewusst zu keiner Allokation.
    pub fn write_bytes(&mut self, data: &[u8], wire_type: &str, wire_subtype: &str) -> Result<()> {
        if !KNOWN_WIRE_TYPES.contains(&wire_type) {
            return Err(Error::AllocationFailed(native::TPENOENT));
        }
        self.clear();
        if data.is_empty() {
            return Ok(());
        }
        if data.len() > MAX_ALLOC {
            return Err(Error::AllocationFailed(native::FMALLOC));
        }
        self.bytes = Some(data.to_vec());
        self.used = data.len();
        self.wire_type = wire_type.to_string();
        self.wire_subtype = wire_subtype.to_string();
        Ok(())
    }

    /// Returns an exact copy of the logical content; empty when unallocated.
    pub fn read_bytes(&self) -> Vec<u8> {
        match self.bytes.as_deref() {
            Some(bytes) => bytes[..self.used.min(bytes.len())].to_vec(),
            None => Vec::new(),
        }
    }

    /// Raw view of the allocation for the record layer.
    pub(crate) fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    /// Mutable raw view of the allocation for the record layer.
    pub(crate) fn bytes_mut(&mut self) -> Option<&mut [u8]> {
        self.bytes.as_deref_mut()
    }

    /// Sets the logical size after a record-layer operation finished.
    pub(crate) fn set_used(&mut self, used: usize) {
        self.used = used.min(self.capacity());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TextEncoding;

    /// clear(); clear() entspricht einem einzelnen clear().
    #[test]
    fn clear_is_idempotent() {
        let mut buf = TypedBuffer::new();
        buf.allocate("CARRAY", "", 64).unwrap();
        buf.clear();
        let after_one = buf.clone();
        buf.clear();
        assert_eq!(buf, after_one);
        assert_eq!(buf.capacity(), 0);
        assert_eq!(buf.used(), 0);
    }

    /// Unknown wire type is an allocator refusal, buffer stays empty.
    #[test]
    fn allocate_unknown_type() {
        let mut buf = TypedBuffer::new();
        let err = buf.allocate("VIEW32", "", 64).unwrap_err();
        assert_eq!(err, Error::AllocationFailed(native::TPENOENT));
        assert_eq!(buf.capacity(), 0);
    }

    /// Size 0 is refused; previous content is released regardless.
    #[test]
    fn allocate_zero_size_releases_previous() {
        let mut buf = TypedBuffer::new();
        buf.write_bytes(&[1, 2, 3], "CARRAY", "").unwrap();
        let err = buf.allocate("CARRAY", "", 0).unwrap_err();
        assert_eq!(err, Error::AllocationFailed(native::TPEINVAL));
        assert_eq!(buf.capacity(), 0);
        assert!(buf.read_bytes().is_empty());
    }

    /// Allocator ceiling surfaces as FMALLOC.
    #[test]
    fn allocate_over_ceiling() {
        let mut buf = TypedBuffer::new();
        let err = buf.allocate("CARRAY", "", MAX_ALLOC + 1).unwrap_err();
        assert_eq!(err, Error::AllocationFailed(native::FMALLOC));
    }

    /// Capacity is rounded up; fielded types get at least the header.
    #[test]
    fn capacity_rounding() {
        let mut buf = TypedBuffer::new();
        buf.allocate("CARRAY", "", 3).unwrap();
        assert_eq!(buf.capacity(), 8);
        buf.allocate("FML32", "", 1).unwrap();
        assert!(buf.capacity() >= record::HEADER_LEN);
        assert_eq!(buf.capacity() % 8, 0);
    }

    /// reallocate without a prior allocation is NoBuffer.
    #[test]
    fn reallocate_needs_buffer() {
        let mut buf = TypedBuffer::new();
        assert_eq!(buf.reallocate(100).unwrap_err(), Error::NoBuffer);
    }

    /// Das konkrete STRING-Szenario: 100 -> 300 -> introspect -> clear.
    #[test]
    fn string_lifecycle_scenario() {
        let mut buf = TypedBuffer::new();
        buf.allocate("STRING", "", 100).unwrap();
        buf.reallocate(300).unwrap();
        let (wire_type, subtype, size) = buf.introspect().unwrap();
        assert_eq!(wire_type, "STRING");
        assert_eq!(subtype, "");
        assert!((300..=304).contains(&size));
        buf.clear();
        assert_eq!(buf.introspect().unwrap_err(), Error::NotAllocated);
    }

    /// Shrinking preserves the content prefix and clamps the logical size.
    #[test]
    fn reallocate_shrink_clamps_used() {
        let mut buf = TypedBuffer::new();
        buf.write_bytes(&[9; 100], "CARRAY", "").unwrap();
        buf.reallocate(16).unwrap();
        assert_eq!(buf.capacity(), 16);
        assert_eq!(buf.read_bytes(), vec![9; 16]);
    }

    /// write_string allocates exactly len+1 incl. terminator.
    #[test]
    fn write_string_exact_allocation() {
        let mut buf = TypedBuffer::new();
        buf.write_string("hello", "STRING", "").unwrap();
        assert_eq!(buf.capacity(), 6);
        assert_eq!(buf.used(), 5);
        assert_eq!(buf.read_string().unwrap(), "hello");
    }

    /// Leerer String: 1 Byte Allokation, logische Groesse 0, liest "".
    #[test]
    fn write_empty_string() {
        let mut buf = TypedBuffer::new();
        buf.write_string("", "STRING", "").unwrap();
        assert_eq!(buf.capacity(), 1);
        assert_eq!(buf.used(), 0);
        assert_eq!(buf.read_string().unwrap(), "");
    }

    /// read_string on an unallocated buffer is NotAllocated.
    #[test]
    fn read_string_unallocated() {
        let buf = TypedBuffer::new();
        assert_eq!(buf.read_string().unwrap_err(), Error::NotAllocated);
    }

    /// Zwei Encodings, gleiche logische Zeichenkette, verschiedene Bytes,
    /// jeweils verlustfrei rueckwaerts lesbar.
    #[test]
    fn string_under_two_encodings() {
        let mut buf = TypedBuffer::new();
        buf.set_text_encoding(TextEncoding::Utf8);
        buf.write_string("café", "STRING", "").unwrap();
        let utf8_bytes = buf.read_bytes();
        assert_eq!(buf.read_string().unwrap(), "café");

        buf.set_text_encoding(TextEncoding::Latin1);
        buf.write_string("café", "STRING", "").unwrap();
        let latin1_bytes = buf.read_bytes();
        assert_ne!(utf8_bytes, latin1_bytes);
        assert_eq!(buf.read_string().unwrap(), "café");
    }

    /// Nicht darstellbare Zeichen sind ein typed error, Buffer bleibt leer.
    #[test]
    fn write_string_unrepresentable() {
        let mut buf = TypedBuffer::new();
        buf.set_text_encoding(TextEncoding::Ascii);
        let err = buf.write_string("übel", "STRING", "").unwrap_err();
        assert_eq!(err, Error::BadEncoding { encoding: "ascii" });
        assert_eq!(buf.capacity(), 0);
    }

    /// Zero-length binary content performs no allocation at all.
    #[test]
    fn write_empty_bytes_stays_unallocated() {
        let mut buf = TypedBuffer::new();
        buf.write_bytes(&[], "CARRAY", "").unwrap();
        assert_eq!(buf.introspect().unwrap_err(), Error::NotAllocated);
        assert!(buf.read_bytes().is_empty());
    }

    /// Raw bytes round-trip exactly, including interior NULs.
    #[test]
    fn bytes_round_trip() {
        let mut buf = TypedBuffer::new();
        let data = vec![0xDE, 0x00, 0xAD, 0x00, 0xEF];
        buf.write_bytes(&data, "CARRAY", "BLOB").unwrap();
        assert_eq!(buf.read_bytes(), data);
        let (wire_type, subtype, size) = buf.introspect().unwrap();
        assert_eq!(wire_type, "CARRAY");
        assert_eq!(subtype, "BLOB");
        assert_eq!(size, data.len());
    }

    /// Ein frueher Terminator beendet den String-Inhalt (C-String-Semantik).
    #[test]
    fn read_string_stops_at_terminator() {
        let mut buf = TypedBuffer::new();
        buf.write_bytes(&[b'a', b'b', 0, b'x'], "STRING", "").unwrap();
        assert_eq!(buf.read_string().unwrap(), "ab");
    }

    /// set_text_encoding never touches content.
    #[test]
    fn set_encoding_is_metadata_only() {
        let mut buf = TypedBuffer::new();
        buf.write_bytes(&[1, 2, 3], "CARRAY", "").unwrap();
        let before = buf.read_bytes();
        buf.set_text_encoding(TextEncoding::Latin1);
        assert_eq!(buf.read_bytes(), before);
        assert_eq!(buf.text_encoding(), TextEncoding::Latin1);
    }
}
