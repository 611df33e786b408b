//! Text encodings for string fields.
//!
//! Jeder `TypedBuffer` traegt ein Text-Encoding, das beim Schreiben und
//! Lesen von String-Inhalten angewendet wird. Der Default ist prozessweit
//! konfigurierbar (analog zur mbstring-Konfiguration der Original-API) und
//! pro Buffer unabhaengig ueberschreibbar.
//!
//! Die Menge der Encodings ist bewusst geschlossen; die Transcodierung ist
//! in beide Richtungen verlustfrei oder schlaegt mit [`Error::BadEncoding`]
//! fehl — niemals stilles Ersetzen von Zeichen.
//!
//! # Beispiel
//!
//! ```
//! use fmlbuf::encoding::TextEncoding;
//!
//! let bytes = TextEncoding::Latin1.encode_str("café").unwrap();
//! assert_eq!(bytes, [0x63, 0x61, 0x66, 0xE9]);
//! assert_eq!(TextEncoding::Latin1.decode_bytes(&bytes).unwrap(), "café");
//! ```

use std::sync::atomic::{AtomicU8, Ordering};

use crate::{Error, Result};

/// Character encoding applied to string content of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// UTF-8 (default).
    #[default]
    Utf8,
    /// ISO-8859-1. Jedes Byte ist der gleichnamige Unicode-Codepoint.
    Latin1,
    /// 7-bit ASCII. Strikte Teilmenge von UTF-8 und Latin-1.
    Ascii,
}

/// Prozessweiter Default, als `repr`-Wert von [`TextEncoding`] gespeichert.
static DEFAULT_ENCODING: AtomicU8 = AtomicU8::new(0);

impl TextEncoding {
    fn to_repr(self) -> u8 {
        match self {
            Self::Utf8 => 0,
            Self::Latin1 => 1,
            Self::Ascii => 2,
        }
    }

    fn from_repr(repr: u8) -> Self {
        match repr {
            1 => Self::Latin1,
            2 => Self::Ascii,
            _ => Self::Utf8,
        }
    }

    /// Canonical lowercase name, used in error payloads and log lines.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Ascii => "ascii",
        }
    }

    /// Encodes `s` into this encoding's byte representation.
    ///
    /// Returns [`Error::BadEncoding`] if a character is not representable
    /// (codepoint > U+00FF for Latin-1, > U+007F for ASCII).
    pub fn encode_str(self, s: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(s.as_bytes().to_vec()),
            Self::Latin1 => {
                let mut out = Vec::with_capacity(s.len());
                for ch in s.chars() {
                    let cp = ch as u32;
                    if cp > 0xFF {
                        return Err(Error::BadEncoding { encoding: self.name() });
                    }
                    out.push(cp as u8);
                }
                Ok(out)
            }
            Self::Ascii => {
                if s.is_ascii() {
                    Ok(s.as_bytes().to_vec())
                } else {
                    Err(Error::BadEncoding { encoding: self.name() })
                }
            }
        }
    }

    /// Decodes bytes produced under this encoding back into a string.
    ///
    /// Returns [`Error::BadEncoding`] for byte sequences that are not valid
    /// in this encoding (malformed UTF-8, bytes >= 0x80 for ASCII).
    /// Latin-1 decoding cannot fail: every byte maps to a codepoint.
    pub fn decode_bytes(self, bytes: &[u8]) -> Result<String> {
        match self {
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|_| Error::BadEncoding { encoding: self.name() }),
            Self::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
            Self::Ascii => {
                if bytes.is_ascii() {
                    let s = std::str::from_utf8(bytes)
                        .expect("ASCII-Bytes sind valides UTF-8");
                    Ok(s.to_string())
                } else {
                    Err(Error::BadEncoding { encoding: self.name() })
                }
            }
        }
    }
}

/// Returns the process-wide default text encoding for new buffers.
pub fn default_encoding() -> TextEncoding {
    TextEncoding::from_repr(DEFAULT_ENCODING.load(Ordering::Relaxed))
}

/// Sets the process-wide default text encoding.
///
/// Wirkt nur auf danach erzeugte Buffer; bestehende Buffer behalten ihr
/// Encoding bis `set_text_encoding`.
pub fn set_default_encoding(encoding: TextEncoding) {
    DEFAULT_ENCODING.store(encoding.to_repr(), Ordering::Relaxed);
}
