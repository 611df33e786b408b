//! Central error types for the fielded-buffer engine.
//!
//! Jede Engine-Operation liefert ein typisiertes `Result`; es gibt keinen
//! Exception-artigen Kontrollfluss. Varianten, die aus der Allokator- oder
//! Record-Schicht stammen, tragen den nativen Diagnose-Code (Ferror/tperrno-
//! Nummerierung, siehe `native`).

use core::fmt;

use crate::native::{NativeCode, code_name};
use crate::value::FieldKind;

/// All error conditions raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The allocator refused an allocation (unknown wire type, invalid size,
    /// out of memory).
    AllocationFailed(NativeCode),
    /// Initializing the fielded record structure failed.
    InitFailed(NativeCode),
    /// Appending a field failed for a reason other than insufficient space.
    AppendFailed { field: String, code: NativeCode },
    /// Reading back the authoritative encoded size failed.
    FinalizeFailed(NativeCode),
    /// A format conversion was refused by the record layer.
    ConversionFailed(NativeCode),
    /// The conversion growth budget (5 doubling attempts) was exhausted.
    ///
    /// Getrennt von `ConversionFailed`, damit Aufrufer "passt nie" von
    /// "etwas anderes ist kaputt" unterscheiden koennen.
    ConversionOutOfSpace,
    /// An operation required buffer content but the buffer is empty.
    NotAllocated,
    /// A resize was requested on a buffer that was never allocated.
    NoBuffer,
    /// The field catalog has no entry for the given name.
    UnknownField(String),
    /// The supplied value's runtime variant does not match the catalog's
    /// type tag for the field.
    TypeMismatch {
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },
    /// The buffer's self-reported wire type differs from the expected one.
    WireTypeMismatch { expected: String, actual: String },
    /// A nested FML32 value was supplied while encoding a plain FML record.
    UnsupportedNesting(String),
    /// A numeric or length representation does not fit its fixed-width
    /// wire target. Never truncated silently.
    OutOfRange(String),
    /// The buffer content is not a valid fielded record.
    NotFielded,
    /// String bytes are not representable or not decodable under the
    /// buffer's configured text encoding.
    BadEncoding { encoding: &'static str },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed(code) => {
                write!(f, "buffer allocation refused ({})", code_name(*code))
            }
            Self::InitFailed(code) => {
                write!(f, "fielded record init failed ({})", code_name(*code))
            }
            Self::AppendFailed { field, code } => {
                write!(f, "append of field '{field}' failed ({})", code_name(*code))
            }
            Self::FinalizeFailed(code) => {
                write!(f, "record finalize failed ({})", code_name(*code))
            }
            Self::ConversionFailed(code) => {
                write!(f, "format conversion failed ({})", code_name(*code))
            }
            Self::ConversionOutOfSpace => {
                write!(f, "format conversion growth budget exhausted (5 attempts)")
            }
            Self::NotAllocated => write!(f, "buffer holds no allocation"),
            Self::NoBuffer => write!(f, "resize requested but no buffer was allocated"),
            Self::UnknownField(name) => write!(f, "field '{name}' not in catalog"),
            Self::TypeMismatch { field, expected, actual } => {
                write!(f, "field '{field}': expected {expected}, got {actual}")
            }
            Self::WireTypeMismatch { expected, actual } => {
                write!(f, "wire type mismatch: expected {expected}, got {actual}")
            }
            Self::UnsupportedNesting(name) => {
                write!(f, "field '{name}': nested FML32 value not allowed in plain FML record")
            }
            Self::OutOfRange(name) => {
                write!(f, "field '{name}': value out of range for its wire representation")
            }
            Self::NotFielded => write!(f, "buffer content is not a fielded record (FNOTFLD)"),
            Self::BadEncoding { encoding } => {
                write!(f, "text not representable under encoding {encoding}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Erstellt einen `AppendFailed` Fehler mit Feldnamen-Kontext.
    pub fn append_failed(field: impl Into<String>, code: NativeCode) -> Self {
        Self::AppendFailed { field: field.into(), code }
    }

    /// Erstellt einen `TypeMismatch` Fehler mit Feldnamen-Kontext.
    pub fn type_mismatch(field: impl Into<String>, expected: FieldKind, actual: FieldKind) -> Self {
        Self::TypeMismatch { field: field.into(), expected, actual }
    }

    /// Erstellt einen `WireTypeMismatch` Fehler.
    pub fn wire_type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::WireTypeMismatch { expected: expected.into(), actual: actual.into() }
    }
}

/// A convenience `Result` type alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
