//! fmlbuf – typed fielded-buffer encoding engine (FML / FML32)
//!
//! Baut, vergroessert und reinterpretiert selbstbeschreibende binaere
//! Payloads aus benannten, typisierten Feldwerten: das klassische
//! FML-Wire-Format und seine 32-bit-Id-Variante FML32. Der Kern besteht aus
//! dem besitzergefuehrten [`TypedBuffer`], dem Encoder mit Grow-and-Retry,
//! der Validierung encodierter Records und der 16⇄32-bit Format-Konversion.
//!
//! # Beispiel
//!
//! ```
//! use fmlbuf::buffer::TypedBuffer;
//! use fmlbuf::catalog::MapCatalog;
//! use fmlbuf::value::{FieldBinding, FieldKind, FieldValue, make_field_id32};
//! use fmlbuf::{decoder, encoder};
//!
//! // Katalog: Name -> (Id, Typ). Aufbau ist Sache des Aufrufers.
//! let mut catalog = MapCatalog::new();
//! let id = make_field_id32(FieldKind::String, 1).unwrap();
//! catalog.insert("T_NAME", FieldBinding::new(id, FieldKind::String));
//!
//! // Encode
//! let mut buf = TypedBuffer::new();
//! buf.allocate("FML32", "", 64).unwrap();
//! encoder::encode(&mut buf, &catalog, &[("T_NAME", FieldValue::String("Hello".into()))])
//!     .unwrap();
//!
//! // Validate
//! decoder::validate(&buf, "FML32").unwrap();
//! assert!(buf.used() > 0);
//! ```

pub mod buffer;
pub mod catalog;
pub mod convert;
pub mod decoder;
pub mod encoder;
pub mod encoding;
pub mod error;
pub mod native;
pub mod record;
pub mod value;

pub use error::{Error, Result};

/// IndexMap mit ahash (deterministische Iteration + schnelles Hashing).
pub(crate) type FastIndexMap<K, V> = indexmap::IndexMap<K, V, ahash::RandomState>;

// Public API: Buffer und Werte
pub use buffer::TypedBuffer;
pub use catalog::{FieldCatalog, MapCatalog};
pub use encoding::{TextEncoding, default_encoding, set_default_encoding};
pub use value::{FieldBinding, FieldKind, FieldValue};

// Public API: Record-Variante (16-bit vs 32-bit Ids)
pub use record::RecordVariant;
