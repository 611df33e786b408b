//! Field catalog seam: name → (id, kind) lookup.
//!
//! Der Katalog ist ein externer Kollaborateur des Encoders. Sein Aufbau
//! (Field-Table-Dateien, Auswahl via Umgebung) liegt ausserhalb dieses
//! Crates; hier lebt nur die Lookup-Schnittstelle plus eine Map-basierte
//! Implementierung fuer Aufrufer und Tests.
//!
//! # Beispiel
//!
//! ```
//! use fmlbuf::catalog::{FieldCatalog, MapCatalog};
//! use fmlbuf::value::{FieldBinding, FieldKind, make_field_id32};
//!
//! let mut catalog = MapCatalog::new();
//! let id = make_field_id32(FieldKind::Long, 100).unwrap();
//! catalog.insert("T_COUNT", FieldBinding::new(id, FieldKind::Long));
//!
//! let binding = catalog.lookup("T_COUNT").unwrap();
//! assert_eq!(binding.kind, FieldKind::Long);
//! assert!(catalog.lookup("T_MISSING").is_none());
//! ```

use crate::FastIndexMap;
use crate::value::FieldBinding;

/// Lookup table resolving a field name to its binding.
pub trait FieldCatalog {
    /// Resolves `name`, or `None` if the catalog has no such field.
    fn lookup(&self, name: &str) -> Option<FieldBinding>;
}

/// Map-backed [`FieldCatalog`] with deterministic iteration order
/// (insertion order, wie bei Field-Table-Dateien ueblich).
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    map: FastIndexMap<String, FieldBinding>,
}

impl MapCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self { map: FastIndexMap::default() }
    }

    /// Inserts or replaces a binding for `name`.
    ///
    /// Returns the previous binding if the name was already present.
    pub fn insert(&mut self, name: impl Into<String>, binding: FieldBinding) -> Option<FieldBinding> {
        self.map.insert(name.into(), binding)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Iterates bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldBinding)> {
        self.map.iter().map(|(name, binding)| (name.as_str(), binding))
    }
}

impl FieldCatalog for MapCatalog {
    fn lookup(&self, name: &str) -> Option<FieldBinding> {
        self.map.get(name).copied()
    }
}
