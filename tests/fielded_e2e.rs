//! End-to-End-Tests des Fielded-Pfads: Encode → Validate → Konversion.
//!
//! Alles laeuft ueber die oeffentliche API; der Byte-Vergleich nach
//! widen → narrow ersetzt den Blick in das (nicht oeffentliche) Layout.

use fmlbuf::buffer::TypedBuffer;
use fmlbuf::catalog::MapCatalog;
use fmlbuf::value::{FieldBinding, FieldKind, FieldValue, make_field_id16, make_field_id32};
use fmlbuf::{Error, convert, decoder, encoder};

fn catalog16() -> MapCatalog {
    let mut c = MapCatalog::new();
    let mut add = |name: &str, kind: FieldKind, number: u16| {
        let id = make_field_id16(kind, number).unwrap();
        c.insert(name, FieldBinding::new(id as u32, kind));
    };
    add("T_ACCOUNT", FieldKind::Long, 10);
    add("T_BALANCE", FieldKind::Double, 11);
    add("T_OWNER", FieldKind::String, 12);
    add("T_NOTE", FieldKind::Carray, 13);
    c
}

fn allocated(wire_type: &str, size: usize) -> TypedBuffer {
    let mut buf = TypedBuffer::new();
    buf.allocate(wire_type, "", size).unwrap();
    buf
}

/// Voller Zyklus: FML encoden, validieren, nach FML32 weiten, zurueck
/// verengen — das Ergebnis ist byte-identisch mit dem Original.
#[test]
fn encode_validate_convert_cycle() {
    let mut src = allocated("FML", 256);
    encoder::encode(
        &mut src,
        &catalog16(),
        &[
            ("T_ACCOUNT", FieldValue::Long(1_000_042)),
            ("T_BALANCE", FieldValue::Double(-12.5)),
            ("T_OWNER", FieldValue::String("mueller".into())),
            ("T_NOTE", FieldValue::Carray(vec![0xCA, 0xFE])),
        ],
    )
    .unwrap();
    decoder::validate(&src, "FML").unwrap();

    let mut wide = allocated("FML32", 16);
    convert::widen(&src, &mut wide).unwrap();
    decoder::validate(&wide, "FML32").unwrap();
    // Die Quelle wurde gelesen, nicht konsumiert.
    decoder::validate(&src, "FML").unwrap();

    let mut back = allocated("FML", 16);
    convert::narrow(&wide, &mut back).unwrap();
    decoder::validate(&back, "FML").unwrap();
    assert_eq!(back.read_bytes(), src.read_bytes());
}

/// Encode waechst aus einer Minimal-Kapazitaet beliebig weit, ohne
/// fruehere Felder zu verlieren.
#[test]
fn growth_from_minimal_capacity() {
    let mut catalog = catalog16();
    let blob_id = make_field_id16(FieldKind::Carray, 99).unwrap();
    catalog.insert("T_BLOB", FieldBinding::new(blob_id as u32, FieldKind::Carray));

    let mut buf = allocated("FML", 1);
    encoder::encode(
        &mut buf,
        &catalog,
        &[
            ("T_ACCOUNT", FieldValue::Long(7)),
            ("T_BLOB", FieldValue::Carray(vec![0x42; 200_000])),
            ("T_OWNER", FieldValue::String("after".into())),
        ],
    )
    .unwrap();
    decoder::validate(&buf, "FML").unwrap();
    assert!(buf.used() > 200_000);
    assert!(buf.capacity() >= buf.used());
}

/// Konversion in ein zu kleines Ziel endet nach 5 Versuchen mit
/// ConversionOutOfSpace — niemals in einer Endlosschleife.
#[test]
fn conversion_attempt_bound() {
    let mut src = allocated("FML", 4096);
    let mut catalog = MapCatalog::new();
    let id = make_field_id16(FieldKind::Carray, 1).unwrap();
    catalog.insert("T_BIG", FieldBinding::new(id as u32, FieldKind::Carray));
    encoder::encode(&mut src, &catalog, &[("T_BIG", FieldValue::Carray(vec![1; 1000]))]).unwrap();

    let mut dst = allocated("FML32", 1);
    let err = convert::widen(&src, &mut dst).unwrap_err();
    assert_eq!(err, Error::ConversionOutOfSpace);

    // Ein grosszuegiges Ziel nimmt dieselbe Quelle anstandslos.
    let mut dst = allocated("FML32", 4096);
    convert::widen(&src, &mut dst).unwrap();
    decoder::validate(&dst, "FML32").unwrap();
}

/// Null Felder ergeben ein minimales, aber gueltiges Record.
#[test]
fn empty_record_is_valid() {
    let mut buf = allocated("FML32", 32);
    encoder::encode(&mut buf, &MapCatalog::new(), &[]).unwrap();
    decoder::validate(&buf, "FML32").unwrap();
    assert!(buf.used() > 0);
}

/// Nested FML32 nur im FML32-Record; im FML-Record typisierter Fehler.
#[test]
fn nesting_rules() {
    let mut inner = allocated("FML32", 32);
    encoder::encode(&mut inner, &MapCatalog::new(), &[]).unwrap();

    let mut catalog = MapCatalog::new();
    let id = make_field_id32(FieldKind::Fml32, 1).unwrap();
    catalog.insert("T_INNER", FieldBinding::new(id, FieldKind::Fml32));

    let mut outer32 = allocated("FML32", 128);
    encoder::encode(&mut outer32, &catalog, &[("T_INNER", FieldValue::Fml32(inner.clone()))])
        .unwrap();
    decoder::validate(&outer32, "FML32").unwrap();

    let mut outer16 = allocated("FML", 128);
    let err = encoder::encode(&mut outer16, &catalog, &[("T_INNER", FieldValue::Fml32(inner))])
        .unwrap_err();
    assert_eq!(err, Error::UnsupportedNesting("T_INNER".into()));
}

/// Validierung unterscheidet leere, falsch getypte und unstrukturierte Buffer.
#[test]
fn validation_taxonomy() {
    assert_eq!(
        decoder::validate(&TypedBuffer::new(), "FML32").unwrap_err(),
        Error::NotAllocated
    );

    let mut fielded = allocated("FML32", 64);
    encoder::encode(&mut fielded, &MapCatalog::new(), &[]).unwrap();
    assert!(matches!(
        decoder::validate(&fielded, "FML").unwrap_err(),
        Error::WireTypeMismatch { .. }
    ));

    let unstructured = allocated("FML32", 64);
    assert_eq!(decoder::validate(&unstructured, "FML32").unwrap_err(), Error::NotFielded);
}

/// Doppelte Feldnamen: das Format erlaubt Duplikate, der Encoder haengt an.
#[test]
fn duplicates_survive_conversion() {
    let mut src = allocated("FML", 256);
    encoder::encode(
        &mut src,
        &catalog16(),
        &[
            ("T_ACCOUNT", FieldValue::Long(1)),
            ("T_ACCOUNT", FieldValue::Long(2)),
        ],
    )
    .unwrap();

    let mut wide = allocated("FML32", 256);
    convert::widen(&src, &mut wide).unwrap();
    let mut back = allocated("FML", 256);
    convert::narrow(&wide, &mut back).unwrap();
    assert_eq!(back.read_bytes(), src.read_bytes());
}
