//! Metadata resolution against on-disk and bundled stores.

use hadesgeom_core::{CapSide, DetectorKind, MetadataError};
use hadesgeom_meta::{DirectoryStore, MetadataResolver};
use std::fs;

const DIODE_JSON: &str = r#"{
  "name": "B00091B",
  "type": "bege",
  "production": {"order": 0, "slice": "B"},
  "daq": {"rawid": 1104000},
  "geometry": {
    "height_in_mm": 32.5,
    "radius_in_mm": 36.0,
    "groove": {"depth_in_mm": 2.0, "radius_in_mm": {"inner": 7.5, "outer": 10.5}}
  }
}"#;

const HADES_YAML: &str = "
holder:
  cylinder:
    inner: {radius_in_mm: 36.5, height_in_mm: 33.0}
    outer: {radius_in_mm: 38.5, height_in_mm: 35.0}
wrap:
  inner: {radius_in_mm: 39.0, height_in_mm: 36.0}
  outer: {radius_in_mm: 39.2, height_in_mm: 36.2}
";

#[test]
fn test_directory_stores() {
    let diodes = tempfile::tempdir().unwrap();
    let hades = tempfile::tempdir().unwrap();
    fs::write(diodes.path().join("B00091B.json"), DIODE_JSON).unwrap();
    fs::write(hades.path().join("B00091B.yaml"), HADES_YAML).unwrap();

    let resolver = MetadataResolver::new(
        DirectoryStore::new("diode", diodes.path()),
        DirectoryStore::new("holder/wrap", hades.path()),
    );
    let desc = resolver.resolve("B00091B").unwrap();
    assert_eq!(desc.kind, DetectorKind::Bege);
    assert_eq!(desc.uid, 1_104_000);
    assert_eq!(desc.holder.cap, CapSide::Bottom);
    assert_eq!(desc.wrap.cap, CapSide::Top);
    assert!(desc.crystal.groove.is_some());

    match resolver.resolve("B00092A") {
        Err(MetadataError::NotFound { detector, store }) => {
            assert_eq!(detector, "B00092A");
            assert_eq!(store, "diode");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_malformed_document() {
    let diodes = tempfile::tempdir().unwrap();
    let hades = tempfile::tempdir().unwrap();
    fs::write(diodes.path().join("B00091B.json"), "{\"name\": ").unwrap();
    fs::write(hades.path().join("B00091B.yaml"), HADES_YAML).unwrap();

    let resolver = MetadataResolver::new(
        DirectoryStore::new("diode", diodes.path()),
        DirectoryStore::new("holder/wrap", hades.path()),
    );
    let err = resolver.resolve("B00091B").unwrap_err();
    assert!(matches!(err, MetadataError::Malformed { .. }));
    assert_eq!(err.detector(), "B00091B");
}

#[test]
fn test_public_data_resolves_any_name() {
    let resolver = MetadataResolver::public();
    for (name, kind) in [("V07302A", DetectorKind::Icpc), ("B00035B", DetectorKind::Bege)] {
        let desc = resolver.resolve(name).unwrap();
        assert_eq!(desc.name, name);
        assert_eq!(desc.kind, kind);
        assert_eq!(desc.production.order, 0);
        assert_eq!(desc.production.slice, "A");
        assert!(!desc.holder.rings.is_empty());
    }
}
