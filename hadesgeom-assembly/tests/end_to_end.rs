//! Full construction from in-memory metadata.

use approx::assert_abs_diff_eq;
use hadesgeom_assembly::{
    Assemblies, Assembly, BuildError, GeometryPipeline, CASTLE_NAME, SOURCE_HOLDER_NAME,
    SOURCE_NAME, UNIT_NAME,
};
use hadesgeom_core::{LeadCastle, MeasurementConfig, MetadataError, SourcePosition, Vec3, Volume};
use hadesgeom_meta::{Document, InMemoryStore, MetadataResolver, HADES_STORE};

const DIODE: &str = "
name: V01234A
type: icpc
production: {order: 1, slice: A}
daq: {rawid: 1110400}
geometry:
  height_in_mm: 90.0
  radius_in_mm: 35.0
  borehole: {radius_in_mm: 5.0, depth_in_mm: 60.0}
  groove: {depth_in_mm: 2.0, radius_in_mm: {inner: 8.0, outer: 11.0}}
  taper:
    top: {outer: {height_in_mm: 3.0, angle_in_deg: 45.0}}
    bottom: {outer: {height_in_mm: 0.0, angle_in_deg: 0.0}}
";

const HADES: &str = "
holder:
  cylinder:
    inner: {radius_in_mm: 36.0, height_in_mm: 91.0}
    outer: {radius_in_mm: 38.0, height_in_mm: 93.0}
wrap:
  inner: {radius_in_mm: 38.5, height_in_mm: 94.0}
  outer: {radius_in_mm: 39.5, height_in_mm: 95.0}
";

fn resolver(with_hades: bool) -> MetadataResolver {
    let diodes = InMemoryStore::new("diode").with("V01234A", Document::yaml(DIODE));
    let mut hades = InMemoryStore::new(HADES_STORE);
    if with_hades {
        hades.insert("V01234A", Document::yaml(HADES));
    }
    MetadataResolver::new(diodes, hades)
}

fn config(r: f64, phi: f64, z: f64) -> MeasurementConfig {
    MeasurementConfig {
        source: SourcePosition::new(r, phi, z),
        lead_castle: LeadCastle::Table1,
    }
}

fn construct(measurement: &str, cfg: &MeasurementConfig) -> Result<Volume, BuildError> {
    GeometryPipeline::new().construct(&resolver(true), "V01234A", measurement, cfg)
}

#[test]
fn test_collimated_americium_top_scan() {
    let world = construct("am_HS1_top_dlt", &config(86.0, 0.0, 3.0)).unwrap();
    world.validate().unwrap();

    let unit = world.find(UNIT_NAME).unwrap();
    let names: Vec<&str> = unit.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["V01234A", "holder", "wrap"]);

    let sensitive = world.sensitive_volumes();
    assert_eq!(sensitive.len(), 1);
    assert_eq!(
        sensitive[0].sensitive.as_ref().unwrap().to_string(),
        "germanium:1110400"
    );

    let sources: Vec<_> = world
        .descendants()
        .into_iter()
        .filter(|(_, v)| v.name == SOURCE_NAME)
        .collect();
    assert_eq!(sources.len(), 1);

    // 86 mm minus the 66 mm holder offset, measured from the cryostat top
    let frame = world.global_frame(SOURCE_NAME).unwrap();
    assert_abs_diff_eq!(frame.origin.x, 20.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frame.origin.y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frame.origin.z, 250.0 + 171.0 + 3.0, epsilon = 1e-9);

    let castle = world.child(CASTLE_NAME).unwrap();
    assert!(castle.is_assembly());
    assert!(castle.child("castle_front").is_some());
}

#[test]
fn test_on_axis_source_ignores_angle() {
    let reference = construct("th_HS2_top_scan", &config(0.0, 0.0, 0.0)).unwrap();
    let expected = reference.global_frame(SOURCE_NAME).unwrap().origin;
    for phi in [30.0, 90.0, 200.0, 359.0] {
        let world = construct("th_HS2_top_scan", &config(0.0, phi, 0.0)).unwrap();
        let origin = world.global_frame(SOURCE_NAME).unwrap().origin;
        assert!(origin.max_abs_diff(&expected) < 1e-9);
    }
}

#[test]
fn test_lateral_thorium_source() {
    let world = construct("th_HS2_lat_scan", &config(86.0, 0.0, -40.0)).unwrap();

    let frame = world.global_frame(SOURCE_NAME).unwrap();
    assert_abs_diff_eq!(frame.origin.x, 86.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frame.origin.y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frame.origin.z, 250.0 + 171.0 - 40.0, epsilon = 1e-9);
    let axis = frame.basis.apply(Vec3::new(0.0, 0.0, 1.0));
    assert_abs_diff_eq!(axis.x, 1.0, epsilon = 1e-9);

    // the ring sits at the source height with its pocket toward the source
    let ring = world.global_frame(SOURCE_HOLDER_NAME).unwrap();
    assert_abs_diff_eq!(ring.origin.z, frame.origin.z, epsilon = 1e-9);
    let pocket = ring.basis.apply(Vec3::new(1.0, 0.0, 0.0));
    assert_abs_diff_eq!(pocket.x, 1.0, epsilon = 1e-9);

    GeometryPipeline::new()
        .with_overlap_check(true)
        .construct(&resolver(true), "V01234A", "th_HS2_lat_scan", &config(86.0, 0.0, -40.0))
        .unwrap();
}

#[test]
fn test_lateral_source_quarter_turn() {
    let world = construct("ba_HS4_lat_scan", &config(86.0, 90.0, -40.0)).unwrap();

    let frame = world.global_frame(SOURCE_NAME).unwrap();
    assert_abs_diff_eq!(frame.origin.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frame.origin.y, 86.0, epsilon = 1e-9);
    assert_abs_diff_eq!(frame.origin.z, 250.0 + 171.0 - 40.0, epsilon = 1e-9);
    let axis = frame.basis.apply(Vec3::new(0.0, 0.0, 1.0));
    assert_abs_diff_eq!(axis.y, 1.0, epsilon = 1e-9);

    // only lateral thorium has a holder model
    assert!(world.child(SOURCE_HOLDER_NAME).is_none());
}

#[test]
fn test_detector_only_selection() {
    let world = GeometryPipeline::new()
        .with_assemblies(Assemblies::detector_only().with(Assembly::Source))
        .construct(
            &resolver(true),
            "V01234A",
            "ba_HS4_lat_scan",
            &config(90.0, 45.0, -40.0),
        )
        .unwrap();
    let names: Vec<&str> = world.children().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, [UNIT_NAME, SOURCE_NAME]);
}

#[test]
fn test_missing_holder_metadata() {
    let err = GeometryPipeline::new()
        .construct(
            &resolver(false),
            "V01234A",
            "am_HS1_top_dlt",
            &config(86.0, 0.0, 3.0),
        )
        .unwrap_err();
    match err {
        BuildError::Metadata(MetadataError::NotFound { detector, store }) => {
            assert_eq!(detector, "V01234A");
            assert_eq!(store, HADES_STORE);
        }
        other => panic!("unexpected error: {other}"),
    }
}
