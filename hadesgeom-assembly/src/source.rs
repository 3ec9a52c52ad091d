//! Radioactive sources.
//!
//! A source is an assembly whose local origin is the center of the face
//! turned toward the detector, with local +z pointing away from it. The
//! capsule holds the active pellet just behind that face; collimated and
//! ring-mounted sources add a collimator or a support ring.

use crate::error::Result;
use hadesgeom_core::{Material, Placement, Rotation, SolidKernel, SourcePosition, Vec3, Volume};
use hadesgeom_meta::{Measurement, SourceKind, SourceSide};
use std::f64::consts::{FRAC_PI_2, PI};

/// Name of the source assembly.
pub const SOURCE_NAME: &str = "source";
/// Name of the active pellet volume.
pub const ACTIVE_NAME: &str = "source_active";

/// Radial shift of the collimated americium source holder.
pub const COLLIMATED_AM_SHIFT: f64 = 66.0;

/// Capsule geometry of one source kind, in mm.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceModel {
    pub capsule_radius: f64,
    pub capsule_height: f64,
    pub capsule_material: &'static str,
    /// Capsule wall between the pellet and the detector-side face.
    pub window: f64,
    pub active_radius: f64,
    pub active_height: f64,
    pub active_material: &'static str,
    /// Copper collimator in front of the capsule: (outer radius, beam radius, height).
    pub collimator: Option<(f64, f64, f64)>,
    /// Aluminium ring around the capsule: (outer radius, height).
    pub ring: Option<(f64, f64)>,
}

impl SourceModel {
    /// Model of a source kind.
    #[must_use]
    pub fn for_kind(kind: SourceKind) -> Self {
        let steel_capsule = Self {
            capsule_radius: 4.0,
            capsule_height: 5.0,
            capsule_material: Material::STEEL,
            window: 0.2,
            active_radius: 2.5,
            active_height: 0.1,
            active_material: "G4_Am",
            collimator: None,
            ring: None,
        };
        let foil_disc = Self {
            capsule_radius: 13.0,
            capsule_height: 0.5,
            capsule_material: Material::PLEXIGLASS,
            window: 0.2,
            active_radius: 2.5,
            active_height: 0.1,
            active_material: "G4_Ba",
            collimator: None,
            ring: Some((15.0, 3.0)),
        };
        match kind {
            SourceKind::Am => steel_capsule,
            SourceKind::AmCollimated => Self {
                collimator: Some((8.0, 1.0, 25.6)),
                ..steel_capsule
            },
            SourceKind::Ba => foil_disc,
            SourceKind::Co => Self {
                active_material: "G4_Co",
                ..foil_disc
            },
            SourceKind::Cs => Self {
                active_material: "G4_Cs",
                ..foil_disc
            },
            SourceKind::Th => Self {
                capsule_height: 6.0,
                window: 0.5,
                active_radius: 1.5,
                active_height: 1.0,
                active_material: "G4_Th",
                ..steel_capsule
            },
        }
    }

    /// Axial position of the capsule center.
    #[must_use]
    pub fn capsule_center(&self) -> f64 {
        self.collimator.map_or(0.0, |c| c.2) + 0.5 * self.capsule_height
    }

    /// Axial range covered by the source in its local frame.
    ///
    /// The ring is centered on the capsule, so for thin capsules it reaches
    /// past the face toward the detector.
    #[must_use]
    pub fn axial_extent(&self) -> (f64, f64) {
        let center = self.capsule_center();
        let back = center + 0.5 * self.capsule_height;
        match self.ring {
            Some((_, height)) => (
                (center - 0.5 * height).min(0.0),
                (center + 0.5 * height).max(back),
            ),
            None => (0.0, back),
        }
    }

    /// Largest distance from the source axis.
    #[must_use]
    pub fn radius(&self) -> f64 {
        let collimator = self.collimator.map_or(0.0, |c| c.0);
        let ring = self.ring.map_or(0.0, |r| r.0);
        self.capsule_radius.max(collimator).max(ring)
    }

    /// Axial length of the source.
    #[must_use]
    pub fn length(&self) -> f64 {
        let (near, far) = self.axial_extent();
        far - near
    }
}

/// Applies the holder-specific position corrections.
///
/// The collimated americium holder sits 66 mm further in than the nominal
/// radius; a shift across the axis flips the azimuth by 180 degrees.
#[must_use]
pub fn effective_position(kind: SourceKind, position: SourcePosition) -> SourcePosition {
    if kind == SourceKind::AmCollimated && position.r_mm != 0.0 {
        SourcePosition::new(
            position.r_mm - COLLIMATED_AM_SHIFT,
            position.phi_deg,
            position.z_mm,
        )
    } else {
        position
    }
}

/// Global placement of the source assembly.
///
/// `front_face` is the global point on the detector axis the position is
/// measured from, `floor` the one bottom measurements are measured from.
#[must_use]
pub fn source_placement(
    measurement: &Measurement,
    position: SourcePosition,
    front_face: Vec3,
    floor: Vec3,
) -> Placement {
    let pos = effective_position(measurement.source, position);
    let (x, y) = pos.xy();
    match measurement.position {
        SourceSide::Top => Placement::at(front_face + Vec3::new(x, y, pos.z_mm)),
        SourceSide::Bottom => Placement::at(floor + Vec3::new(x, y, -pos.z_mm))
            .with_rotation(Rotation::new(PI, 0.0, 0.0)),
        SourceSide::Lat => {
            // local +z points radially outward
            let phi = pos.phi_deg.to_radians();
            Placement::at(front_face + Vec3::new(x, y, pos.z_mm))
                .with_rotation(Rotation::new(FRAC_PI_2, phi - FRAC_PI_2, 0.0))
        }
    }
}

/// Builds the source assembly in its local frame.
///
/// # Errors
/// Propagates kernel errors.
pub fn build_source(kernel: &dyn SolidKernel, kind: SourceKind) -> Result<Volume> {
    let model = SourceModel::for_kind(kind);
    let mut source = Volume::assembly(SOURCE_NAME);

    if let Some((radius, beam_radius, height)) = model.collimator {
        let solid = kernel.tube("source_collimator", beam_radius, radius, height)?;
        source.add_child(
            Volume::logical("source_collimator", solid, Material::COPPER)
                .with_placement(Placement::at_z(0.5 * height)),
        )?;
    }

    let capsule_center = model.capsule_center();
    let mut capsule = Volume::logical(
        "source_capsule",
        kernel.cylinder("source_capsule", model.capsule_radius, model.capsule_height)?,
        model.capsule_material,
    )
    .with_placement(Placement::at_z(capsule_center));
    capsule.add_child(
        Volume::logical(
            ACTIVE_NAME,
            kernel.cylinder(ACTIVE_NAME, model.active_radius, model.active_height)?,
            model.active_material,
        )
        .with_placement(Placement::at_z(
            -0.5 * model.capsule_height + model.window + 0.5 * model.active_height,
        )),
    )?;
    source.add_child(capsule)?;

    if let Some((radius, height)) = model.ring {
        let solid = kernel.tube("source_ring", model.capsule_radius, radius, height)?;
        source.add_child(
            Volume::logical("source_ring", solid, Material::ALUMINIUM)
                .with_placement(Placement::at_z(capsule_center)),
        )?;
    }

    log::debug!("built {kind} source, {} mm long", model.length());
    Ok(source)
}
