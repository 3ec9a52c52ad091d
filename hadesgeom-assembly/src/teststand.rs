//! Test-stand assembly.
//!
//! Places the detector unit inside the cryostat cavity and adds the lead
//! castle, the bottom plate and the source to the world volume.

use crate::castle::{build_bottom_plate, build_castle, interior_height};
use crate::detector::DetectorUnit;
use crate::dimensions::{CryostatDims, UNIT_CLEARANCE, WORLD_SIZE};
use crate::error::Result;
use crate::holder::{build_holder, HolderModel};
use crate::source::{build_source, effective_position, source_placement, SourceModel};
use hadesgeom_core::{
    ConfigValidationError, DetectorDescriptor, FieldViolation, Material, MeasurementConfig,
    Placement, SolidKernel, Vec3, Volume,
};
use hadesgeom_meta::Measurement;
use std::fmt;
use std::str::FromStr;

/// Name of the world volume.
pub const WORLD_NAME: &str = "world";
/// Name of the cryostat vessel.
pub const CRYOSTAT_NAME: &str = "cryostat";
/// Name of the vacuum cavity inside the cryostat.
pub const CAVITY_NAME: &str = "vacuum_cavity";
/// Configuration field reported for invalid assembly names.
pub const ASSEMBLIES_FIELD: &str = "assemblies";

const EPS: f64 = 1e-9;

/// Optional parts of the test stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assembly {
    Cryostat,
    LeadCastle,
    BottomPlate,
    Source,
    SourceHolder,
}

impl Assembly {
    /// All optional parts.
    pub const ALL: [Self; 5] = [
        Self::Cryostat,
        Self::LeadCastle,
        Self::BottomPlate,
        Self::Source,
        Self::SourceHolder,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cryostat => "cryostat",
            Self::LeadCastle => "lead_castle",
            Self::BottomPlate => "bottom_plate",
            Self::Source => "source",
            Self::SourceHolder => "source_holder",
        }
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Assembly {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown assembly '{s}'"))
    }
}

/// Selection of optional test-stand parts. The detector unit is always built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assemblies {
    enabled: [bool; Assembly::ALL.len()],
}

impl Default for Assemblies {
    fn default() -> Self {
        Self::all()
    }
}

impl Assemblies {
    /// Every optional part.
    #[must_use]
    pub fn all() -> Self {
        Self {
            enabled: [true; Assembly::ALL.len()],
        }
    }

    /// The detector unit alone.
    #[must_use]
    pub fn detector_only() -> Self {
        Self {
            enabled: [false; Assembly::ALL.len()],
        }
    }

    /// Parses a list of part names.
    ///
    /// `hpge` and `detector` name the detector unit and are accepted without
    /// effect.
    ///
    /// # Errors
    /// Returns a [`ConfigValidationError`] on field `assemblies` listing every
    /// unknown name.
    pub fn from_names<I, S>(names: I) -> std::result::Result<Self, ConfigValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selection = Self::detector_only();
        let mut violations = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            if matches!(name, "hpge" | "detector") {
                continue;
            }
            match name.parse::<Assembly>() {
                Ok(part) => selection = selection.with(part),
                Err(message) => violations.push(FieldViolation::new(ASSEMBLIES_FIELD, message)),
            }
        }
        if violations.is_empty() {
            Ok(selection)
        } else {
            Err(ConfigValidationError::new(violations))
        }
    }

    #[must_use]
    pub fn with(mut self, part: Assembly) -> Self {
        self.enabled[part as usize] = true;
        self
    }

    #[must_use]
    pub fn without(mut self, part: Assembly) -> Self {
        self.enabled[part as usize] = false;
        self
    }

    #[must_use]
    pub fn contains(&self, part: Assembly) -> bool {
        self.enabled[part as usize]
    }
}

/// Assembles the world volume around a detector unit.
pub struct TestStand<'a> {
    kernel: &'a dyn SolidKernel,
    assemblies: Assemblies,
}

impl<'a> TestStand<'a> {
    pub fn new(kernel: &'a dyn SolidKernel) -> Self {
        Self {
            kernel,
            assemblies: Assemblies::all(),
        }
    }

    #[must_use]
    pub fn with_assemblies(mut self, assemblies: Assemblies) -> Self {
        self.assemblies = assemblies;
        self
    }

    /// Builds the world.
    ///
    /// The unit sits on the detector axis with its top [`UNIT_CLEARANCE`]
    /// below the cavity ceiling. Without the cryostat it is placed directly
    /// in the world at the same global position. Volumes are placed as
    /// given; see [`TestStand::clearance_issues`] for known collisions.
    ///
    /// # Errors
    /// Returns [`MetadataError::Inconsistent`] for detector types without a
    /// cryostat model, and propagates kernel and tree errors.
    ///
    /// [`MetadataError::Inconsistent`]: hadesgeom_core::MetadataError::Inconsistent
    pub fn assemble(
        &self,
        desc: &DetectorDescriptor,
        unit: DetectorUnit,
        measurement: &Measurement,
        config: &MeasurementConfig,
    ) -> Result<Volume> {
        let cryo = CryostatDims::for_detector(desc)?;
        let cavity_center = cryo.center_z() + cryo.cavity_offset();
        let unit_center =
            cavity_center + 0.5 * cryo.cavity_height() - UNIT_CLEARANCE - 0.5 * unit.height;
        log::debug!(
            "{}: crystal front face at z = {:.3} mm, cryostat top at z = {:.3} mm",
            desc.name,
            unit_center + unit.front_face_z,
            cryo.top_z()
        );

        let world_solid = self
            .kernel
            .cuboid(WORLD_NAME, WORLD_SIZE, WORLD_SIZE, WORLD_SIZE)?;
        let mut world = Volume::logical(WORLD_NAME, world_solid, Material::AIR);

        if self.assemblies.contains(Assembly::Cryostat) {
            let vessel = self
                .kernel
                .cylinder(CRYOSTAT_NAME, 0.5 * cryo.width, cryo.height)?;
            let mut cryostat = Volume::logical(CRYOSTAT_NAME, vessel, Material::ALUMINIUM)
                .with_placement(Placement::at_z(cryo.center_z()));
            let cavity_solid =
                self.kernel
                    .cylinder(CAVITY_NAME, cryo.cavity_radius(), cryo.cavity_height())?;
            let mut cavity = Volume::logical(CAVITY_NAME, cavity_solid, Material::VACUUM)
                .with_placement(Placement::at_z(cryo.cavity_offset()));
            cavity.add_child(
                unit.volume
                    .with_placement(Placement::at_z(unit_center - cavity_center)),
            )?;
            cryostat.add_child(cavity)?;
            world.add_child(cryostat)?;
        } else {
            world.add_child(unit.volume.with_placement(Placement::at_z(unit_center)))?;
        }

        if self.assemblies.contains(Assembly::LeadCastle) {
            world.add_child(build_castle(self.kernel, config.lead_castle)?)?;
        }
        if self.assemblies.contains(Assembly::BottomPlate) {
            world.add_child(build_bottom_plate(self.kernel)?)?;
        }

        let placement = placed_source(measurement, config, &cryo);
        if self.assemblies.contains(Assembly::Source) {
            log::debug!(
                "{} source at ({:.3}, {:.3}, {:.3}) mm",
                measurement.source,
                placement.position.x,
                placement.position.y,
                placement.position.z
            );
            let source = build_source(self.kernel, measurement.source)?;
            world.add_child(source.with_placement(placement))?;
        }
        if self.assemblies.contains(Assembly::SourceHolder) {
            match HolderModel::for_measurement(measurement) {
                Some(model) => {
                    let (near, _) = SourceModel::for_kind(measurement.source).axial_extent();
                    let at = model.placement(&placement, near);
                    let lift = at.position.z - cryo.top_z();
                    let holder = build_holder(self.kernel, &model, lift)?;
                    world.add_child(holder.with_placement(at))?;
                }
                None => log::debug!(
                    "no source holder for {} {:?} measurements",
                    measurement.source,
                    measurement.position
                ),
            }
        }

        world.validate()?;
        Ok(world)
    }

    /// Known clearance problems of the assembled stand.
    ///
    /// Overlaps are only excluded inside the detector unit. This reports a
    /// unit larger than the cryostat cavity, the cryostat reaching above
    /// the castle interior, source material inside the cryostat vessel and
    /// a source holder colliding with the cryostat or not holding its source.
    ///
    /// # Errors
    /// Returns [`MetadataError::Inconsistent`] for detector types without a
    /// cryostat model.
    ///
    /// [`MetadataError::Inconsistent`]: hadesgeom_core::MetadataError::Inconsistent
    pub fn clearance_issues(
        &self,
        desc: &DetectorDescriptor,
        unit: &DetectorUnit,
        measurement: &Measurement,
        config: &MeasurementConfig,
    ) -> Result<Vec<String>> {
        let cryo = CryostatDims::for_detector(desc)?;
        if !self.assemblies.contains(Assembly::Cryostat) {
            return Ok(Vec::new());
        }
        let mut issues = Vec::new();

        if let Some(outer) = unit.outermost() {
            let room = cryo.cavity_height() - UNIT_CLEARANCE;
            if outer.outer_radius > cryo.cavity_radius() + EPS || outer.height() > room + EPS {
                issues.push(format!(
                    "detector unit of {} ({:.1} mm x {:.1} mm) does not fit the cryostat cavity \
                     ({:.1} mm x {room:.1} mm)",
                    desc.name,
                    outer.outer_radius,
                    outer.height(),
                    cryo.cavity_radius()
                ));
            }
        }

        if self.assemblies.contains(Assembly::LeadCastle) {
            let interior = interior_height(config.lead_castle);
            if cryo.top_z() > interior + EPS {
                issues.push(format!(
                    "cryostat top at {:.1} mm is above the {} interior ({interior:.1} mm)",
                    cryo.top_z(),
                    config.lead_castle
                ));
            }
        }

        let model = SourceModel::for_kind(measurement.source);
        let placement = placed_source(measurement, config, &cryo);
        let body = SourceBody::new(&model, &placement);

        if self.assemblies.contains(Assembly::Source) {
            let radius = 0.5 * cryo.width;
            let inside = body.radial.0 + EPS < radius
                && body.z.0 + EPS < cryo.top_z()
                && body.z.1 > cryo.position_from_bottom + EPS;
            if inside {
                let pos = effective_position(measurement.source, config.source);
                issues.push(format!(
                    "source at r = {:.1} mm, z = {:.1} mm reaches into the cryostat \
                     (spans z = {:.1} to {:.1} mm)",
                    pos.r_mm, pos.z_mm, body.z.0, body.z.1
                ));
            }
        }

        if self.assemblies.contains(Assembly::SourceHolder) {
            if let Some(holder) = HolderModel::for_measurement(measurement) {
                let (near, _) = model.axial_extent();
                let lift = holder.placement(&placement, near).position.z - cryo.top_z();
                issues.extend(holder.issues(lift, 0.5 * cryo.width, body.radial));
            }
        }
        Ok(issues)
    }
}

/// Global placement of the source for a measurement.
fn placed_source(
    measurement: &Measurement,
    config: &MeasurementConfig,
    cryo: &CryostatDims,
) -> Placement {
    source_placement(
        measurement,
        config.source,
        Vec3::along_z(cryo.top_z()),
        Vec3::along_z(cryo.position_from_bottom),
    )
}

/// Global bounds of a placed source: radial span from the detector axis
/// and axial span.
struct SourceBody {
    radial: (f64, f64),
    z: (f64, f64),
}

impl SourceBody {
    fn new(model: &SourceModel, at: &Placement) -> Self {
        let (near, far) = model.axial_extent();
        let axis = at.rotation.apply(Vec3::new(0.0, 0.0, 1.0));
        let rho = at.position.x.hypot(at.position.y);
        let radius = model.radius();
        if axis.z.abs() > 0.5 {
            let (a, b) = (at.position.z + axis.z * near, at.position.z + axis.z * far);
            Self {
                radial: ((rho - radius).max(0.0), rho + radius),
                z: (a.min(b), a.max(b)),
            }
        } else {
            // lateral sources point radially outward
            Self {
                radial: (rho + near, rho + far),
                z: (at.position.z - radius, at.position.z + radius),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorBuilder;
    use crate::fabricate::PolyconeFabricator;
    use crate::holder::SOURCE_HOLDER_NAME;
    use approx::assert_abs_diff_eq;
    use hadesgeom_core::{
        CapSide, CrystalGeometry, CsgKernel, DetectorKind, LeadCastle, Production, ShellLayer,
        SourcePosition,
    };
    use hadesgeom_meta::parse_measurement;

    fn descriptor(radius: f64) -> DetectorDescriptor {
        let shell = |name: &str, cap| ShellLayer {
            name: name.to_string(),
            material: Material::new(Material::COPPER),
            radial_gap: 0.5,
            axial_gap: 0.5,
            wall_thickness: 1.0,
            cap_thickness: 1.0,
            cap,
            rings: Vec::new(),
        };
        DetectorDescriptor {
            name: "V05000A".into(),
            kind: DetectorKind::Icpc,
            production: Production {
                order: 5,
                slice: "A".into(),
            },
            uid: 3,
            crystal: CrystalGeometry::cylinder(radius, 80.0),
            holder: shell("holder", CapSide::Bottom),
            wrap: shell("wrap", CapSide::Top),
        }
    }

    fn config(r: f64, castle: LeadCastle) -> MeasurementConfig {
        MeasurementConfig {
            source: SourcePosition::new(r, 0.0, 12.0),
            lead_castle: castle,
        }
    }

    fn unit(desc: &DetectorDescriptor) -> DetectorUnit {
        DetectorBuilder::new(&CsgKernel, &PolyconeFabricator)
            .build(desc)
            .unwrap()
    }

    fn assemble(
        stand: &TestStand<'_>,
        desc: &DetectorDescriptor,
        cfg: &MeasurementConfig,
    ) -> Result<Volume> {
        let measurement = parse_measurement("th_HS2_top_scan").unwrap();
        stand.assemble(desc, unit(desc), &measurement, cfg)
    }

    fn issues(
        stand: &TestStand<'_>,
        desc: &DetectorDescriptor,
        measurement: &str,
        cfg: &MeasurementConfig,
    ) -> Vec<String> {
        let measurement = parse_measurement(measurement).unwrap();
        stand
            .clearance_issues(desc, &unit(desc), &measurement, cfg)
            .unwrap()
    }

    #[test]
    fn test_assemblies_from_names() {
        let sel = Assemblies::from_names(["hpge", "source", "lead_castle"]).unwrap();
        assert!(sel.contains(Assembly::Source));
        assert!(sel.contains(Assembly::LeadCastle));
        assert!(!sel.contains(Assembly::Cryostat));
        assert!(!sel.contains(Assembly::SourceHolder));

        let holder = Assemblies::from_names(["source_holder"]).unwrap();
        assert!(holder.contains(Assembly::SourceHolder));
        assert!(!holder.contains(Assembly::Source));

        let err = Assemblies::from_names(["source", "table", "roof"]).unwrap_err();
        assert_eq!(err.violations.len(), 2);
        assert!(err.has_field(ASSEMBLIES_FIELD));
    }

    #[test]
    fn test_unit_below_cavity_ceiling() {
        let stand = TestStand::new(&CsgKernel);
        let desc = descriptor(35.0);
        let world = assemble(&stand, &desc, &config(0.0, LeadCastle::Table1)).unwrap();

        let frame = world.global_frame(crate::detector::UNIT_NAME).unwrap();
        let unit_height = 80.0 + 1.5 + 1.5;
        let ceiling = 250.0 + 171.0 - 1.5;
        assert_abs_diff_eq!(
            frame.origin.z + 0.5 * unit_height,
            ceiling - UNIT_CLEARANCE,
            epsilon = 1e-9
        );
        assert!(world.child(CRYOSTAT_NAME).is_some());
        assert!(world.child("lead_castle").is_some());
        assert!(world.child("bottom_plate").is_some());
        let source = world.global_frame("source").unwrap();
        assert_abs_diff_eq!(source.origin.z, 421.0 + 12.0, epsilon = 1e-9);
        // thorium lies on the copper plate of the hat
        let holder = world.global_frame(SOURCE_HOLDER_NAME).unwrap();
        assert_abs_diff_eq!(holder.origin.z, 421.0 + 12.0, epsilon = 1e-9);
        assert!(world.find("source_holder_th_plate").is_some());
    }

    #[test]
    fn test_same_position_without_cryostat() {
        let desc = descriptor(35.0);
        let cfg = config(0.0, LeadCastle::Table1);
        let full = assemble(&TestStand::new(&CsgKernel), &desc, &cfg).unwrap();
        let bare_stand = TestStand::new(&CsgKernel)
            .with_assemblies(Assemblies::all().without(Assembly::Cryostat));
        let bare = assemble(&bare_stand, &desc, &cfg).unwrap();

        let a = full.global_frame(crate::detector::UNIT_NAME).unwrap();
        let b = bare.global_frame(crate::detector::UNIT_NAME).unwrap();
        assert!(a.origin.max_abs_diff(&b.origin) < 1e-9);
        assert!(bare.child(CRYOSTAT_NAME).is_none());
    }

    #[test]
    fn test_oversized_unit_is_assembled_and_reported() {
        let stand = TestStand::new(&CsgKernel);
        let desc = descriptor(48.5);
        let cfg = config(0.0, LeadCastle::Table1);

        let world = assemble(&stand, &desc, &cfg).unwrap();
        assert!(world.find(crate::detector::UNIT_NAME).is_some());

        let found = issues(&stand, &desc, "th_HS2_top_scan", &cfg);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("does not fit the cryostat cavity"));

        let bare = TestStand::new(&CsgKernel)
            .with_assemblies(Assemblies::all().without(Assembly::Cryostat));
        assert!(issues(&bare, &desc, "th_HS2_top_scan", &cfg).is_empty());
    }

    #[test]
    fn test_clearance_issues() {
        let stand = TestStand::new(&CsgKernel);
        let desc = descriptor(35.0);

        let fine = issues(&stand, &desc, "th_HS2_top_scan", &config(0.0, LeadCastle::Table1));
        assert!(fine.is_empty());

        let low_castle = issues(&stand, &desc, "th_HS2_top_scan", &config(0.0, LeadCastle::Table2));
        assert_eq!(low_castle.len(), 1);

        let source_only = TestStand::new(&CsgKernel).with_assemblies(
            Assemblies::detector_only()
                .with(Assembly::Cryostat)
                .with(Assembly::Source),
        );
        let mut buried = config(0.0, LeadCastle::Table1);
        buried.source = SourcePosition::new(0.0, 0.0, -20.0);
        let found = issues(&source_only, &desc, "th_HS2_top_scan", &buried);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("reaches into the cryostat"));
    }

    #[test]
    fn test_source_ring_just_above_cryostat() {
        let stand = TestStand::new(&CsgKernel).with_assemblies(
            Assemblies::detector_only()
                .with(Assembly::Cryostat)
                .with(Assembly::Source),
        );
        let desc = descriptor(35.0);
        let mut cfg = config(0.0, LeadCastle::Table1);

        // the face clears the lid but the ring does not
        cfg.source = SourcePosition::new(0.0, 0.0, 0.5);
        let found = issues(&stand, &desc, "cs_HS4_top_scan", &cfg);
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("reaches into the cryostat"));

        cfg.source = SourcePosition::new(0.0, 0.0, 1.5);
        assert!(issues(&stand, &desc, "cs_HS4_top_scan", &cfg).is_empty());

        // below the cryostat the ring reaches up into the vessel floor
        cfg.source = SourcePosition::new(0.0, 0.0, 0.5);
        assert_eq!(issues(&stand, &desc, "cs_HS4_bottom_scan", &cfg).len(), 1);
    }

    #[test]
    fn test_holder_clearance() {
        let stand = TestStand::new(&CsgKernel).with_assemblies(
            Assemblies::detector_only()
                .with(Assembly::Cryostat)
                .with(Assembly::SourceHolder),
        );
        let desc = descriptor(35.0);
        let mut cfg = config(0.0, LeadCastle::Table1);

        cfg.source = SourcePosition::new(0.0, 0.0, 4.0);
        let low = issues(&stand, &desc, "th_HS2_top_scan", &cfg);
        assert_eq!(low.len(), 1);
        assert!(low[0].contains("lid"));

        cfg.source = SourcePosition::new(40.0, 0.0, -40.0);
        let inside = issues(&stand, &desc, "th_HS2_lat_scan", &cfg);
        assert_eq!(inside.len(), 1);
        assert!(inside[0].contains("pocket"));

        cfg.source = SourcePosition::new(86.0, 0.0, -40.0);
        assert!(issues(&stand, &desc, "th_HS2_lat_scan", &cfg).is_empty());
    }
}
