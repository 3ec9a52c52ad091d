//! Detector unit construction.
//!
//! The unit is a vacuum envelope holding the crystal and its shell layers.
//! Layers are stacked from the inside out: each one starts at the outer
//! extent of everything inside it plus its own gap, so neighbouring layers
//! can touch but never overlap.

use crate::error::{BuildError, Result};
use crate::fabricate::dedup_outline;
use hadesgeom_core::{
    CapSide, DetectorDescriptor, HpgeFabricator, Material, Placement, RzPoint, SensitiveTag,
    ShellLayer, SolidKernel, Volume,
};

/// Name of the envelope volume.
pub const UNIT_NAME: &str = "detector_unit";

const EPS: f64 = 1e-9;

/// Radial and axial bounds of one layer in the crystal frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerExtent {
    pub name: String,
    /// Radius of the enclosed cavity (zero for the crystal).
    pub inner_radius: f64,
    /// Largest radius, rings included.
    pub outer_radius: f64,
    pub z_min: f64,
    pub z_max: f64,
    /// Axial range of the enclosed cavity.
    pub cavity: Option<(f64, f64)>,
}

impl LayerExtent {
    /// Returns true if `inner` fits in this layer's cavity.
    #[must_use]
    pub fn encloses(&self, inner: &LayerExtent) -> bool {
        let Some((lo, hi)) = self.cavity else {
            return false;
        };
        self.inner_radius + EPS >= inner.outer_radius
            && lo <= inner.z_min + EPS
            && hi + EPS >= inner.z_max
    }

    /// Axial length.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.z_max - self.z_min
    }
}

/// A built detector unit.
#[derive(Debug, Clone)]
pub struct DetectorUnit {
    /// Envelope volume with the crystal and shells as children.
    pub volume: Volume,
    /// Extents from the crystal outwards.
    pub layers: Vec<LayerExtent>,
    /// Axial position of the crystal front face in the envelope frame.
    pub front_face_z: f64,
    /// Envelope radius.
    pub radius: f64,
    /// Envelope height.
    pub height: f64,
}

impl DetectorUnit {
    /// Checks that every layer encloses the one inside it.
    ///
    /// # Errors
    /// Returns [`BuildError::LayerOverlap`] for the first offending pair.
    pub fn check_layers(&self) -> Result<()> {
        for pair in self.layers.windows(2) {
            if !pair[1].encloses(&pair[0]) {
                return Err(BuildError::LayerOverlap {
                    outer: pair[1].name.clone(),
                    inner: pair[0].name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Outermost extent.
    #[must_use]
    pub fn outermost(&self) -> Option<&LayerExtent> {
        self.layers.last()
    }
}

/// Builds detector units from descriptors.
pub struct DetectorBuilder<'a> {
    kernel: &'a dyn SolidKernel,
    fabricator: &'a dyn HpgeFabricator,
}

impl<'a> DetectorBuilder<'a> {
    /// Creates a builder using the given capabilities.
    pub fn new(kernel: &'a dyn SolidKernel, fabricator: &'a dyn HpgeFabricator) -> Self {
        Self { kernel, fabricator }
    }

    /// Builds the unit for one detector.
    ///
    /// # Errors
    /// Propagates fabricator and kernel errors, and returns
    /// [`BuildError::LayerOverlap`] if the stacked layers do not nest.
    pub fn build(&self, desc: &DetectorDescriptor) -> Result<DetectorUnit> {
        let crystal = &desc.crystal;
        let crystal_solid = self
            .fabricator
            .fabricate(self.kernel, &desc.name, crystal)?;
        log::debug!(
            "{}: crystal fabricated by '{}' with kernel '{}'",
            desc.name,
            self.fabricator.name(),
            self.kernel.name()
        );

        let mut layers = vec![LayerExtent {
            name: desc.name.clone(),
            inner_radius: 0.0,
            outer_radius: crystal.radius,
            z_min: 0.0,
            z_max: crystal.height,
            cavity: None,
        }];
        let mut parts = vec![Volume::logical(
            desc.name.clone(),
            crystal_solid,
            Material::GERMANIUM,
        )
        .with_sensitive(SensitiveTag::germanium(desc.uid))];

        for layer in desc.shells() {
            let enclosed = layers[layers.len() - 1].clone();
            let (points, extent) = cup_outline(layer, &enclosed);
            let solid = self.kernel.polycone(&layer.name, points)?;
            log::debug!(
                "{}: {} r = [{:.3}, {:.3}] z = [{:.3}, {:.3}]",
                desc.name,
                layer.name,
                extent.inner_radius,
                extent.outer_radius,
                extent.z_min,
                extent.z_max
            );
            parts.push(Volume::logical(
                layer.name.clone(),
                solid,
                layer.material.clone(),
            ));
            layers.push(extent);
        }

        let outer = layers[layers.len() - 1].clone();
        let center = 0.5 * (outer.z_min + outer.z_max);
        let envelope = self
            .kernel
            .cylinder(UNIT_NAME, outer.outer_radius, outer.height())?;
        let mut volume = Volume::logical(UNIT_NAME, envelope, Material::VACUUM);
        for part in parts {
            volume.add_child(part.with_placement(Placement::at_z(-center)))?;
        }

        let unit = DetectorUnit {
            volume,
            front_face_z: crystal.height - center,
            radius: outer.outer_radius,
            height: outer.height(),
            layers,
        };
        unit.check_layers()?;
        Ok(unit)
    }
}

/// Outline and extent of a cup around `enclosed`.
fn cup_outline(layer: &ShellLayer, enclosed: &LayerExtent) -> (Vec<RzPoint>, LayerExtent) {
    let ri = enclosed.outer_radius + layer.radial_gap;
    let ro = ri + layer.wall_thickness;
    let c = layer.cap_thickness;

    let (z_min, z_max, cavity) = match layer.cap {
        CapSide::Bottom => {
            let z_max = enclosed.z_max;
            let z_min = enclosed.z_min - layer.axial_gap - c;
            (z_min, z_max, (z_min + c, z_max))
        }
        CapSide::Top => {
            let z_min = enclosed.z_min;
            let z_max = enclosed.z_max + layer.axial_gap + c;
            (z_min, z_max, (z_min, z_max - c))
        }
    };

    // outer wall from bottom to top, with ring bulges
    let (rim, toward_cap) = match layer.cap {
        CapSide::Bottom => (z_max, -1.0),
        CapSide::Top => (z_min, 1.0),
    };
    let mut bulges: Vec<(f64, f64, f64)> = layer
        .rings
        .iter()
        .map(|ring| {
            let a = rim + toward_cap * ring.offset_from_rim;
            let b = a + toward_cap * ring.height;
            (a.min(b), a.max(b), ring.radius)
        })
        .collect();
    bulges.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut wall = vec![RzPoint::new(ro, z_min)];
    for (lo, hi, radius) in &bulges {
        wall.extend([
            RzPoint::new(ro, *lo),
            RzPoint::new(*radius, *lo),
            RzPoint::new(*radius, *hi),
            RzPoint::new(ro, *hi),
        ]);
    }
    wall.push(RzPoint::new(ro, z_max));

    let mut points = match layer.cap {
        CapSide::Bottom => {
            let mut p = vec![RzPoint::new(0.0, z_min)];
            p.extend(wall);
            p.extend([
                RzPoint::new(ri, z_max),
                RzPoint::new(ri, z_min + c),
                RzPoint::new(0.0, z_min + c),
            ]);
            p
        }
        CapSide::Top => {
            let mut p = vec![RzPoint::new(ri, z_min)];
            p.extend(wall);
            p.extend([
                RzPoint::new(0.0, z_max),
                RzPoint::new(0.0, z_max - c),
                RzPoint::new(ri, z_max - c),
            ]);
            p
        }
    };
    points = dedup_outline(points);

    let outer_radius = bulges.iter().map(|b| b.2).fold(ro, f64::max);
    let extent = LayerExtent {
        name: layer.name.clone(),
        inner_radius: ri,
        outer_radius,
        z_min,
        z_max,
        cavity: Some(cavity),
    };
    (points, extent)
}
