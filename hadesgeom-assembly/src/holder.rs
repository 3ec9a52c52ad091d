//! Source holders.
//!
//! Top sources rest on a plexiglass hat sitting on the cryostat lid: a plate
//! under the source, a lid around the plate, a sleeve down to the cryostat
//! and a skirt around the cryostat rim. Thorium sources lie on a copper
//! plate instead of the plexiglass one. Lateral thorium sources sit in a
//! pocket cut through a ring around the cryostat. Bottom measurements have
//! no holder.

use crate::dimensions::{
    LateralHolderDims, ThPlateDims, TopHolderDims, AM_TOP_HOLDER, CUT_MARGIN, LATERAL_HOLDER,
    TH_PLATE, TOP_HOLDER,
};
use crate::error::Result;
use hadesgeom_core::{Material, Placement, Rotation, SolidKernel, Vec3, Volume};
use hadesgeom_meta::{Measurement, SourceKind, SourceSide};

/// Name of the holder assembly.
pub const SOURCE_HOLDER_NAME: &str = "source_holder";

const EPS: f64 = 1e-9;

/// Holder carrying the source of a measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HolderModel {
    /// Hat on the cryostat lid, with a copper plate under thorium sources.
    Top {
        hat: TopHolderDims,
        th_plate: Option<ThPlateDims>,
    },
    /// Ring around the cryostat.
    Lateral(LateralHolderDims),
}

impl HolderModel {
    /// Holder used by a measurement, `None` if there is no model for it.
    #[must_use]
    pub fn for_measurement(measurement: &Measurement) -> Option<Self> {
        match (measurement.position, measurement.source) {
            (SourceSide::Top, SourceKind::Am) => Some(Self::Top {
                hat: AM_TOP_HOLDER,
                th_plate: None,
            }),
            (SourceSide::Top, SourceKind::Th) => Some(Self::Top {
                hat: TOP_HOLDER,
                th_plate: Some(TH_PLATE),
            }),
            (SourceSide::Top, _) => Some(Self::Top {
                hat: TOP_HOLDER,
                th_plate: None,
            }),
            (SourceSide::Lat, SourceKind::Th) => Some(Self::Lateral(LATERAL_HOLDER)),
            _ => None,
        }
    }

    /// Global placement of the holder for a source placed at `source`.
    ///
    /// `near` is the local z of the source point closest to the detector
    /// side; the hat plate is put right under it. The ring is centered on
    /// the source height and turned so its pocket faces the source.
    #[must_use]
    pub fn placement(&self, source: &Placement, near: f64) -> Placement {
        match self {
            Self::Top { .. } => Placement::at_z(source.position.z + near),
            Self::Lateral(_) => {
                let phi = source.position.y.atan2(source.position.x);
                Placement::at_z(source.position.z).with_rotation(Rotation::new(0.0, 0.0, -phi))
            }
        }
    }

    /// Known clearance problems around a cryostat of radius
    /// `cryostat_radius`.
    ///
    /// `lift` is the height of the holder origin above the cryostat top and
    /// `radial` the radial span of the source body.
    #[must_use]
    pub fn issues(&self, lift: f64, cryostat_radius: f64, radial: (f64, f64)) -> Vec<String> {
        let mut issues = Vec::new();
        match self {
            Self::Top { hat, .. } => {
                if lift + EPS < hat.lid_height {
                    issues.push(format!(
                        "source holder lid reaches {:.1} mm below the cryostat top",
                        hat.lid_height - lift
                    ));
                }
                if 0.5 * hat.skirt_inner_width + EPS < cryostat_radius {
                    issues.push(format!(
                        "source holder skirt ({:.1} mm) is narrower than the cryostat ({:.1} mm)",
                        0.5 * hat.skirt_inner_width,
                        cryostat_radius
                    ));
                }
            }
            Self::Lateral(ring) => {
                if 0.5 * ring.inner_width + EPS < cryostat_radius {
                    issues.push(format!(
                        "source holder ring ({:.1} mm) is narrower than the cryostat ({:.1} mm)",
                        0.5 * ring.inner_width,
                        cryostat_radius
                    ));
                }
                if radial.0 + EPS < 0.5 * ring.inner_width
                    || radial.1 > 0.5 * ring.outer_width + EPS
                {
                    issues.push(format!(
                        "source spans r = {:.1} to {:.1} mm, outside the holder pocket \
                         ({:.1} to {:.1} mm)",
                        radial.0,
                        radial.1,
                        0.5 * ring.inner_width,
                        0.5 * ring.outer_width
                    ));
                }
            }
        }
        issues
    }
}

/// Builds the holder assembly in its local frame.
///
/// # Errors
/// Propagates kernel errors.
pub fn build_holder(kernel: &dyn SolidKernel, model: &HolderModel, lift: f64) -> Result<Volume> {
    let holder = match model {
        HolderModel::Top { hat, th_plate } => {
            build_top_holder(kernel, hat, th_plate.as_ref(), lift)?
        }
        HolderModel::Lateral(ring) => build_lateral_holder(kernel, ring)?,
    };
    log::debug!("built source holder with {} volumes", holder.count());
    Ok(holder)
}

/// Plate under the source, with its outer radius and height.
fn top_plate(
    kernel: &dyn SolidKernel,
    hat: &TopHolderDims,
    th_plate: Option<&ThPlateDims>,
) -> Result<(Volume, f64, f64)> {
    if let Some(plate) = th_plate {
        let solid = kernel.tube(
            "source_holder_th_plate",
            0.5 * plate.cavity_width,
            0.5 * plate.width,
            plate.height,
        )?;
        let volume = Volume::logical("source_holder_th_plate", solid, Material::COPPER)
            .with_placement(Placement::at_z(-0.5 * plate.height));
        return Ok((volume, 0.5 * plate.width, plate.height));
    }

    let (solid, radius) = match hat.plate_depth {
        Some(depth) => {
            let outer = kernel.cuboid(
                "source_holder_plate_block",
                hat.plate_width,
                depth,
                hat.plate_height,
            )?;
            let hole = kernel.cuboid(
                "source_holder_plate_hole",
                hat.hole_width,
                hat.hole_depth.unwrap_or(hat.hole_width),
                hat.plate_height + 2.0 * CUT_MARGIN,
            )?;
            let solid = kernel.subtract("source_holder_plate", outer, hole, Placement::ORIGIN)?;
            (solid, (0.5 * hat.plate_width).hypot(0.5 * depth))
        }
        None => (
            kernel.tube(
                "source_holder_plate",
                0.5 * hat.hole_width,
                0.5 * hat.plate_width,
                hat.plate_height,
            )?,
            0.5 * hat.plate_width,
        ),
    };
    let volume = Volume::logical("source_holder_plate", solid, Material::PLEXIGLASS)
        .with_placement(Placement::at_z(-0.5 * hat.plate_height));
    Ok((volume, radius, hat.plate_height))
}

/// Builds the hat with the upper face of its plate at the origin.
///
/// `lift` is the height of that face above the cryostat top. The sleeve is
/// left out when the lid already reaches the cryostat.
///
/// # Errors
/// Propagates kernel errors.
pub fn build_top_holder(
    kernel: &dyn SolidKernel,
    hat: &TopHolderDims,
    th_plate: Option<&ThPlateDims>,
    lift: f64,
) -> Result<Volume> {
    let mut holder = Volume::assembly(SOURCE_HOLDER_NAME);
    let outer = 0.5 * hat.outer_width;

    let (plate, plate_radius, plate_height) = top_plate(kernel, hat, th_plate)?;
    holder.add_child(plate)?;

    let lid_height = hat.lid_height.max(plate_height);
    let lid = kernel.tube("source_holder_lid", plate_radius, outer, lid_height)?;
    holder.add_child(
        Volume::logical("source_holder_lid", lid, Material::PLEXIGLASS)
            .with_placement(Placement::at_z(-0.5 * lid_height)),
    )?;

    let sleeve_height = lift - lid_height;
    if sleeve_height > EPS {
        let sleeve = kernel.tube(
            "source_holder_sleeve",
            0.5 * hat.inner_width,
            outer,
            sleeve_height,
        )?;
        holder.add_child(
            Volume::logical("source_holder_sleeve", sleeve, Material::PLEXIGLASS)
                .with_placement(Placement::at_z(-lid_height - 0.5 * sleeve_height)),
        )?;
    }

    let skirt_top = -lift.max(lid_height);
    let skirt = kernel.tube(
        "source_holder_skirt",
        0.5 * hat.skirt_inner_width,
        outer,
        hat.skirt_height,
    )?;
    holder.add_child(
        Volume::logical("source_holder_skirt", skirt, Material::PLEXIGLASS)
            .with_placement(Placement::at_z(skirt_top - 0.5 * hat.skirt_height)),
    )?;
    Ok(holder)
}

/// Builds the ring centered on the detector axis, its pocket on local +x.
///
/// # Errors
/// Propagates kernel errors.
pub fn build_lateral_holder(kernel: &dyn SolidKernel, ring: &LateralHolderDims) -> Result<Volume> {
    let (inner, outer) = (0.5 * ring.inner_width, 0.5 * ring.outer_width);
    let body = kernel.tube("source_holder_ring_body", inner, outer, ring.height)?;
    let pocket = kernel.cuboid(
        "source_holder_pocket",
        outer - inner + 2.0 * CUT_MARGIN,
        ring.pocket_width,
        ring.pocket_height,
    )?;
    let solid = kernel.subtract(
        "source_holder_ring",
        body,
        pocket,
        Placement::at(Vec3::new(0.5 * (inner + outer), 0.0, 0.0)),
    )?;

    let mut holder = Volume::assembly(SOURCE_HOLDER_NAME);
    holder.add_child(Volume::logical("source_holder_ring", solid, Material::PLEXIGLASS))?;
    Ok(holder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hadesgeom_core::{CsgKernel, Frame};
    use hadesgeom_meta::parse_measurement;

    fn model(name: &str) -> Option<HolderModel> {
        HolderModel::for_measurement(&parse_measurement(name).unwrap())
    }

    #[test]
    fn test_holder_by_measurement() {
        assert_eq!(
            model("ba_HS4_top_scan"),
            Some(HolderModel::Top {
                hat: TOP_HOLDER,
                th_plate: None
            })
        );
        assert_eq!(
            model("am_HS6_top_dlt"),
            Some(HolderModel::Top {
                hat: AM_TOP_HOLDER,
                th_plate: None
            })
        );
        assert!(matches!(
            model("th_HS2_top_psa"),
            Some(HolderModel::Top {
                th_plate: Some(_),
                ..
            })
        ));
        assert_eq!(
            model("th_HS2_lat_psa"),
            Some(HolderModel::Lateral(LATERAL_HOLDER))
        );
        assert_eq!(model("co_HS5_bottom_scan"), None);
        assert_eq!(model("cs_HS4_lat_scan"), None);
    }

    #[test]
    fn test_hat_reaches_cryostat() {
        let hat = build_top_holder(&CsgKernel, &TOP_HOLDER, None, 30.0).unwrap();
        assert!(hat.is_assembly());
        let sleeve = hat.child("source_holder_sleeve").unwrap();
        assert_abs_diff_eq!(sleeve.placement.position.z, -20.0, epsilon = 1e-12);
        let skirt = hat.child("source_holder_skirt").unwrap();
        assert_abs_diff_eq!(
            skirt.placement.position.z,
            -30.0 - 0.5 * TOP_HOLDER.skirt_height,
            epsilon = 1e-12
        );
        let plate = hat.child("source_holder_plate").unwrap();
        assert_eq!(plate.material().unwrap().name(), Material::PLEXIGLASS);

        let low = build_top_holder(&CsgKernel, &TOP_HOLDER, None, 4.0).unwrap();
        assert!(low.child("source_holder_sleeve").is_none());
    }

    #[test]
    fn test_thorium_plate_is_copper() {
        let hat = build_top_holder(&CsgKernel, &TOP_HOLDER, Some(&TH_PLATE), 20.0).unwrap();
        assert!(hat.child("source_holder_plate").is_none());
        let plate = hat.child("source_holder_th_plate").unwrap();
        assert_eq!(plate.material().unwrap().name(), Material::COPPER);
    }

    #[test]
    fn test_americium_plate_is_rectangular() {
        let hat = build_top_holder(&CsgKernel, &AM_TOP_HOLDER, None, 20.0).unwrap();
        let plate = hat.child("source_holder_plate").unwrap();
        assert_eq!(plate.solid().unwrap().shape.tag(), "subtraction");
        assert_eq!(hat.children().len(), 4);
    }

    #[test]
    fn test_ring_pocket_faces_source() {
        let ring = model("th_HS2_lat_scan").unwrap();
        let holder = build_holder(&CsgKernel, &ring, 0.0).unwrap();
        assert!(holder.child("source_holder_ring").is_some());

        let source = Placement::at(Vec3::new(0.0, 86.0, 380.0));
        let at = ring.placement(&source, 0.0);
        assert_abs_diff_eq!(at.position.z, 380.0);
        let pocket = Frame::WORLD.child(&at).basis.apply(Vec3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(pocket.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(pocket.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_holder_issues() {
        let hat = model("ba_HS4_top_scan").unwrap();
        assert!(hat.issues(12.0, 50.8, (0.0, 15.0)).is_empty());
        assert_eq!(hat.issues(5.0, 50.8, (0.0, 15.0)).len(), 1);
        // wide cryostat
        assert_eq!(hat.issues(12.0, 57.15, (0.0, 15.0)).len(), 1);

        let ring = model("th_HS2_lat_scan").unwrap();
        assert!(ring.issues(0.0, 50.8, (86.0, 92.0)).is_empty());
        assert_eq!(ring.issues(0.0, 50.8, (40.0, 46.0)).len(), 1);
    }
}
