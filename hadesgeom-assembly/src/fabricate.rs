//! Default HPGe crystal fabricator.

use hadesgeom_core::{
    outline_area, CrystalGeometry, Error, HpgeFabricator, Result, RzPoint, Solid, SolidKernel,
};

/// Revolves the crystal cross-section into a `genericPolycone`.
///
/// The outline runs from the axis along the back face (through the groove
/// notch and bottom taper), up the outer wall (through the top taper),
/// across the front face and down the borehole back to the axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolyconeFabricator;

impl PolyconeFabricator {
    /// Closed (r, z) outline of the crystal.
    #[must_use]
    pub fn outline(crystal: &CrystalGeometry) -> Vec<RzPoint> {
        let r = crystal.radius;
        let h = crystal.height;
        let mut points = vec![RzPoint::new(0.0, 0.0)];

        if let Some(g) = crystal.groove {
            points.extend([
                RzPoint::new(g.inner_radius, 0.0),
                RzPoint::new(g.inner_radius, g.depth),
                RzPoint::new(g.outer_radius, g.depth),
                RzPoint::new(g.outer_radius, 0.0),
            ]);
        }

        match crystal.bottom_taper {
            Some(t) => points.extend([
                RzPoint::new(r - t.radial_depth(), 0.0),
                RzPoint::new(r, t.height),
            ]),
            None => points.push(RzPoint::new(r, 0.0)),
        }

        match crystal.top_taper {
            Some(t) => points.extend([
                RzPoint::new(r, h - t.height),
                RzPoint::new(r - t.radial_depth(), h),
            ]),
            None => points.push(RzPoint::new(r, h)),
        }

        match crystal.borehole {
            Some(b) => points.extend([
                RzPoint::new(b.radius, h),
                RzPoint::new(b.radius, h - b.depth),
                RzPoint::new(0.0, h - b.depth),
            ]),
            None => points.push(RzPoint::new(0.0, h)),
        }

        dedup_outline(points)
    }
}

/// Drops consecutive duplicate vertices, including a closing duplicate.
pub(crate) fn dedup_outline(mut points: Vec<RzPoint>) -> Vec<RzPoint> {
    points.dedup_by(|b, a| (a.r - b.r).abs() < 1e-12 && (a.z - b.z).abs() < 1e-12);
    if points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (first.r - last.r).abs() < 1e-12 && (first.z - last.z).abs() < 1e-12 {
            points.pop();
        }
    }
    points
}

impl HpgeFabricator for PolyconeFabricator {
    fn name(&self) -> &'static str {
        "polycone"
    }

    fn fabricate(
        &self,
        kernel: &dyn SolidKernel,
        solid_name: &str,
        crystal: &CrystalGeometry,
    ) -> Result<Solid> {
        let points = Self::outline(crystal);
        if outline_area(&points) <= 0.0 {
            return Err(Error::Fabrication {
                detector: solid_name.to_string(),
                reason: "crystal outline is empty or inverted".to_string(),
            });
        }
        log::debug!("{solid_name}: crystal outline with {} vertices", points.len());
        kernel.polycone(solid_name, points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hadesgeom_core::{Borehole, CsgKernel, Groove, Shape, Taper};
    use std::f64::consts::PI;

    #[test]
    fn test_plain_cylinder_outline() {
        let points = PolyconeFabricator::outline(&CrystalGeometry::cylinder(35.0, 90.0));
        assert_eq!(points.len(), 4);
        assert_abs_diff_eq!(outline_area(&points), 35.0 * 90.0);
    }

    #[test]
    fn test_cut_crystal_area() {
        let crystal = CrystalGeometry {
            radius: 35.0,
            height: 90.0,
            borehole: Some(Borehole {
                radius: 5.0,
                depth: 60.0,
            }),
            groove: Some(Groove {
                inner_radius: 8.0,
                outer_radius: 11.0,
                depth: 2.0,
            }),
            top_taper: Some(Taper {
                height: 4.0,
                angle_deg: 45.0,
            }),
            bottom_taper: None,
        };
        let points = PolyconeFabricator::outline(&crystal);
        let expected = 35.0 * 90.0 - 5.0 * 60.0 - 3.0 * 2.0 - 0.5 * 4.0 * 4.0;
        assert_abs_diff_eq!(outline_area(&points), expected, epsilon = 1e-9);

        let solid = PolyconeFabricator
            .fabricate(&CsgKernel, "V01234A", &crystal)
            .unwrap();
        let Shape::GenericPolycone { delta_phi, .. } = solid.shape else {
            panic!("expected a polycone");
        };
        assert_abs_diff_eq!(delta_phi, 2.0 * PI);
    }
}
