//! Capability traits for solid construction.
//!
//! The assembly pipeline never builds [`Shape`] values directly; it asks a
//! [`SolidKernel`] for them so a different modeling backend can be plugged
//! in. Crystal solids come from an [`HpgeFabricator`].

use crate::descriptor::CrystalGeometry;
use crate::error::Result;
use crate::solid::{RzPoint, Shape, Solid};
use crate::units::Placement;
use std::f64::consts::TAU;

/// Creates validated solids.
pub trait SolidKernel {
    /// Returns the name of this kernel.
    fn name(&self) -> &'static str;

    /// Creates a named solid from a shape.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateSolid`](crate::Error::DegenerateSolid) if
    /// the shape encloses no volume.
    fn solid(&self, name: &str, shape: Shape) -> Result<Solid>;

    /// Box with full side lengths.
    ///
    /// # Errors
    /// See [`SolidKernel::solid`].
    fn cuboid(&self, name: &str, x: f64, y: f64, z: f64) -> Result<Solid> {
        self.solid(name, Shape::Box { x, y, z })
    }

    /// Full cylinder.
    ///
    /// # Errors
    /// See [`SolidKernel::solid`].
    fn cylinder(&self, name: &str, radius: f64, height: f64) -> Result<Solid> {
        self.solid(name, Shape::cylinder(radius, height))
    }

    /// Hollow cylinder.
    ///
    /// # Errors
    /// See [`SolidKernel::solid`].
    fn tube(&self, name: &str, rmin: f64, rmax: f64, height: f64) -> Result<Solid> {
        self.solid(
            name,
            Shape::Tube {
                rmin,
                rmax,
                z: height,
                start_phi: 0.0,
                delta_phi: TAU,
            },
        )
    }

    /// Full revolution of a closed (r, z) outline.
    ///
    /// # Errors
    /// See [`SolidKernel::solid`].
    fn polycone(&self, name: &str, points: Vec<RzPoint>) -> Result<Solid> {
        self.solid(
            name,
            Shape::GenericPolycone {
                start_phi: 0.0,
                delta_phi: TAU,
                points,
            },
        )
    }

    /// Boolean difference with `second` placed in the frame of `first`.
    ///
    /// # Errors
    /// See [`SolidKernel::solid`].
    fn subtract(
        &self,
        name: &str,
        first: Solid,
        second: Solid,
        placement: Placement,
    ) -> Result<Solid> {
        self.solid(
            name,
            Shape::Subtraction {
                first: Box::new(first),
                second: Box::new(second),
                placement,
            },
        )
    }
}

/// Default kernel producing GDML-native CSG shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsgKernel;

impl SolidKernel for CsgKernel {
    fn name(&self) -> &'static str {
        "csg"
    }

    fn solid(&self, name: &str, shape: Shape) -> Result<Solid> {
        shape.validate(name)?;
        Ok(Solid::new(name, shape))
    }
}

/// Produces the crystal solid of an HPGe detector.
pub trait HpgeFabricator {
    /// Returns the name of this fabricator.
    fn name(&self) -> &'static str;

    /// Builds the crystal solid in the crystal frame (back face at `z = 0`,
    /// front face at `z = height`).
    ///
    /// # Errors
    /// Returns [`Error::Fabrication`](crate::Error::Fabrication) if the
    /// geometry cannot be realized, or any kernel error.
    fn fabricate(
        &self,
        kernel: &dyn SolidKernel,
        solid_name: &str,
        crystal: &CrystalGeometry,
    ) -> Result<Solid>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_csg_kernel_rejects_degenerate() {
        let kernel = CsgKernel;
        assert!(kernel.cuboid("ok", 1.0, 2.0, 3.0).is_ok());
        assert!(matches!(
            kernel.cuboid("flat", 1.0, 0.0, 3.0),
            Err(Error::DegenerateSolid { .. })
        ));
        assert!(kernel.tube("ring", 5.0, 4.0, 1.0).is_err());
    }

    #[test]
    fn test_subtraction_validates_operands() {
        let kernel = CsgKernel;
        let outer = kernel.cuboid("outer", 10.0, 10.0, 10.0).unwrap();
        let bad = Solid::new("bad", Shape::Box { x: -1.0, y: 1.0, z: 1.0 });
        let err = kernel
            .subtract("diff", outer, bad, Placement::ORIGIN)
            .unwrap_err();
        assert!(err.to_string().contains("bad"));
    }
}
