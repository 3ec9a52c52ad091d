//! Solid shapes.
//!
//! The vocabulary mirrors the GDML primitives the exporter can write.
//! Shapes are plain data; construction and validation go through a
//! [`SolidKernel`](crate::kernel::SolidKernel).

use crate::error::{Error, Result};
use crate::units::Placement;
use std::f64::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A vertex of a revolved outline.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RzPoint {
    /// Distance from the symmetry axis in mm.
    pub r: f64,
    /// Axial coordinate in mm.
    pub z: f64,
}

impl RzPoint {
    /// Creates a new outline vertex.
    #[inline]
    #[must_use]
    pub const fn new(r: f64, z: f64) -> Self {
        Self { r, z }
    }
}

/// Geometric content of a solid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// Axis-aligned box with full side lengths, centered on the origin.
    Box { x: f64, y: f64, z: f64 },
    /// Cylindrical tube segment with full height, centered on the origin.
    Tube {
        rmin: f64,
        rmax: f64,
        z: f64,
        start_phi: f64,
        delta_phi: f64,
    },
    /// Closed (r, z) outline revolved about the z axis.
    GenericPolycone {
        start_phi: f64,
        delta_phi: f64,
        points: Vec<RzPoint>,
    },
    /// `first` minus `second`, with `second` placed in the frame of `first`.
    Subtraction {
        first: std::boxed::Box<Solid>,
        second: std::boxed::Box<Solid>,
        placement: Placement,
    },
}

impl Shape {
    /// Full cylinder of the given radius and height.
    #[must_use]
    pub fn cylinder(radius: f64, height: f64) -> Self {
        Self::Tube {
            rmin: 0.0,
            rmax: radius,
            z: height,
            start_phi: 0.0,
            delta_phi: TAU,
        }
    }

    /// GDML element name of the shape.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Tube { .. } => "tube",
            Self::GenericPolycone { .. } => "genericPolycone",
            Self::Subtraction { .. } => "subtraction",
        }
    }

    /// Checks that the shape encloses a non-empty region.
    ///
    /// # Errors
    /// Returns [`Error::DegenerateSolid`] naming `solid` if any extent is
    /// non-positive or non-finite.
    pub fn validate(&self, solid: &str) -> Result<()> {
        match self {
            Self::Box { x, y, z } => {
                for (axis, value) in [("x", x), ("y", y), ("z", z)] {
                    if !value.is_finite() || *value <= 0.0 {
                        return Err(Error::degenerate(
                            solid,
                            format!("box side {axis} = {value} must be positive"),
                        ));
                    }
                }
                Ok(())
            }
            Self::Tube {
                rmin,
                rmax,
                z,
                delta_phi,
                ..
            } => {
                if !rmin.is_finite() || *rmin < 0.0 {
                    return Err(Error::degenerate(solid, format!("rmin = {rmin} < 0")));
                }
                if !rmax.is_finite() || *rmax <= *rmin {
                    return Err(Error::degenerate(
                        solid,
                        format!("rmax = {rmax} must exceed rmin = {rmin}"),
                    ));
                }
                if !z.is_finite() || *z <= 0.0 {
                    return Err(Error::degenerate(solid, format!("height {z} <= 0")));
                }
                if *delta_phi <= 0.0 {
                    return Err(Error::degenerate(solid, "empty phi range"));
                }
                Ok(())
            }
            Self::GenericPolycone {
                points, delta_phi, ..
            } => {
                if points.len() < 3 {
                    return Err(Error::degenerate(
                        solid,
                        format!("outline needs at least 3 points, got {}", points.len()),
                    ));
                }
                if let Some(p) = points
                    .iter()
                    .find(|p| !p.r.is_finite() || !p.z.is_finite() || p.r < 0.0)
                {
                    return Err(Error::degenerate(
                        solid,
                        format!("invalid outline point (r={}, z={})", p.r, p.z),
                    ));
                }
                if outline_area(points).abs() <= f64::EPSILON {
                    return Err(Error::degenerate(solid, "outline encloses no area"));
                }
                if *delta_phi <= 0.0 {
                    return Err(Error::degenerate(solid, "empty phi range"));
                }
                Ok(())
            }
            Self::Subtraction { first, second, .. } => {
                first.shape.validate(&first.name)?;
                second.shape.validate(&second.name)
            }
        }
    }
}

/// Signed area of a closed (r, z) outline (shoelace formula).
#[must_use]
pub fn outline_area(points: &[RzPoint]) -> f64 {
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.r * b.z - b.r * a.z
        })
        .sum();
    twice / 2.0
}

/// A named shape.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Solid {
    /// Unique solid name in the output file.
    pub name: String,
    /// Geometric content.
    pub shape: Shape,
}

impl Solid {
    /// Pairs a name with a shape without validating it.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    /// This solid and every solid it is built from, operands first.
    #[must_use]
    pub fn components(&self) -> Vec<&Solid> {
        let mut out = Vec::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components<'a>(&'a self, out: &mut Vec<&'a Solid>) {
        if let Shape::Subtraction { first, second, .. } = &self.shape {
            first.collect_components(out);
            second.collect_components(out);
        }
        out.push(self);
    }
}
