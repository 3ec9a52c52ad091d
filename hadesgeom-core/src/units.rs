//! Lengths, placements and materials.
//!
//! All lengths in the volume tree are millimeters and all angles are
//! radians. Configuration files carry degrees; conversion happens at the
//! loader boundary.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A point or displacement in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// A displacement along the z axis.
    #[inline]
    #[must_use]
    pub const fn along_z(z: f64) -> Self {
        Self { x: 0.0, y: 0.0, z }
    }

    /// Euclidean length.
    #[inline]
    #[must_use]
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Largest absolute component difference to `other`.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Rotation angles about x, y and z in radians, following the GDML
/// `physvol` convention.
///
/// The angles describe the rotation of the daughter *frame*; the rotation
/// applied to the daughter *object* is its inverse,
/// `Rx(-x) · Ry(-y) · Rz(-z)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Rotation {
    /// No rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Creates a rotation from GDML angles in radians.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns true if all angles are zero.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }

    /// Row-major matrix of the object rotation.
    #[must_use]
    pub fn matrix(&self) -> Mat3 {
        Mat3::rot_x(-self.x) * Mat3::rot_y(-self.y) * Mat3::rot_z(-self.z)
    }

    /// Rotates a vector the way the placed object is rotated.
    #[must_use]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        self.matrix().apply(v)
    }
}

/// Row-major 3×3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3(pub [[f64; 3]; 3]);

impl Mat3 {
    /// The identity matrix.
    pub const IDENTITY: Self = Self([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]);

    fn rot_x(a: f64) -> Self {
        let (s, c) = a.sin_cos();
        Self([[1.0, 0.0, 0.0], [0.0, c, -s], [0.0, s, c]])
    }

    fn rot_y(a: f64) -> Self {
        let (s, c) = a.sin_cos();
        Self([[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]])
    }

    fn rot_z(a: f64) -> Self {
        let (s, c) = a.sin_cos();
        Self([[c, -s, 0.0], [s, c, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Matrix-vector product.
    #[must_use]
    pub fn apply(&self, v: Vec3) -> Vec3 {
        let m = &self.0;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }
}

impl Mul for Mat3 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let mut out = [[0.0; 3]; 3];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| self.0[i][k] * rhs.0[k][j]).sum();
            }
        }
        Self(out)
    }
}

/// Translation and rotation of a volume relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// Translation in mm.
    pub position: Vec3,
    /// Frame rotation in rad.
    pub rotation: Rotation,
}

impl Placement {
    /// Placement at the parent origin without rotation.
    pub const ORIGIN: Self = Self {
        position: Vec3::ZERO,
        rotation: Rotation::IDENTITY,
    };

    /// Pure translation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Rotation::IDENTITY,
        }
    }

    /// Translation along the parent z axis.
    #[must_use]
    pub const fn at_z(z: f64) -> Self {
        Self::at(Vec3::along_z(z))
    }

    /// Sets the rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }
}

/// Absolute position and orientation of a placed volume in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Global position of the volume origin in mm.
    pub origin: Vec3,
    /// Object rotation from local to global axes.
    pub basis: Mat3,
}

impl Frame {
    /// The world frame.
    pub const WORLD: Self = Self {
        origin: Vec3::ZERO,
        basis: Mat3::IDENTITY,
    };

    /// Frame of a daughter placed inside this frame.
    #[must_use]
    pub fn child(&self, placement: &Placement) -> Self {
        Self {
            origin: self.origin + self.basis.apply(placement.position),
            basis: self.basis * placement.rotation.matrix(),
        }
    }

    /// Maps a local point into global coordinates.
    #[must_use]
    pub fn to_global(&self, local: Vec3) -> Vec3 {
        self.origin + self.basis.apply(local)
    }
}

/// A material reference by name.
///
/// Names starting with `G4_` refer to the simulator's built-in NIST
/// database and need no definition in the interchange file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material(String);

impl Material {
    pub const AIR: &'static str = "G4_AIR";
    pub const VACUUM: &'static str = "G4_Galactic";
    pub const GERMANIUM: &'static str = "G4_Ge";
    pub const COPPER: &'static str = "G4_Cu";
    pub const MYLAR: &'static str = "G4_MYLAR";
    pub const ALUMINIUM: &'static str = "G4_Al";
    pub const LEAD: &'static str = "G4_Pb";
    pub const STEEL: &'static str = "G4_STAINLESS-STEEL";
    pub const PLEXIGLASS: &'static str = "G4_PLEXIGLASS";

    /// Creates a material reference.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the material name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns true for built-in NIST materials.
    #[must_use]
    pub fn is_nist(&self) -> bool {
        self.0.starts_with("G4_")
    }
}

impl From<&str> for Material {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_about_z_turns_object_clockwise() {
        // GDML frame rotation of +90 deg about z turns the object by -90 deg.
        let rot = Rotation::new(0.0, 0.0, FRAC_PI_2);
        let v = rot.apply(Vec3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(v.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_frame_composition() {
        let parent = Frame::WORLD.child(&Placement::at(Vec3::new(0.0, 0.0, 100.0)));
        let child = parent.child(&Placement::at(Vec3::new(5.0, 0.0, -10.0)));
        assert_abs_diff_eq!(child.origin.x, 5.0);
        assert_abs_diff_eq!(child.origin.z, 90.0);
    }

    #[test]
    fn test_material_nist() {
        assert!(Material::new(Material::GERMANIUM).is_nist());
        assert!(!Material::new("EnrichedGermanium").is_nist());
    }
}
