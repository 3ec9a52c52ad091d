//! Measurement configuration types.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lead shielding variants of the test stand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LeadCastle {
    /// Castle on table 1, with a front opening and plug.
    Table1,
    /// Castle on table 2, with a copper plate under the lid.
    Table2,
}

impl LeadCastle {
    /// Every valid variant.
    pub const ALL: [Self; 2] = [Self::Table1, Self::Table2];

    /// Looks a variant up by its configuration index.
    #[must_use]
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            1 => Some(Self::Table1),
            2 => Some(Self::Table2),
            _ => None,
        }
    }

    /// Configuration index of the variant.
    #[must_use]
    pub fn index(&self) -> u8 {
        match self {
            Self::Table1 => 1,
            Self::Table2 => 2,
        }
    }
}

impl fmt::Display for LeadCastle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lead castle {}", self.index())
    }
}

/// Source position in cylindrical coordinates around the detector axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SourcePosition {
    /// Distance from the detector axis in mm, never negative.
    pub r_mm: f64,
    /// Azimuth in degrees within `[0, 360)`.
    pub phi_deg: f64,
    /// Axial offset from the detector front face in mm.
    pub z_mm: f64,
}

impl SourcePosition {
    /// Creates a position, folding negative radii and normalizing the angle.
    #[must_use]
    pub fn new(r_mm: f64, phi_deg: f64, z_mm: f64) -> Self {
        let (r_mm, phi_deg) = if r_mm < 0.0 {
            (-r_mm, phi_deg + 180.0)
        } else {
            (r_mm, phi_deg)
        };
        Self {
            r_mm,
            phi_deg: normalize_degrees(phi_deg),
            z_mm,
        }
    }

    /// Cartesian offset `(x, y)` from the detector axis.
    ///
    /// The azimuth is measured from +x, counter-clockwise when looking
    /// down the axis from the source side.
    #[must_use]
    pub fn xy(&self) -> (f64, f64) {
        if self.r_mm == 0.0 {
            return (0.0, 0.0);
        }
        let (s, c) = self.phi_deg.to_radians().sin_cos();
        (self.r_mm * c, self.r_mm * s)
    }
}

/// Folds an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_degrees(deg: f64) -> f64 {
    let folded = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if folded >= 360.0 {
        0.0
    } else {
        folded
    }
}

/// The validated user configuration of one measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasurementConfig {
    pub source: SourcePosition,
    pub lead_castle: LeadCastle,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_degrees() {
        assert_abs_diff_eq!(normalize_degrees(-90.0), 270.0);
        assert_abs_diff_eq!(normalize_degrees(720.0), 0.0);
        assert_abs_diff_eq!(normalize_degrees(359.5), 359.5);
        assert!(normalize_degrees(-1e-20) < 360.0);
    }

    #[test]
    fn test_zero_radius_ignores_angle() {
        for phi in [0.0, 33.0, 180.0, 359.0] {
            assert_eq!(SourcePosition::new(0.0, phi, 0.0).xy(), (0.0, 0.0));
        }
    }

    #[test]
    fn test_xy_counter_clockwise() {
        let (x, y) = SourcePosition::new(10.0, 90.0, 0.0).xy();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_castle_index_round_trip() {
        for castle in LeadCastle::ALL {
            assert_eq!(LeadCastle::from_index(i64::from(castle.index())), Some(castle));
        }
        assert_eq!(LeadCastle::from_index(0), None);
        assert_eq!(LeadCastle::from_index(3), None);
    }
}
