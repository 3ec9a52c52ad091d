//! Normalized detector descriptor.
//!
//! A [`DetectorDescriptor`] is the merge of the crystal metadata and the
//! holder/wrap metadata of one detector. It is produced once per run and
//! never modified afterwards.

use crate::units::Material;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// HPGe detector geometry family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DetectorKind {
    /// Broad energy germanium.
    Bege,
    /// Inverted-coaxial point contact.
    Icpc,
    /// P-type point contact.
    Ppc,
    /// Semi-coaxial.
    Coax,
}

impl DetectorKind {
    /// Lowercase metadata name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bege => "bege",
            Self::Icpc => "icpc",
            Self::Ppc => "ppc",
            Self::Coax => "coax",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bege" => Ok(Self::Bege),
            "icpc" => Ok(Self::Icpc),
            "ppc" => Ok(Self::Ppc),
            "coax" => Ok(Self::Coax),
            other => Err(format!("unknown detector type '{other}'")),
        }
    }
}

/// Crystal production batch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Production {
    /// Production order number.
    pub order: u32,
    /// Slice letter within the order.
    pub slice: String,
}

/// Central hole drilled from the front face.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Borehole {
    pub radius: f64,
    pub depth: f64,
}

/// Annular groove around the point contact on the back face.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Groove {
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub depth: f64,
}

/// Conical cut of an outer crystal edge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Taper {
    /// Axial length of the cut in mm.
    pub height: f64,
    /// Cut angle against the crystal axis in degrees.
    pub angle_deg: f64,
}

impl Taper {
    /// Radial depth of the cut in mm.
    #[must_use]
    pub fn radial_depth(&self) -> f64 {
        self.height * self.angle_deg.to_radians().tan()
    }
}

/// Crystal dimensions in mm.
///
/// The crystal frame has the back face (point contact, groove) at `z = 0`
/// and the front face (borehole) at `z = height`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CrystalGeometry {
    pub radius: f64,
    pub height: f64,
    pub borehole: Option<Borehole>,
    pub groove: Option<Groove>,
    pub top_taper: Option<Taper>,
    pub bottom_taper: Option<Taper>,
}

impl CrystalGeometry {
    /// Plain cylinder without cuts.
    #[must_use]
    pub fn cylinder(radius: f64, height: f64) -> Self {
        Self {
            radius,
            height,
            borehole: None,
            groove: None,
            top_taper: None,
            bottom_taper: None,
        }
    }
}

/// Which end of a shell layer is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CapSide {
    /// Closed below the enclosed layers, open toward the front face.
    Bottom,
    /// Closed over the front face, open toward the back.
    Top,
}

/// A ring bulging out of a shell wall.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ring {
    /// Outer radius in mm.
    pub radius: f64,
    /// Axial length in mm.
    pub height: f64,
    /// Distance from the open rim of the wall to the near edge of the ring.
    pub offset_from_rim: f64,
}

/// A cup-shaped layer around everything inside it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShellLayer {
    /// Layer name, also the volume name stem.
    pub name: String,
    pub material: Material,
    /// Radial air gap to the enclosed layers.
    pub radial_gap: f64,
    /// Axial air gap between the enclosed layers and the cap.
    pub axial_gap: f64,
    /// Wall thickness; zero means the layer is absent.
    pub wall_thickness: f64,
    /// Cap thickness.
    pub cap_thickness: f64,
    pub cap: CapSide,
    pub rings: Vec<Ring>,
}

impl ShellLayer {
    /// Returns true if the layer has no material.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        self.wall_thickness == 0.0
    }
}

/// Everything needed to build one detector unit.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorDescriptor {
    /// Detector name, e.g. `V01234A`.
    pub name: String,
    pub kind: DetectorKind,
    pub production: Production,
    /// Sensitive-detector id written to the output file.
    pub uid: u32,
    pub crystal: CrystalGeometry,
    /// Innermost shell.
    pub holder: ShellLayer,
    /// Outermost shell; may be absent.
    pub wrap: ShellLayer,
}

impl DetectorDescriptor {
    /// Shell layers from the inside out, skipping absent ones.
    pub fn shells(&self) -> impl Iterator<Item = &ShellLayer> {
        [&self.holder, &self.wrap]
            .into_iter()
            .filter(|layer| !layer.is_absent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_kind_parse() {
        assert_eq!("ICPC".parse::<DetectorKind>().unwrap(), DetectorKind::Icpc);
        assert_eq!("bege".parse::<DetectorKind>().unwrap(), DetectorKind::Bege);
        assert!("semi".parse::<DetectorKind>().is_err());
    }

    #[test]
    fn test_taper_depth() {
        let taper = Taper {
            height: 10.0,
            angle_deg: 45.0,
        };
        assert_abs_diff_eq!(taper.radial_depth(), 10.0, epsilon = 1e-12);
    }
}
