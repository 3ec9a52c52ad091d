//! Fixed test-stand dimensions in mm.
//!
//! The global frame has the table surface at `z = 0` and the detector axis
//! along +z through the origin. The lead castles open toward -y.

use crate::error::Result;
use hadesgeom_core::{DetectorDescriptor, DetectorKind, MetadataError};

/// Cryostat vessel dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CryostatDims {
    /// Outer height of the vessel.
    pub height: f64,
    /// Outer diameter of the vessel.
    pub width: f64,
    /// Wall thickness.
    pub thickness: f64,
    /// Distance from the outer top face to the cavity ceiling.
    pub cavity_from_top: f64,
    /// Distance from the outer bottom face to the cavity floor.
    pub cavity_from_bottom: f64,
    /// Height of the vessel bottom above the table.
    pub position_from_bottom: f64,
}

/// Production orders delivered in the wide ICPC cryostat.
const XL_ORDERS: [u32; 4] = [3, 8, 9, 10];

impl CryostatDims {
    /// Cryostat used for a detector.
    ///
    /// # Errors
    /// Returns [`MetadataError::Inconsistent`] for detector types without a
    /// cryostat model.
    pub fn for_detector(desc: &DetectorDescriptor) -> Result<Self> {
        let (height, width) = match desc.kind {
            DetectorKind::Bege => (122.2, 101.6),
            DetectorKind::Icpc => {
                let order = desc.production.order;
                let width = if order == 9 && desc.production.slice == "B" {
                    107.95
                } else if XL_ORDERS.contains(&order) {
                    114.3
                } else {
                    101.6
                };
                (171.0, width)
            }
            other => {
                return Err(MetadataError::Inconsistent {
                    detector: desc.name.clone(),
                    problems: vec![format!("no cryostat model for detector type '{other}'")],
                }
                .into())
            }
        };
        Ok(Self {
            height,
            width,
            thickness: 1.5,
            cavity_from_top: 1.5,
            cavity_from_bottom: 0.8,
            position_from_bottom: 250.0,
        })
    }

    /// Radius of the vacuum cavity.
    #[must_use]
    pub fn cavity_radius(&self) -> f64 {
        0.5 * self.width - self.thickness
    }

    /// Height of the vacuum cavity.
    #[must_use]
    pub fn cavity_height(&self) -> f64 {
        self.height - self.cavity_from_top - self.cavity_from_bottom
    }

    /// Global z of the vessel center.
    #[must_use]
    pub fn center_z(&self) -> f64 {
        self.position_from_bottom + 0.5 * self.height
    }

    /// Global z of the outer top face.
    #[must_use]
    pub fn top_z(&self) -> f64 {
        self.position_from_bottom + self.height
    }

    /// Offset of the cavity center from the vessel center.
    #[must_use]
    pub fn cavity_offset(&self) -> f64 {
        0.5 * (self.cavity_from_bottom - self.cavity_from_top)
    }
}

/// Clearance between the detector unit and the cavity ceiling.
pub const UNIT_CLEARANCE: f64 = 2.0;

/// Full width (x), depth (y) and height (z) of a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxDims {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl BoxDims {
    #[must_use]
    pub const fn new(width: f64, depth: f64, height: f64) -> Self {
        Self {
            width,
            depth,
            height,
        }
    }
}

/// Lead castle on table 1.
pub mod castle1 {
    use super::BoxDims;

    pub const BASE: BoxDims = BoxDims::new(480.0, 450.0, 500.0);
    pub const INNER_CAVITY: BoxDims = BoxDims::new(300.0, 250.0, 500.0);
    /// Opening in the -y wall, from the floor up.
    pub const CAVITY: BoxDims = BoxDims::new(120.0, 100.0, 400.0);
    pub const TOP: BoxDims = BoxDims::new(300.0, 300.0, 90.0);
    /// Block in front of the opening.
    pub const FRONT: BoxDims = BoxDims::new(160.0, 100.0, 400.0);
}

/// Lead castle on table 2.
pub mod castle2 {
    use super::BoxDims;

    pub const BASE: BoxDims = BoxDims::new(350.0, 350.0, 400.0);
    pub const INNER_CAVITY: BoxDims = BoxDims::new(250.0, 250.0, 400.0);
    pub const TOP: BoxDims = BoxDims::new(200.0, 200.0, 50.0);
    pub const COPPER_PLATE: BoxDims = BoxDims::new(350.0, 350.0, 10.0);
}

/// Plate under the table surface.
pub const BOTTOM_PLATE: BoxDims = BoxDims::new(750.0, 750.0, 15.0);
/// Slot through the bottom plate.
pub const BOTTOM_PLATE_CAVITY: BoxDims = BoxDims::new(120.0, 940.0, 20.0);

/// Plexiglass hat carrying top sources, resting on the cryostat lid.
///
/// Widths are full diameters; a plate with a depth is rectangular.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopHolderDims {
    pub plate_height: f64,
    pub plate_width: f64,
    pub plate_depth: Option<f64>,
    /// Opening in the plate under the source.
    pub hole_width: f64,
    pub hole_depth: Option<f64>,
    /// Lid around the plate.
    pub lid_height: f64,
    /// Sleeve from the lid down to the cryostat.
    pub inner_width: f64,
    /// Skirt around the cryostat rim.
    pub skirt_inner_width: f64,
    pub skirt_height: f64,
    pub outer_width: f64,
}

/// Hat used for collimated americium, barium, cobalt, caesium and thorium.
pub const TOP_HOLDER: TopHolderDims = TopHolderDims {
    plate_height: 3.0,
    plate_width: 30.0,
    plate_depth: None,
    hole_width: 20.0,
    hole_depth: None,
    lid_height: 10.0,
    inner_width: 87.0,
    skirt_inner_width: 102.0,
    skirt_height: 6.1,
    outer_width: 108.0,
};

/// Hat for the bare americium capsule, with a rectangular plate.
pub const AM_TOP_HOLDER: TopHolderDims = TopHolderDims {
    plate_depth: Some(20.0),
    hole_width: 6.0,
    hole_depth: Some(6.0),
    ..TOP_HOLDER
};

/// Copper plate replacing the plexiglass one under thorium sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThPlateDims {
    pub height: f64,
    pub width: f64,
    pub cavity_width: f64,
}

pub const TH_PLATE: ThPlateDims = ThPlateDims {
    height: 3.0,
    width: 30.0,
    cavity_width: 10.0,
};

/// Plexiglass ring around the cryostat carrying lateral thorium sources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LateralHolderDims {
    pub height: f64,
    /// Pocket cut through the ring for the source.
    pub pocket_height: f64,
    pub pocket_width: f64,
    pub inner_width: f64,
    pub outer_width: f64,
}

pub const LATERAL_HOLDER: LateralHolderDims = LateralHolderDims {
    height: 20.0,
    pocket_height: 16.0,
    pocket_width: 16.0,
    inner_width: 120.0,
    outer_width: 220.0,
};

/// Extra length added to subtracted boxes so cut faces never coincide.
pub const CUT_MARGIN: f64 = 1.0;

/// Full side of the world box.
pub const WORLD_SIZE: f64 = 10_000.0;
