//! Holder and wrap documents of the HADES test stand.
//!
//! ```yaml
//! holder:
//!   material: G4_Cu            # optional
//!   cylinder:
//!     inner: {radius_in_mm: 36.0, height_in_mm: 95.0}
//!     outer: {radius_in_mm: 38.0, height_in_mm: 97.0}
//!   rings:                     # optional
//!     radius_in_mm: 40.0
//!     height_in_mm: 3.0
//!     position_top_ring_in_mm: 5.0
//!     position_bottom_ring_in_mm: 60.0   # optional
//! wrap:
//!   material: G4_MYLAR         # optional
//!   inner: {radius_in_mm: 40.5, height_in_mm: 98.0}
//!   outer: {radius_in_mm: 41.5, height_in_mm: 99.0}
//! ```
//!
//! Ring positions are measured from the open rim of the holder.

use hadesgeom_core::Material;
use serde::Deserialize;

/// Top level of a holder/wrap document.
#[derive(Debug, Clone, Deserialize)]
pub struct HadesDoc {
    pub holder: HolderDoc,
    pub wrap: WrapDoc,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CylinderDims {
    pub radius_in_mm: f64,
    pub height_in_mm: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CylinderPair {
    pub inner: CylinderDims,
    pub outer: CylinderDims,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HolderDoc {
    #[serde(default)]
    pub material: Option<String>,
    pub cylinder: CylinderPair,
    #[serde(default)]
    pub rings: Option<RingsDoc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RingsDoc {
    pub radius_in_mm: f64,
    pub height_in_mm: f64,
    pub position_top_ring_in_mm: f64,
    #[serde(default)]
    pub position_bottom_ring_in_mm: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WrapDoc {
    #[serde(default)]
    pub material: Option<String>,
    pub inner: CylinderDims,
    pub outer: CylinderDims,
}

impl HolderDoc {
    /// Holder material, copper unless the document says otherwise.
    #[must_use]
    pub fn material(&self) -> Material {
        Material::new(self.material.as_deref().unwrap_or(Material::COPPER))
    }

    /// Ring offsets from the rim, top ring first.
    #[must_use]
    pub fn ring_positions(&self) -> Vec<f64> {
        self.rings
            .iter()
            .flat_map(|r| std::iter::once(r.position_top_ring_in_mm).chain(r.position_bottom_ring_in_mm))
            .collect()
    }
}

impl WrapDoc {
    /// Wrap material, mylar unless the document says otherwise.
    #[must_use]
    pub fn material(&self) -> Material {
        Material::new(self.material.as_deref().unwrap_or(Material::MYLAR))
    }
}
