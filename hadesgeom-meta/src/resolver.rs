//! Detector metadata resolution.
//!
//! [`MetadataResolver::resolve`] looks up the crystal document and the
//! holder/wrap document of one detector and merges them with [`merge`].
//! The merge is exhaustive: every violated cross-check is collected before
//! failing, so a broken metadata entry is fixed in one round.

use crate::crystal::{DiodeDoc, GeometryDoc};
use crate::hades::{CylinderDims, HadesDoc};
use crate::public::PublicStore;
use crate::store::{Document, DocumentStore};
use hadesgeom_core::{
    Borehole, CapSide, CrystalGeometry, DetectorDescriptor, DetectorKind, Groove, MetadataError,
    Production, Ring, ShellLayer, Taper,
};
use serde::de::DeserializeOwned;

/// Sensitive-detector id used when the diode document carries none.
pub const DEFAULT_UID: u32 = 1;

/// Label of the crystal document store.
pub const DIODE_STORE: &str = "diode";
/// Label of the holder/wrap document store.
pub const HADES_STORE: &str = "holder/wrap";

/// Resolves detector names to [`DetectorDescriptor`]s.
pub struct MetadataResolver {
    diodes: Box<dyn DocumentStore>,
    hades: Box<dyn DocumentStore>,
}

impl MetadataResolver {
    /// Creates a resolver over a crystal store and a holder/wrap store.
    pub fn new(diodes: impl DocumentStore + 'static, hades: impl DocumentStore + 'static) -> Self {
        Self {
            diodes: Box::new(diodes),
            hades: Box::new(hades),
        }
    }

    /// Resolver over the bundled public test data.
    #[must_use]
    pub fn public() -> Self {
        log::warn!("CONSTRUCTING GEOMETRY FROM PUBLIC DATA ONLY");
        Self::new(PublicStore::diodes(), PublicStore::hades())
    }

    /// Looks up and merges the metadata of `detector`.
    ///
    /// # Errors
    /// - [`MetadataError::NotFound`] if either document is missing
    /// - [`MetadataError::Io`] if a document cannot be read
    /// - [`MetadataError::Malformed`] if a document cannot be parsed
    /// - [`MetadataError::Inconsistent`] if the cross-checks fail
    pub fn resolve(&self, detector: &str) -> Result<DetectorDescriptor, MetadataError> {
        let diode: DiodeDoc = load(self.diodes.as_ref(), detector)?;
        let hades: HadesDoc = load(self.hades.as_ref(), detector)?;
        let descriptor = merge(detector, &diode, &hades)?;
        log::info!(
            "resolved {} ({}, order {}{})",
            descriptor.name,
            descriptor.kind,
            descriptor.production.order,
            descriptor.production.slice
        );
        Ok(descriptor)
    }
}

fn load<T: DeserializeOwned>(store: &dyn DocumentStore, detector: &str) -> Result<T, MetadataError> {
    let document: Document = store
        .fetch(detector)
        .map_err(|source| MetadataError::Io {
            detector: detector.to_string(),
            store: store.label().to_string(),
            source,
        })?
        .ok_or_else(|| MetadataError::NotFound {
            detector: detector.to_string(),
            store: store.label().to_string(),
        })?;
    document.parse().map_err(|message| MetadataError::Malformed {
        detector: detector.to_string(),
        store: store.label().to_string(),
        message,
    })
}

/// Collects failed checks.
#[derive(Default)]
struct Checks(Vec<String>);

impl Checks {
    fn require(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.0.push(message());
        }
    }

    fn positive(&mut self, field: &str, value: f64) {
        self.require(value.is_finite() && value > 0.0, || {
            format!("{field} must be positive, got {value}")
        });
    }

    fn non_negative(&mut self, field: &str, value: f64) {
        self.require(value.is_finite() && value >= 0.0, || {
            format!("{field} must not be negative, got {value}")
        });
    }
}

/// Merges a crystal document and a holder/wrap document.
///
/// # Errors
/// - [`MetadataError::Malformed`] for an unknown detector type
/// - [`MetadataError::Inconsistent`] listing every failed cross-check
pub fn merge(
    detector: &str,
    diode: &DiodeDoc,
    hades: &HadesDoc,
) -> Result<DetectorDescriptor, MetadataError> {
    let kind: DetectorKind = diode
        .kind
        .parse()
        .map_err(|message| MetadataError::Malformed {
            detector: detector.to_string(),
            store: DIODE_STORE.to_string(),
            message,
        })?;

    let mut checks = Checks::default();
    checks.require(diode.name == detector, || {
        format!("diode document is named '{}'", diode.name)
    });
    checks.require(matches!(kind, DetectorKind::Bege | DetectorKind::Icpc), || {
        format!("no cryostat model for detector type '{kind}'")
    });

    let crystal = check_crystal(&diode.geometry, &mut checks);

    // holder cup around the crystal, open toward the front face
    let holder_doc = &hades.holder;
    let cyl = holder_doc.cylinder;
    check_cylinder("holder.cylinder.inner", cyl.inner, &mut checks);
    check_cylinder("holder.cylinder.outer", cyl.outer, &mut checks);
    checks.require(cyl.inner.radius_in_mm >= crystal.radius, || {
        format!(
            "holder inner radius {} is smaller than the crystal radius {}",
            cyl.inner.radius_in_mm, crystal.radius
        )
    });
    checks.require(cyl.inner.height_in_mm >= crystal.height, || {
        format!(
            "holder inner height {} is smaller than the crystal height {}",
            cyl.inner.height_in_mm, crystal.height
        )
    });
    checks.require(cyl.outer.radius_in_mm > cyl.inner.radius_in_mm, || {
        "holder outer radius must exceed its inner radius".to_string()
    });
    checks.require(cyl.outer.height_in_mm > cyl.inner.height_in_mm, || {
        "holder outer height must exceed its inner height".to_string()
    });

    let mut rings = Vec::new();
    if let Some(doc) = holder_doc.rings {
        checks.positive("holder.rings.height_in_mm", doc.height_in_mm);
        checks.require(doc.radius_in_mm > cyl.outer.radius_in_mm, || {
            format!(
                "holder ring radius {} does not exceed the holder outer radius {}",
                doc.radius_in_mm, cyl.outer.radius_in_mm
            )
        });
        let positions = holder_doc.ring_positions();
        for (i, &offset) in positions.iter().enumerate() {
            checks.non_negative("holder.rings position", offset);
            checks.require(offset + doc.height_in_mm <= cyl.outer.height_in_mm, || {
                format!("holder ring at {offset} mm sticks out below the holder")
            });
            if i > 0 {
                let previous = positions[i - 1];
                checks.require(offset >= previous + doc.height_in_mm, || {
                    "holder rings overlap each other".to_string()
                });
            }
            rings.push(Ring {
                radius: doc.radius_in_mm,
                height: doc.height_in_mm,
                offset_from_rim: offset,
            });
        }
    }
    let holder_extent = rings
        .iter()
        .map(|r| r.radius)
        .fold(cyl.outer.radius_in_mm, f64::max);

    let holder = ShellLayer {
        name: "holder".to_string(),
        material: holder_doc.material(),
        radial_gap: cyl.inner.radius_in_mm - crystal.radius,
        axial_gap: cyl.inner.height_in_mm - crystal.height,
        wall_thickness: cyl.outer.radius_in_mm - cyl.inner.radius_in_mm,
        cap_thickness: cyl.outer.height_in_mm - cyl.inner.height_in_mm,
        cap: CapSide::Bottom,
        rings,
    };

    // wrap over holder and crystal, closed over the front face
    let wrap_doc = &hades.wrap;
    let wrap_thickness = wrap_doc.outer.radius_in_mm - wrap_doc.inner.radius_in_mm;
    let wrap = if wrap_thickness == 0.0 {
        log::debug!("{detector}: wrap has zero thickness, omitting it");
        ShellLayer {
            name: "wrap".to_string(),
            material: wrap_doc.material(),
            radial_gap: 0.0,
            axial_gap: 0.0,
            wall_thickness: 0.0,
            cap_thickness: 0.0,
            cap: CapSide::Top,
            rings: Vec::new(),
        }
    } else {
        check_cylinder("wrap.inner", wrap_doc.inner, &mut checks);
        check_cylinder("wrap.outer", wrap_doc.outer, &mut checks);
        checks.require(wrap_thickness > 0.0, || {
            "wrap outer radius is smaller than its inner radius".to_string()
        });
        checks.require(wrap_doc.inner.radius_in_mm >= holder_extent, || {
            format!(
                "wrap inner radius {} is smaller than the holder outer radius {holder_extent}",
                wrap_doc.inner.radius_in_mm
            )
        });
        checks.require(wrap_doc.inner.height_in_mm >= cyl.outer.height_in_mm, || {
            format!(
                "wrap inner height {} is smaller than the holder outer height {}",
                wrap_doc.inner.height_in_mm, cyl.outer.height_in_mm
            )
        });
        checks.require(wrap_doc.outer.height_in_mm > wrap_doc.inner.height_in_mm, || {
            "wrap outer height must exceed its inner height".to_string()
        });
        ShellLayer {
            name: "wrap".to_string(),
            material: wrap_doc.material(),
            radial_gap: wrap_doc.inner.radius_in_mm - holder_extent,
            axial_gap: wrap_doc.inner.height_in_mm - cyl.outer.height_in_mm,
            wall_thickness: wrap_thickness,
            cap_thickness: wrap_doc.outer.height_in_mm - wrap_doc.inner.height_in_mm,
            cap: CapSide::Top,
            rings: Vec::new(),
        }
    };

    if !checks.0.is_empty() {
        return Err(MetadataError::Inconsistent {
            detector: detector.to_string(),
            problems: checks.0,
        });
    }

    Ok(DetectorDescriptor {
        name: detector.to_string(),
        kind,
        production: Production {
            order: diode.production.order,
            slice: diode.production.slice.clone(),
        },
        uid: diode
            .daq
            .as_ref()
            .and_then(|d| d.rawid)
            .unwrap_or(DEFAULT_UID),
        crystal,
        holder,
        wrap,
    })
}

fn check_cylinder(field: &str, dims: CylinderDims, checks: &mut Checks) {
    checks.positive(&format!("{field}.radius_in_mm"), dims.radius_in_mm);
    checks.positive(&format!("{field}.height_in_mm"), dims.height_in_mm);
}

fn check_crystal(geometry: &GeometryDoc, checks: &mut Checks) -> CrystalGeometry {
    let radius = geometry.radius_in_mm;
    let height = geometry.height_in_mm;
    checks.positive("geometry.radius_in_mm", radius);
    checks.positive("geometry.height_in_mm", height);

    let borehole = geometry.active_borehole().map(|b| Borehole {
        radius: b.radius_in_mm,
        depth: b.depth_in_mm,
    });
    if let Some(b) = borehole {
        checks.positive("geometry.borehole.radius_in_mm", b.radius);
        checks.positive("geometry.borehole.depth_in_mm", b.depth);
        checks.require(b.radius < radius, || {
            format!("borehole radius {} is not smaller than the crystal radius {radius}", b.radius)
        });
        checks.require(b.depth < height, || {
            format!("borehole depth {} is not smaller than the crystal height {height}", b.depth)
        });
    }

    let groove = geometry.active_groove().map(|g| Groove {
        inner_radius: g.radius_in_mm.inner,
        outer_radius: g.radius_in_mm.outer,
        depth: g.depth_in_mm,
    });
    if let Some(g) = groove {
        checks.positive("geometry.groove.depth_in_mm", g.depth);
        checks.positive("geometry.groove.radius_in_mm.inner", g.inner_radius);
        checks.require(g.outer_radius > g.inner_radius, || {
            "groove outer radius must exceed its inner radius".to_string()
        });
        checks.require(g.outer_radius < radius, || {
            format!("groove outer radius {} is not smaller than the crystal radius {radius}", g.outer_radius)
        });
        if let Some(b) = borehole {
            let radial_overlap = g.inner_radius < b.radius;
            checks.require(!radial_overlap || g.depth + b.depth < height, || {
                "groove and borehole cut through the crystal".to_string()
            });
        }
    }

    let top_taper = geometry.top_taper().map(|t| Taper {
        height: t.height_in_mm,
        angle_deg: t.angle_in_deg,
    });
    let bottom_taper = geometry.bottom_taper().map(|t| Taper {
        height: t.height_in_mm,
        angle_deg: t.angle_in_deg,
    });
    for (field, taper) in [("top", top_taper), ("bottom", bottom_taper)] {
        if let Some(t) = taper {
            checks.positive(&format!("geometry.taper.{field}.outer.height_in_mm"), t.height);
            checks.require(t.angle_deg > 0.0 && t.angle_deg < 90.0, || {
                format!("{field} taper angle {} must lie in (0, 90) degrees", t.angle_deg)
            });
            checks.require(t.radial_depth() < radius, || {
                format!("{field} taper removes the whole crystal radius")
            });
        }
    }
    let taper_length = top_taper.map_or(0.0, |t| t.height) + bottom_taper.map_or(0.0, |t| t.height);
    checks.require(taper_length <= height, || {
        format!("tapers are {taper_length} mm long in total, longer than the crystal")
    });
    if let (Some(t), Some(b)) = (top_taper, borehole) {
        checks.require(radius - t.radial_depth() > b.radius, || {
            "top taper cuts into the borehole".to_string()
        });
    }
    if let (Some(t), Some(g)) = (bottom_taper, groove) {
        checks.require(radius - t.radial_depth() > g.outer_radius, || {
            "bottom taper cuts into the groove".to_string()
        });
    }

    CrystalGeometry {
        radius,
        height,
        borehole,
        groove,
        top_taper,
        bottom_taper,
    }
}
