//! Crystal documents in the legend diode format.

use serde::Deserialize;

/// Top level of a diode document.
///
/// Only the fields used for geometry are modeled; everything else in the
/// document (enrichment, characterization, ...) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DiodeDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub production: ProductionDoc,
    pub geometry: GeometryDoc,
    #[serde(default)]
    pub daq: Option<DaqDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductionDoc {
    pub order: u32,
    pub slice: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DaqDoc {
    pub rawid: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeometryDoc {
    pub height_in_mm: f64,
    pub radius_in_mm: f64,
    #[serde(default)]
    pub borehole: Option<BoreholeDoc>,
    #[serde(default)]
    pub groove: Option<GrooveDoc>,
    #[serde(default)]
    pub taper: Option<TapersDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoreholeDoc {
    pub radius_in_mm: f64,
    pub depth_in_mm: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GrooveDoc {
    pub depth_in_mm: f64,
    pub radius_in_mm: InnerOuter,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InnerOuter {
    pub inner: f64,
    pub outer: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TapersDoc {
    #[serde(default)]
    pub top: Option<TaperEndDoc>,
    #[serde(default)]
    pub bottom: Option<TaperEndDoc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaperEndDoc {
    #[serde(default)]
    pub outer: Option<TaperDoc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TaperDoc {
    pub height_in_mm: f64,
    pub angle_in_deg: f64,
}

impl GeometryDoc {
    /// Outer taper on the front face, if it has any length.
    #[must_use]
    pub fn top_taper(&self) -> Option<TaperDoc> {
        self.taper
            .as_ref()
            .and_then(|t| t.top.as_ref())
            .and_then(|end| end.outer)
            .filter(|t| t.height_in_mm != 0.0)
    }

    /// Outer taper on the back face, if it has any length.
    #[must_use]
    pub fn bottom_taper(&self) -> Option<TaperDoc> {
        self.taper
            .as_ref()
            .and_then(|t| t.bottom.as_ref())
            .and_then(|end| end.outer)
            .filter(|t| t.height_in_mm != 0.0)
    }

    /// Borehole, if it has any depth.
    #[must_use]
    pub fn active_borehole(&self) -> Option<&BoreholeDoc> {
        self.borehole.as_ref().filter(|b| b.depth_in_mm != 0.0)
    }

    /// Groove, if it has any depth.
    #[must_use]
    pub fn active_groove(&self) -> Option<&GrooveDoc> {
        self.groove.as_ref().filter(|g| g.depth_in_mm != 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Document;

    #[test]
    fn test_parse_ignores_unknown_fields() {
        let doc = Document::yaml(
            r"
name: B00000B
type: bege
production:
  order: 0
  slice: B
  enrichment: {val: 0.88}
geometry:
  height_in_mm: 30
  radius_in_mm: 37
  groove:
    depth_in_mm: 2
    radius_in_mm: {inner: 7.5, outer: 10.5}
  taper:
    top:
      outer: {height_in_mm: 0, angle_in_deg: 0}
",
        );
        let diode: DiodeDoc = doc.parse().unwrap();
        assert_eq!(diode.kind, "bege");
        assert!(diode.geometry.top_taper().is_none());
        assert!(diode.geometry.active_groove().is_some());
        assert!(diode.geometry.active_borehole().is_none());
    }

    #[test]
    fn test_missing_geometry_is_an_error() {
        let doc = Document::yaml("name: V1\ntype: icpc\nproduction: {order: 1, slice: A}\n");
        let err = doc.parse::<DiodeDoc>().unwrap_err();
        assert!(err.contains("geometry"));
    }
}
