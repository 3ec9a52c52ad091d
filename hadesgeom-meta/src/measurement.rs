//! Measurement names.
//!
//! Campaign measurements are named `<source>_<holder>_<position>_<id>`,
//! e.g. `am_HS1_top_dlt`.

use hadesgeom_core::ConfigValidationError;
use std::fmt;
use std::str::FromStr;

/// Field name used for measurement-name violations.
pub const MEASUREMENT_FIELD: &str = "measurement";

/// Radioactive source models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Americium-241 in a plain capsule.
    Am,
    /// Americium-241 behind a collimator (source holder `HS1`).
    AmCollimated,
    /// Barium-133.
    Ba,
    /// Cobalt-60.
    Co,
    /// Caesium-137.
    Cs,
    /// Thorium-228.
    Th,
}

impl SourceKind {
    /// Short name used in measurement names and volume names.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Am => "am",
            Self::AmCollimated => "am_collimated",
            Self::Ba => "ba",
            Self::Co => "co",
            Self::Cs => "cs",
            Self::Th => "th",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "am" => Ok(Self::Am),
            "am_collimated" => Ok(Self::AmCollimated),
            "ba" => Ok(Self::Ba),
            "co" => Ok(Self::Co),
            "cs" => Ok(Self::Cs),
            "th" => Ok(Self::Th),
            other => Err(format!("unknown source '{other}'")),
        }
    }
}

/// Where the source sits relative to the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSide {
    /// Above the front face.
    Top,
    /// Beside the cryostat, pointing at the detector axis.
    Lat,
    /// Below the detector.
    Bottom,
}

impl FromStr for SourceSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top" => Ok(Self::Top),
            "lat" => Ok(Self::Lat),
            "bottom" => Ok(Self::Bottom),
            other => Err(format!("unknown source position '{other}'")),
        }
    }
}

/// A parsed measurement name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub source: SourceKind,
    /// Source holder id, e.g. `HS1`.
    pub holder: String,
    pub position: SourceSide,
    /// Free-form measurement id.
    pub id: String,
}

/// Parses a measurement name.
///
/// The americium source in holder `HS1` is the collimated one.
///
/// # Errors
/// Returns a [`ConfigValidationError`] on field `measurement` if the name
/// has fewer than four parts or names an unknown source or position.
pub fn parse_measurement(name: &str) -> Result<Measurement, ConfigValidationError> {
    let invalid = |message: String| ConfigValidationError::single(MEASUREMENT_FIELD, message);

    let parts: Vec<&str> = name.splitn(4, '_').collect();
    let [source, holder, position, id] = parts[..] else {
        return Err(invalid(format!(
            "'{name}' is not of the form <source>_<holder>_<position>_<id>"
        )));
    };
    if holder.is_empty() || id.is_empty() {
        return Err(invalid(format!("'{name}' has an empty holder or id")));
    }

    let mut source: SourceKind = source.parse().map_err(invalid)?;
    if source == SourceKind::Am && holder == "HS1" {
        source = SourceKind::AmCollimated;
    }
    let position: SourceSide = position.parse().map_err(invalid)?;

    Ok(Measurement {
        source,
        holder: holder.to_string(),
        position,
        id: id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_measurement_basic() {
        let m = parse_measurement("cs_HS2_bottom_foo").unwrap();
        assert_eq!(m.source, SourceKind::Cs);
        assert_eq!(m.holder, "HS2");
        assert_eq!(m.position, SourceSide::Bottom);
        assert_eq!(m.id, "foo");
    }

    #[test]
    fn test_collimated_americium() {
        let m = parse_measurement("am_HS1_top_dlt").unwrap();
        assert_eq!(m.source, SourceKind::AmCollimated);
        assert_eq!(m.position, SourceSide::Top);
        assert_eq!(m.id, "dlt");

        assert_eq!(parse_measurement("am_HS2_top_dlt").unwrap().source, SourceKind::Am);
    }

    #[test]
    fn test_id_keeps_underscores() {
        assert_eq!(parse_measurement("th_HS2_lat_psa_scan").unwrap().id, "psa_scan");
    }

    #[test]
    fn test_invalid_names() {
        for name in ["am_HS1_top", "xx_HS1_top_a", "am_HS1_side_a", "am__top_a"] {
            let err = parse_measurement(name).unwrap_err();
            assert!(err.has_field(MEASUREMENT_FIELD), "{name}");
        }
    }
}
