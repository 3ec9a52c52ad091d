//! Measurement configuration loading.
//!
//! ```yaml
//! source_position:
//!   r_in_mm: 86.0
//!   phi_in_deg: 0.0
//!   z_in_mm: 3.0
//! lead_castle_idx: 1
//! ```
//!
//! Validation walks the whole document and reports every bad field at
//! once instead of stopping at the first one.

use hadesgeom_core::{
    ConfigValidationError, FieldViolation, LeadCastle, MeasurementConfig, SourcePosition,
};
use serde_yml::Value;
use std::fs;
use std::path::Path;

/// Field name used for whole-document problems.
pub const DOCUMENT_FIELD: &str = "document";

const SOURCE_POSITION: &str = "source_position";
const LEAD_CASTLE_IDX: &str = "lead_castle_idx";
const CASTLE_CHOICES: &str = "{1, 2}";
const KNOWN_KEYS: [&str; 4] = [SOURCE_POSITION, LEAD_CASTLE_IDX, "detector", "measurement"];

/// Reads and validates a configuration file.
///
/// # Errors
/// Returns a [`ConfigValidationError`] listing every invalid field, or a
/// single `document` violation if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<MeasurementConfig, ConfigValidationError> {
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigValidationError::single(
            DOCUMENT_FIELD,
            format!("cannot read {}: {e}", path.display()),
        )
    })?;
    parse_config(&text)
}

/// Parses and validates a configuration document.
///
/// # Errors
/// See [`load_config`].
pub fn parse_config(text: &str) -> Result<MeasurementConfig, ConfigValidationError> {
    let root: Value = serde_yml::from_str(text)
        .map_err(|e| ConfigValidationError::single(DOCUMENT_FIELD, e.to_string()))?;
    let Some(map) = root.as_mapping() else {
        return Err(ConfigValidationError::single(
            DOCUMENT_FIELD,
            "expected a mapping at the top level",
        ));
    };
    for key in map.keys().filter_map(Value::as_str) {
        if !KNOWN_KEYS.contains(&key) {
            log::debug!("ignoring configuration key '{key}'");
        }
    }

    let mut violations = Vec::new();

    let position = match root.get(SOURCE_POSITION) {
        None => {
            violations.push(FieldViolation::new(SOURCE_POSITION, "missing"));
            None
        }
        Some(section) if !section.is_mapping() => {
            violations.push(FieldViolation::new(SOURCE_POSITION, "expected a mapping"));
            None
        }
        Some(section) => {
            let r = number(section, "r_in_mm", &mut violations);
            let phi = number(section, "phi_in_deg", &mut violations);
            let z = number(section, "z_in_mm", &mut violations);
            if let Some(r) = r.filter(|r| *r < 0.0) {
                violations.push(FieldViolation::new(
                    format!("{SOURCE_POSITION}.r_in_mm"),
                    format!("must not be negative, got {r}"),
                ));
            }
            match (r, phi, z) {
                (Some(r), Some(phi), Some(z)) if r >= 0.0 => Some(SourcePosition::new(r, phi, z)),
                _ => None,
            }
        }
    };

    let castle = match root.get(LEAD_CASTLE_IDX) {
        None => {
            violations.push(FieldViolation::new(LEAD_CASTLE_IDX, "missing"));
            None
        }
        Some(value) => {
            let castle = value.as_i64().and_then(LeadCastle::from_index);
            if castle.is_none() {
                violations.push(FieldViolation::new(
                    LEAD_CASTLE_IDX,
                    format!("must be one of {CASTLE_CHOICES}, got {}", describe(value)),
                ));
            }
            castle
        }
    };

    match (position, castle) {
        (Some(source), Some(lead_castle)) if violations.is_empty() => Ok(MeasurementConfig {
            source,
            lead_castle,
        }),
        _ => Err(ConfigValidationError::new(violations)),
    }
}

fn number(section: &Value, key: &str, violations: &mut Vec<FieldViolation>) -> Option<f64> {
    let field = format!("{SOURCE_POSITION}.{key}");
    let Some(value) = section.get(key) else {
        violations.push(FieldViolation::new(field, "missing"));
        return None;
    };
    match value.as_f64() {
        Some(x) if x.is_finite() => Some(x),
        Some(x) => {
            violations.push(FieldViolation::new(field, format!("must be finite, got {x}")));
            None
        }
        None => {
            violations.push(FieldViolation::new(
                field,
                format!("expected a number, got {}", describe(value)),
            ));
            None
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Sequence(_) => "a list".to_string(),
        Value::Mapping(_) => "a mapping".to_string(),
        Value::Tagged(_) => "a tagged value".to_string(),
    }
}
