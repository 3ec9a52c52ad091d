//! Error types for hadesgeom-core.

use std::fmt;
use thiserror::Error;

/// Result type alias for geometry operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Geometry construction errors.
#[derive(Error, Debug)]
pub enum Error {
    /// A shape with non-positive extent or an empty outline.
    #[error("degenerate solid '{solid}': {reason}")]
    DegenerateSolid { solid: String, reason: String },

    /// Two children of one parent share a name.
    #[error("volume '{parent}' already has a child named '{child}'")]
    DuplicateChild { parent: String, child: String },

    /// A volume name appears more than once in the tree.
    #[error("volume name '{0}' is used more than once in the tree")]
    DuplicateVolumeName(String),

    /// Two volumes claim the same sensitive-detector tag.
    #[error("sensitive tag '{tag}' is claimed by both '{first}' and '{second}'")]
    DuplicateSensitiveTag {
        tag: String,
        first: String,
        second: String,
    },

    /// Assemblies have no material and cannot record energy deposits.
    #[error("assembly '{0}' cannot carry a sensitive tag")]
    SensitiveAssembly(String),

    /// The HPGe fabricator could not produce a crystal solid.
    #[error("crystal fabrication failed for '{detector}': {reason}")]
    Fabrication { detector: String, reason: String },
}

impl Error {
    /// Convenience constructor for [`Error::DegenerateSolid`].
    pub fn degenerate(solid: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DegenerateSolid {
            solid: solid.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while resolving detector metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The store holds no document for the detector.
    #[error("metadata not found: no {store} document for detector '{detector}'")]
    NotFound { detector: String, store: String },

    /// Cross-checks between crystal and holder/wrap dimensions failed.
    #[error("inconsistent metadata for detector '{detector}': {}", .problems.join("; "))]
    Inconsistent {
        detector: String,
        problems: Vec<String>,
    },

    /// The document exists but cannot be parsed.
    #[error("malformed {store} document for detector '{detector}': {message}")]
    Malformed {
        detector: String,
        store: String,
        message: String,
    },

    /// The document exists but cannot be read.
    #[error("cannot read {store} document for detector '{detector}': {source}")]
    Io {
        detector: String,
        store: String,
        #[source]
        source: std::io::Error,
    },
}

impl MetadataError {
    /// Returns the detector name the error refers to.
    #[must_use]
    pub fn detector(&self) -> &str {
        match self {
            Self::NotFound { detector, .. }
            | Self::Inconsistent { detector, .. }
            | Self::Malformed { detector, .. }
            | Self::Io { detector, .. } => detector,
        }
    }
}

/// A single rejected configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Dotted key path, e.g. `source_position.r_in_mm`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldViolation {
    /// Creates a new violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found in one configuration document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// All violations, in document order.
    pub violations: Vec<FieldViolation>,
}

impl ConfigValidationError {
    /// Wraps a list of violations.
    #[must_use]
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self { violations }
    }

    /// A validation error with exactly one violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    /// Returns true if the given field was rejected.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Names of all rejected fields.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.violations.iter().map(|v| v.field.as_str())
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid configuration ({} problem{})",
            self.violations.len(),
            if self.violations.len() == 1 { "" } else { "s" }
        )?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_lists_every_field() {
        let err = ConfigValidationError::new(vec![
            FieldViolation::new("source_position.r_in_mm", "must be >= 0"),
            FieldViolation::new("lead_castle_idx", "missing"),
        ]);
        let text = err.to_string();
        assert!(text.contains("2 problems"));
        assert!(text.contains("source_position.r_in_mm: must be >= 0"));
        assert!(text.contains("lead_castle_idx: missing"));
        assert!(err.has_field("lead_castle_idx"));
        assert!(!err.has_field("source_position.z_in_mm"));
    }

    #[test]
    fn test_metadata_error_names_detector() {
        let err = MetadataError::NotFound {
            detector: "V01234A".into(),
            store: "holder/wrap".into(),
        };
        assert_eq!(err.detector(), "V01234A");
        assert!(err.to_string().contains("V01234A"));
        assert!(err.to_string().contains("holder/wrap"));
    }
}
