//! Error types for hadesgeom-assembly.

use hadesgeom_core::{ConfigValidationError, MetadataError};
use thiserror::Error;

/// Result type alias for assembly operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors raised while building the geometry.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Detector metadata missing, unreadable or inconsistent.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Invalid configuration or measurement name.
    #[error(transparent)]
    Config(#[from] ConfigValidationError),

    /// Solid or volume-tree construction failed.
    #[error("geometry error: {0}")]
    Geometry(#[from] hadesgeom_core::Error),

    /// A layer does not enclose the layers inside it.
    #[error("layer '{outer}' does not enclose '{inner}'")]
    LayerOverlap { outer: String, inner: String },

    /// The assembled stand has known clearance problems.
    #[error("clearance check failed: {}", problems.join("; "))]
    Clearance { problems: Vec<String> },
}
