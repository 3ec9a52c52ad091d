//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for I/O operations.
pub type Result<T> = std::result::Result<T, Error>;

/// I/O error types.
#[derive(Error, Debug)]
pub enum Error {
    /// The output file could not be written.
    #[error("cannot write '{}': {source}", path.display())]
    ExportIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML could not be produced or tokenized.
    #[error("XML error: {0}")]
    Xml(String),

    /// Well-formed XML that is not a supported GDML document.
    #[error("invalid GDML: {0}")]
    InvalidFormat(String),

    /// Scene file could not be parsed.
    #[error("invalid scene: {0}")]
    Scene(String),

    /// The viewer could not be started or failed.
    #[error("viewer '{viewer}' failed: {message}")]
    Viewer { viewer: String, message: String },

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] hadesgeom_core::Error),
}
