//! hadesgeom-io: GDML export and import for HADES geometry.
//!
//! Renders a validated volume tree as GDML, reads such documents back,
//! lists volumes and hands exported files to an external viewer.

mod error;
pub mod export;
pub mod gdml;
pub mod viewer;

pub use error::{Error, Result};
pub use export::{list_volumes, visualize, write_gdml, VolumeListing};
pub use gdml::{parse_gdml, read_gdml, render_gdml, AUX_DETECTOR, AUX_DETECTOR_UID};
pub use viewer::{ClipPlane, ExternalViewer, Scene, Viewer, VIEWER_ENV};
