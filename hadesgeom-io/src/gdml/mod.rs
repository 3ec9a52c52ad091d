//! GDML interchange format.

mod reader;
mod writer;

pub use reader::{parse_gdml, read_gdml};
pub use writer::render_gdml;

/// Auxiliary type carrying the sensitive-detector system.
pub const AUX_DETECTOR: &str = "RMG_detector";
/// Auxiliary type carrying the sensitive-detector id.
pub const AUX_DETECTOR_UID: &str = "RMG_detector_uid";

const LENGTH_UNIT: &str = "mm";
const ANGLE_UNIT: &str = "rad";
