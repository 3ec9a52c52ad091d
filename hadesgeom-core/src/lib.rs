//! hadesgeom-core: Core types and traits for HADES test-stand geometry.
//!
//! This crate provides the shared vocabulary of the assembly pipeline:
//! solids, placements, the volume tree, the normalized detector and
//! measurement descriptors, the error taxonomy, and the capability traits
//! behind which solid kernels and HPGe fabricators are swapped.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod kernel;
pub mod solid;
pub mod units;
pub mod volume;

pub use config::{LeadCastle, MeasurementConfig, SourcePosition};
pub use descriptor::{
    Borehole, CapSide, CrystalGeometry, DetectorDescriptor, DetectorKind, Groove, Production,
    Ring, ShellLayer, Taper,
};
pub use error::{ConfigValidationError, Error, FieldViolation, MetadataError, Result};
pub use kernel::{CsgKernel, HpgeFabricator, SolidKernel};
pub use solid::{outline_area, RzPoint, Shape, Solid};
pub use units::{Frame, Mat3, Material, Placement, Rotation, Vec3};
pub use volume::{SensitiveTag, Volume, VolumeContent};
