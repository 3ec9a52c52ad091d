//! hadesgeom-assembly: Detector and test-stand geometry construction.
//!
//! Builds the nested detector unit (crystal, holder, wrap) from a
//! [`DetectorDescriptor`] and places it, the cryostat, the lead castle, the
//! bottom plate, the source and its holder into the world volume.
//!
//! [`DetectorDescriptor`]: hadesgeom_core::DetectorDescriptor

pub mod castle;
pub mod detector;
pub mod dimensions;
pub mod error;
pub mod fabricate;
pub mod holder;
pub mod pipeline;
pub mod source;
pub mod teststand;

pub use castle::{build_bottom_plate, build_castle, BOTTOM_PLATE_NAME, CASTLE_NAME};
pub use detector::{DetectorBuilder, DetectorUnit, LayerExtent, UNIT_NAME};
pub use dimensions::{CryostatDims, UNIT_CLEARANCE};
pub use error::{BuildError, Result};
pub use fabricate::PolyconeFabricator;
pub use holder::{build_holder, HolderModel, SOURCE_HOLDER_NAME};
pub use pipeline::GeometryPipeline;
pub use source::{build_source, effective_position, source_placement, SourceModel, SOURCE_NAME};
pub use teststand::{Assemblies, Assembly, TestStand, CAVITY_NAME, CRYOSTAT_NAME, WORLD_NAME};
