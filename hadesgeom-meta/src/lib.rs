//! hadesgeom-meta: Metadata resolution and configuration loading.
//!
//! Turns a detector name into a validated [`DetectorDescriptor`] by merging
//! the crystal document and the holder/wrap document of the detector, and
//! turns a YAML configuration plus a measurement name into a
//! [`MeasurementConfig`] and a [`Measurement`].
//!
//! [`DetectorDescriptor`]: hadesgeom_core::DetectorDescriptor
//! [`MeasurementConfig`]: hadesgeom_core::MeasurementConfig

pub mod config;
pub mod crystal;
pub mod hades;
pub mod measurement;
pub mod public;
pub mod resolver;
pub mod store;

pub use config::{load_config, parse_config};
pub use measurement::{parse_measurement, Measurement, SourceKind, SourceSide};
pub use public::PublicStore;
pub use resolver::{merge, MetadataResolver, DIODE_STORE, HADES_STORE};
pub use store::{DirectoryStore, DocFormat, Document, DocumentStore, InMemoryStore};
