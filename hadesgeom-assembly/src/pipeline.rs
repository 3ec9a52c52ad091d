//! End-to-end geometry construction.

use crate::detector::DetectorBuilder;
use crate::error::{BuildError, Result};
use crate::fabricate::PolyconeFabricator;
use crate::teststand::{Assemblies, TestStand};
use hadesgeom_core::{
    CsgKernel, DetectorDescriptor, HpgeFabricator, MeasurementConfig, SolidKernel, Volume,
};
use hadesgeom_meta::{parse_measurement, Measurement, MetadataResolver};

/// Resolves metadata, builds the detector unit and assembles the world.
pub struct GeometryPipeline {
    kernel: Box<dyn SolidKernel>,
    fabricator: Box<dyn HpgeFabricator>,
    assemblies: Assemblies,
    check_overlaps: bool,
}

impl Default for GeometryPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl GeometryPipeline {
    /// Pipeline with the default kernel and fabricator and every assembly.
    #[must_use]
    pub fn new() -> Self {
        Self {
            kernel: Box::new(CsgKernel),
            fabricator: Box::new(PolyconeFabricator),
            assemblies: Assemblies::all(),
            check_overlaps: false,
        }
    }

    #[must_use]
    pub fn with_kernel(mut self, kernel: impl SolidKernel + 'static) -> Self {
        self.kernel = Box::new(kernel);
        self
    }

    #[must_use]
    pub fn with_fabricator(mut self, fabricator: impl HpgeFabricator + 'static) -> Self {
        self.fabricator = Box::new(fabricator);
        self
    }

    #[must_use]
    pub fn with_assemblies(mut self, assemblies: Assemblies) -> Self {
        self.assemblies = assemblies;
        self
    }

    /// Turns clearance problems of the assembled stand into errors.
    #[must_use]
    pub fn with_overlap_check(mut self, enabled: bool) -> Self {
        self.check_overlaps = enabled;
        self
    }

    /// Builds the world volume for a detector and a measurement.
    ///
    /// # Errors
    /// Returns [`BuildError::Config`] for an invalid measurement name,
    /// [`BuildError::Metadata`] if the detector cannot be resolved, and any
    /// error of [`GeometryPipeline::construct_from`].
    pub fn construct(
        &self,
        resolver: &MetadataResolver,
        detector: &str,
        measurement: &str,
        config: &MeasurementConfig,
    ) -> Result<Volume> {
        let measurement = parse_measurement(measurement)?;
        let desc = resolver.resolve(detector)?;
        self.construct_from(&desc, &measurement, config)
    }

    /// Builds the world volume from an already resolved descriptor.
    ///
    /// # Errors
    /// Propagates detector and assembly errors. With the overlap check
    /// enabled, returns [`BuildError::Clearance`] if the stand has known
    /// clearance problems; otherwise they are logged as warnings.
    pub fn construct_from(
        &self,
        desc: &DetectorDescriptor,
        measurement: &Measurement,
        config: &MeasurementConfig,
    ) -> Result<Volume> {
        let builder = DetectorBuilder::new(self.kernel.as_ref(), self.fabricator.as_ref());
        let unit = builder.build(desc)?;
        log::info!(
            "built detector unit of {}: {} layers, {:.1} mm x {:.1} mm",
            desc.name,
            unit.layers.len(),
            unit.radius,
            unit.height
        );

        let stand = TestStand::new(self.kernel.as_ref()).with_assemblies(self.assemblies);
        let issues = stand.clearance_issues(desc, &unit, measurement, config)?;
        if self.check_overlaps && !issues.is_empty() {
            return Err(BuildError::Clearance { problems: issues });
        }
        for issue in &issues {
            log::warn!("{issue}");
        }

        let world = stand.assemble(desc, unit, measurement, config)?;
        log::info!(
            "assembled {} with {} and {}: {} volumes",
            desc.name,
            measurement.source,
            config.lead_castle,
            world.count()
        );
        Ok(world)
    }
}
