//! Writing, listing and showing an assembled geometry.

use crate::error::{Error, Result};
use crate::gdml::render_gdml;
use crate::viewer::{Scene, Viewer};
use hadesgeom_core::Volume;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Writes the tree as GDML to `path`.
///
/// The document is rendered before the file is touched and written through
/// a sibling temporary file, so a failed export leaves no file behind.
///
/// # Errors
/// Returns [`Error::ExportIo`] if the file cannot be written and the
/// rendering errors of [`render_gdml`].
pub fn write_gdml(world: &Volume, path: &Path) -> Result<()> {
    let text = render_gdml(world)?;
    let staging = staging_path(path);
    let export_error = |source| Error::ExportIo {
        path: path.to_path_buf(),
        source,
    };

    if let Err(source) = fs::write(&staging, text.as_bytes()) {
        // a partially written staging file must not survive
        let _ = fs::remove_file(&staging);
        return Err(export_error(source));
    }
    if let Err(source) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(export_error(source));
    }
    log::info!(
        "exported {} volumes to {}",
        world.count(),
        path.display()
    );
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Shows an exported geometry. Failures are logged and reported as `false`.
pub fn visualize(viewer: &dyn Viewer, gdml: &Path, scene: &Scene) -> bool {
    log::info!("visualizing {} with {}", gdml.display(), viewer.name());
    match viewer.show(gdml, scene) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("visualization failed: {e}");
            false
        }
    }
}

/// Kinds of volume listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeListing {
    /// Logical volumes, i.e. volumes with a solid and a material.
    Logical,
    /// Placed volumes, assemblies included.
    Physical,
    /// Sensitive volumes with their detector tag.
    Detector,
}

impl VolumeListing {
    pub const ALL: [Self; 3] = [Self::Logical, Self::Physical, Self::Detector];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logical => "logical",
            Self::Physical => "physical",
            Self::Detector => "detector",
        }
    }
}

impl fmt::Display for VolumeListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeListing {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| format!("unknown volume listing '{s}'"))
    }
}

/// Lists volume names of the tree in depth-first order.
#[must_use]
pub fn list_volumes(world: &Volume, listing: VolumeListing) -> Vec<String> {
    let all = world.descendants();
    match listing {
        VolumeListing::Logical => all
            .into_iter()
            .filter(|(_, v)| !v.is_assembly())
            .map(|(_, v)| v.name.clone())
            .collect(),
        VolumeListing::Physical => all
            .into_iter()
            .filter(|(depth, _)| *depth > 0)
            .map(|(_, v)| v.name.clone())
            .collect(),
        VolumeListing::Detector => world
            .sensitive_volumes()
            .into_iter()
            .filter_map(|v| v.sensitive.as_ref().map(|tag| format!("{} {tag}", v.name)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hadesgeom_core::{CsgKernel, Material, SensitiveTag, SolidKernel};
    use std::cell::Cell;

    fn world() -> Volume {
        let k = CsgKernel;
        let mut world = Volume::logical(
            "world",
            k.cuboid("world", 100.0, 100.0, 100.0).unwrap(),
            Material::AIR,
        );
        let mut group = Volume::assembly("group");
        group
            .add_child(
                Volume::logical("ge", k.cylinder("ge", 1.0, 1.0).unwrap(), Material::GERMANIUM)
                    .with_sensitive(SensitiveTag::germanium(9)),
            )
            .unwrap();
        world.add_child(group).unwrap();
        world
    }

    #[test]
    fn test_listings() {
        let w = world();
        assert_eq!(list_volumes(&w, VolumeListing::Logical), ["world", "ge"]);
        assert_eq!(list_volumes(&w, VolumeListing::Physical), ["group", "ge"]);
        assert_eq!(list_volumes(&w, VolumeListing::Detector), ["ge germanium:9"]);
        assert_eq!("physical".parse::<VolumeListing>(), Ok(VolumeListing::Physical));
        assert!("all".parse::<VolumeListing>().is_err());
    }

    struct Broken(Cell<u32>);

    impl Viewer for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn show(&self, _gdml: &Path, _scene: &Scene) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Err(Error::Viewer {
                viewer: "broken".into(),
                message: "no display".into(),
            })
        }
    }

    #[test]
    fn test_visualization_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stand.gdml");
        write_gdml(&world(), &path).unwrap();

        let viewer = Broken(Cell::new(0));
        assert!(!visualize(&viewer, &path, &Scene::default()));
        assert_eq!(viewer.0.get(), 1);
        assert!(path.exists());
    }
}
