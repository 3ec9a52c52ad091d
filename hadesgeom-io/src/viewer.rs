//! Visualization hand-off.
//!
//! The interactive viewer is an external program. [`ExternalViewer`] writes
//! the scene next to the GDML file as JSON and runs the program with both
//! paths as arguments.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable naming the viewer program.
pub const VIEWER_ENV: &str = "HADESGEOM_VIEWER";

/// A clipping plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipPlane {
    pub origin: [f64; 3],
    pub normal: [f64; 3],
    #[serde(default)]
    pub close_cuts: bool,
}

impl ClipPlane {
    /// The plane through the detector axis used by `--clip-geometry`.
    #[must_use]
    pub fn through_axis() -> Self {
        Self {
            origin: [0.0, 0.0, 0.0],
            normal: [1.0, 0.0, 0.0],
            close_cuts: false,
        }
    }
}

/// Viewer scene options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub clipper: Vec<ClipPlane>,
    /// Render curved surfaces with a finer mesh.
    #[serde(default)]
    pub fine_mesh: bool,
}

impl Scene {
    /// Loads a scene from a YAML file.
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the file cannot be read and
    /// [`Error::Scene`] if it is not a valid scene.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Parses a scene from YAML text. An empty document is the default scene.
    ///
    /// # Errors
    /// Returns [`Error::Scene`] if the text is not a valid scene.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(text).map_err(|e| Error::Scene(e.to_string()))
    }

    /// Replaces the clip planes with the single plane through the axis.
    #[must_use]
    pub fn clipped(mut self) -> Self {
        self.clipper = vec![ClipPlane::through_axis()];
        self
    }
}

/// Displays an exported geometry.
pub trait Viewer {
    /// Returns the name of this viewer.
    fn name(&self) -> &str;

    /// Shows the geometry stored at `gdml`.
    ///
    /// # Errors
    /// Returns an error if the viewer cannot be started or fails.
    fn show(&self, gdml: &Path, scene: &Scene) -> Result<()>;
}

/// Viewer backed by an external program.
#[derive(Debug, Clone)]
pub struct ExternalViewer {
    program: PathBuf,
}

impl ExternalViewer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Viewer named by [`VIEWER_ENV`], if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var_os(VIEWER_ENV)
            .filter(|v| !v.is_empty())
            .map(Self::new)
    }

    /// Path of the scene file written for `gdml`.
    #[must_use]
    pub fn scene_path(gdml: &Path) -> PathBuf {
        gdml.with_extension("scene.json")
    }

    fn failure(&self, message: impl Into<String>) -> Error {
        Error::Viewer {
            viewer: self.program.display().to_string(),
            message: message.into(),
        }
    }
}

impl Viewer for ExternalViewer {
    fn name(&self) -> &str {
        "external"
    }

    fn show(&self, gdml: &Path, scene: &Scene) -> Result<()> {
        let scene_path = Self::scene_path(gdml);
        let json =
            serde_json::to_string_pretty(scene).map_err(|e| self.failure(e.to_string()))?;
        std::fs::write(&scene_path, json)?;
        log::debug!(
            "starting {} with {} and {}",
            self.program.display(),
            gdml.display(),
            scene_path.display()
        );

        let status = Command::new(&self.program)
            .arg(gdml)
            .arg(&scene_path)
            .status()
            .map_err(|e| self.failure(e.to_string()))?;
        if status.success() {
            Ok(())
        } else {
            Err(self.failure(format!("exited with {status}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_from_yaml() {
        let scene = Scene::from_yaml(
            "fine_mesh: true\nclipper:\n  - {origin: [0, 0, 0], normal: [0, 1, 0]}\n",
        )
        .unwrap();
        assert!(scene.fine_mesh);
        assert_eq!(scene.clipper.len(), 1);
        assert!(!scene.clipper[0].close_cuts);

        assert_eq!(Scene::from_yaml("").unwrap(), Scene::default());
        assert!(matches!(
            Scene::from_yaml("fine_mesh: [1, 2]"),
            Err(Error::Scene(_))
        ));
    }

    #[test]
    fn test_clipped_scene() {
        let scene = Scene::default().clipped();
        assert_eq!(scene.clipper, vec![ClipPlane::through_axis()]);
    }

    #[test]
    fn test_missing_program_fails() {
        let dir = tempfile::tempdir().unwrap();
        let gdml = dir.path().join("stand.gdml");
        std::fs::write(&gdml, "<gdml/>").unwrap();

        let viewer = ExternalViewer::new(dir.path().join("no-such-viewer"));
        let err = viewer.show(&gdml, &Scene::default()).unwrap_err();
        assert!(matches!(err, Error::Viewer { .. }));
        assert!(dir.path().join("stand.scene.json").exists());
    }
}
