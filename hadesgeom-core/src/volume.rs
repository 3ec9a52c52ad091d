//! The volume tree.
//!
//! A [`Volume`] exclusively owns its children, so the scene graph is a
//! tree by construction. Each node is either a logical volume (solid plus
//! material) or an assembly that only groups placed children.

use crate::error::{Error, Result};
use crate::solid::Solid;
use crate::units::{Frame, Material, Placement};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Marks a volume whose energy deposits the simulator records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensitiveTag {
    /// Detector system, e.g. `germanium`.
    pub kind: String,
    /// Unique channel id within the system.
    pub uid: u32,
}

impl SensitiveTag {
    /// Creates a new tag.
    pub fn new(kind: impl Into<String>, uid: u32) -> Self {
        Self {
            kind: kind.into(),
            uid,
        }
    }

    /// Germanium detector tag.
    #[must_use]
    pub fn germanium(uid: u32) -> Self {
        Self::new("germanium", uid)
    }
}

impl fmt::Display for SensitiveTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.uid)
    }
}

/// What a volume is made of.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VolumeContent {
    /// A solid filled with a material.
    Logical { solid: Solid, material: Material },
    /// A grouping without its own solid.
    Assembly,
}

/// A node of the scene graph.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Volume {
    /// Unique name; also used for the placement.
    pub name: String,
    /// Solid and material, or assembly marker.
    pub content: VolumeContent,
    /// Placement relative to the parent (ignored for the root).
    pub placement: Placement,
    /// Optional sensitive-detector tag.
    pub sensitive: Option<SensitiveTag>,
    children: Vec<Volume>,
}

impl Volume {
    /// Creates a logical volume placed at the parent origin.
    pub fn logical(name: impl Into<String>, solid: Solid, material: impl Into<Material>) -> Self {
        Self {
            name: name.into(),
            content: VolumeContent::Logical {
                solid,
                material: material.into(),
            },
            placement: Placement::ORIGIN,
            sensitive: None,
            children: Vec::new(),
        }
    }

    /// Creates an empty assembly placed at the parent origin.
    pub fn assembly(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: VolumeContent::Assembly,
            placement: Placement::ORIGIN,
            sensitive: None,
            children: Vec::new(),
        }
    }

    /// Sets the placement.
    #[must_use]
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the sensitive-detector tag.
    #[must_use]
    pub fn with_sensitive(mut self, tag: SensitiveTag) -> Self {
        self.sensitive = Some(tag);
        self
    }

    /// Returns the solid, if this is a logical volume.
    #[must_use]
    pub fn solid(&self) -> Option<&Solid> {
        match &self.content {
            VolumeContent::Logical { solid, .. } => Some(solid),
            VolumeContent::Assembly => None,
        }
    }

    /// Returns the material, if this is a logical volume.
    #[must_use]
    pub fn material(&self) -> Option<&Material> {
        match &self.content {
            VolumeContent::Logical { material, .. } => Some(material),
            VolumeContent::Assembly => None,
        }
    }

    /// Returns true for assemblies.
    #[must_use]
    pub fn is_assembly(&self) -> bool {
        matches!(self.content, VolumeContent::Assembly)
    }

    /// Places a child inside this volume.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateChild`] if a sibling already has the name.
    pub fn add_child(&mut self, child: Volume) -> Result<&mut Volume> {
        if self.children.iter().any(|c| c.name == child.name) {
            return Err(Error::DuplicateChild {
                parent: self.name.clone(),
                child: child.name,
            });
        }
        self.children.push(child);
        let last = self.children.len() - 1;
        Ok(&mut self.children[last])
    }

    /// Direct children in insertion order.
    #[must_use]
    pub fn children(&self) -> &[Volume] {
        &self.children
    }

    /// Direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Volume> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Mutable direct child by name.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut Volume> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Depth-first search for a volume by name, including `self`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Volume> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// All volumes in pre-order with their depth below `self`.
    #[must_use]
    pub fn descendants(&self) -> Vec<(usize, &Volume)> {
        let mut out = Vec::new();
        self.collect(0, &mut out);
        out
    }

    fn collect<'a>(&'a self, depth: usize, out: &mut Vec<(usize, &'a Volume)>) {
        out.push((depth, self));
        for child in &self.children {
            child.collect(depth + 1, out);
        }
    }

    /// Number of volumes in the tree, including `self`.
    #[must_use]
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Volume::count).sum::<usize>()
    }

    /// Volumes carrying a sensitive tag.
    #[must_use]
    pub fn sensitive_volumes(&self) -> Vec<&Volume> {
        self.descendants()
            .into_iter()
            .map(|(_, v)| v)
            .filter(|v| v.sensitive.is_some())
            .collect()
    }

    /// Absolute frame of every volume, treating `self` as the world.
    #[must_use]
    pub fn global_frames(&self) -> Vec<(&str, Frame)> {
        let mut out = Vec::new();
        self.collect_frames(Frame::WORLD, &mut out);
        out
    }

    fn collect_frames<'a>(&'a self, frame: Frame, out: &mut Vec<(&'a str, Frame)>) {
        out.push((self.name.as_str(), frame));
        for child in &self.children {
            child.collect_frames(frame.child(&child.placement), out);
        }
    }

    /// Absolute frame of the named volume.
    #[must_use]
    pub fn global_frame(&self, name: &str) -> Option<Frame> {
        self.global_frames()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| f)
    }

    /// Checks the tree-wide invariants.
    ///
    /// Volume names and solid names are unique, sensitive tags are unique
    /// and only attached to logical volumes, and every solid is valid.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut solids: HashMap<&str, &Solid> = HashMap::new();
        let mut tags: HashMap<&SensitiveTag, &str> = HashMap::new();

        for (_, volume) in self.descendants() {
            if !names.insert(volume.name.as_str()) {
                return Err(Error::DuplicateVolumeName(volume.name.clone()));
            }
            if let Some(tag) = &volume.sensitive {
                if volume.is_assembly() {
                    return Err(Error::SensitiveAssembly(volume.name.clone()));
                }
                if let Some(first) = tags.insert(tag, volume.name.as_str()) {
                    return Err(Error::DuplicateSensitiveTag {
                        tag: tag.to_string(),
                        first: first.to_string(),
                        second: volume.name.clone(),
                    });
                }
            }
            if let Some(solid) = volume.solid() {
                solid.shape.validate(&solid.name)?;
                for component in solid.components() {
                    if let Some(previous) = solids.insert(component.name.as_str(), component) {
                        if previous != component {
                            return Err(Error::degenerate(
                                component.name.clone(),
                                "solid name is used by two different shapes",
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solid::Shape;
    use crate::units::Vec3;
    use approx::assert_abs_diff_eq;

    fn cube(name: &str, side: f64) -> Volume {
        Volume::logical(
            format!("{name}_lv"),
            Solid::new(name, Shape::Box { x: side, y: side, z: side }),
            Material::AIR,
        )
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let mut world = cube("world", 100.0);
        world.add_child(cube("a", 1.0)).unwrap();
        let err = world.add_child(cube("a", 2.0)).unwrap_err();
        assert!(matches!(err, Error::DuplicateChild { .. }));
        assert_eq!(world.children().len(), 1);
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut world = cube("world", 100.0);
        world
            .add_child(cube("a", 1.0).with_sensitive(SensitiveTag::germanium(1)))
            .unwrap();
        world
            .add_child(cube("b", 1.0).with_sensitive(SensitiveTag::germanium(1)))
            .unwrap();
        assert!(matches!(
            world.validate(),
            Err(Error::DuplicateSensitiveTag { .. })
        ));
    }

    #[test]
    fn test_duplicate_name_at_different_depth_rejected() {
        let mut world = cube("world", 100.0);
        let mut box_a = cube("a", 10.0);
        box_a.add_child(cube("inner", 1.0)).unwrap();
        world.add_child(box_a).unwrap();
        world.add_child(cube("inner", 1.0)).unwrap();
        assert!(matches!(
            world.validate(),
            Err(Error::DuplicateVolumeName(_))
        ));
    }

    #[test]
    fn test_global_frames_accumulate() {
        let mut world = cube("world", 100.0);
        let mut outer = cube("outer", 50.0).with_placement(Placement::at_z(10.0));
        outer
            .add_child(cube("inner", 5.0).with_placement(Placement::at(Vec3::new(1.0, 2.0, 3.0))))
            .unwrap();
        world.add_child(outer).unwrap();

        let frame = world.global_frame("inner_lv").unwrap();
        assert_abs_diff_eq!(frame.origin.x, 1.0);
        assert_abs_diff_eq!(frame.origin.y, 2.0);
        assert_abs_diff_eq!(frame.origin.z, 13.0);
        assert_eq!(world.count(), 3);
    }
}
