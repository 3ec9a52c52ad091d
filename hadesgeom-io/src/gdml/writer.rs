//! GDML rendering.
//!
//! The document is rendered fully in memory. Every logical volume and
//! assembly is emitted after the volumes it places, and every solid after
//! its boolean components. Positions and rotations are written inline in
//! `physvol` and `subtraction` elements; lengths are in mm, angles in rad.

use super::{ANGLE_UNIT, AUX_DETECTOR, AUX_DETECTOR_UID, LENGTH_UNIT};
use crate::error::{Error, Result};
use hadesgeom_core::{Placement, Shape, Solid, Volume, VolumeContent};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use std::collections::HashSet;
use std::io::Cursor;

const SCHEMA: &str =
    "http://service-spi.web.cern.ch/service-spi/app/releases/GDML/schema/gdml.xsd";

/// Renders a volume tree as a GDML document.
///
/// # Errors
/// Returns [`Error::CoreError`] if the tree violates its invariants,
/// [`Error::InvalidFormat`] if the root is an assembly, and
/// [`Error::Xml`] if rendering fails.
pub fn render_gdml(world: &Volume) -> Result<String> {
    world.validate()?;
    if world.is_assembly() {
        return Err(Error::InvalidFormat(format!(
            "world volume '{}' must be a logical volume",
            world.name
        )));
    }

    let mut out = GdmlWriter::new();
    out.decl()?;
    let mut root = BytesStart::new("gdml");
    root.push_attribute(("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"));
    root.push_attribute(("xsi:noNamespaceSchemaLocation", SCHEMA));
    out.start(root)?;

    out.empty(BytesStart::new("define"))?;
    out.empty(BytesStart::new("materials"))?;

    let order = post_order(world);

    out.start(BytesStart::new("solids"))?;
    let mut written: HashSet<&str> = HashSet::new();
    for volume in &order {
        if let Some(solid) = volume.solid() {
            for component in solid.components() {
                if written.insert(component.name.as_str()) {
                    out.solid(component)?;
                }
            }
        }
    }
    out.end("solids")?;

    out.start(BytesStart::new("structure"))?;
    for volume in &order {
        out.volume(volume)?;
    }
    out.end("structure")?;

    let mut setup = BytesStart::new("setup");
    setup.push_attribute(("name", "Default"));
    setup.push_attribute(("version", "1.0"));
    out.start(setup)?;
    let mut world_ref = BytesStart::new("world");
    world_ref.push_attribute(("ref", world.name.as_str()));
    out.empty(world_ref)?;
    out.end("setup")?;

    out.end("gdml")?;
    out.finish()
}

/// Volumes with every child before its parent.
fn post_order(root: &Volume) -> Vec<&Volume> {
    fn visit<'a>(volume: &'a Volume, out: &mut Vec<&'a Volume>) {
        for child in volume.children() {
            visit(child, out);
        }
        out.push(volume);
    }
    let mut out = Vec::new();
    visit(root, &mut out);
    out
}

struct GdmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl GdmlWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| Error::Xml(e.to_string()))
    }

    fn decl(&mut self) -> Result<()> {
        self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    }

    fn start(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.write(Event::Start(element))
    }

    fn empty(&mut self, element: BytesStart<'_>) -> Result<()> {
        self.write(Event::Empty(element))
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn reference(&mut self, tag: &str, name: &str) -> Result<()> {
        let mut element = BytesStart::new(tag);
        element.push_attribute(("ref", name));
        self.empty(element)
    }

    fn solid(&mut self, solid: &Solid) -> Result<()> {
        let mut element = BytesStart::new(solid.shape.tag());
        element.push_attribute(("name", solid.name.as_str()));
        match &solid.shape {
            Shape::Box { x, y, z } => {
                push_floats(&mut element, &[("x", *x), ("y", *y), ("z", *z)]);
                element.push_attribute(("lunit", LENGTH_UNIT));
                self.empty(element)
            }
            Shape::Tube {
                rmin,
                rmax,
                z,
                start_phi,
                delta_phi,
            } => {
                push_floats(
                    &mut element,
                    &[
                        ("rmin", *rmin),
                        ("rmax", *rmax),
                        ("z", *z),
                        ("startphi", *start_phi),
                        ("deltaphi", *delta_phi),
                    ],
                );
                element.push_attribute(("aunit", ANGLE_UNIT));
                element.push_attribute(("lunit", LENGTH_UNIT));
                self.empty(element)
            }
            Shape::GenericPolycone {
                start_phi,
                delta_phi,
                points,
            } => {
                push_floats(
                    &mut element,
                    &[("startphi", *start_phi), ("deltaphi", *delta_phi)],
                );
                element.push_attribute(("aunit", ANGLE_UNIT));
                element.push_attribute(("lunit", LENGTH_UNIT));
                self.start(element)?;
                for point in points {
                    let mut rz = BytesStart::new("rzpoint");
                    push_floats(&mut rz, &[("r", point.r), ("z", point.z)]);
                    self.empty(rz)?;
                }
                self.end("genericPolycone")
            }
            Shape::Subtraction {
                first,
                second,
                placement,
            } => {
                self.start(element)?;
                self.reference("first", &first.name)?;
                self.reference("second", &second.name)?;
                self.placement(&format!("{}_sub", solid.name), placement)?;
                self.end("subtraction")
            }
        }
    }

    fn placement(&mut self, name: &str, placement: &Placement) -> Result<()> {
        let p = placement.position;
        let mut position = BytesStart::new("position");
        position.push_attribute(("name", format!("{name}_pos").as_str()));
        position.push_attribute(("unit", LENGTH_UNIT));
        push_floats(&mut position, &[("x", p.x), ("y", p.y), ("z", p.z)]);
        self.empty(position)?;

        let r = placement.rotation;
        if !r.is_identity() {
            let mut rotation = BytesStart::new("rotation");
            rotation.push_attribute(("name", format!("{name}_rot").as_str()));
            rotation.push_attribute(("unit", ANGLE_UNIT));
            push_floats(&mut rotation, &[("x", r.x), ("y", r.y), ("z", r.z)]);
            self.empty(rotation)?;
        }
        Ok(())
    }

    fn volume(&mut self, volume: &Volume) -> Result<()> {
        let element_name = match &volume.content {
            VolumeContent::Logical { .. } => "volume",
            VolumeContent::Assembly => "assembly",
        };
        let mut element = BytesStart::new(element_name);
        element.push_attribute(("name", volume.name.as_str()));
        self.start(element)?;

        if let VolumeContent::Logical { solid, material } = &volume.content {
            if !material.is_nist() {
                log::warn!(
                    "material '{material}' of '{}' is not a built-in material",
                    volume.name
                );
            }
            self.reference("materialref", material.name())?;
            self.reference("solidref", &solid.name)?;
        }

        for child in volume.children() {
            let mut physvol = BytesStart::new("physvol");
            physvol.push_attribute(("name", child.name.as_str()));
            self.start(physvol)?;
            self.reference("volumeref", &child.name)?;
            self.placement(&child.name, &child.placement)?;
            self.end("physvol")?;
        }

        if let Some(tag) = &volume.sensitive {
            self.auxiliary(AUX_DETECTOR, &tag.kind)?;
            self.auxiliary(AUX_DETECTOR_UID, &tag.uid.to_string())?;
        }
        self.end(element_name)
    }

    fn auxiliary(&mut self, kind: &str, value: &str) -> Result<()> {
        let mut aux = BytesStart::new("auxiliary");
        aux.push_attribute(("auxtype", kind));
        aux.push_attribute(("auxvalue", value));
        self.empty(aux)
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner().into_inner())
            .map_err(|e| Error::Xml(format!("invalid UTF-8 in generated XML: {e}")))
    }
}

/// Shortest representation that parses back to the same value.
fn push_floats(element: &mut BytesStart<'_>, values: &[(&str, f64)]) {
    for (key, value) in values {
        element.push_attribute((*key, value.to_string().as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hadesgeom_core::{CsgKernel, Material, Rotation, SensitiveTag, SolidKernel, Vec3};

    fn world() -> Volume {
        let kernel = CsgKernel;
        let mut world = Volume::logical(
            "world",
            kernel.cuboid("world", 1000.0, 1000.0, 1000.0).unwrap(),
            Material::AIR,
        );
        let mut group = Volume::assembly("group");
        group
            .add_child(
                Volume::logical(
                    "crystal",
                    kernel.cylinder("crystal", 10.0, 20.0).unwrap(),
                    Material::GERMANIUM,
                )
                .with_sensitive(SensitiveTag::germanium(42))
                .with_placement(
                    Placement::at(Vec3::new(0.1, 0.0, 5.0))
                        .with_rotation(Rotation::new(0.5, 0.0, 0.0)),
                ),
            )
            .unwrap();
        world.add_child(group).unwrap();
        world
    }

    #[test]
    fn test_render_structure() {
        let text = render_gdml(&world()).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains(r#"<tube name="crystal" rmin="0" rmax="10" z="20""#));
        assert!(text.contains(r#"<assembly name="group">"#));
        assert!(text.contains(r#"auxtype="RMG_detector" auxvalue="germanium""#));
        assert!(text.contains(r#"auxtype="RMG_detector_uid" auxvalue="42""#));
        assert!(text.contains(r#"x="0.1""#));
        assert!(text.contains(r#"<world ref="world"/>"#));

        // referenced volumes come first
        let crystal = text.find(r#"<volume name="crystal">"#).unwrap();
        let group = text.find(r#"<assembly name="group">"#).unwrap();
        let world = text.find(r#"<volume name="world">"#).unwrap();
        assert!(crystal < group && group < world);
    }

    #[test]
    fn test_assembly_root_rejected() {
        let err = render_gdml(&Volume::assembly("world")).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
