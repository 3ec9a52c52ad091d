//! GDML parsing.
//!
//! Reads the subset of GDML the writer produces: `box`, `tube`,
//! `genericPolycone` and `subtraction` solids, logical volumes and
//! assemblies with inline `physvol` placements, `auxiliary` sensitive tags
//! and the `setup` world reference.

use super::{AUX_DETECTOR, AUX_DETECTOR_UID};
use crate::error::{Error, Result};
use hadesgeom_core::{
    Material, Placement, Rotation, RzPoint, SensitiveTag, Shape, Solid, Vec3, Volume,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::io::BufRead;
use std::path::Path;

/// Reads a GDML file into a volume tree.
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read and the errors of
/// [`parse_gdml`].
pub fn read_gdml(path: &Path) -> Result<Volume> {
    let text = std::fs::read_to_string(path)?;
    parse_gdml(&text)
}

/// Parses a GDML document into a volume tree.
///
/// # Errors
/// Returns [`Error::Xml`] for malformed XML and [`Error::InvalidFormat`] for
/// missing or dangling references and unsupported units.
pub fn parse_gdml(xml: &str) -> Result<Volume> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = Document::default();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"solids" => parse_solids(&mut reader, &mut doc)?,
                b"structure" => parse_structure(&mut reader, &mut doc)?,
                b"setup" => doc.world = Some(parse_setup(&mut reader)?),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }

    let world = doc
        .world
        .clone()
        .ok_or_else(|| invalid("missing setup world reference"))?;
    doc.build(&world, Placement::ORIGIN, 0)
}

#[derive(Debug, Default)]
struct Document {
    solids: HashMap<String, Solid>,
    volumes: HashMap<String, VolumeDef>,
    world: Option<String>,
}

#[derive(Debug, Default)]
struct VolumeDef {
    solid: Option<String>,
    material: Option<String>,
    assembly: bool,
    physvols: Vec<(String, Placement)>,
    aux: Vec<(String, String)>,
}

impl Document {
    fn solid(&self, name: &str) -> Result<Solid> {
        self.solids
            .get(name)
            .cloned()
            .ok_or_else(|| invalid(format!("unknown solid '{name}'")))
    }

    fn build(&self, name: &str, placement: Placement, depth: usize) -> Result<Volume> {
        if depth > self.volumes.len() {
            return Err(invalid(format!("volume '{name}' places itself")));
        }
        let def = self
            .volumes
            .get(name)
            .ok_or_else(|| invalid(format!("unknown volume '{name}'")))?;

        let volume = if def.assembly {
            Volume::assembly(name)
        } else {
            let solid = def
                .solid
                .as_deref()
                .ok_or_else(|| invalid(format!("volume '{name}' has no solidref")))?;
            let material = def
                .material
                .as_deref()
                .ok_or_else(|| invalid(format!("volume '{name}' has no materialref")))?;
            Volume::logical(name, self.solid(solid)?, Material::new(material))
        };
        let mut volume = volume.with_placement(placement);

        if let Some(tag) = def.sensitive_tag(name)? {
            volume = volume.with_sensitive(tag);
        }
        for (child, child_placement) in &def.physvols {
            volume.add_child(self.build(child, *child_placement, depth + 1)?)?;
        }
        Ok(volume)
    }
}

impl VolumeDef {
    fn sensitive_tag(&self, name: &str) -> Result<Option<SensitiveTag>> {
        let find = |kind: &str| {
            self.aux
                .iter()
                .find(|(k, _)| k == kind)
                .map(|(_, v)| v.as_str())
        };
        let Some(kind) = find(AUX_DETECTOR) else {
            return Ok(None);
        };
        let uid = find(AUX_DETECTOR_UID)
            .ok_or_else(|| invalid(format!("volume '{name}' has no detector uid")))?;
        let uid: u32 = uid
            .parse()
            .map_err(|_| invalid(format!("volume '{name}' has invalid detector uid '{uid}'")))?;
        Ok(Some(SensitiveTag::new(kind, uid)))
    }
}

fn parse_solids<R: BufRead>(reader: &mut Reader<R>, doc: &mut Document) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => {
                let solid = match e.name().as_ref() {
                    b"box" => parse_box(e)?,
                    b"tube" => parse_tube(e)?,
                    _ => return Err(unsupported(e)),
                };
                doc.solids.insert(solid.name.clone(), solid);
            }
            Ok(Event::Start(ref e)) => {
                let solid = match e.name().as_ref() {
                    b"genericPolycone" => parse_polycone(reader, e)?,
                    b"subtraction" => parse_subtraction(reader, e, doc)?,
                    _ => return Err(unsupported(e)),
                };
                doc.solids.insert(solid.name.clone(), solid);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"solids" => break,
            Ok(Event::Eof) => return Err(Error::Xml("unexpected EOF in solids".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }
    Ok(())
}

fn parse_box(e: &BytesStart) -> Result<Solid> {
    let l = length_unit(e)?;
    Ok(Solid::new(
        get_attribute(e, "name")?,
        Shape::Box {
            x: float_attr(e, "x")? * l,
            y: float_attr(e, "y")? * l,
            z: float_attr(e, "z")? * l,
        },
    ))
}

fn parse_tube(e: &BytesStart) -> Result<Solid> {
    let l = length_unit(e)?;
    let a = angle_unit(e, "aunit")?;
    Ok(Solid::new(
        get_attribute(e, "name")?,
        Shape::Tube {
            rmin: float_attr_or(e, "rmin", 0.0)? * l,
            rmax: float_attr(e, "rmax")? * l,
            z: float_attr(e, "z")? * l,
            start_phi: float_attr_or(e, "startphi", 0.0)? * a,
            delta_phi: float_attr_or(e, "deltaphi", TAU / a)? * a,
        },
    ))
}

fn parse_polycone<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Solid> {
    let name = get_attribute(start, "name")?;
    let l = length_unit(start)?;
    let a = angle_unit(start, "aunit")?;
    let start_phi = float_attr_or(start, "startphi", 0.0)? * a;
    let delta_phi = float_attr_or(start, "deltaphi", TAU / a)? * a;

    let mut points = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"rzpoint" => {
                points.push(RzPoint::new(float_attr(e, "r")? * l, float_attr(e, "z")? * l));
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"genericPolycone" => break,
            Ok(Event::Eof) => {
                return Err(Error::Xml("unexpected EOF in genericPolycone".into()));
            }
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }
    Ok(Solid::new(
        name,
        Shape::GenericPolycone {
            start_phi,
            delta_phi,
            points,
        },
    ))
}

fn parse_subtraction<R: BufRead>(
    reader: &mut Reader<R>,
    start: &BytesStart,
    doc: &Document,
) -> Result<Solid> {
    let name = get_attribute(start, "name")?;
    let mut first = None;
    let mut second = None;
    let mut placement = Placement::ORIGIN;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"first" => first = Some(doc.solid(&get_attribute(e, "ref")?)?),
                b"second" => second = Some(doc.solid(&get_attribute(e, "ref")?)?),
                b"position" => placement.position = parse_position(e)?,
                b"rotation" => placement.rotation = parse_rotation(e)?,
                _ => return Err(unsupported(e)),
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"subtraction" => break,
            Ok(Event::Eof) => return Err(Error::Xml("unexpected EOF in subtraction".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }

    let first = first.ok_or_else(|| invalid(format!("subtraction '{name}' has no first")))?;
    let second = second.ok_or_else(|| invalid(format!("subtraction '{name}' has no second")))?;
    Ok(Solid::new(
        name,
        Shape::Subtraction {
            first: Box::new(first),
            second: Box::new(second),
            placement,
        },
    ))
}

fn parse_structure<R: BufRead>(reader: &mut Reader<R>, doc: &mut Document) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let assembly = match e.name().as_ref() {
                    b"volume" => false,
                    b"assembly" => true,
                    _ => return Err(unsupported(e)),
                };
                let name = get_attribute(e, "name")?;
                let end = e.name().as_ref().to_vec();
                let def = parse_volume(reader, &end, assembly)?;
                doc.volumes.insert(name, def);
            }
            Ok(Event::Empty(ref e)) => {
                // childless assembly or volume without content
                let name = get_attribute(e, "name")?;
                doc.volumes.insert(
                    name,
                    VolumeDef {
                        assembly: e.name().as_ref() == b"assembly",
                        ..VolumeDef::default()
                    },
                );
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"structure" => break,
            Ok(Event::Eof) => return Err(Error::Xml("unexpected EOF in structure".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }
    Ok(())
}

fn parse_volume<R: BufRead>(
    reader: &mut Reader<R>,
    end: &[u8],
    assembly: bool,
) -> Result<VolumeDef> {
    let mut def = VolumeDef {
        assembly,
        ..VolumeDef::default()
    };
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"materialref" => def.material = Some(get_attribute(e, "ref")?),
                b"solidref" => def.solid = Some(get_attribute(e, "ref")?),
                b"auxiliary" => def
                    .aux
                    .push((get_attribute(e, "auxtype")?, get_attribute(e, "auxvalue")?)),
                _ => return Err(unsupported(e)),
            },
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"physvol" => {
                def.physvols.push(parse_physvol(reader)?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == end => break,
            Ok(Event::Eof) => return Err(Error::Xml("unexpected EOF in volume".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }
    Ok(def)
}

fn parse_physvol<R: BufRead>(reader: &mut Reader<R>) -> Result<(String, Placement)> {
    let mut volume = None;
    let mut placement = Placement::ORIGIN;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"volumeref" => volume = Some(get_attribute(e, "ref")?),
                b"position" => placement.position = parse_position(e)?,
                b"rotation" => placement.rotation = parse_rotation(e)?,
                _ => return Err(unsupported(e)),
            },
            Ok(Event::End(ref e)) if e.name().as_ref() == b"physvol" => break,
            Ok(Event::Eof) => return Err(Error::Xml("unexpected EOF in physvol".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }
    let volume = volume.ok_or_else(|| invalid("physvol without volumeref"))?;
    Ok((volume, placement))
}

fn parse_setup<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut world = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"world" => {
                world = Some(get_attribute(e, "ref")?);
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"setup" => break,
            Ok(Event::Eof) => return Err(Error::Xml("unexpected EOF in setup".into())),
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
        buf.clear();
    }
    world.ok_or_else(|| invalid("setup without world"))
}

fn parse_position(e: &BytesStart) -> Result<Vec3> {
    let l = length_unit_attr(e, "unit")?;
    Ok(Vec3::new(
        float_attr_or(e, "x", 0.0)? * l,
        float_attr_or(e, "y", 0.0)? * l,
        float_attr_or(e, "z", 0.0)? * l,
    ))
}

fn parse_rotation(e: &BytesStart) -> Result<Rotation> {
    let a = angle_unit(e, "unit")?;
    Ok(Rotation::new(
        float_attr_or(e, "x", 0.0)? * a,
        float_attr_or(e, "y", 0.0)? * a,
        float_attr_or(e, "z", 0.0)? * a,
    ))
}

fn length_unit(e: &BytesStart) -> Result<f64> {
    length_unit_attr(e, "lunit")
}

fn length_unit_attr(e: &BytesStart, key: &str) -> Result<f64> {
    match get_attribute_opt(e, key).as_deref() {
        None | Some("mm") => Ok(1.0),
        Some("cm") => Ok(10.0),
        Some("m") => Ok(1000.0),
        Some(other) => Err(invalid(format!("unsupported length unit '{other}'"))),
    }
}

fn angle_unit(e: &BytesStart, key: &str) -> Result<f64> {
    match get_attribute_opt(e, key).as_deref() {
        None | Some("rad") => Ok(1.0),
        Some("deg") => Ok(1f64.to_radians()),
        Some(other) => Err(invalid(format!("unsupported angle unit '{other}'"))),
    }
}

fn get_attribute(e: &BytesStart, name: &str) -> Result<String> {
    get_attribute_opt(e, name)
        .ok_or_else(|| invalid(format!("missing attribute '{name}' on <{}>", element_name(e))))
}

fn get_attribute_opt(e: &BytesStart, name: &str) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name.as_bytes() {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

fn float_attr(e: &BytesStart, name: &str) -> Result<f64> {
    let value = get_attribute(e, name)?;
    value.trim().parse().map_err(|_| {
        invalid(format!(
            "attribute '{name}' on <{}> is not a number: '{value}'",
            element_name(e)
        ))
    })
}

fn float_attr_or(e: &BytesStart, name: &str, default: f64) -> Result<f64> {
    if get_attribute_opt(e, name).is_some() {
        float_attr(e, name)
    } else {
        Ok(default)
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn invalid(message: impl Into<String>) -> Error {
    Error::InvalidFormat(message.into())
}

fn unsupported(e: &BytesStart) -> Error {
    invalid(format!("unsupported element <{}>", element_name(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gdml>
  <solids>
    <box name="world" x="2" y="2" z="2" lunit="m"/>
    <tube name="disc" rmax="1" z="0.5" deltaphi="360" aunit="deg" lunit="cm"/>
  </solids>
  <structure>
    <volume name="disc">
      <materialref ref="G4_Cu"/>
      <solidref ref="disc"/>
    </volume>
    <volume name="world">
      <materialref ref="G4_AIR"/>
      <solidref ref="world"/>
      <physvol name="disc">
        <volumeref ref="disc"/>
        <position name="disc_pos" unit="cm" x="1"/>
        <rotation name="disc_rot" unit="deg" x="90"/>
      </physvol>
    </volume>
  </structure>
  <setup name="Default" version="1.0">
    <world ref="world"/>
  </setup>
</gdml>
"#;

    #[test]
    fn test_units_converted() {
        let world = parse_gdml(DOC).unwrap();
        let Shape::Box { x, .. } = world.solid().unwrap().shape else {
            panic!("expected a box");
        };
        assert_abs_diff_eq!(x, 2000.0);

        let disc = world.child("disc").unwrap();
        assert_abs_diff_eq!(disc.placement.position.x, 10.0);
        assert_abs_diff_eq!(
            disc.placement.rotation.x,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
        let Shape::Tube { rmax, delta_phi, .. } = disc.solid().unwrap().shape else {
            panic!("expected a tube");
        };
        assert_abs_diff_eq!(rmax, 10.0);
        assert_abs_diff_eq!(delta_phi, TAU, epsilon = 1e-12);
    }

    #[test]
    fn test_dangling_reference() {
        let broken = DOC.replace(r#"<solidref ref="disc"/>"#, r#"<solidref ref="missing"/>"#);
        assert!(matches!(parse_gdml(&broken), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_world() {
        let text = DOC.replace(r#"<world ref="world"/>"#, "");
        assert!(matches!(parse_gdml(&text), Err(Error::InvalidFormat(_))));
    }
}
