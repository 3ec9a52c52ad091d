//! Lead castles and the bottom plate.
//!
//! Castles are assemblies standing on the table surface (`z = 0`), centered
//! on the detector axis.

use crate::dimensions::{castle1, castle2, BoxDims, BOTTOM_PLATE, BOTTOM_PLATE_CAVITY, CUT_MARGIN};
use crate::error::Result;
use hadesgeom_core::{LeadCastle, Material, Placement, Solid, SolidKernel, Vec3, Volume};

/// Name of the castle assembly.
pub const CASTLE_NAME: &str = "lead_castle";
/// Name of the bottom plate volume.
pub const BOTTOM_PLATE_NAME: &str = "bottom_plate";

fn cuboid(kernel: &dyn SolidKernel, name: &str, dims: BoxDims) -> Result<Solid> {
    Ok(kernel.cuboid(name, dims.width, dims.depth, dims.height)?)
}

/// Builds the castle assembly for a table.
///
/// # Errors
/// Propagates kernel errors.
pub fn build_castle(kernel: &dyn SolidKernel, castle: LeadCastle) -> Result<Volume> {
    let volume = match castle {
        LeadCastle::Table1 => table1(kernel)?,
        LeadCastle::Table2 => table2(kernel)?,
    };
    log::debug!("built {castle} with {} volumes", volume.count());
    Ok(volume)
}

/// Base block with a vertical bore through its full height.
fn bored_base(kernel: &dyn SolidKernel, name: &str, base: BoxDims, bore: BoxDims) -> Result<Solid> {
    let outer = cuboid(kernel, "castle_base_block", base)?;
    let hole = kernel.cuboid(
        "castle_base_bore",
        bore.width,
        bore.depth,
        bore.height + 2.0 * CUT_MARGIN,
    )?;
    Ok(kernel.subtract(name, outer, hole, Placement::ORIGIN)?)
}

fn table1(kernel: &dyn SolidKernel) -> Result<Volume> {
    use castle1::{BASE, CAVITY, FRONT, INNER_CAVITY, TOP};

    let bored = bored_base(kernel, "castle_base_bored", BASE, INNER_CAVITY)?;
    // front opening through the -y wall, from the floor up
    let wall = 0.5 * (BASE.depth - INNER_CAVITY.depth);
    let opening = kernel.cuboid(
        "castle_base_opening",
        CAVITY.width,
        CAVITY.depth + 2.0 * CUT_MARGIN,
        CAVITY.height + CUT_MARGIN,
    )?;
    let opening_at = Vec3::new(
        0.0,
        -0.5 * INNER_CAVITY.depth - 0.5 * wall,
        -0.5 * BASE.height + 0.5 * (CAVITY.height - CUT_MARGIN),
    );
    let base = kernel.subtract("castle_base", bored, opening, Placement::at(opening_at))?;

    let mut castle = Volume::assembly(CASTLE_NAME);
    castle.add_child(
        Volume::logical("castle_base", base, Material::LEAD)
            .with_placement(Placement::at_z(0.5 * BASE.height)),
    )?;
    castle.add_child(
        Volume::logical("castle_top", cuboid(kernel, "castle_top", TOP)?, Material::LEAD)
            .with_placement(Placement::at_z(BASE.height + 0.5 * TOP.height)),
    )?;
    castle.add_child(
        Volume::logical("castle_front", cuboid(kernel, "castle_front", FRONT)?, Material::LEAD)
            .with_placement(Placement::at(Vec3::new(
                0.0,
                -0.5 * BASE.depth - 0.5 * FRONT.depth,
                0.5 * FRONT.height,
            ))),
    )?;
    Ok(castle)
}

fn table2(kernel: &dyn SolidKernel) -> Result<Volume> {
    use castle2::{BASE, COPPER_PLATE, INNER_CAVITY, TOP};

    let base = bored_base(kernel, "castle_base", BASE, INNER_CAVITY)?;

    let mut castle = Volume::assembly(CASTLE_NAME);
    castle.add_child(
        Volume::logical("castle_base", base, Material::LEAD)
            .with_placement(Placement::at_z(0.5 * BASE.height)),
    )?;
    castle.add_child(
        Volume::logical(
            "castle_copper_plate",
            cuboid(kernel, "castle_copper_plate", COPPER_PLATE)?,
            Material::COPPER,
        )
        .with_placement(Placement::at_z(BASE.height + 0.5 * COPPER_PLATE.height)),
    )?;
    castle.add_child(
        Volume::logical("castle_top", cuboid(kernel, "castle_top", TOP)?, Material::LEAD)
            .with_placement(Placement::at_z(
                BASE.height + COPPER_PLATE.height + 0.5 * TOP.height,
            )),
    )?;
    Ok(castle)
}

/// Inner height of the castle, from the table to the underside of the lid.
#[must_use]
pub fn interior_height(castle: LeadCastle) -> f64 {
    match castle {
        LeadCastle::Table1 => castle1::BASE.height,
        LeadCastle::Table2 => castle2::BASE.height,
    }
}

/// Builds the slotted steel plate below the table surface.
///
/// # Errors
/// Propagates kernel errors.
pub fn build_bottom_plate(kernel: &dyn SolidKernel) -> Result<Volume> {
    let plate = cuboid(kernel, "bottom_plate_block", BOTTOM_PLATE)?;
    let slot = cuboid(kernel, "bottom_plate_slot", BOTTOM_PLATE_CAVITY)?;
    let solid = kernel.subtract(BOTTOM_PLATE_NAME, plate, slot, Placement::ORIGIN)?;
    Ok(Volume::logical(BOTTOM_PLATE_NAME, solid, Material::STEEL)
        .with_placement(Placement::at_z(-0.5 * BOTTOM_PLATE.height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use hadesgeom_core::{CsgKernel, Shape};

    #[test]
    fn test_table1_layout() {
        let castle = build_castle(&CsgKernel, LeadCastle::Table1).unwrap();
        assert!(castle.is_assembly());
        assert_eq!(castle.children().len(), 3);
        let top = castle.child("castle_top").unwrap();
        assert_abs_diff_eq!(top.placement.position.z, 545.0);
        let front = castle.child("castle_front").unwrap();
        assert_abs_diff_eq!(front.placement.position.y, -275.0);
        let base = castle.child("castle_base").unwrap();
        assert_eq!(base.solid().unwrap().components().len(), 5);
    }

    #[test]
    fn test_table2_layout() {
        let castle = build_castle(&CsgKernel, LeadCastle::Table2).unwrap();
        let plate = castle.child("castle_copper_plate").unwrap();
        assert_eq!(plate.material().unwrap().name(), Material::COPPER);
        assert_abs_diff_eq!(plate.placement.position.z, 405.0);
        assert_abs_diff_eq!(
            castle.child("castle_top").unwrap().placement.position.z,
            435.0
        );
    }

    #[test]
    fn test_bottom_plate_below_table() {
        let plate = build_bottom_plate(&CsgKernel).unwrap();
        assert_abs_diff_eq!(plate.placement.position.z, -7.5);
        assert!(matches!(
            plate.solid().unwrap().shape,
            Shape::Subtraction { .. }
        ));
    }
}
