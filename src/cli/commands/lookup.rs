//! owner and area commands - Read-only chunk lookups

use anyhow::{bail, Result};

use super::{parse_world, Session};
use crate::cli::Context;
use crate::core::types::ChunkPos;

/// Largest rectangle `area` will scan.
const MAX_AREA_CELLS: u64 = 1 << 20;

/// Print the owner of a chunk, or "unclaimed".
pub fn owner(ctx: &Context, world: &str, x: i32, z: i32) -> Result<()> {
    let world = parse_world(world)?;
    let session = Session::open(ctx, 0.0)?;
    let pos = ChunkPos::new(x, z);
    let store = session.store();

    match store.get_claim_at(&world, pos) {
        Some(claim) => {
            let owner = store.get_owner(&world, pos);
            let label = match (&claim.display_name, owner) {
                (Some(name), _) if claim.admin => name.clone(),
                (_, Some(id)) => format!("{} ({})", store.get_name(id), id),
                (_, None) => "unknown".to_string(),
            };
            println!("{} {}: {}", world, pos, label);
        }
        None => match store.get_owner(&world, pos) {
            // Indexed but missing from the owner's record.
            Some(id) => println!("{} {}: {} (record missing claim)", world, pos, id),
            None => println!("{} {}: unclaimed", world, pos),
        },
    }

    session.close()
}

/// List the claimed chunks in an inclusive rectangle.
pub fn area(
    ctx: &Context,
    world: &str,
    min_x: i32,
    max_x: i32,
    min_z: i32,
    max_z: i32,
) -> Result<()> {
    let world = parse_world(world)?;
    if min_x > max_x || min_z > max_z {
        bail!("Empty area: min must not exceed max");
    }
    let cells = (u64::from(max_x.abs_diff(min_x)) + 1) * (u64::from(max_z.abs_diff(min_z)) + 1);
    if cells > MAX_AREA_CELLS {
        bail!("Area too large: {} chunks (limit {})", cells, MAX_AREA_CELLS);
    }

    let session = Session::open(ctx, 0.0)?;
    let mut claimed: Vec<_> = session
        .store()
        .claimed_cells_in_area(&world, min_x, max_x, min_z, max_z)
        .into_iter()
        .collect();
    claimed.sort_by_key(|(pos, _)| *pos);

    for (pos, (id, name)) in &claimed {
        println!("{} {} {}", pos, name, id);
    }
    if claimed.is_empty() {
        println!("No claimed chunks in {}", world);
    }

    session.close()
}
