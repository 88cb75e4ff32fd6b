//! manager::grouping
//!
//! Maximal-rectangle grouping of same-owner chunks.
//!
//! Presentation merges adjacent chunks of one owner into a single block.
//! No shape structure is stored, so each query grows a rectangle around the
//! cell and then checks that every cell inside grows the very same
//! rectangle. Irregular regions (an L, a notched block) disagree at their
//! seams; those cells fall back to single-cell groups.
//!
//! # Growth
//!
//! Starting from a 1×1 box, each iteration tries left, right, up (−z), and
//! down (+z) in that order, adding a whole column or row only when every
//! cell in it belongs to the owner. No side may reach more than
//! [`MAX_EXPAND`] cells past the origin, and growth stops after
//! `4 * MAX_EXPAND` iterations.
//!
//! The grid is read through a lookup closure with no lock held across the
//! scan. A concurrent claim change may produce a stale group, which is
//! acceptable for display.

use crate::core::types::{ChunkPos, PlayerId};

/// How far a rectangle may grow from its origin in each direction.
pub const MAX_EXPAND: i32 = 8;

/// Upper bound on growth iterations.
pub const MAX_ITERATIONS: i32 = 4 * MAX_EXPAND;

/// A cell's place inside its merged block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimGroup {
    pub width: u32,
    pub height: u32,
    /// Zero-based x offset of the cell inside the block.
    pub local_x: u32,
    /// Zero-based z offset of the cell inside the block.
    pub local_z: u32,
}

impl ClaimGroup {
    /// The ungrouped result.
    pub const SINGLE: ClaimGroup = ClaimGroup {
        width: 1,
        height: 1,
        local_x: 0,
        local_z: 0,
    };

    pub fn is_single(&self) -> bool {
        self.width == 1 && self.height == 1
    }
}

/// Inclusive chunk rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRect {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

impl ChunkRect {
    fn unit(pos: ChunkPos) -> Self {
        Self {
            min_x: pos.x,
            max_x: pos.x,
            min_z: pos.z,
            max_z: pos.z,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_x.abs_diff(self.min_x) + 1
    }

    pub fn height(&self) -> u32 {
        self.max_z.abs_diff(self.min_z) + 1
    }

    pub fn cells(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        (self.min_x..=self.max_x)
            .flat_map(move |x| (self.min_z..=self.max_z).map(move |z| ChunkPos::new(x, z)))
    }
}

/// Grow the largest same-owner rectangle around `origin`.
pub fn compute_rectangle<F>(owner_at: &F, origin: ChunkPos, owner: PlayerId) -> ChunkRect
where
    F: Fn(ChunkPos) -> Option<PlayerId>,
{
    let owned = |x: i32, z: i32| owner_at(ChunkPos::new(x, z)) == Some(owner);
    let column_owned = |x: i32, min_z: i32, max_z: i32| (min_z..=max_z).all(|z| owned(x, z));
    let row_owned = |min_x: i32, max_x: i32, z: i32| (min_x..=max_x).all(|x| owned(x, z));

    let mut rect = ChunkRect::unit(origin);
    let mut changed = true;
    let mut iterations = 0;

    while changed && iterations < MAX_ITERATIONS {
        changed = false;
        iterations += 1;

        if rect.min_x > origin.x.saturating_sub(MAX_EXPAND)
            && column_owned(rect.min_x - 1, rect.min_z, rect.max_z)
        {
            rect.min_x -= 1;
            changed = true;
        }

        if rect.max_x < origin.x.saturating_add(MAX_EXPAND)
            && column_owned(rect.max_x + 1, rect.min_z, rect.max_z)
        {
            rect.max_x += 1;
            changed = true;
        }

        if rect.min_z > origin.z.saturating_sub(MAX_EXPAND)
            && row_owned(rect.min_x, rect.max_x, rect.min_z - 1)
        {
            rect.min_z -= 1;
            changed = true;
        }

        if rect.max_z < origin.z.saturating_add(MAX_EXPAND)
            && row_owned(rect.min_x, rect.max_x, rect.max_z + 1)
        {
            rect.max_z += 1;
            changed = true;
        }
    }

    rect
}

/// Group info for the cell at `pos`, or `None` if it is unclaimed.
pub fn group_info<F>(owner_at: &F, pos: ChunkPos) -> Option<ClaimGroup>
where
    F: Fn(ChunkPos) -> Option<PlayerId>,
{
    let owner = owner_at(pos)?;
    let rect = compute_rectangle(owner_at, pos, owner);

    if rect.width() == 1 && rect.height() == 1 {
        return Some(ClaimGroup::SINGLE);
    }

    let stable = rect
        .cells()
        .all(|cell| compute_rectangle(owner_at, cell, owner) == rect);
    if !stable {
        return Some(ClaimGroup::SINGLE);
    }

    Some(ClaimGroup {
        width: rect.width(),
        height: rect.height(),
        local_x: pos.x.abs_diff(rect.min_x),
        local_z: pos.z.abs_diff(rect.min_z),
    })
}
