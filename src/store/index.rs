//! store::index
//!
//! In-memory spatial index: world -> chunk -> owner.
//!
//! # Concurrency
//!
//! The index is sharded per world. The outer map is only write-locked when a
//! world is seen for the first time; every lookup and mutation after that
//! goes through the world's own lock, so traffic in one world never waits on
//! another.
//!
//! # Invariants
//!
//! - At most one owner per `(world, chunk)`; [`SpatialIndex::try_insert`]
//!   checks and inserts under the same write lock
//! - Removal is owner-checked, so a stale remove can never evict a newer
//!   owner's entry

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::types::{ChunkPos, PlayerId, WorldName};

type Shard = Arc<RwLock<HashMap<ChunkPos, PlayerId>>>;

/// Thread-safe chunk ownership index.
#[derive(Debug, Default)]
pub struct SpatialIndex {
    worlds: RwLock<HashMap<WorldName, Shard>>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn shard(&self, world: &WorldName) -> Option<Shard> {
        self.worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(world)
            .cloned()
    }

    fn shard_or_create(&self, world: &WorldName) -> Shard {
        if let Some(shard) = self.shard(world) {
            return shard;
        }
        self.worlds
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(world.clone())
            .or_default()
            .clone()
    }

    /// Owner of a chunk, if any.
    pub fn get(&self, world: &WorldName, pos: ChunkPos) -> Option<PlayerId> {
        let shard = self.shard(world)?;
        let cells = shard.read().unwrap_or_else(PoisonError::into_inner);
        cells.get(&pos).copied()
    }

    /// Insert `owner` unless a different owner already holds the chunk.
    ///
    /// Returns the conflicting owner on failure. Inserting an entry that
    /// already belongs to `owner` succeeds without change.
    pub fn try_insert(
        &self,
        world: &WorldName,
        pos: ChunkPos,
        owner: PlayerId,
    ) -> Result<(), PlayerId> {
        let shard = self.shard_or_create(world);
        let mut cells = shard.write().unwrap_or_else(PoisonError::into_inner);
        match cells.get(&pos) {
            Some(existing) if *existing != owner => Err(*existing),
            Some(_) => Ok(()),
            None => {
                cells.insert(pos, owner);
                Ok(())
            }
        }
    }

    /// Remove a chunk entry if it belongs to `owner`.
    pub fn remove(&self, world: &WorldName, pos: ChunkPos, owner: PlayerId) -> bool {
        let Some(shard) = self.shard(world) else {
            return false;
        };
        let mut cells = shard.write().unwrap_or_else(PoisonError::into_inner);
        if cells.get(&pos) == Some(&owner) {
            cells.remove(&pos);
            true
        } else {
            false
        }
    }

    /// Scan the `(2r+1)^2` square around `center` for an owner other than
    /// `exclude`.
    ///
    /// Scans row by row (`dz` outer, `dx` inner). Which owner is returned
    /// when several qualify carries no meaning.
    pub fn find_nearby_other(
        &self,
        world: &WorldName,
        center: ChunkPos,
        radius: u32,
        exclude: PlayerId,
    ) -> Option<PlayerId> {
        if radius == 0 {
            return None;
        }
        let shard = self.shard(world)?;
        let cells = shard.read().unwrap_or_else(PoisonError::into_inner);
        if cells.is_empty() {
            return None;
        }

        let r = i32::try_from(radius).unwrap_or(i32::MAX);
        for dz in -r..=r {
            for dx in -r..=r {
                if let Some(owner) = cells.get(&center.offset(dx, dz)) {
                    if *owner != exclude {
                        return Some(*owner);
                    }
                }
            }
        }
        None
    }

    /// Claimed cells inside an inclusive rectangle.
    ///
    /// Walks the rectangle, so cost follows the area asked for rather than
    /// the number of claims. Empty if `min > max` on either axis.
    pub fn area(
        &self,
        world: &WorldName,
        min_x: i32,
        max_x: i32,
        min_z: i32,
        max_z: i32,
    ) -> Vec<(ChunkPos, PlayerId)> {
        let Some(shard) = self.shard(world) else {
            return Vec::new();
        };
        let cells = shard.read().unwrap_or_else(PoisonError::into_inner);

        let mut found = Vec::new();
        if cells.is_empty() || min_x > max_x || min_z > max_z {
            return found;
        }
        for x in min_x..=max_x {
            for z in min_z..=max_z {
                let pos = ChunkPos::new(x, z);
                if let Some(owner) = cells.get(&pos) {
                    found.push((pos, *owner));
                }
            }
        }
        found
    }

    /// Snapshot of every claimed cell in a world.
    pub fn world_snapshot(&self, world: &WorldName) -> HashMap<ChunkPos, PlayerId> {
        self.shard(world)
            .map(|shard| shard.read().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Snapshot of every entry, sorted by world then position.
    pub fn entries(&self) -> Vec<(WorldName, ChunkPos, PlayerId)> {
        let worlds: Vec<(WorldName, Shard)> = self
            .worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(w, s)| (w.clone(), s.clone()))
            .collect();

        let mut entries = Vec::new();
        for (world, shard) in worlds {
            let cells = shard.read().unwrap_or_else(PoisonError::into_inner);
            entries.extend(cells.iter().map(|(pos, owner)| (world.clone(), *pos, *owner)));
        }
        entries.sort_by(|a, b| {
            a.0.as_str()
                .cmp(b.0.as_str())
                .then(a.1.x.cmp(&b.1.x))
                .then(a.1.z.cmp(&b.1.z))
        });
        entries
    }

    /// Number of claimed cells across all worlds.
    pub fn len(&self) -> usize {
        let worlds: Vec<Shard> = self
            .worlds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        worlds
            .iter()
            .map(|s| s.read().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the whole index with `entries`.
    ///
    /// Later entries for an already-filled cell are ignored. Shards are
    /// swapped, not edited: an insert racing this call may land in a shard
    /// that is then discarded.
    pub fn replace_all(&self, entries: impl IntoIterator<Item = (WorldName, ChunkPos, PlayerId)>) {
        let mut fresh: HashMap<WorldName, HashMap<ChunkPos, PlayerId>> = HashMap::new();
        for (world, pos, owner) in entries {
            fresh.entry(world).or_default().entry(pos).or_insert(owner);
        }

        let mut worlds = self.worlds.write().unwrap_or_else(PoisonError::into_inner);
        *worlds = fresh
            .into_iter()
            .map(|(world, cells)| (world, Arc::new(RwLock::new(cells))))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world(name: &str) -> WorldName {
        WorldName::new(name).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let index = SpatialIndex::new();
        let owner = PlayerId::random();
        let w = world("default");

        assert_eq!(index.get(&w, ChunkPos::new(0, 0)), None);
        index.try_insert(&w, ChunkPos::new(0, 0), owner).unwrap();
        assert_eq!(index.get(&w, ChunkPos::new(0, 0)), Some(owner));
        assert_eq!(index.get(&world("nether"), ChunkPos::new(0, 0)), None);
    }

    #[test]
    fn insert_conflict_reports_existing_owner() {
        let index = SpatialIndex::new();
        let (a, b) = (PlayerId::random(), PlayerId::random());
        let w = world("default");

        index.try_insert(&w, ChunkPos::new(3, 3), a).unwrap();
        assert_eq!(index.try_insert(&w, ChunkPos::new(3, 3), b), Err(a));
        assert!(index.try_insert(&w, ChunkPos::new(3, 3), a).is_ok());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn remove_is_owner_checked() {
        let index = SpatialIndex::new();
        let (a, b) = (PlayerId::random(), PlayerId::random());
        let w = world("default");

        index.try_insert(&w, ChunkPos::new(1, 1), a).unwrap();
        assert!(!index.remove(&w, ChunkPos::new(1, 1), b));
        assert!(index.remove(&w, ChunkPos::new(1, 1), a));
        assert!(!index.remove(&w, ChunkPos::new(1, 1), a));
        assert!(index.is_empty());
    }

    mod nearby {
        use super::*;

        #[test]
        fn zero_radius_finds_nothing() {
            let index = SpatialIndex::new();
            let w = world("default");
            index.try_insert(&w, ChunkPos::new(0, 0), PlayerId::random()).unwrap();
            assert!(index
                .find_nearby_other(&w, ChunkPos::new(0, 0), 0, PlayerId::random())
                .is_none());
        }

        #[test]
        fn finds_other_owner_within_square() {
            let index = SpatialIndex::new();
            let (a, b) = (PlayerId::random(), PlayerId::random());
            let w = world("default");
            index.try_insert(&w, ChunkPos::new(0, 0), a).unwrap();

            assert_eq!(index.find_nearby_other(&w, ChunkPos::new(2, -2), 2, b), Some(a));
            assert_eq!(index.find_nearby_other(&w, ChunkPos::new(3, 0), 2, b), None);
        }

        #[test]
        fn excluded_owner_ignored() {
            let index = SpatialIndex::new();
            let a = PlayerId::random();
            let w = world("default");
            index.try_insert(&w, ChunkPos::new(1, 0), a).unwrap();

            assert_eq!(index.find_nearby_other(&w, ChunkPos::new(0, 0), 3, a), None);
        }

        #[test]
        fn scans_rows_from_the_top_left() {
            let index = SpatialIndex::new();
            let (a, b, me) = (PlayerId::random(), PlayerId::random(), PlayerId::random());
            let w = world("default");
            // Row order reaches `a` first; column order would reach `b`.
            index.try_insert(&w, ChunkPos::new(1, -1), a).unwrap();
            index.try_insert(&w, ChunkPos::new(-1, 0), b).unwrap();

            assert_eq!(index.find_nearby_other(&w, ChunkPos::new(0, 0), 1, me), Some(a));
        }

        #[test]
        fn other_worlds_ignored() {
            let index = SpatialIndex::new();
            index
                .try_insert(&world("nether"), ChunkPos::new(0, 0), PlayerId::random())
                .unwrap();
            assert_eq!(
                index.find_nearby_other(&world("default"), ChunkPos::new(0, 0), 5, PlayerId::random()),
                None
            );
        }
    }

    #[test]
    fn area_is_inclusive() {
        let index = SpatialIndex::new();
        let owner = PlayerId::random();
        let w = world("default");
        for x in -2..=2 {
            index.try_insert(&w, ChunkPos::new(x, 0), owner).unwrap();
        }

        let cells = index.area(&w, -1, 1, 0, 0);
        assert_eq!(cells.len(), 3);
        assert!(index.area(&w, 1, -1, 0, 0).is_empty());
        assert!(index.area(&world("nether"), -5, 5, -5, 5).is_empty());
    }

    #[test]
    fn replace_all_keeps_first_entry_per_cell() {
        let index = SpatialIndex::new();
        let (a, b) = (PlayerId::random(), PlayerId::random());
        let w = world("default");
        index.try_insert(&w, ChunkPos::new(9, 9), a).unwrap();

        index.replace_all(vec![
            (w.clone(), ChunkPos::new(0, 0), a),
            (w.clone(), ChunkPos::new(0, 0), b),
            (world("nether"), ChunkPos::new(1, 1), b),
        ]);

        assert_eq!(index.get(&w, ChunkPos::new(9, 9)), None);
        assert_eq!(index.get(&w, ChunkPos::new(0, 0)), Some(a));
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries().len(), 2);
        assert_eq!(index.world_snapshot(&world("nether")).len(), 1);
    }
}
