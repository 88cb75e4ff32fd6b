//! store::claim_store
//!
//! The [`ClaimStore`] façade: spatial index, record cache, name cache, and
//! deferred persistence behind one thread-safe handle.
//!
//! # Lifecycle
//!
//! ```text
//! open ──► load names ──► load index ──► clear clean-shutdown marker ──► start worker
//!            (rebuild from records if the index is missing, corrupt, or the
//!             previous session did not shut down cleanly)
//!   ... concurrent reads and mutations, flushed every interval ...
//! shutdown ──► stop worker ──► final flush ──► set marker ──► release data-dir lock
//! ```
//!
//! # Invariants
//!
//! - The index holds `(world, chunk) -> owner` iff that owner's record holds
//!   the claim. Mutations update the record first, then the index, and undo
//!   the record change if the index refuses it. Both steps run under the
//!   owner's mutation lock.
//! - After a clean shutdown, only the first access to an uncached owner reads
//!   durable storage; concurrent first accesses share a single load.
//! - The clean-shutdown marker is set only after a final flush that wrote
//!   everything.
//! - Durable failures are logged and never surface on the hot path. A failed
//!   write leaves its dirty mark set for the next flush.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use claimwork::core::claim::Claim;
//! use claimwork::core::types::{ChunkPos, PlayerId, WorldName};
//! use claimwork::store::{AddClaimOutcome, ClaimStore, MemoryClaimRepository};
//!
//! let store = ClaimStore::in_memory(Arc::new(MemoryClaimRepository::new()));
//! let owner = PlayerId::random();
//! let world = WorldName::new("default").unwrap();
//!
//! let outcome = store.add_claim(owner, Claim::new(world.clone(), ChunkPos::new(3, -1))).unwrap();
//! assert_eq!(outcome, AddClaimOutcome::Added);
//! assert_eq!(store.get_owner(&world, ChunkPos::new(3, -1)), Some(owner));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::flusher::FlushWorker;
use super::index::SpatialIndex;
use super::repository::{ClaimRepository, FileClaimRepository};
use super::schema::{self, RecordError};
use super::writeback::DirtySet;
use super::StoreError;
use crate::core::claim::Claim;
use crate::core::config::ClaimsConfig;
use crate::core::lock::DataDirLock;
use crate::core::paths::ClaimPaths;
use crate::core::player_claims::PlayerClaims;
use crate::core::types::{ChunkPos, PlayerId, WorldName};

/// How [`ClaimStore::open`] runs the store.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Interval between background flushes.
    pub flush_interval: Duration,
    /// Start the background flush thread. Without it, state is only
    /// written by [`ClaimStore::flush`] and on shutdown.
    pub start_worker: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(30),
            start_worker: true,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &ClaimsConfig) -> Self {
        Self {
            flush_interval: config.flush_interval(),
            ..Self::default()
        }
    }

    /// Options for short-lived maintenance runs: no background thread.
    pub fn offline() -> Self {
        Self {
            start_worker: false,
            ..Self::default()
        }
    }
}

/// Non-error outcomes of [`ClaimStore::add_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddClaimOutcome {
    Added,
    /// The owner already had this cell; nothing changed.
    AlreadyPresent,
}

/// What a flush wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub records_written: usize,
    /// Writes that failed and were re-marked for the next flush.
    pub failures: usize,
    pub index_written: bool,
    pub names_written: bool,
}

impl FlushReport {
    pub fn is_clean(&self) -> bool {
        self.failures == 0
    }
}

/// What an index rebuild found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildReport {
    pub records: usize,
    pub cells: usize,
    /// Claims dropped because an earlier claim on the same cell won.
    pub conflicts: usize,
}

/// One owner's claims, locked for mutation by [`ClaimStore::with_owner`].
pub struct OwnerClaims<'a> {
    state: &'a StoreState,
    record: &'a PlayerClaims,
}

impl OwnerClaims<'_> {
    pub fn record(&self) -> &PlayerClaims {
        self.record
    }

    /// Record first, then index; the record change is undone if the index
    /// refuses the cell.
    pub fn add_claim(&self, claim: Claim) -> Result<AddClaimOutcome, StoreError> {
        let owner = self.record.owner();
        let world = claim.world.clone();
        let pos = claim.pos;

        if !self.record.add_claim(claim) {
            return Ok(AddClaimOutcome::AlreadyPresent);
        }

        if let Err(existing) = self.state.index.try_insert(&world, pos, owner) {
            self.record.remove_claim(&world, pos);
            return Err(StoreError::Conflict {
                world,
                pos,
                owner: existing,
            });
        }

        self.state.dirty.mark_owner(owner);
        self.state.dirty.mark_index();
        debug!(owner = %owner, world = %world, chunk = %pos, "claim added");
        Ok(AddClaimOutcome::Added)
    }

    pub fn remove_claim(&self, world: &WorldName, pos: ChunkPos) -> bool {
        let owner = self.record.owner();
        if !self.record.remove_claim(world, pos) {
            return false;
        }
        self.state.index.remove(world, pos, owner);
        self.state.dirty.mark_owner(owner);
        self.state.dirty.mark_index();
        debug!(owner = %owner, world = %world, chunk = %pos, "claim removed");
        true
    }

    pub fn remove_all(&self) -> usize {
        let owner = self.record.owner();
        let removed = self.record.clear_claims();
        if removed.is_empty() {
            return 0;
        }
        for claim in &removed {
            self.state.index.remove(&claim.world, claim.pos, owner);
        }
        self.state.dirty.mark_owner(owner);
        self.state.dirty.mark_index();
        debug!(owner = %owner, count = removed.len(), "all claims removed");
        removed.len()
    }
}

type RecordSlot = Arc<OnceLock<Arc<PlayerClaims>>>;

/// State shared between the façade and the flush worker.
struct StoreState {
    repository: Arc<dyn ClaimRepository>,
    index: SpatialIndex,
    records: RwLock<HashMap<PlayerId, RecordSlot>>,
    names: RwLock<HashMap<PlayerId, String>>,
    dirty: DirtySet,
    /// Serializes flushes between the worker and explicit callers.
    flushing: Mutex<()>,
}

/// Thread-safe claim ownership store.
///
/// Share it as `Arc<ClaimStore>`; every method takes `&self`.
pub struct ClaimStore {
    state: Arc<StoreState>,
    worker: Mutex<Option<FlushWorker>>,
    lock: Mutex<Option<DataDirLock>>,
    closed: AtomicBool,
}

impl fmt::Debug for ClaimStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimStore")
            .field("cells", &self.state.index.len())
            .field("cached_records", &self.cached_owners().len())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl ClaimStore {
    /// Open the store for a data directory.
    ///
    /// Acquires the data-dir lock, loads the name cache and index (rebuilding
    /// the index from records when it is missing or unreadable), and starts
    /// the flush worker unless `options` says otherwise.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Lock`] if another process holds the data directory
    /// - [`StoreError::Worker`] if the flush thread cannot be spawned
    pub fn open(paths: &ClaimPaths, options: StoreOptions) -> Result<Self, StoreError> {
        let lock = DataDirLock::acquire(paths)?;
        let repository = Arc::new(FileClaimRepository::new(paths.clone()));
        let state = Arc::new(StoreState::load(repository));

        let worker = if options.start_worker {
            let flush_state = Arc::clone(&state);
            let worker = FlushWorker::spawn(options.flush_interval, move || {
                flush_state.flush();
            })
            .map_err(StoreError::Worker)?;
            Some(worker)
        } else {
            None
        };

        info!(
            data_dir = %paths.data_dir().display(),
            cells = state.index.len(),
            worker = worker.is_some(),
            "claim store opened"
        );

        Ok(Self {
            state,
            worker: Mutex::new(worker),
            lock: Mutex::new(Some(lock)),
            closed: AtomicBool::new(false),
        })
    }

    /// Build a store over any repository, with no lock and no worker.
    ///
    /// State is written only by [`flush`](Self::flush), [`save_all`](Self::save_all),
    /// and [`shutdown`](Self::shutdown).
    pub fn in_memory(repository: Arc<dyn ClaimRepository>) -> Self {
        Self {
            state: Arc::new(StoreState::load(repository)),
            worker: Mutex::new(None),
            lock: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Owner of a chunk. Never touches durable storage.
    pub fn get_owner(&self, world: &WorldName, pos: ChunkPos) -> Option<PlayerId> {
        self.state.index.get(world, pos)
    }

    pub fn is_claimed(&self, world: &WorldName, pos: ChunkPos) -> bool {
        self.get_owner(world, pos).is_some()
    }

    /// The claim covering a chunk, looked up through its owner's record.
    pub fn get_claim_at(&self, world: &WorldName, pos: ChunkPos) -> Option<Claim> {
        let owner = self.get_owner(world, pos)?;
        self.record(owner).find_claim(world, pos)
    }

    /// An owner's record, loading it on first access.
    ///
    /// Absent or unreadable durable data yields an empty record.
    pub fn record(&self, owner: PlayerId) -> Arc<PlayerClaims> {
        self.state.record(owner)
    }

    /// First owner other than `exclude` within `radius` chunks of `center`.
    pub fn find_nearby_other_owner(
        &self,
        world: &WorldName,
        center: ChunkPos,
        radius: u32,
        exclude: PlayerId,
    ) -> Option<PlayerId> {
        self.state
            .index
            .find_nearby_other(world, center, radius, exclude)
    }

    /// Claimed cells in an inclusive rectangle with owner names.
    pub fn claimed_cells_in_area(
        &self,
        world: &WorldName,
        min_x: i32,
        max_x: i32,
        min_z: i32,
        max_z: i32,
    ) -> HashMap<ChunkPos, (PlayerId, String)> {
        let cells = self.state.index.area(world, min_x, max_x, min_z, max_z);
        let names = self.state.names.read().unwrap_or_else(PoisonError::into_inner);
        cells
            .into_iter()
            .map(|(pos, owner)| {
                let name = names.get(&owner).cloned().unwrap_or_else(|| owner.short());
                (pos, (owner, name))
            })
            .collect()
    }

    /// Every claimed cell in a world.
    pub fn claimed_cells_in_world(&self, world: &WorldName) -> HashMap<ChunkPos, PlayerId> {
        self.state.index.world_snapshot(world)
    }

    /// Number of claimed cells across all worlds.
    pub fn claimed_cell_count(&self) -> usize {
        self.state.index.len()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a claim for `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if another owner holds the cell. The
    /// owner's record is left unchanged in that case.
    pub fn add_claim(&self, owner: PlayerId, claim: Claim) -> Result<AddClaimOutcome, StoreError> {
        self.with_owner(owner, |claims| claims.add_claim(claim))
    }

    /// Remove one claim. Returns whether anything was removed.
    pub fn remove_claim(&self, owner: PlayerId, world: &WorldName, pos: ChunkPos) -> bool {
        self.with_owner(owner, |claims| claims.remove_claim(world, pos))
    }

    /// Remove every claim of `owner`. Returns how many there were.
    pub fn remove_all_claims(&self, owner: PlayerId) -> usize {
        self.with_owner(owner, |claims| claims.remove_all())
    }

    /// Run `f` with `owner`'s claims locked against other mutations.
    ///
    /// Checks made inside `f` (a quota, say) still hold when `f` mutates.
    /// Do not call back into the store's mutating methods for the same owner
    /// from inside `f`; use the [`OwnerClaims`] handle instead.
    pub fn with_owner<R>(&self, owner: PlayerId, f: impl FnOnce(&OwnerClaims<'_>) -> R) -> R {
        let record = self.record(owner);
        let _mutation = record.lock_mutations();
        f(&OwnerClaims {
            state: &self.state,
            record: &record,
        })
    }

    /// Flag an owner's record for the next flush after an in-place change
    /// (trust, bonuses).
    pub fn mark_dirty(&self, owner: PlayerId) {
        self.state.dirty.mark_owner(owner);
    }

    // =========================================================================
    // Names
    // =========================================================================

    /// Remember a display name. Presentation only.
    pub fn set_name(&self, id: PlayerId, name: &str) {
        let mut names = self.state.names.write().unwrap_or_else(PoisonError::into_inner);
        if names.get(&id).map(String::as_str) != Some(name) {
            names.insert(id, name.to_string());
            self.state.dirty.mark_names();
        }
    }

    /// Last known name, or the first eight characters of the id.
    pub fn get_name(&self, id: PlayerId) -> String {
        self.known_name(id).unwrap_or_else(|| id.short())
    }

    pub fn known_name(&self, id: PlayerId) -> Option<String> {
        self.state
            .names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Case-insensitive reverse lookup in the name cache.
    pub fn find_player_by_name(&self, name: &str) -> Option<PlayerId> {
        let names = self.state.names.read().unwrap_or_else(PoisonError::into_inner);
        let mut matches: Vec<PlayerId> = names
            .iter()
            .filter(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(id, _)| *id)
            .collect();
        matches.sort();
        matches.into_iter().next()
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Owners whose records are currently cached, sorted.
    pub fn cached_owners(&self) -> Vec<PlayerId> {
        self.state.cached().into_iter().map(|r| r.owner()).collect()
    }

    /// Owners with a durable record or a cached one, sorted.
    pub fn known_record_ids(&self) -> Result<Vec<PlayerId>, StoreError> {
        let mut ids: BTreeSet<PlayerId> = self.state.repository.list_records()?.into_iter().collect();
        ids.extend(self.cached_owners());
        Ok(ids.into_iter().collect())
    }

    /// Rebuild the index from every record.
    ///
    /// When two records hold the same cell, the earliest claim wins and the
    /// later one is dropped from its record.
    ///
    /// The index is swapped wholesale, so a mutation running alongside the
    /// rebuild can be lost. Call this only while nothing else mutates the
    /// store: [`open`](Self::open) does so before any handle exists, and the
    /// maintenance binary holds the data directory offline.
    pub fn rebuild_index(&self) -> Result<RebuildReport, StoreError> {
        self.state.rebuild_index()
    }

    /// Whether anything is waiting to be written.
    pub fn has_pending_writes(&self) -> bool {
        self.state.dirty.is_dirty()
    }

    /// Write all dirty state now.
    pub fn flush(&self) -> FlushReport {
        self.state.flush()
    }

    /// Mark everything cached dirty and flush it.
    pub fn save_all(&self) -> FlushReport {
        for record in self.state.cached() {
            self.state.dirty.mark_owner(record.owner());
        }
        self.state.dirty.mark_index();
        self.state.dirty.mark_names();
        self.state.flush()
    }

    /// Stop the worker, flush, and release the data-dir lock.
    ///
    /// Only the first call does anything; later calls return an empty
    /// report. Also runs on drop.
    pub fn shutdown(&self) -> FlushReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return FlushReport::default();
        }

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(mut worker) = worker {
            worker.stop();
        }

        let report = self.state.flush();
        if !report.is_clean() || self.state.dirty.is_dirty() {
            warn!(failures = report.failures, "final flush left unsaved claim data");
        } else if let Err(e) = self.state.repository.set_clean_shutdown(true) {
            warn!(error = %e, "failed to write clean-shutdown marker");
        }

        let lock = self.lock.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(mut lock) = lock {
            if let Err(e) = lock.release() {
                warn!(error = %e, "failed to release data directory lock");
            }
        }

        info!(
            records = report.records_written,
            index = report.index_written,
            "claim store shut down"
        );
        report
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Drop for ClaimStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Shared state
// =============================================================================

impl StoreState {
    fn load(repository: Arc<dyn ClaimRepository>) -> Self {
        let state = Self {
            repository,
            index: SpatialIndex::new(),
            records: RwLock::new(HashMap::new()),
            names: RwLock::new(HashMap::new()),
            dirty: DirtySet::new(),
            flushing: Mutex::new(()),
        };

        state.load_names();
        let clean = state.take_clean_marker();
        let rebuild = state.load_index() || (!clean && state.has_durable_claims());
        if rebuild {
            if !clean {
                warn!("previous session did not shut down cleanly; rebuilding index");
            }
            if let Err(e) = state.rebuild_index() {
                warn!(error = %e, "index rebuild failed; starting with an empty index");
            }
        }
        state
    }

    /// Read the clean-shutdown marker and clear it for this session.
    fn take_clean_marker(&self) -> bool {
        let clean = match self.repository.clean_shutdown() {
            Ok(clean) => clean,
            Err(e) => {
                warn!(error = %e, "failed to read clean-shutdown marker");
                false
            }
        };
        if clean {
            if let Err(e) = self.repository.set_clean_shutdown(false) {
                warn!(error = %e, "failed to clear clean-shutdown marker");
            }
        }
        clean
    }

    /// Whether there is anything an index rebuild could recover or drop.
    fn has_durable_claims(&self) -> bool {
        if !self.index.is_empty() {
            return true;
        }
        match self.repository.list_records() {
            Ok(ids) => !ids.is_empty(),
            Err(e) => {
                warn!(error = %e, "failed to list claim records");
                true
            }
        }
    }

    fn load_names(&self) {
        let json = match self.repository.load_names() {
            Ok(Some(json)) => json,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "failed to read name cache");
                return;
            }
        };

        match schema::decode_names(&json) {
            Ok((names, skipped)) => {
                log_skipped("names", &skipped);
                *self.names.write().unwrap_or_else(PoisonError::into_inner) = names;
            }
            Err(e) => warn!(error = %e, "ignoring unreadable name cache"),
        }
    }

    /// Load the durable index. Returns true if it must be rebuilt.
    fn load_index(&self) -> bool {
        match self.repository.load_index() {
            Ok(Some(json)) => match schema::decode_index(&json) {
                Ok((entries, skipped)) => {
                    log_skipped("index", &skipped);
                    self.index.replace_all(entries);
                    false
                }
                Err(e) => {
                    warn!(error = %e, "index is unreadable");
                    true
                }
            },
            Ok(None) => match self.repository.list_records() {
                Ok(ids) => !ids.is_empty(),
                Err(e) => {
                    warn!(error = %e, "failed to list claim records");
                    false
                }
            },
            Err(e) => {
                warn!(error = %e, "failed to read index");
                true
            }
        }
    }

    fn record(&self, owner: PlayerId) -> Arc<PlayerClaims> {
        let existing = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&owner)
            .cloned();
        let slot = match existing {
            Some(slot) => slot,
            None => self
                .records
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(owner)
                .or_default()
                .clone(),
        };
        slot.get_or_init(|| Arc::new(self.load_record(owner)))
            .clone()
    }

    fn cached_record(&self, owner: PlayerId) -> Option<Arc<PlayerClaims>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&owner)
            .and_then(|slot| slot.get().cloned())
    }

    /// Every loaded record, sorted by owner.
    fn cached(&self) -> Vec<Arc<PlayerClaims>> {
        let mut records: Vec<Arc<PlayerClaims>> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter_map(|slot| slot.get().cloned())
            .collect();
        records.sort_by_key(|r| r.owner());
        records
    }

    fn load_record(&self, owner: PlayerId) -> PlayerClaims {
        let json = match self.repository.load_record(owner) {
            Ok(Some(json)) => json,
            Ok(None) => return PlayerClaims::new(owner),
            Err(e) => {
                warn!(owner = %owner, error = %e, "failed to read claim record");
                return PlayerClaims::new(owner);
            }
        };

        match schema::decode_record(owner, &json) {
            Ok(decoded) => {
                for skipped in &decoded.skipped {
                    warn!(owner = %owner, error = %skipped, "skipped malformed record entry");
                }
                if decoded.migrated {
                    debug!(owner = %owner, "record in legacy shape; scheduling rewrite");
                    self.dirty.mark_owner(owner);
                }
                decoded.record
            }
            Err(e) => {
                warn!(owner = %owner, error = %e, "ignoring unreadable claim record");
                PlayerClaims::new(owner)
            }
        }
    }

    fn rebuild_index(&self) -> Result<RebuildReport, StoreError> {
        let mut ids: BTreeSet<PlayerId> = self.repository.list_records()?.into_iter().collect();
        ids.extend(self.cached().iter().map(|r| r.owner()));

        let records: Vec<Arc<PlayerClaims>> = ids.iter().map(|id| self.record(*id)).collect();

        let mut claims: Vec<(PlayerId, Claim)> = records
            .iter()
            .flat_map(|r| r.claims().into_iter().map(move |c| (r.owner(), c)))
            .collect();
        claims.sort_by(|(a_owner, a), (b_owner, b)| {
            a.claimed_at.cmp(&b.claimed_at).then(a_owner.cmp(b_owner))
        });

        let mut winners: HashMap<(WorldName, ChunkPos), PlayerId> = HashMap::new();
        let mut conflicts = 0;
        for (owner, claim) in claims {
            let key = (claim.world.clone(), claim.pos);
            match winners.get(&key) {
                None => {
                    winners.insert(key, owner);
                }
                Some(winner) => {
                    warn!(
                        owner = %owner,
                        winner = %winner,
                        world = %claim.world,
                        chunk = %claim.pos,
                        "dropping claim on a cell claimed earlier by another owner"
                    );
                    if let Some(record) = self.cached_record(owner) {
                        record.remove_claim(&claim.world, claim.pos);
                    }
                    self.dirty.mark_owner(owner);
                    conflicts += 1;
                }
            }
        }

        let report = RebuildReport {
            records: records.len(),
            cells: winners.len(),
            conflicts,
        };
        self.index.replace_all(
            winners
                .into_iter()
                .map(|((world, pos), owner)| (world, pos, owner)),
        );
        self.dirty.mark_index();

        info!(
            records = report.records,
            cells = report.cells,
            conflicts = report.conflicts,
            "spatial index rebuilt"
        );
        Ok(report)
    }

    fn flush(&self) -> FlushReport {
        let _flushing = self.flushing.lock().unwrap_or_else(PoisonError::into_inner);
        let mut report = FlushReport::default();

        for owner in self.dirty.drain_owners() {
            let Some(record) = self.cached_record(owner) else {
                continue;
            };
            let result = schema::encode_record(&record)
                .map_err(|e| StoreError::serialize(format!("record {}", owner), e))
                .and_then(|json| self.repository.save_record(owner, &json));
            match result {
                Ok(()) => report.records_written += 1,
                Err(e) => {
                    warn!(owner = %owner, error = %e, "failed to save claim record; will retry");
                    self.dirty.mark_owner(owner);
                    report.failures += 1;
                }
            }
        }

        if self.dirty.take_index() {
            let entries = self.index.entries();
            let result = schema::encode_index(entries.iter().map(|(w, p, o)| (w, *p, *o)))
                .map_err(|e| StoreError::serialize("index", e))
                .and_then(|json| self.repository.save_index(&json));
            match result {
                Ok(()) => report.index_written = true,
                Err(e) => {
                    warn!(error = %e, "failed to save index; will retry");
                    self.dirty.mark_index();
                    report.failures += 1;
                }
            }
        }

        if self.dirty.take_names() {
            let json = {
                let names = self.names.read().unwrap_or_else(PoisonError::into_inner);
                schema::encode_names(&names)
            };
            let result = json
                .map_err(|e| StoreError::serialize("names", e))
                .and_then(|json| self.repository.save_names(&json));
            match result {
                Ok(()) => report.names_written = true,
                Err(e) => {
                    warn!(error = %e, "failed to save name cache; will retry");
                    self.dirty.mark_names();
                    report.failures += 1;
                }
            }
        }

        if report != FlushReport::default() {
            debug!(
                records = report.records_written,
                index = report.index_written,
                names = report.names_written,
                failures = report.failures,
                "flushed claim data"
            );
        }
        report
    }
}

fn log_skipped(document: &str, skipped: &[RecordError]) {
    for e in skipped {
        warn!(document, error = %e, "skipped malformed entry");
    }
}
