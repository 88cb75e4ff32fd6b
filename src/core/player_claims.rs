//! core::player_claims
//!
//! One owner's claims, trusted players, and admin-granted quota bonuses.
//!
//! # Concurrency
//!
//! A record is shared as `Arc<PlayerClaims>` between the store cache, the
//! flush worker, and every caller thread. Each part is synchronized on its
//! own:
//!
//! - the claim list behind a `Mutex` (reads return a copy, never a live view)
//! - the trust map behind an `RwLock`
//! - bonuses and the unlimited flag as atomics
//!
//! A separate mutation lock serializes the store's claim changes for this
//! owner, so the claim list and the spatial index move together. Reads never
//! take it.
//!
//! The record does not mark itself dirty; the store does that after each
//! mutation it performs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use super::claim::{Claim, TrustedPlayer};
use super::trust::TrustLevel;
use super::types::{ChunkPos, PlayerId, WorldName};

/// All claim data owned by a single player.
#[derive(Debug)]
pub struct PlayerClaims {
    owner: PlayerId,
    claims: Mutex<Vec<Claim>>,
    trusted: RwLock<HashMap<PlayerId, TrustedPlayer>>,
    bonus_claim_slots: AtomicU32,
    bonus_max_claims: AtomicU32,
    unlimited_claims: AtomicBool,
    mutation: Mutex<()>,
}

impl PlayerClaims {
    /// Create an empty record.
    pub fn new(owner: PlayerId) -> Self {
        Self {
            owner,
            claims: Mutex::new(Vec::new()),
            trusted: RwLock::new(HashMap::new()),
            bonus_claim_slots: AtomicU32::new(0),
            bonus_max_claims: AtomicU32::new(0),
            unlimited_claims: AtomicBool::new(false),
            mutation: Mutex::new(()),
        }
    }

    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Exclusive right to change this owner's claims together with the index.
    pub(crate) fn lock_mutations(&self) -> MutexGuard<'_, ()> {
        self.mutation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Claims
    // =========================================================================

    /// Snapshot of the claim list in insertion order.
    pub fn claims(&self) -> Vec<Claim> {
        self.claims_guard().clone()
    }

    pub fn claim_count(&self) -> usize {
        self.claims_guard().len()
    }

    pub fn has_claim(&self, world: &WorldName, pos: ChunkPos) -> bool {
        self.claims_guard().iter().any(|c| c.is_at(world, pos))
    }

    pub fn find_claim(&self, world: &WorldName, pos: ChunkPos) -> Option<Claim> {
        self.claims_guard()
            .iter()
            .find(|c| c.is_at(world, pos))
            .cloned()
    }

    /// Append a claim unless one for the same cell is already present.
    ///
    /// Returns `true` if the claim was added.
    pub fn add_claim(&self, claim: Claim) -> bool {
        let mut claims = self.claims_guard();
        if claims.iter().any(|c| c.is_at(&claim.world, claim.pos)) {
            return false;
        }
        claims.push(claim);
        true
    }

    /// Remove the claim for a cell. Returns `true` if one was removed.
    pub fn remove_claim(&self, world: &WorldName, pos: ChunkPos) -> bool {
        let mut claims = self.claims_guard();
        let before = claims.len();
        claims.retain(|c| !c.is_at(world, pos));
        claims.len() != before
    }

    /// Remove every claim, returning what was removed.
    pub fn clear_claims(&self) -> Vec<Claim> {
        std::mem::take(&mut *self.claims_guard())
    }

    fn claims_guard(&self) -> std::sync::MutexGuard<'_, Vec<Claim>> {
        self.claims.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Trust
    // =========================================================================

    /// Snapshot of trusted players, sorted by name.
    pub fn trusted_players(&self) -> Vec<TrustedPlayer> {
        let trusted = self.trusted.read().unwrap_or_else(PoisonError::into_inner);
        let mut list: Vec<TrustedPlayer> = trusted.values().cloned().collect();
        list.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then(a.id.cmp(&b.id))
        });
        list
    }

    pub fn trusted_count(&self) -> usize {
        self.trusted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Add or update a trusted player.
    ///
    /// Granting [`TrustLevel::None`] removes the entry instead, so NONE is
    /// never stored.
    pub fn add_trusted_player(&self, id: PlayerId, name: impl Into<String>, level: TrustLevel) {
        let mut trusted = self.trusted.write().unwrap_or_else(PoisonError::into_inner);
        if level == TrustLevel::None {
            trusted.remove(&id);
            return;
        }
        let name = name.into();
        trusted
            .entry(id)
            .and_modify(|tp| {
                tp.name = name.clone();
                tp.level = level;
            })
            .or_insert_with(|| TrustedPlayer::new(id, name.clone(), level));
    }

    /// Remove a trusted player, returning their stored name.
    pub fn remove_trusted_player(&self, id: PlayerId) -> Option<String> {
        self.trusted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .map(|tp| tp.name)
    }

    pub fn trusted_player(&self, id: PlayerId) -> Option<TrustedPlayer> {
        self.trusted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Find a trusted player's id by stored name, case-insensitively.
    pub fn trusted_player_by_name(&self, name: &str) -> Option<PlayerId> {
        self.trusted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|tp| tp.name.eq_ignore_ascii_case(name))
            .map(|tp| tp.id)
    }

    /// Trust level granted to `id`, or NONE.
    pub fn trust_level(&self, id: PlayerId) -> TrustLevel {
        self.trusted_player(id)
            .map(|tp| tp.level)
            .unwrap_or(TrustLevel::None)
    }

    pub fn is_trusted(&self, id: PlayerId) -> bool {
        self.trust_level(id) != TrustLevel::None
    }

    pub fn has_permission(&self, id: PlayerId, required: TrustLevel) -> bool {
        self.trust_level(id).has_permission(required)
    }

    // =========================================================================
    // Quota bonuses
    // =========================================================================

    /// Extra slots granted on top of the capped quota.
    pub fn bonus_claim_slots(&self) -> u32 {
        self.bonus_claim_slots.load(Ordering::Acquire)
    }

    /// Extra headroom added to the server-wide cap.
    pub fn bonus_max_claims(&self) -> u32 {
        self.bonus_max_claims.load(Ordering::Acquire)
    }

    pub fn has_unlimited_claims(&self) -> bool {
        self.unlimited_claims.load(Ordering::Acquire)
    }

    /// Add bonus slots, returning the new total.
    pub fn add_bonus_claim_slots(&self, amount: u32) -> u32 {
        saturating_add(&self.bonus_claim_slots, amount)
    }

    /// Add bonus cap headroom, returning the new total.
    pub fn add_bonus_max_claims(&self, amount: u32) -> u32 {
        saturating_add(&self.bonus_max_claims, amount)
    }

    pub fn set_bonus_claim_slots(&self, value: u32) {
        self.bonus_claim_slots.store(value, Ordering::Release);
    }

    pub fn set_bonus_max_claims(&self, value: u32) {
        self.bonus_max_claims.store(value, Ordering::Release);
    }

    pub fn set_unlimited_claims(&self, unlimited: bool) {
        self.unlimited_claims.store(unlimited, Ordering::Release);
    }
}

fn saturating_add(counter: &AtomicU32, amount: u32) -> u32 {
    let previous = counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
            Some(v.saturating_add(amount))
        })
        .unwrap_or_else(|v| v);
    previous.saturating_add(amount)
}
