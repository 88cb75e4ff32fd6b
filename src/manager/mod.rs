//! manager
//!
//! Claim Manager: the business rules on top of the store.
//!
//! # Modules
//!
//! - [`result`] - Claim attempt outcomes
//! - [`quota`] - Playtime-scaled quota math
//! - [`grouping`] - Maximal-rectangle grouping for display
//!
//! # Responsibilities
//!
//! The store answers "who owns what"; the manager decides whether an action
//! is allowed: claiming (buffer zone, quota), unclaiming (ownership), acting
//! inside a claim (trust levels), and the PvP rule.
//!
//! Coordinates passed to the manager are world-space unless a parameter is a
//! [`ChunkPos`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use claimwork::core::config::ClaimsConfig;
//! use claimwork::core::playtime::FixedPlaytime;
//! use claimwork::core::types::{PlayerId, WorldName};
//! use claimwork::manager::{ClaimManager, ClaimResult};
//! use claimwork::store::{ClaimStore, MemoryClaimRepository};
//!
//! let store = Arc::new(ClaimStore::in_memory(Arc::new(MemoryClaimRepository::new())));
//! let manager = ClaimManager::new(store, ClaimsConfig::default(), Arc::new(FixedPlaytime::new()));
//!
//! let world = WorldName::new("default").unwrap();
//! let player = PlayerId::random();
//! assert_eq!(manager.claim_chunk(player, &world, 10.0, -5.0, false), ClaimResult::Success);
//! assert_eq!(manager.claim_chunk(player, &world, 20.0, -1.0, false), ClaimResult::AlreadyOwn);
//! ```

pub mod grouping;
pub mod quota;
pub mod result;

pub use grouping::ClaimGroup;
pub use quota::QuotaInputs;
pub use result::ClaimResult;

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::claim::Claim;
use crate::core::config::ClaimsConfig;
use crate::core::player_claims::PlayerClaims;
use crate::core::playtime::PlaytimeSource;
use crate::core::trust::TrustLevel;
use crate::core::types::{ChunkPos, PlayerId, WorldName};
use crate::store::{AddClaimOutcome, ClaimStore, StoreError};

/// Claim rules over a shared store.
pub struct ClaimManager {
    store: Arc<ClaimStore>,
    config: ClaimsConfig,
    playtime: Arc<dyn PlaytimeSource>,
}

impl ClaimManager {
    pub fn new(
        store: Arc<ClaimStore>,
        config: ClaimsConfig,
        playtime: Arc<dyn PlaytimeSource>,
    ) -> Self {
        Self {
            store,
            config,
            playtime,
        }
    }

    pub fn store(&self) -> &Arc<ClaimStore> {
        &self.store
    }

    pub fn config(&self) -> &ClaimsConfig {
        &self.config
    }

    /// The chunk containing a world-space position.
    pub fn chunk_coords(&self, world_x: f64, world_z: f64) -> ChunkPos {
        ChunkPos::from_world(world_x, world_z)
    }

    pub fn record(&self, player: PlayerId) -> Arc<PlayerClaims> {
        self.store.record(player)
    }

    // =========================================================================
    // Claiming
    // =========================================================================

    /// Try to claim the chunk at a world-space position.
    ///
    /// `bypass_limits` skips the buffer-zone and quota checks, but never
    /// takes a chunk from another owner.
    pub fn claim_chunk(
        &self,
        player: PlayerId,
        world: &WorldName,
        world_x: f64,
        world_z: f64,
        bypass_limits: bool,
    ) -> ClaimResult {
        let pos = self.chunk_coords(world_x, world_z);

        if let Some(owner) = self.store.get_owner(world, pos) {
            return if owner == player {
                ClaimResult::AlreadyOwn
            } else {
                ClaimResult::ClaimedByOther
            };
        }

        if !bypass_limits {
            let buffer = self.config.claim_buffer_size();
            if buffer > 0
                && self
                    .store
                    .find_nearby_other_owner(world, pos, buffer, player)
                    .is_some()
            {
                return ClaimResult::TooCloseToOtherClaim;
            }
        }

        // Quota check and insert run under the owner's lock.
        self.store.with_owner(player, |claims| {
            let count = claims.record().claim_count();
            if !bypass_limits && count >= self.max_claims(player) as usize {
                return ClaimResult::LimitReached;
            }
            Self::outcome(player, world, pos, claims.add_claim(Claim::new(world.clone(), pos)))
        })
    }

    /// Claim a chunk for the server under [`PlayerId::admin`], bypassing
    /// limits.
    ///
    /// `pvp_enabled` overrides the server PvP rule inside this chunk.
    pub fn claim_admin_chunk(
        &self,
        world: &WorldName,
        world_x: f64,
        world_z: f64,
        display_name: Option<String>,
        pvp_enabled: bool,
    ) -> ClaimResult {
        let admin = PlayerId::admin();
        let pos = self.chunk_coords(world_x, world_z);

        match self.store.get_owner(world, pos) {
            Some(owner) if owner == admin => return ClaimResult::AlreadyOwn,
            Some(_) => return ClaimResult::ClaimedByOther,
            None => {}
        }

        let added = self.store.add_claim(
            admin,
            Claim::admin(world.clone(), pos, display_name, pvp_enabled),
        );
        let result = Self::outcome(admin, world, pos, added);
        if result.is_success() {
            info!(world = %world, chunk = %pos, "admin claim created");
        }
        result
    }

    fn outcome(
        player: PlayerId,
        world: &WorldName,
        pos: ChunkPos,
        added: Result<AddClaimOutcome, StoreError>,
    ) -> ClaimResult {
        match added {
            Ok(AddClaimOutcome::Added) => {
                debug!(player = %player, world = %world, chunk = %pos, "chunk claimed");
                ClaimResult::Success
            }
            Ok(AddClaimOutcome::AlreadyPresent) => ClaimResult::AlreadyOwn,
            Err(StoreError::Conflict { owner, .. }) if owner == player => ClaimResult::AlreadyOwn,
            Err(_) => ClaimResult::ClaimedByOther,
        }
    }

    /// Release the chunk at a world-space position. Only its owner may.
    pub fn unclaim_chunk(
        &self,
        player: PlayerId,
        world: &WorldName,
        world_x: f64,
        world_z: f64,
    ) -> bool {
        let pos = self.chunk_coords(world_x, world_z);
        if self.store.get_owner(world, pos) != Some(player) {
            return false;
        }
        self.store.remove_claim(player, world, pos)
    }

    /// Release every claim of a player. Returns how many there were.
    pub fn unclaim_all(&self, player: PlayerId) -> usize {
        let count = self.store.remove_all_claims(player);
        if count > 0 {
            info!(player = %player, count, "all claims released");
        }
        count
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn owner_at(&self, world: &WorldName, world_x: f64, world_z: f64) -> Option<PlayerId> {
        self.store
            .get_owner(world, self.chunk_coords(world_x, world_z))
    }

    pub fn claim_at(&self, world: &WorldName, world_x: f64, world_z: f64) -> Option<Claim> {
        self.store
            .get_claim_at(world, self.chunk_coords(world_x, world_z))
    }

    /// Label for the claim at a position: an admin claim's display name,
    /// otherwise the owner's name.
    pub fn display_name_at(&self, world: &WorldName, world_x: f64, world_z: f64) -> Option<String> {
        let claim = self.claim_at(world, world_x, world_z)?;
        if let Some(name) = claim.display_name.filter(|_| claim.admin) {
            return Some(name);
        }
        let owner = self.owner_at(world, world_x, world_z)?;
        Some(self.store.get_name(owner))
    }

    /// Merged display block for a chunk, or `None` if it is unclaimed.
    pub fn claim_group_info(&self, world: &WorldName, pos: ChunkPos) -> Option<ClaimGroup> {
        let owner_at = |p: ChunkPos| self.store.get_owner(world, p);
        grouping::group_info(&owner_at, pos)
    }

    // =========================================================================
    // Permissions
    // =========================================================================

    /// Whether `player` may act at a position with the `required` level.
    ///
    /// Unclaimed chunks and the owner always pass.
    pub fn has_permission_at(
        &self,
        player: PlayerId,
        world: &WorldName,
        world_x: f64,
        world_z: f64,
        required: TrustLevel,
    ) -> bool {
        match self.owner_at(world, world_x, world_z) {
            None => true,
            Some(owner) if owner == player => true,
            Some(owner) => self.store.record(owner).has_permission(player, required),
        }
    }

    /// Basic interaction check (`USE`).
    pub fn can_interact(
        &self,
        player: PlayerId,
        world: &WorldName,
        world_x: f64,
        world_z: f64,
    ) -> bool {
        self.has_permission_at(player, world, world_x, world_z, TrustLevel::Use)
    }

    /// The level `player` holds at a position; `BUILD` where unclaimed or
    /// owned by them.
    pub fn trust_level_at(
        &self,
        player: PlayerId,
        world: &WorldName,
        world_x: f64,
        world_z: f64,
    ) -> TrustLevel {
        match self.owner_at(world, world_x, world_z) {
            None => TrustLevel::Build,
            Some(owner) if owner == player => TrustLevel::Build,
            Some(owner) => self.store.record(owner).trust_level(player),
        }
    }

    /// PvP rule at a position.
    ///
    /// Unclaimed: allowed. Admin claims: their own switch. Player claims:
    /// the server setting.
    pub fn is_pvp_enabled_at(&self, world: &WorldName, world_x: f64, world_z: f64) -> bool {
        match self.claim_at(world, world_x, world_z) {
            None => true,
            Some(claim) if claim.admin => claim.pvp_enabled,
            Some(_) => self.config.pvp_in_player_claims(),
        }
    }

    // =========================================================================
    // Trust
    // =========================================================================

    pub fn is_trusted(&self, owner: PlayerId, player: PlayerId) -> bool {
        self.store.record(owner).is_trusted(player)
    }

    pub fn trust_level(&self, owner: PlayerId, player: PlayerId) -> TrustLevel {
        self.store.record(owner).trust_level(player)
    }

    /// Grant or change a trust level. `NONE` is refused; use
    /// [`remove_trust`](Self::remove_trust).
    pub fn add_trust(
        &self,
        owner: PlayerId,
        player: PlayerId,
        name: &str,
        level: TrustLevel,
    ) -> bool {
        if level == TrustLevel::None || owner == player {
            return false;
        }
        self.store
            .record(owner)
            .add_trusted_player(player, name, level);
        self.store.set_name(player, name);
        self.store.mark_dirty(owner);
        debug!(owner = %owner, player = %player, level = %level, "trust granted");
        true
    }

    /// Revoke trust. Returns the removed player's stored name.
    pub fn remove_trust(&self, owner: PlayerId, player: PlayerId) -> Option<String> {
        let removed = self.store.record(owner).remove_trusted_player(player);
        if removed.is_some() {
            self.store.mark_dirty(owner);
            debug!(owner = %owner, player = %player, "trust revoked");
        }
        removed
    }

    // =========================================================================
    // Quota
    // =========================================================================

    pub fn quota_inputs(&self, player: PlayerId) -> QuotaInputs {
        let record = self.store.record(player);
        QuotaInputs::new(&self.config, &record, self.playtime.total_hours(player))
    }

    /// Current quota; `u32::MAX` for unlimited players.
    pub fn max_claims(&self, player: PlayerId) -> u32 {
        quota::max_claims(&self.quota_inputs(player))
    }

    /// Hours until the next claim; `0` if available now, `-1` if never.
    pub fn hours_until_next_claim(&self, player: PlayerId) -> f64 {
        let count = self.store.record(player).claim_count();
        quota::hours_until_next_claim(&self.quota_inputs(player), count)
    }

    /// Grant extra claim slots on top of the cap. Returns the new total.
    pub fn add_bonus_claim_slots(&self, player: PlayerId, amount: u32) -> u32 {
        let total = self.store.record(player).add_bonus_claim_slots(amount);
        self.store.mark_dirty(player);
        info!(player = %player, amount, total, "bonus claim slots granted");
        total
    }

    /// Raise the player's cap. Clears the unlimited flag. Returns the new
    /// total.
    pub fn add_bonus_max_claims(&self, player: PlayerId, amount: u32) -> u32 {
        let record = self.store.record(player);
        record.set_unlimited_claims(false);
        let total = record.add_bonus_max_claims(amount);
        self.store.mark_dirty(player);
        info!(player = %player, amount, total, "bonus max claims granted");
        total
    }

    pub fn set_unlimited_claims(&self, player: PlayerId, unlimited: bool) {
        self.store.record(player).set_unlimited_claims(unlimited);
        self.store.mark_dirty(player);
        info!(player = %player, unlimited, "unlimited claims updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playtime::FixedPlaytime;
    use crate::core::types::CHUNK_SIZE;
    use crate::store::MemoryClaimRepository;

    struct Fixture {
        manager: ClaimManager,
        playtime: Arc<FixedPlaytime>,
        world: WorldName,
    }

    fn fixture_with(config: ClaimsConfig) -> Fixture {
        let store = Arc::new(ClaimStore::in_memory(Arc::new(MemoryClaimRepository::new())));
        let playtime = Arc::new(FixedPlaytime::new());
        Fixture {
            manager: ClaimManager::new(store, config, playtime.clone()),
            playtime,
            world: WorldName::new("default").unwrap(),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(ClaimsConfig::default())
    }

    /// World-space centre of a chunk.
    fn at(chunk: i32) -> f64 {
        f64::from(chunk * CHUNK_SIZE) + 0.5
    }

    mod claiming {
        use super::*;

        #[test]
        fn claim_then_already_own() {
            let f = fixture();
            let p = PlayerId::random();

            assert_eq!(f.manager.claim_chunk(p, &f.world, 1.0, 1.0, false), ClaimResult::Success);
            assert_eq!(f.manager.claim_chunk(p, &f.world, 31.0, 31.0, false), ClaimResult::AlreadyOwn);
        }

        #[test]
        fn claimed_by_other() {
            let f = fixture();
            let (a, b) = (PlayerId::random(), PlayerId::random());

            f.manager.claim_chunk(a, &f.world, 0.0, 0.0, false);
            assert_eq!(
                f.manager.claim_chunk(b, &f.world, 0.0, 0.0, true),
                ClaimResult::ClaimedByOther
            );
        }

        #[test]
        fn negative_coordinates_floor() {
            let f = fixture();
            let p = PlayerId::random();

            f.manager.claim_chunk(p, &f.world, -0.5, -33.0, false);
            assert_eq!(
                f.manager.store().get_owner(&f.world, ChunkPos::new(-1, -2)),
                Some(p)
            );
        }

        #[test]
        fn buffer_zone() {
            let f = fixture();
            let (a, b) = (PlayerId::random(), PlayerId::random());

            assert!(f.manager.claim_chunk(a, &f.world, at(0), at(0), false).is_success());
            assert_eq!(
                f.manager.claim_chunk(b, &f.world, at(1), at(1), false),
                ClaimResult::TooCloseToOtherClaim
            );
            assert_eq!(
                f.manager.claim_chunk(b, &f.world, at(5), at(5), false),
                ClaimResult::Success
            );
            assert_eq!(
                f.manager.claim_chunk(b, &f.world, at(2), at(0), true),
                ClaimResult::Success
            );
        }

        #[test]
        fn zero_buffer_disables_check() {
            let mut config = ClaimsConfig::default();
            config.set_claim_buffer_size(0);
            let f = fixture_with(config);
            let (a, b) = (PlayerId::random(), PlayerId::random());

            f.manager.claim_chunk(a, &f.world, at(0), at(0), false);
            assert!(f.manager.claim_chunk(b, &f.world, at(1), at(0), false).is_success());
        }

        #[test]
        fn own_claims_do_not_block_buffer() {
            let f = fixture();
            let p = PlayerId::random();

            f.manager.claim_chunk(p, &f.world, at(0), at(0), false);
            assert!(f.manager.claim_chunk(p, &f.world, at(1), at(0), false).is_success());
        }

        #[test]
        fn limit_reached() {
            let f = fixture();
            let p = PlayerId::random();

            for x in 0..4 {
                assert!(f.manager.claim_chunk(p, &f.world, at(x), at(0), false).is_success());
            }
            assert_eq!(
                f.manager.claim_chunk(p, &f.world, at(4), at(0), false),
                ClaimResult::LimitReached
            );
            assert!(f.manager.claim_chunk(p, &f.world, at(4), at(0), true).is_success());

            f.playtime.set(p, 1.0);
            assert!(f.manager.claim_chunk(p, &f.world, at(5), at(0), false).is_success());
        }

        #[test]
        fn unclaim_requires_ownership() {
            let f = fixture();
            let (a, b) = (PlayerId::random(), PlayerId::random());
            f.manager.claim_chunk(a, &f.world, 0.0, 0.0, false);

            assert!(!f.manager.unclaim_chunk(b, &f.world, 0.0, 0.0));
            assert!(f.manager.unclaim_chunk(a, &f.world, 0.0, 0.0));
            assert!(!f.manager.unclaim_chunk(a, &f.world, 0.0, 0.0));
        }

        #[test]
        fn unclaim_all_twice() {
            let f = fixture();
            let p = PlayerId::random();
            for x in 0..3 {
                f.manager.claim_chunk(p, &f.world, at(x), at(0), false);
            }

            assert_eq!(f.manager.unclaim_all(p), 3);
            assert_eq!(f.manager.unclaim_all(p), 0);
        }
    }

    mod permissions {
        use super::*;

        #[test]
        fn unclaimed_and_owner_always_pass() {
            let f = fixture();
            let (owner, stranger) = (PlayerId::random(), PlayerId::random());

            assert!(f.manager.has_permission_at(stranger, &f.world, 0.0, 0.0, TrustLevel::Build));
            assert_eq!(f.manager.trust_level_at(stranger, &f.world, 0.0, 0.0), TrustLevel::Build);

            f.manager.claim_chunk(owner, &f.world, 0.0, 0.0, false);
            assert!(f.manager.has_permission_at(owner, &f.world, 0.0, 0.0, TrustLevel::Build));
            assert!(!f.manager.can_interact(stranger, &f.world, 0.0, 0.0));
            assert_eq!(f.manager.trust_level_at(stranger, &f.world, 0.0, 0.0), TrustLevel::None);
        }

        #[test]
        fn trust_levels_apply() {
            let f = fixture();
            let (owner, friend) = (PlayerId::random(), PlayerId::random());
            f.manager.claim_chunk(owner, &f.world, 0.0, 0.0, false);

            assert!(f.manager.add_trust(owner, friend, "Friend", TrustLevel::Container));

            assert!(f.manager.can_interact(friend, &f.world, 0.0, 0.0));
            assert!(f.manager.has_permission_at(friend, &f.world, 0.0, 0.0, TrustLevel::Container));
            assert!(!f.manager.has_permission_at(friend, &f.world, 0.0, 0.0, TrustLevel::Build));
            assert_eq!(
                f.manager.trust_level_at(friend, &f.world, 0.0, 0.0),
                TrustLevel::Container
            );
            assert_eq!(f.manager.store().get_name(friend), "Friend");
        }

        #[test]
        fn add_trust_refuses_none_and_self() {
            let f = fixture();
            let (owner, friend) = (PlayerId::random(), PlayerId::random());

            assert!(!f.manager.add_trust(owner, friend, "Friend", TrustLevel::None));
            assert!(!f.manager.add_trust(owner, owner, "Me", TrustLevel::Build));
            assert!(!f.manager.is_trusted(owner, friend));
        }

        #[test]
        fn remove_trust_returns_name() {
            let f = fixture();
            let (owner, friend) = (PlayerId::random(), PlayerId::random());
            f.manager.add_trust(owner, friend, "Friend", TrustLevel::Use);

            assert_eq!(f.manager.remove_trust(owner, friend), Some("Friend".to_string()));
            assert_eq!(f.manager.remove_trust(owner, friend), None);
            assert_eq!(f.manager.trust_level(owner, friend), TrustLevel::None);
        }
    }

    mod quota {
        use super::*;

        #[test]
        fn scenario_ten_then_fifteen() {
            let f = fixture();
            let p = PlayerId::random();
            f.playtime.set(p, 3.0);

            assert_eq!(f.manager.max_claims(p), 10);
            f.manager.add_bonus_claim_slots(p, 5);
            assert_eq!(f.manager.max_claims(p), 15);
        }

        #[test]
        fn unlimited_and_bonus_max() {
            let f = fixture();
            let p = PlayerId::random();

            f.manager.set_unlimited_claims(p, true);
            assert_eq!(f.manager.max_claims(p), u32::MAX);
            assert_eq!(f.manager.hours_until_next_claim(p), 0.0);

            assert_eq!(f.manager.add_bonus_max_claims(p, 3), 3);
            assert!(!f.manager.record(p).has_unlimited_claims());
            assert_eq!(f.manager.max_claims(p), 4);
        }

        #[test]
        fn hours_until_next() {
            let f = fixture();
            let p = PlayerId::random();

            assert_eq!(f.manager.hours_until_next_claim(p), 0.0);
            for x in 0..4 {
                f.manager.claim_chunk(p, &f.world, at(x * 3), at(0), false);
            }
            assert_eq!(f.manager.hours_until_next_claim(p), 0.5);
        }
    }

    mod admin {
        use super::*;

        #[test]
        fn admin_claim_controls_pvp_and_label() {
            let f = fixture();

            let result = f.manager.claim_admin_chunk(&f.world, 0.0, 0.0, Some("Spawn".into()), false);
            assert_eq!(result, ClaimResult::Success);
            assert_eq!(
                f.manager.owner_at(&f.world, 0.0, 0.0),
                Some(PlayerId::admin())
            );
            assert!(!f.manager.is_pvp_enabled_at(&f.world, 0.0, 0.0));
            assert_eq!(
                f.manager.display_name_at(&f.world, 0.0, 0.0).as_deref(),
                Some("Spawn")
            );
            assert_eq!(
                f.manager.claim_admin_chunk(&f.world, 1.0, 1.0, None, true),
                ClaimResult::AlreadyOwn
            );
        }

        #[test]
        fn admin_claim_respects_other_owners() {
            let f = fixture();
            let p = PlayerId::random();
            f.manager.claim_chunk(p, &f.world, 0.0, 0.0, false);

            assert_eq!(
                f.manager.claim_admin_chunk(&f.world, 0.0, 0.0, None, true),
                ClaimResult::ClaimedByOther
            );
        }

        #[test]
        fn pvp_follows_config_in_player_claims() {
            let mut config = ClaimsConfig::default();
            config.set_pvp_in_player_claims(false);
            let f = fixture_with(config);
            let p = PlayerId::random();

            assert!(f.manager.is_pvp_enabled_at(&f.world, 0.0, 0.0));
            f.manager.claim_chunk(p, &f.world, 0.0, 0.0, false);
            assert!(!f.manager.is_pvp_enabled_at(&f.world, 0.0, 0.0));
        }

        #[test]
        fn display_name_falls_back_to_owner() {
            let f = fixture();
            let p = PlayerId::random();
            f.manager.store().set_name(p, "Alex");
            f.manager.claim_chunk(p, &f.world, 0.0, 0.0, false);

            assert_eq!(
                f.manager.display_name_at(&f.world, 0.0, 0.0).as_deref(),
                Some("Alex")
            );
            assert_eq!(f.manager.display_name_at(&f.world, at(9), 0.0), None);
        }
    }

    #[test]
    fn group_info_through_manager() {
        let mut config = ClaimsConfig::default();
        config.set_claim_buffer_size(0);
        let f = fixture_with(config);
        let p = PlayerId::random();
        for x in 0..3 {
            for z in 0..2 {
                assert!(f.manager.claim_chunk(p, &f.world, at(x), at(z), true).is_success());
            }
        }

        let group = f.manager.claim_group_info(&f.world, ChunkPos::new(2, 1)).unwrap();
        assert_eq!(
            group,
            ClaimGroup {
                width: 3,
                height: 2,
                local_x: 2,
                local_z: 1
            }
        );
        assert!(f.manager.claim_group_info(&f.world, ChunkPos::new(9, 9)).is_none());
    }
}
