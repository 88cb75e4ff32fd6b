//! Integration tests for the claim manager.
//!
//! Each scenario runs the manager over a file-backed store and, where it
//! matters, reopens the data directory to check what was persisted.

use std::sync::Arc;

use tempfile::TempDir;

use claimwork::core::config::ClaimsConfig;
use claimwork::core::paths::ClaimPaths;
use claimwork::core::playtime::FixedPlaytime;
use claimwork::core::trust::TrustLevel;
use claimwork::core::types::{ChunkPos, PlayerId, WorldName, CHUNK_SIZE};
use claimwork::manager::{ClaimGroup, ClaimManager, ClaimResult};
use claimwork::store::{ClaimStore, StoreOptions};

// =============================================================================
// Test Helpers
// =============================================================================

struct Server {
    dir: TempDir,
    config: ClaimsConfig,
    playtime: Arc<FixedPlaytime>,
    manager: ClaimManager,
}

impl Server {
    fn start(config: ClaimsConfig) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let playtime = Arc::new(FixedPlaytime::new());
        let manager = Self::manager_for(&dir, &config, &playtime);
        Self {
            dir,
            config,
            playtime,
            manager,
        }
    }

    fn manager_for(dir: &TempDir, config: &ClaimsConfig, playtime: &Arc<FixedPlaytime>) -> ClaimManager {
        let store = ClaimStore::open(&ClaimPaths::new(dir.path()), StoreOptions::offline())
            .expect("open store");
        ClaimManager::new(Arc::new(store), config.clone(), playtime.clone())
    }

    /// Shut the store down and open the data directory again.
    fn restart(self) -> Self {
        self.manager.store().shutdown();
        let manager = Self::manager_for(&self.dir, &self.config, &self.playtime);
        Self { manager, ..self }
    }
}

fn world() -> WorldName {
    WorldName::new("default").unwrap()
}

/// World-space centre of a chunk.
fn at(chunk: i32) -> f64 {
    f64::from(chunk * CHUNK_SIZE) + 0.5
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn claim_trust_and_reopen() {
    let server = Server::start(ClaimsConfig::default());
    let (owner, friend, stranger) = (PlayerId::random(), PlayerId::random(), PlayerId::random());
    let w = world();

    assert_eq!(
        server.manager.claim_chunk(owner, &w, 10.0, 10.0, false),
        ClaimResult::Success
    );
    assert!(server.manager.add_trust(owner, friend, "Friend", TrustLevel::Workstation));

    let server = server.restart();
    let m = &server.manager;

    assert_eq!(m.owner_at(&w, 10.0, 10.0), Some(owner));
    assert!(m.has_permission_at(friend, &w, 10.0, 10.0, TrustLevel::Workstation));
    assert!(!m.has_permission_at(friend, &w, 10.0, 10.0, TrustLevel::Damage));
    assert!(!m.can_interact(stranger, &w, 10.0, 10.0));
    assert_eq!(m.store().find_player_by_name("FRIEND"), Some(friend));
}

#[test]
fn quota_grows_with_playtime_and_bonuses() {
    let mut config = ClaimsConfig::default();
    config.set_claim_buffer_size(0);
    let server = Server::start(config);
    let p = PlayerId::random();
    let w = world();

    for x in 0..4 {
        assert!(server.manager.claim_chunk(p, &w, at(x), 0.0, false).is_success());
    }
    assert_eq!(
        server.manager.claim_chunk(p, &w, at(4), 0.0, false),
        ClaimResult::LimitReached
    );
    assert_eq!(server.manager.hours_until_next_claim(p), 0.5);

    server.playtime.set(p, 0.5);
    assert_eq!(server.manager.hours_until_next_claim(p), 0.0);
    assert!(server.manager.claim_chunk(p, &w, at(4), 0.0, false).is_success());

    server.manager.add_bonus_claim_slots(p, 2);
    let server = server.restart();
    assert_eq!(server.manager.record(p).bonus_claim_slots(), 2);
    assert_eq!(server.manager.max_claims(p), 7);
    assert!(server.manager.claim_chunk(p, &w, at(5), 0.0, false).is_success());
    assert!(server.manager.claim_chunk(p, &w, at(6), 0.0, false).is_success());
    assert_eq!(
        server.manager.claim_chunk(p, &w, at(7), 0.0, false),
        ClaimResult::LimitReached
    );
}

#[test]
fn cap_is_hard_without_bonus_slots() {
    let mut config = ClaimsConfig::default();
    config.set_max_claims(5);
    let server = Server::start(config);
    let p = PlayerId::random();
    server.playtime.set(p, 1000.0);

    assert_eq!(server.manager.max_claims(p), 5);
    assert_eq!(server.manager.add_bonus_max_claims(p, 5), 5);
    assert_eq!(server.manager.max_claims(p), 10);
}

#[test]
fn buffer_zone_blocks_neighbours_only() {
    let server = Server::start(ClaimsConfig::default());
    let (a, b) = (PlayerId::random(), PlayerId::random());
    let w = world();
    let other_world = WorldName::new("nether").unwrap();

    assert!(server.manager.claim_chunk(a, &w, at(0), at(0), false).is_success());
    assert_eq!(
        server.manager.claim_chunk(b, &w, at(-2), at(2), false),
        ClaimResult::TooCloseToOtherClaim
    );
    assert!(server.manager.claim_chunk(b, &w, at(-3), at(0), false).is_success());
    assert!(server
        .manager
        .claim_chunk(b, &other_world, at(1), at(0), false)
        .is_success());
}

#[test]
fn unclaim_all_then_reopen() {
    let server = Server::start(ClaimsConfig::default());
    let p = PlayerId::random();
    let w = world();
    for x in 0..3 {
        server.manager.claim_chunk(p, &w, at(x), 0.0, false);
    }

    assert_eq!(server.manager.unclaim_all(p), 3);
    let server = server.restart();

    assert_eq!(server.manager.record(p).claim_count(), 0);
    assert_eq!(server.manager.store().claimed_cell_count(), 0);
    assert_eq!(server.manager.owner_at(&w, at(1), 0.0), None);
}

#[test]
fn admin_claims_persist_their_settings() {
    let mut config = ClaimsConfig::default();
    config.set_pvp_in_player_claims(false);
    let server = Server::start(config);
    let w = world();

    assert!(server
        .manager
        .claim_admin_chunk(&w, at(0), at(0), Some("Arena".to_string()), true)
        .is_success());

    let server = server.restart();
    let m = &server.manager;
    assert!(m.is_pvp_enabled_at(&w, at(0), at(0)));
    assert_eq!(m.display_name_at(&w, at(0), at(0)).as_deref(), Some("Arena"));

    let p = PlayerId::random();
    assert!(m.claim_chunk(p, &w, at(10), at(10), false).is_success());
    assert!(!m.is_pvp_enabled_at(&w, at(10), at(10)));
}

#[test]
fn grouping_sees_persisted_blocks() {
    let mut config = ClaimsConfig::default();
    config.set_claim_buffer_size(0);
    let server = Server::start(config);
    let p = PlayerId::random();
    let w = world();
    for x in 0..2 {
        for z in 0..2 {
            server.manager.claim_chunk(p, &w, at(x), at(z), true);
        }
    }

    let server = server.restart();
    assert_eq!(
        server.manager.claim_group_info(&w, ChunkPos::new(1, 0)),
        Some(ClaimGroup {
            width: 2,
            height: 2,
            local_x: 1,
            local_z: 0
        })
    );
}
