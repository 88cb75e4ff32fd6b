//! Concurrency tests for the claim store and manager.
//!
//! Many threads race for the same cells; afterwards the index and the
//! per-player records must agree and every cell must have one owner.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use claimwork::core::claim::Claim;
use claimwork::core::config::ClaimsConfig;
use claimwork::core::playtime::FixedPlaytime;
use claimwork::core::types::{ChunkPos, PlayerId, WorldName, CHUNK_SIZE};
use claimwork::manager::{ClaimManager, ClaimResult};
use claimwork::store::{AddClaimOutcome, ClaimStore, MemoryClaimRepository, StoreError};

fn world() -> WorldName {
    WorldName::new("default").unwrap()
}

fn memory_store() -> Arc<ClaimStore> {
    Arc::new(ClaimStore::in_memory(Arc::new(MemoryClaimRepository::new())))
}

/// Every indexed cell is in its owner's record, and vice versa.
fn assert_consistent(store: &ClaimStore, owners: &[PlayerId]) {
    let indexed = store.claimed_cells_in_world(&world());
    let mut recorded: HashMap<ChunkPos, PlayerId> = HashMap::new();
    for owner in owners {
        for claim in store.record(*owner).claims() {
            let previous = recorded.insert(claim.pos, *owner);
            assert!(previous.is_none(), "cell {} recorded twice", claim.pos);
        }
    }
    assert_eq!(indexed, recorded);
}

#[test]
fn two_owners_race_for_one_cell() {
    for _ in 0..50 {
        let store = memory_store();
        let owners = [PlayerId::random(), PlayerId::random()];
        let barrier = Arc::new(Barrier::new(owners.len()));

        let handles: Vec<_> = owners
            .iter()
            .map(|&owner| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.add_claim(owner, Claim::new(world(), ChunkPos::new(0, 0)))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let added = results
            .iter()
            .filter(|r| matches!(r, Ok(AddClaimOutcome::Added)))
            .count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(StoreError::Conflict { .. })))
            .count();

        assert_eq!(added, 1);
        assert_eq!(conflicts, 1);
        assert_consistent(&store, &owners);
    }
}

#[test]
fn many_players_race_through_manager() {
    let mut config = ClaimsConfig::default();
    config.set_claim_buffer_size(0);
    let store = memory_store();
    let manager = Arc::new(ClaimManager::new(
        Arc::clone(&store),
        config,
        Arc::new(FixedPlaytime::uniform(100.0)),
    ));

    let players: Vec<PlayerId> = (0..8).map(|_| PlayerId::random()).collect();
    let barrier = Arc::new(Barrier::new(players.len()));

    let handles: Vec<_> = players
        .iter()
        .map(|&player| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut won = 0;
                for x in 0..6 {
                    for z in 0..6 {
                        let wx = f64::from(x * 32) + 1.0;
                        let wz = f64::from(z * 32) + 1.0;
                        match manager.claim_chunk(player, &world(), wx, wz, false) {
                            ClaimResult::Success => won += 1,
                            ClaimResult::ClaimedByOther | ClaimResult::AlreadyOwn => {}
                            other => panic!("unexpected result {:?}", other),
                        }
                    }
                }
                won
            })
        })
        .collect();

    let total: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(total, 36);
    assert_eq!(store.claimed_cell_count(), 36);
    assert_consistent(&store, &players);
}

#[test]
fn claims_and_unclaims_interleave() {
    let store = memory_store();
    let owners: Vec<PlayerId> = (0..4).map(|_| PlayerId::random()).collect();

    let handles: Vec<_> = owners
        .iter()
        .map(|&owner| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..100 {
                    let pos = ChunkPos::new(round % 5, 0);
                    if store.add_claim(owner, Claim::new(world(), pos)).is_ok() && round % 2 == 0 {
                        store.remove_claim(owner, &world(), pos);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_consistent(&store, &owners);
}

#[test]
fn same_owner_add_races_remove_all() {
    let store = memory_store();
    let owner = PlayerId::random();
    let done = Arc::new(AtomicBool::new(false));

    let adder = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for x in 0..20_000 {
                store
                    .add_claim(owner, Claim::new(world(), ChunkPos::new(x, 0)))
                    .unwrap();
            }
            done.store(true, Ordering::SeqCst);
        })
    };
    let remover = {
        let store = Arc::clone(&store);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::SeqCst) {
                store.remove_all_claims(owner);
            }
        })
    };

    adder.join().unwrap();
    remover.join().unwrap();
    assert_consistent(&store, &[owner]);

    let left = store.record(owner).claim_count();
    assert_eq!(store.remove_all_claims(owner), left);
    assert_eq!(store.claimed_cell_count(), 0);
}

#[test]
fn same_owner_add_races_remove_one() {
    let store = memory_store();
    let owner = PlayerId::random();
    let barrier = Arc::new(Barrier::new(2));

    let adder = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for round in 0..5_000 {
                let _ = store.add_claim(owner, Claim::new(world(), ChunkPos::new(round % 4, 0)));
            }
        })
    };
    let remover = {
        let store = Arc::clone(&store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            for round in 0..5_000 {
                store.remove_claim(owner, &world(), ChunkPos::new(round % 4, 0));
            }
        })
    };

    adder.join().unwrap();
    remover.join().unwrap();
    assert_consistent(&store, &[owner]);
}

#[test]
fn quota_holds_when_one_player_claims_in_parallel() {
    let mut config = ClaimsConfig::default();
    config.set_claim_buffer_size(0);
    let store = memory_store();
    let manager = Arc::new(ClaimManager::new(
        Arc::clone(&store),
        config,
        Arc::new(FixedPlaytime::new()),
    ));
    let player = PlayerId::random();
    let quota = manager.max_claims(player) as usize;
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8i32)
        .map(|t| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..4i32)
                    .filter(|&i| {
                        let wx = f64::from((t * 4 + i) * CHUNK_SIZE) + 1.0;
                        manager.claim_chunk(player, &world(), wx, 1.0, false).is_success()
                    })
                    .count()
            })
        })
        .collect();

    let won: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(won, quota);
    assert_eq!(store.record(player).claim_count(), quota);
    assert_consistent(&store, &[player]);
}

#[test]
fn flush_runs_alongside_writers() {
    let store = memory_store();
    let owner = PlayerId::random();

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for x in 0..200 {
                store
                    .add_claim(owner, Claim::new(world(), ChunkPos::new(x, 0)))
                    .unwrap();
            }
        })
    };
    let flusher = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for _ in 0..50 {
                assert!(store.flush().is_clean());
            }
        })
    };

    writer.join().unwrap();
    flusher.join().unwrap();
    store.flush();

    assert!(!store.has_pending_writes());
    assert_eq!(store.record(owner).claim_count(), 200);
}
