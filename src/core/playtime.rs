//! core::playtime
//!
//! Injected playtime source used for playtime-scaled quotas.
//!
//! Playtime accounting lives outside this crate; the claim manager only asks
//! how many hours a player has played in total, including any session still
//! in progress.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::types::PlayerId;

/// Source of total hours played per player.
///
/// Implementations must be thread-safe and cheap to call; the manager
/// queries this on every claim attempt.
pub trait PlaytimeSource: Send + Sync {
    /// Total hours played, including the current session.
    fn total_hours(&self, player: PlayerId) -> f64;
}

/// Map-backed playtime source.
///
/// Unknown players have played zero hours. Used by the maintenance binary
/// and by tests.
#[derive(Debug, Default)]
pub struct FixedPlaytime {
    hours: RwLock<HashMap<PlayerId, f64>>,
    default_hours: f64,
}

impl FixedPlaytime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source reporting the same hours for every player.
    pub fn uniform(hours: f64) -> Self {
        Self {
            hours: RwLock::new(HashMap::new()),
            default_hours: sanitize(hours),
        }
    }

    /// Set a player's total hours.
    pub fn set(&self, player: PlayerId, hours: f64) {
        self.hours
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(player, sanitize(hours));
    }
}

impl PlaytimeSource for FixedPlaytime {
    fn total_hours(&self, player: PlayerId) -> f64 {
        self.hours
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&player)
            .copied()
            .unwrap_or(self.default_hours)
    }
}

fn sanitize(hours: f64) -> f64 {
    if hours.is_finite() {
        hours.max(0.0)
    } else {
        0.0
    }
}
