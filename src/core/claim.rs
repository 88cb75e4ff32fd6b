//! core::claim
//!
//! Value types for a single owned chunk and a trusted player entry.
//!
//! A [`Claim`] does not know its owner: ownership is a property of the
//! [`PlayerClaims`](super::player_claims::PlayerClaims) record that holds it,
//! and uniqueness per cell is enforced by the store's spatial index.

use chrono::{DateTime, Utc};

use super::trust::TrustLevel;
use super::types::{ChunkPos, PlayerId, WorldName};

/// One owned cell plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub world: WorldName,
    pub pos: ChunkPos,
    pub claimed_at: DateTime<Utc>,
    /// Server-administered claim (owned by [`PlayerId::admin`]).
    pub admin: bool,
    /// Per-claim PvP switch. Only consulted for admin claims.
    pub pvp_enabled: bool,
    /// Optional label shown instead of the owner name.
    pub display_name: Option<String>,
}

impl Claim {
    /// A regular player claim stamped with the current time.
    pub fn new(world: WorldName, pos: ChunkPos) -> Self {
        Self::claimed_at(world, pos, now_millis())
    }

    /// A regular player claim with an explicit timestamp.
    pub fn claimed_at(world: WorldName, pos: ChunkPos, claimed_at: DateTime<Utc>) -> Self {
        Self {
            world,
            pos,
            claimed_at,
            admin: false,
            pvp_enabled: true,
            display_name: None,
        }
    }

    /// A server-administered claim.
    pub fn admin(
        world: WorldName,
        pos: ChunkPos,
        display_name: Option<String>,
        pvp_enabled: bool,
    ) -> Self {
        Self {
            admin: true,
            pvp_enabled,
            display_name: display_name.filter(|n| !n.trim().is_empty()),
            ..Self::new(world, pos)
        }
    }

    /// Check whether this claim covers the given cell.
    pub fn is_at(&self, world: &WorldName, pos: ChunkPos) -> bool {
        self.pos == pos && &self.world == world
    }
}

/// A player an owner has granted a trust level to.
///
/// Entries with [`TrustLevel::None`] are never stored; absence means NONE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedPlayer {
    pub id: PlayerId,
    pub name: String,
    pub level: TrustLevel,
}

impl TrustedPlayer {
    pub fn new(id: PlayerId, name: impl Into<String>, level: TrustLevel) -> Self {
        Self {
            id,
            name: name.into(),
            level,
        }
    }
}

/// Current time truncated to the millisecond precision of durable records.
pub(crate) fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
