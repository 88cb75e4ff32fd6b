//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`PlayerId`] - Stable, string-serializable player identity
//! - [`WorldName`] - Validated world (spatial namespace) name
//! - [`ChunkPos`] - Chunk coordinates within a world
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so malformed durable entries are rejected at the
//! load boundary instead of leaking into the index.
//!
//! # Examples
//!
//! ```
//! use claimwork::core::types::{ChunkPos, PlayerId, WorldName};
//!
//! let world = WorldName::new("overworld").unwrap();
//! let pos = ChunkPos::from_world(-1.0, 65.5);
//! assert_eq!(pos, ChunkPos::new(-1, 2));
//! assert_eq!(pos.key(), "-1,2");
//!
//! let id: PlayerId = "6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11".parse().unwrap();
//! assert_eq!(id.short(), "6f1c2f4e");
//!
//! assert!(WorldName::new("").is_err());
//! assert!(ChunkPos::parse_key("12;4").is_err());
//! # let _ = world;
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Edge length of a chunk, in world units.
pub const CHUNK_SIZE: i32 = 32;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid player id: {0}")]
    InvalidPlayerId(String),

    #[error("invalid world name: {0}")]
    InvalidWorldName(String),

    #[error("invalid chunk key: {0}")]
    InvalidChunkKey(String),
}

/// An opaque, globally unique player identifier.
///
/// Serialized as the hyphenated UUID string, which is also the file stem of
/// the player's durable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The reserved owner of server-administered claims.
    pub fn admin() -> Self {
        Self(Uuid::nil())
    }

    /// Check whether this is the reserved admin owner.
    pub fn is_admin(&self) -> bool {
        self.0.is_nil()
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Abbreviated form used when no display name is known.
    pub fn short(&self) -> String {
        let mut s = self.0.hyphenated().to_string();
        s.truncate(8);
        s
    }
}

impl FromStr for PlayerId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| TypeError::InvalidPlayerId(s.to_string()))
    }
}

impl TryFrom<String> for PlayerId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.to_string()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// A validated world name.
///
/// Worlds are parallel spatial namespaces: equal chunk coordinates in two
/// worlds are unrelated cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorldName(String);

impl WorldName {
    /// Create a new validated world name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidWorldName` if the name is empty, blank, or
    /// contains control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TypeError::InvalidWorldName(
                "world name cannot be empty".into(),
            ));
        }
        if name.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidWorldName(
                "world name cannot contain control characters".into(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the world name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for WorldName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<WorldName> for String {
    fn from(name: WorldName) -> Self {
        name.0
    }
}

impl AsRef<str> for WorldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chunk coordinates within a single world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Convert a world-space position into the chunk containing it.
    ///
    /// Uses floor division, so `-0.5` lands in chunk `-1`.
    pub fn from_world(world_x: f64, world_z: f64) -> Self {
        Self::new(to_chunk_coord(world_x), to_chunk_coord(world_z))
    }

    /// Canonical `"x,z"` key used by the durable index.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.z)
    }

    /// Parse a canonical chunk key.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidChunkKey` unless the input is two
    /// comma-separated integers.
    pub fn parse_key(key: &str) -> Result<Self, TypeError> {
        let (x, z) = key
            .split_once(',')
            .ok_or_else(|| TypeError::InvalidChunkKey(key.to_string()))?;
        let x = x
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidChunkKey(key.to_string()))?;
        let z = z
            .trim()
            .parse()
            .map_err(|_| TypeError::InvalidChunkKey(key.to_string()))?;
        Ok(Self::new(x, z))
    }

    /// The chunk displaced by `(dx, dz)`, saturating at the coordinate limits.
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.z.saturating_add(dz))
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// Convert one world-space coordinate into a chunk coordinate.
pub fn to_chunk_coord(world: f64) -> i32 {
    let block = world.floor() as i64;
    block.div_euclid(CHUNK_SIZE as i64) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    mod player_id {
        use super::*;

        #[test]
        fn parse_and_display_roundtrip() {
            let s = "6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11";
            let id: PlayerId = s.parse().unwrap();
            assert_eq!(id.to_string(), s);
        }

        #[test]
        fn parse_trims_whitespace() {
            let id: PlayerId = " 6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11\n".parse().unwrap();
            assert_eq!(id.short(), "6f1c2f4e");
        }

        #[test]
        fn invalid_rejected() {
            assert!("not-a-uuid".parse::<PlayerId>().is_err());
            assert!("".parse::<PlayerId>().is_err());
        }

        #[test]
        fn admin_is_reserved() {
            assert!(PlayerId::admin().is_admin());
            assert!(!PlayerId::random().is_admin());
        }

        #[test]
        fn serde_as_string() {
            let id: PlayerId = "6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11".parse().unwrap();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11\"");
            let back: PlayerId = serde_json::from_str(&json).unwrap();
            assert_eq!(back, id);
        }
    }

    mod world_name {
        use super::*;

        #[test]
        fn valid_names() {
            assert!(WorldName::new("default").is_ok());
            assert!(WorldName::new("Orbis Prime").is_ok());
        }

        #[test]
        fn empty_and_blank_rejected() {
            assert!(WorldName::new("").is_err());
            assert!(WorldName::new("   ").is_err());
        }

        #[test]
        fn control_chars_rejected() {
            assert!(WorldName::new("a\nb").is_err());
        }
    }

    mod chunk_pos {
        use super::*;

        #[test]
        fn floor_division_for_negatives() {
            assert_eq!(to_chunk_coord(0.0), 0);
            assert_eq!(to_chunk_coord(31.9), 0);
            assert_eq!(to_chunk_coord(32.0), 1);
            assert_eq!(to_chunk_coord(-0.1), -1);
            assert_eq!(to_chunk_coord(-32.0), -1);
            assert_eq!(to_chunk_coord(-32.5), -2);
        }

        #[test]
        fn key_roundtrip() {
            let pos = ChunkPos::new(-7, 12);
            assert_eq!(pos.key(), "-7,12");
            assert_eq!(ChunkPos::parse_key("-7,12").unwrap(), pos);
        }

        #[test]
        fn malformed_keys_rejected() {
            assert!(ChunkPos::parse_key("1").is_err());
            assert!(ChunkPos::parse_key("a,b").is_err());
            assert!(ChunkPos::parse_key("1,2,3").is_err());
        }

        #[test]
        fn offset_saturates() {
            let pos = ChunkPos::new(i32::MAX, 0);
            assert_eq!(pos.offset(1, -1), ChunkPos::new(i32::MAX, -1));
        }
    }
}
