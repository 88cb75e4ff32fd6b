//! store::schema
//!
//! Durable JSON shapes for owner records, the spatial index, and the name
//! cache.
//!
//! # Record Versions
//!
//! Records have been written in three shapes over time. They differ only in
//! how the trusted-player map is stored:
//!
//! | version | key | shape | level |
//! |---|---|---|---|
//! | 1 | `trustedPlayers` | `[uuid, ...]` | BUILD |
//! | 2 | `trustedPlayersWithNames` | `{uuid: name}` | BUILD |
//! | 3 | `trustedPlayersData` | `{uuid: {name, level}}` | stored |
//!
//! Files carry no reliable version tag before v3, so the shape is detected
//! from the keys present. When several are present the newest wins. Legacy
//! shapes never leave this module: [`decode_record`] always yields the
//! current in-memory [`PlayerClaims`].
//!
//! # Leniency
//!
//! Individual malformed claims and trusted entries are skipped and reported
//! back as [`RecordError`]s so the caller can log them. Only a top-level
//! parse failure rejects the whole document.
//!
//! # Example
//!
//! ```
//! use claimwork::core::types::PlayerId;
//! use claimwork::store::schema::decode_record;
//!
//! let owner = PlayerId::random();
//! let json = r#"{
//!     "claims": [{"world": "default", "chunkX": 1, "chunkZ": -2, "claimedAt": 1700000000000}],
//!     "trustedPlayers": ["6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11"]
//! }"#;
//!
//! let decoded = decode_record(owner, json).unwrap();
//! assert_eq!(decoded.record.claim_count(), 1);
//! assert_eq!(decoded.record.trusted_count(), 1);
//! assert!(decoded.migrated);
//! ```

use std::collections::{BTreeMap, HashMap};

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::claim::Claim;
use crate::core::player_claims::PlayerClaims;
use crate::core::trust::TrustLevel;
use crate::core::types::{ChunkPos, PlayerId, WorldName};

/// Current record schema version.
pub const RECORD_SCHEMA_VERSION: u32 = 3;

/// Decode failures for durable documents or individual entries.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("unsupported record schema version {0}, supported: {RECORD_SCHEMA_VERSION}")]
    UnsupportedVersion(u32),

    #[error("skipping claim #{index}: {reason}")]
    InvalidClaim { index: usize, reason: String },

    #[error("skipping trusted player '{key}': {reason}")]
    InvalidTrusted { key: String, reason: String },

    #[error("skipping index entry '{world}/{key}': {reason}")]
    InvalidIndexEntry {
        world: String,
        key: String,
        reason: String,
    },

    #[error("skipping name entry '{key}': {reason}")]
    InvalidName { key: String, reason: String },
}

// =============================================================================
// Owner records
// =============================================================================

/// A claim as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEntry {
    pub world: String,
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// Epoch milliseconds.
    pub claimed_at: i64,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_admin_claim: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvp_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A trusted player as stored on disk (v3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedEntry {
    pub name: String,
    pub level: String,
}

/// The current (v3) record shape. This is what gets written.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFile {
    pub schema_version: u32,
    pub claims: Vec<ClaimEntry>,
    pub trusted_players_data: BTreeMap<String, TrustedEntry>,
    pub bonus_claim_slots: u32,
    pub bonus_max_claims: u32,
    pub unlimited_claims: bool,
}

impl RecordFile {
    /// Snapshot a live record into its durable form.
    pub fn from_record(record: &PlayerClaims) -> Self {
        let claims = record.claims().iter().map(ClaimEntry::from_claim).collect();
        let trusted_players_data = record
            .trusted_players()
            .into_iter()
            .map(|t| {
                (
                    t.id.to_string(),
                    TrustedEntry {
                        name: t.name,
                        level: t.level.key().to_string(),
                    },
                )
            })
            .collect();

        Self {
            schema_version: RECORD_SCHEMA_VERSION,
            claims,
            trusted_players_data,
            bonus_claim_slots: record.bonus_claim_slots(),
            bonus_max_claims: record.bonus_max_claims(),
            unlimited_claims: record.has_unlimited_claims(),
        }
    }
}

impl ClaimEntry {
    pub fn from_claim(claim: &Claim) -> Self {
        Self {
            world: claim.world.to_string(),
            chunk_x: claim.pos.x,
            chunk_z: claim.pos.z,
            claimed_at: claim.claimed_at.timestamp_millis(),
            is_admin_claim: claim.admin,
            pvp_enabled: claim.admin.then_some(claim.pvp_enabled),
            display_name: claim.display_name.clone(),
        }
    }

    /// Validate and convert into a live claim.
    pub fn into_claim(self) -> Result<Claim, String> {
        let world = WorldName::new(self.world).map_err(|e| e.to_string())?;
        let claimed_at = DateTime::from_timestamp_millis(self.claimed_at)
            .ok_or_else(|| format!("timestamp {} out of range", self.claimed_at))?;
        let pos = ChunkPos::new(self.chunk_x, self.chunk_z);

        let mut claim = Claim::claimed_at(world, pos, claimed_at);
        claim.admin = self.is_admin_claim;
        claim.pvp_enabled = self.pvp_enabled.unwrap_or(true);
        claim.display_name = self.display_name.filter(|n| !n.trim().is_empty());
        Ok(claim)
    }
}

/// Loose top-level shape accepted on read.
///
/// Entries are kept as raw JSON so one bad entry cannot fail the document.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawRecord {
    schema_version: Option<u32>,
    claims: Vec<Value>,
    trusted_players: Option<Vec<Value>>,
    trusted_players_with_names: Option<Map<String, Value>>,
    trusted_players_data: Option<Map<String, Value>>,
    bonus_claim_slots: u32,
    bonus_max_claims: u32,
    unlimited_claims: bool,
}

/// The trusted-player map in whichever historical shape it was found.
#[derive(Debug)]
enum TrustedShape {
    IdList(Vec<Value>),
    WithNames(Map<String, Value>),
    Data(Map<String, Value>),
}

impl RawRecord {
    fn take_trusted(&mut self) -> Option<TrustedShape> {
        if let Some(data) = self.trusted_players_data.take() {
            return Some(TrustedShape::Data(data));
        }
        if let Some(names) = self.trusted_players_with_names.take() {
            return Some(TrustedShape::WithNames(names));
        }
        self.trusted_players.take().map(TrustedShape::IdList)
    }
}

/// A decoded record plus everything that was skipped on the way.
#[derive(Debug)]
pub struct DecodedRecord {
    pub record: PlayerClaims,
    /// Entries dropped during decoding.
    pub skipped: Vec<RecordError>,
    /// The document was not in the current shape and should be rewritten.
    pub migrated: bool,
}

/// Decode an owner record from any supported shape.
///
/// # Errors
///
/// Returns [`RecordError::Parse`] if the document is not a JSON object of
/// the expected form, or [`RecordError::UnsupportedVersion`] for records
/// written by a newer schema.
pub fn decode_record(owner: PlayerId, json: &str) -> Result<DecodedRecord, RecordError> {
    let mut raw: RawRecord =
        serde_json::from_str(json).map_err(|e| RecordError::Parse(e.to_string()))?;

    if let Some(v) = raw.schema_version {
        if v > RECORD_SCHEMA_VERSION {
            return Err(RecordError::UnsupportedVersion(v));
        }
    }

    let record = PlayerClaims::new(owner);
    let mut skipped = Vec::new();
    let mut migrated = raw.schema_version != Some(RECORD_SCHEMA_VERSION);

    for (index, value) in std::mem::take(&mut raw.claims).into_iter().enumerate() {
        let claim = serde_json::from_value::<ClaimEntry>(value)
            .map_err(|e| e.to_string())
            .and_then(ClaimEntry::into_claim);
        match claim {
            Ok(claim) => {
                if !record.add_claim(claim) {
                    migrated = true;
                }
            }
            Err(reason) => skipped.push(RecordError::InvalidClaim { index, reason }),
        }
    }

    match raw.take_trusted() {
        Some(TrustedShape::Data(data)) => {
            for (key, value) in data {
                match decode_trusted_data(&key, value) {
                    Ok((id, entry)) => {
                        let level = TrustLevel::from_key(&entry.level).unwrap_or(TrustLevel::Build);
                        record.add_trusted_player(id, entry.name, level);
                    }
                    Err(reason) => skipped.push(RecordError::InvalidTrusted { key, reason }),
                }
            }
        }
        Some(TrustedShape::WithNames(names)) => {
            migrated = true;
            for (key, value) in names {
                let entry = key
                    .parse::<PlayerId>()
                    .map_err(|e| e.to_string())
                    .and_then(|id| match value {
                        Value::String(name) => Ok((id, name)),
                        other => Err(format!("expected a name, found {}", other)),
                    });
                match entry {
                    Ok((id, name)) => record.add_trusted_player(id, name, TrustLevel::Build),
                    Err(reason) => skipped.push(RecordError::InvalidTrusted { key, reason }),
                }
            }
        }
        Some(TrustedShape::IdList(ids)) => {
            migrated = true;
            for value in ids {
                let key = match &value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                match key.parse::<PlayerId>() {
                    Ok(id) => record.add_trusted_player(id, id.short(), TrustLevel::Build),
                    Err(e) => skipped.push(RecordError::InvalidTrusted {
                        key,
                        reason: e.to_string(),
                    }),
                }
            }
        }
        None => {}
    }

    record.set_bonus_claim_slots(raw.bonus_claim_slots);
    record.set_bonus_max_claims(raw.bonus_max_claims);
    record.set_unlimited_claims(raw.unlimited_claims);

    Ok(DecodedRecord {
        record,
        skipped,
        migrated,
    })
}

fn decode_trusted_data(key: &str, value: Value) -> Result<(PlayerId, TrustedEntry), String> {
    let id = key.parse::<PlayerId>().map_err(|e| e.to_string())?;
    let entry = serde_json::from_value::<TrustedEntry>(value).map_err(|e| e.to_string())?;
    Ok((id, entry))
}

/// Serialize a live record in the current shape.
pub fn encode_record(record: &PlayerClaims) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RecordFile::from_record(record))
}

// =============================================================================
// Spatial index
// =============================================================================

/// On-disk index: world -> chunk key -> owner id.
pub type IndexFile = BTreeMap<String, BTreeMap<String, String>>;

/// One decoded index entry.
pub type IndexEntry = (WorldName, ChunkPos, PlayerId);

/// Decode the index document, skipping malformed entries individually.
pub fn decode_index(json: &str) -> Result<(Vec<IndexEntry>, Vec<RecordError>), RecordError> {
    let raw: BTreeMap<String, Map<String, Value>> =
        serde_json::from_str(json).map_err(|e| RecordError::Parse(e.to_string()))?;

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (world_key, cells) in raw {
        let world = match WorldName::new(world_key.clone()) {
            Ok(world) => world,
            Err(e) => {
                skipped.push(RecordError::InvalidIndexEntry {
                    world: world_key,
                    key: "*".to_string(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        for (key, value) in cells {
            let entry = ChunkPos::parse_key(&key)
                .map_err(|e| e.to_string())
                .and_then(|pos| match &value {
                    Value::String(s) => s
                        .parse::<PlayerId>()
                        .map(|owner| (pos, owner))
                        .map_err(|e| e.to_string()),
                    other => Err(format!("expected an owner id, found {}", other)),
                });
            match entry {
                Ok((pos, owner)) => entries.push((world.clone(), pos, owner)),
                Err(reason) => skipped.push(RecordError::InvalidIndexEntry {
                    world: world_key.clone(),
                    key,
                    reason,
                }),
            }
        }
    }

    Ok((entries, skipped))
}

/// Serialize index entries in the on-disk shape.
pub fn encode_index<'a>(
    entries: impl IntoIterator<Item = (&'a WorldName, ChunkPos, PlayerId)>,
) -> Result<String, serde_json::Error> {
    let mut file = IndexFile::new();
    for (world, pos, owner) in entries {
        file.entry(world.to_string())
            .or_default()
            .insert(pos.key(), owner.to_string());
    }
    serde_json::to_string_pretty(&file)
}

// =============================================================================
// Name cache
// =============================================================================

/// Decode the name cache, skipping malformed entries individually.
pub fn decode_names(
    json: &str,
) -> Result<(HashMap<PlayerId, String>, Vec<RecordError>), RecordError> {
    let raw: Map<String, Value> =
        serde_json::from_str(json).map_err(|e| RecordError::Parse(e.to_string()))?;

    let mut names = HashMap::new();
    let mut skipped = Vec::new();

    for (key, value) in raw {
        let entry = key
            .parse::<PlayerId>()
            .map_err(|e| e.to_string())
            .and_then(|id| match value {
                Value::String(name) => Ok((id, name)),
                other => Err(format!("expected a name, found {}", other)),
            });
        match entry {
            Ok((id, name)) => {
                names.insert(id, name);
            }
            Err(reason) => skipped.push(RecordError::InvalidName { key, reason }),
        }
    }

    Ok((names, skipped))
}

/// Serialize the name cache with stable key order.
pub fn encode_names(names: &HashMap<PlayerId, String>) -> Result<String, serde_json::Error> {
    let file: BTreeMap<String, &String> = names
        .iter()
        .map(|(id, name)| (id.to_string(), name))
        .collect();
    serde_json::to_string_pretty(&file)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: &str = "6f1c2f4e-8a51-4a43-9d5e-6f1b0f6e2c11";
    const BOB: &str = "0b7e7c1a-2d3f-4c5e-8f90-a1b2c3d4e5f6";

    fn id(s: &str) -> PlayerId {
        s.parse().unwrap()
    }

    fn world() -> WorldName {
        WorldName::new("default").unwrap()
    }

    mod records {
        use super::*;

        #[test]
        fn current_shape_decodes_without_migration() {
            let json = format!(
                r#"{{
                    "schemaVersion": 3,
                    "claims": [
                        {{"world": "default", "chunkX": 1, "chunkZ": 2, "claimedAt": 1700000000000}},
                        {{"world": "default", "chunkX": 0, "chunkZ": 0, "claimedAt": 1700000000001,
                          "isAdminClaim": true, "pvpEnabled": false, "displayName": "Spawn"}}
                    ],
                    "trustedPlayersData": {{"{ALICE}": {{"name": "Alice", "level": "container"}}}},
                    "bonusClaimSlots": 3,
                    "bonusMaxClaims": 7,
                    "unlimitedClaims": true
                }}"#
            );

            let decoded = decode_record(PlayerId::random(), &json).unwrap();
            let record = decoded.record;

            assert!(!decoded.migrated);
            assert!(decoded.skipped.is_empty());
            assert_eq!(record.claim_count(), 2);
            let admin = record.find_claim(&world(), ChunkPos::new(0, 0)).unwrap();
            assert!(admin.admin);
            assert!(!admin.pvp_enabled);
            assert_eq!(admin.display_name.as_deref(), Some("Spawn"));
            assert_eq!(record.trust_level(id(ALICE)), TrustLevel::Container);
            assert_eq!(record.bonus_claim_slots(), 3);
            assert_eq!(record.bonus_max_claims(), 7);
            assert!(record.has_unlimited_claims());
        }

        #[test]
        fn id_list_implies_build() {
            let json = format!(r#"{{"claims": [], "trustedPlayers": ["{ALICE}"]}}"#);
            let decoded = decode_record(PlayerId::random(), &json).unwrap();

            assert!(decoded.migrated);
            let trusted = decoded.record.trusted_player(id(ALICE)).unwrap();
            assert_eq!(trusted.level, TrustLevel::Build);
            assert_eq!(trusted.name, "6f1c2f4e");
        }

        #[test]
        fn name_map_implies_build() {
            let json = format!(r#"{{"trustedPlayersWithNames": {{"{BOB}": "Bob"}}}}"#);
            let decoded = decode_record(PlayerId::random(), &json).unwrap();

            let trusted = decoded.record.trusted_player(id(BOB)).unwrap();
            assert_eq!(trusted.name, "Bob");
            assert_eq!(trusted.level, TrustLevel::Build);
        }

        #[test]
        fn newest_trusted_shape_wins() {
            let json = format!(
                r#"{{
                    "trustedPlayers": ["{BOB}"],
                    "trustedPlayersWithNames": {{"{BOB}": "Bob"}},
                    "trustedPlayersData": {{"{ALICE}": {{"name": "Alice", "level": "use"}}}}
                }}"#
            );
            let record = decode_record(PlayerId::random(), &json).unwrap().record;

            assert_eq!(record.trusted_count(), 1);
            assert_eq!(record.trust_level(id(ALICE)), TrustLevel::Use);
            assert_eq!(record.trust_level(id(BOB)), TrustLevel::None);
        }

        #[test]
        fn unknown_level_defaults_to_build() {
            let json = format!(
                r#"{{"schemaVersion": 3, "trustedPlayersData": {{"{ALICE}": {{"name": "Alice", "level": "owner"}}}}}}"#
            );
            let record = decode_record(PlayerId::random(), &json).unwrap().record;
            assert_eq!(record.trust_level(id(ALICE)), TrustLevel::Build);
        }

        #[test]
        fn malformed_entries_skipped_individually() {
            let json = format!(
                r#"{{
                    "schemaVersion": 3,
                    "claims": [
                        {{"world": "default", "chunkX": 1, "chunkZ": 1, "claimedAt": 0}},
                        {{"world": "", "chunkX": 2, "chunkZ": 2, "claimedAt": 0}},
                        {{"world": "default", "chunkX": "three"}},
                        42
                    ],
                    "trustedPlayersData": {{
                        "not-a-uuid": {{"name": "X", "level": "build"}},
                        "{ALICE}": {{"name": "Alice", "level": "build"}},
                        "{BOB}": "Bob"
                    }}
                }}"#
            );

            let decoded = decode_record(PlayerId::random(), &json).unwrap();

            assert_eq!(decoded.record.claim_count(), 1);
            assert_eq!(decoded.record.trusted_count(), 1);
            assert_eq!(decoded.skipped.len(), 5);
        }

        #[test]
        fn duplicate_claims_collapse() {
            let json = r#"{
                "schemaVersion": 3,
                "claims": [
                    {"world": "default", "chunkX": 1, "chunkZ": 1, "claimedAt": 0},
                    {"world": "default", "chunkX": 1, "chunkZ": 1, "claimedAt": 5}
                ]
            }"#;
            let decoded = decode_record(PlayerId::random(), json).unwrap();
            assert_eq!(decoded.record.claim_count(), 1);
            assert!(decoded.migrated);
        }

        #[test]
        fn garbage_rejected_whole() {
            assert!(matches!(
                decode_record(PlayerId::random(), "{ not json"),
                Err(RecordError::Parse(_))
            ));
            assert!(decode_record(PlayerId::random(), "[1, 2]").is_err());
        }

        #[test]
        fn future_version_rejected() {
            let result = decode_record(PlayerId::random(), r#"{"schemaVersion": 9}"#);
            assert!(matches!(result, Err(RecordError::UnsupportedVersion(9))));
        }

        #[test]
        fn encoded_record_uses_current_shape() {
            let record = PlayerClaims::new(PlayerId::random());
            record.add_claim(Claim::new(world(), ChunkPos::new(-1, 4)));
            record.add_trusted_player(id(ALICE), "Alice", TrustLevel::Damage);
            record.set_bonus_claim_slots(2);

            let json = encode_record(&record).unwrap();
            let value: Value = serde_json::from_str(&json).unwrap();

            assert_eq!(value["schemaVersion"], 3);
            assert_eq!(value["claims"][0]["chunkX"], -1);
            assert!(value["claims"][0].get("isAdminClaim").is_none());
            assert_eq!(value["trustedPlayersData"][ALICE]["level"], "damage");
            assert_eq!(value["bonusClaimSlots"], 2);
            assert!(value.get("trustedPlayers").is_none());

            let decoded = decode_record(record.owner(), &json).unwrap();
            assert!(!decoded.migrated);
            assert_eq!(decoded.record.claims(), record.claims());
        }
    }

    mod index {
        use super::*;

        #[test]
        fn decode_skips_bad_entries() {
            let json = format!(
                r#"{{
                    "default": {{"1,2": "{ALICE}", "nope": "{ALICE}", "3,4": "bad-id"}},
                    "nether": {{"-5,0": "{BOB}"}}
                }}"#
            );

            let (entries, skipped) = decode_index(&json).unwrap();

            assert_eq!(entries.len(), 2);
            assert_eq!(skipped.len(), 2);
            assert!(entries.contains(&(world(), ChunkPos::new(1, 2), id(ALICE))));
        }

        #[test]
        fn encode_groups_by_world() {
            let default = world();
            let nether = WorldName::new("nether").unwrap();
            let json = encode_index(vec![
                (&default, ChunkPos::new(0, 0), id(ALICE)),
                (&nether, ChunkPos::new(1, -1), id(BOB)),
            ])
            .unwrap();

            let file: IndexFile = serde_json::from_str(&json).unwrap();
            assert_eq!(file["default"]["0,0"], ALICE);
            assert_eq!(file["nether"]["1,-1"], BOB);
        }
    }

    mod names {
        use super::*;

        #[test]
        fn decode_skips_bad_entries() {
            let json = format!(r#"{{"{ALICE}": "Alice", "junk": "X", "{BOB}": 7}}"#);
            let (names, skipped) = decode_names(&json).unwrap();

            assert_eq!(names.len(), 1);
            assert_eq!(names[&id(ALICE)], "Alice");
            assert_eq!(skipped.len(), 2);
        }

        #[test]
        fn encode_then_decode() {
            let mut names = HashMap::new();
            names.insert(id(BOB), "Bob".to_string());
            let json = encode_names(&names).unwrap();
            let (decoded, skipped) = decode_names(&json).unwrap();
            assert_eq!(decoded, names);
            assert!(skipped.is_empty());
        }
    }
}
