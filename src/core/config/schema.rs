//! core::config::schema
//!
//! On-disk configuration schema.
//!
//! # Location
//!
//! Resolved (in order of precedence):
//! 1. `$CLAIMWORK_CONFIG` if set and the file exists
//! 2. `<data_dir>/config.toml` (canonical write location)
//!
//! # Legacy Keys
//!
//! Older deployments used per-chunk naming. These keys are still accepted and
//! migrated on load:
//!
//! | legacy | current |
//! |---|---|
//! | `starting_chunks` | `starting_claims` |
//! | `chunks_per_hour` | `claims_per_hour` |
//! | `max_claims_per_player` | `max_claims` |
//! | `allow_player_pvp_toggle` | `pvp_in_player_claims` (inverted) |
//!
//! # Validation
//!
//! Values are validated after parsing and migration. Counts are kept signed
//! here so that a negative value is reported as an invalid value rather than
//! an opaque parse error.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Configuration file contents.
///
/// Every field is optional; missing fields take the defaults from
/// [`ClaimsConfig`](super::ClaimsConfig).
///
/// # Example
///
/// ```toml
/// starting_claims = 4
/// claims_per_hour = 2.0
/// max_claims = 50
/// claim_buffer_size = 2
/// pvp_in_player_claims = true
/// flush_interval_secs = 30
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimsConfigFile {
    /// Claims every player starts with
    pub starting_claims: Option<i64>,

    /// Claims earned per hour of playtime
    pub claims_per_hour: Option<f64>,

    /// Server-wide cap on playtime-earned claims
    pub max_claims: Option<i64>,

    /// Minimum chunk distance to another player's claims (0 disables)
    pub claim_buffer_size: Option<i64>,

    /// Whether PvP is allowed inside player claims
    pub pvp_in_player_claims: Option<bool>,

    /// Seconds between background flushes
    pub flush_interval_secs: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_chunks: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_per_hour: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_claims_per_player: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_player_pvp_toggle: Option<bool>,
}

impl ClaimsConfigFile {
    /// Move legacy keys onto their current names.
    ///
    /// A legacy key only fills its current counterpart when that one is
    /// unset. Returns one message per legacy key encountered; legacy fields
    /// are cleared either way.
    pub fn migrate_legacy(&mut self) -> Vec<String> {
        let mut notes = Vec::new();

        if let Some(v) = self.starting_chunks.take() {
            self.starting_claims.get_or_insert(v);
            notes.push(renamed("starting_chunks", "starting_claims"));
        }
        if let Some(v) = self.chunks_per_hour.take() {
            self.claims_per_hour.get_or_insert(v);
            notes.push(renamed("chunks_per_hour", "claims_per_hour"));
        }
        if let Some(v) = self.max_claims_per_player.take() {
            self.max_claims.get_or_insert(v);
            notes.push(renamed("max_claims_per_player", "max_claims"));
        }
        if let Some(v) = self.allow_player_pvp_toggle.take() {
            self.pvp_in_player_claims.get_or_insert(!v);
            notes.push(
                "'allow_player_pvp_toggle' is deprecated; use 'pvp_in_player_claims' (inverted)"
                    .to_string(),
            );
        }

        notes
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("starting_claims", self.starting_claims)?;
        non_negative("claim_buffer_size", self.claim_buffer_size)?;

        if let Some(rate) = self.claims_per_hour {
            if !rate.is_finite() || rate < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "claims_per_hour must be a non-negative number, got {}",
                    rate
                )));
            }
        }

        at_least_one("max_claims", self.max_claims)?;
        at_least_one("flush_interval_secs", self.flush_interval_secs)?;

        for (key, value) in [
            ("starting_claims", self.starting_claims),
            ("max_claims", self.max_claims),
            ("claim_buffer_size", self.claim_buffer_size),
        ] {
            if let Some(v) = value {
                if v > i64::from(u32::MAX) {
                    return Err(ConfigError::InvalidValue(format!(
                        "{} is too large: {}",
                        key, v
                    )));
                }
            }
        }

        Ok(())
    }
}

fn renamed(old: &str, new: &str) -> String {
    format!("'{}' is deprecated; use '{}'", old, new)
}

fn non_negative(key: &str, value: Option<i64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if v < 0 => Err(ConfigError::InvalidValue(format!(
            "{} must not be negative, got {}",
            key, v
        ))),
        _ => Ok(()),
    }
}

fn at_least_one(key: &str, value: Option<i64>) -> Result<(), ConfigError> {
    match value {
        Some(v) if v < 1 => Err(ConfigError::InvalidValue(format!(
            "{} must be at least 1, got {}",
            key, v
        ))),
        _ => Ok(()),
    }
}
