//! manager::quota
//!
//! Playtime-scaled claim quota.
//!
//! ```text
//! earned  = floor(hours * claims_per_hour)
//! capped  = min(starting + earned, server_max + bonus_max)
//! quota   = capped + bonus_slots
//! ```
//!
//! Bonus slots are added after the cap and can never be capped away; bonus
//! max-claims widens the cap itself. `unlimited` overrides everything.
//!
//! [`hours_until_next_claim`] is derived from the same quota, so "a claim is
//! available now" and "zero hours to wait" always agree.

use crate::core::config::ClaimsConfig;
use crate::core::player_claims::PlayerClaims;

/// Everything the quota depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaInputs {
    pub hours_played: f64,
    pub starting_claims: u32,
    pub claims_per_hour: f64,
    pub server_max_claims: u32,
    pub bonus_claim_slots: u32,
    pub bonus_max_claims: u32,
    pub unlimited: bool,
}

impl QuotaInputs {
    pub fn new(config: &ClaimsConfig, record: &PlayerClaims, hours_played: f64) -> Self {
        Self {
            hours_played,
            starting_claims: config.starting_claims(),
            claims_per_hour: config.claims_per_hour(),
            server_max_claims: config.max_claims(),
            bonus_claim_slots: record.bonus_claim_slots(),
            bonus_max_claims: record.bonus_max_claims(),
            unlimited: record.has_unlimited_claims(),
        }
    }

    fn cap(&self) -> u32 {
        self.server_max_claims.saturating_add(self.bonus_max_claims)
    }

    fn earned(&self) -> u32 {
        let earned = (self.hours_played.max(0.0) * self.claims_per_hour.max(0.0)).floor();
        if earned.is_finite() {
            // Float-to-int casts saturate.
            earned as u32
        } else {
            u32::MAX
        }
    }
}

/// Maximum number of claims the player may hold right now.
pub fn max_claims(inputs: &QuotaInputs) -> u32 {
    if inputs.unlimited {
        return u32::MAX;
    }
    let base = inputs.starting_claims.saturating_add(inputs.earned());
    base.min(inputs.cap())
        .saturating_add(inputs.bonus_claim_slots)
}

/// Hours of play until the next claim becomes available.
///
/// - `0.0` if a claim is available now (or the player is unlimited)
/// - `-1.0` if playtime can never raise the quota further (at the cap, or
///   the rate is zero)
pub fn hours_until_next_claim(inputs: &QuotaInputs, claim_count: usize) -> f64 {
    if inputs.unlimited {
        return 0.0;
    }

    let count = u64::try_from(claim_count).unwrap_or(u64::MAX);
    let ceiling = u64::from(inputs.cap()) + u64::from(inputs.bonus_claim_slots);
    if count >= ceiling {
        return -1.0;
    }

    let allotment = u64::from(inputs.starting_claims) + u64::from(inputs.bonus_claim_slots);
    if count < allotment {
        return 0.0;
    }
    if inputs.claims_per_hour <= 0.0 {
        return -1.0;
    }

    let used_beyond_start = (count - allotment) as f64;
    let needed = (used_beyond_start + 1.0) / inputs.claims_per_hour;
    (needed - inputs.hours_played).max(0.0)
}
