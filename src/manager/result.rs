//! manager::result
//!
//! Outcome of a claim attempt.

use std::fmt;

/// Every possible outcome of [`ClaimManager::claim_chunk`](super::ClaimManager::claim_chunk).
///
/// Contested and refused claims are ordinary outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimResult {
    Success,
    /// The candidate already owns the chunk.
    AlreadyOwn,
    /// Someone else owns the chunk.
    ClaimedByOther,
    /// The candidate is at or over their quota.
    LimitReached,
    /// Another owner has a claim within the buffer radius.
    TooCloseToOtherClaim,
}

impl ClaimResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Stable machine-readable key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::AlreadyOwn => "already_own",
            Self::ClaimedByOther => "claimed_by_other",
            Self::LimitReached => "limit_reached",
            Self::TooCloseToOtherClaim => "too_close_to_other_claim",
        }
    }
}

impl fmt::Display for ClaimResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::Success => "chunk claimed",
            Self::AlreadyOwn => "you already own this chunk",
            Self::ClaimedByOther => "this chunk is claimed by another player",
            Self::LimitReached => "claim limit reached",
            Self::TooCloseToOtherClaim => "too close to another player's claim",
        };
        f.write_str(message)
    }
}
