//! core::trust
//!
//! Trust levels an owner grants to other players inside their claims.
//!
//! Levels form a strict order; holding a level implies every level below it:
//!
//! ```text
//! NONE < USE < CONTAINER < WORKSTATION < DAMAGE < BUILD
//! ```
//!
//! Owners implicitly hold [`TrustLevel::Build`] in their own claims.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered permission tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    #[default]
    None,
    Use,
    Container,
    Workstation,
    Damage,
    Build,
}

impl TrustLevel {
    /// All levels in ascending order.
    pub const ALL: [TrustLevel; 6] = [
        TrustLevel::None,
        TrustLevel::Use,
        TrustLevel::Container,
        TrustLevel::Workstation,
        TrustLevel::Damage,
        TrustLevel::Build,
    ];

    /// Stable storage key.
    pub fn key(&self) -> &'static str {
        match self {
            TrustLevel::None => "none",
            TrustLevel::Use => "use",
            TrustLevel::Container => "container",
            TrustLevel::Workstation => "workstation",
            TrustLevel::Damage => "damage",
            TrustLevel::Build => "build",
        }
    }

    /// Parse a storage key, case-insensitively.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|level| level.key().eq_ignore_ascii_case(key))
    }

    /// Short human-readable description of what the level allows.
    pub fn description(&self) -> &'static str {
        match self {
            TrustLevel::None => "no access",
            TrustLevel::Use => "use doors, buttons and levers",
            TrustLevel::Container => "open chests and containers",
            TrustLevel::Workstation => "use crafting stations",
            TrustLevel::Damage => "damage blocks and entities",
            TrustLevel::Build => "place and break blocks",
        }
    }

    /// Levels an owner may grant (everything except NONE).
    pub fn grantable() -> &'static [TrustLevel] {
        &Self::ALL[1..]
    }

    /// Check whether this level satisfies `required`.
    pub fn has_permission(self, required: TrustLevel) -> bool {
        self >= required
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Free-function form of [`TrustLevel::has_permission`].
pub fn has_permission(actual: TrustLevel, required: TrustLevel) -> bool {
    actual.has_permission(required)
}
