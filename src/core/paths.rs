//! core::paths
//!
//! Centralized path routing for claim storage locations.
//!
//! **Hard rule:** no code outside this module joins storage file names onto
//! the data directory. Everything goes through [`ClaimPaths`].
//!
//! # Storage Layout
//!
//! ```text
//! <data_dir>/
//!   config.toml          claim rules (read-only to the core)
//!   claims/
//!     .lock              exclusive data-dir lock
//!     index.json         world -> {"x,z": owner}
//!     names.json         owner -> display name
//!     <player-uuid>.json per-owner record
//! ```
//!
//! # Example
//!
//! ```
//! use claimwork::core::paths::ClaimPaths;
//! use std::path::PathBuf;
//!
//! let paths = ClaimPaths::new("/srv/game/claims-data");
//! assert_eq!(
//!     paths.index_path(),
//!     PathBuf::from("/srv/game/claims-data/claims/index.json")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::PlayerId;

/// Environment variable overriding the default data directory.
pub const DATA_DIR_ENV: &str = "CLAIMWORK_DATA_DIR";

/// Centralized path routing for claim storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimPaths {
    data_dir: PathBuf,
}

impl ClaimPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolve the default data directory.
    ///
    /// Uses `$CLAIMWORK_DATA_DIR` if set, otherwise `~/.claimwork`.
    /// Returns `None` if neither is available.
    pub fn default_location() -> Option<Self> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Some(Self::new(dir));
            }
        }
        dirs::home_dir().map(|home| Self::new(home.join(".claimwork")))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `<data_dir>/config.toml`
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    /// `<data_dir>/claims/`
    pub fn claims_dir(&self) -> PathBuf {
        self.data_dir.join("claims")
    }

    /// `<data_dir>/claims/index.json`
    pub fn index_path(&self) -> PathBuf {
        self.claims_dir().join("index.json")
    }

    /// `<data_dir>/claims/names.json`
    pub fn names_path(&self) -> PathBuf {
        self.claims_dir().join("names.json")
    }

    /// `<data_dir>/claims/.lock`
    pub fn lock_path(&self) -> PathBuf {
        self.claims_dir().join(".lock")
    }

    /// `<data_dir>/claims/.clean`, present only between a clean shutdown and
    /// the next open.
    pub fn clean_marker_path(&self) -> PathBuf {
        self.claims_dir().join(".clean")
    }

    /// `<data_dir>/claims/<player-uuid>.json`
    pub fn record_path(&self, owner: PlayerId) -> PathBuf {
        self.claims_dir().join(format!("{}.json", owner))
    }

    /// Parse the owner id out of a record file path.
    ///
    /// Returns `None` for the index, names, markers, temp files, and anything
    /// whose stem is not a player id.
    pub fn record_owner(path: &Path) -> Option<PlayerId> {
        if path.extension()? != "json" {
            return None;
        }
        path.file_stem()?.to_str()?.parse().ok()
    }

    /// Create the claims directory if needed.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.claims_dir())
    }
}
