//! core::config
//!
//! Claim rule configuration and loading.
//!
//! # Overview
//!
//! The claim core consumes a handful of tunables (starting allotment,
//! playtime rate, server cap, buffer radius, PvP default, flush interval).
//! They are read once at startup; the core never reloads them by itself.
//!
//! # Precedence
//!
//! 1. Default values
//! 2. Config file (`$CLAIMWORK_CONFIG`, else `<data_dir>/config.toml`)
//!
//! # Example
//!
//! ```no_run
//! use claimwork::core::config::ClaimsConfig;
//! use claimwork::core::paths::ClaimPaths;
//!
//! let paths = ClaimPaths::new("/srv/game/claims-data");
//! let result = ClaimsConfig::load(&paths).unwrap();
//! for warning in &result.warnings {
//!     eprintln!("warning: {}", warning.message);
//! }
//! println!("buffer radius: {}", result.config.claim_buffer_size());
//! ```

pub mod schema;

pub use schema::ClaimsConfigFile;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::ClaimPaths;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV: &str = "CLAIMWORK_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The resolved configuration.
    pub config: ClaimsConfig,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
    /// The file the values came from, if any.
    pub loaded_from: Option<PathBuf>,
}

/// Resolved claim rules.
///
/// Setters clamp into range instead of failing; file values are validated
/// strictly on load.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimsConfig {
    starting_claims: u32,
    claims_per_hour: f64,
    max_claims: u32,
    claim_buffer_size: u32,
    pvp_in_player_claims: bool,
    flush_interval_secs: u64,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            starting_claims: 4,
            claims_per_hour: 2.0,
            max_claims: 50,
            claim_buffer_size: 2,
            pvp_in_player_claims: true,
            flush_interval_secs: 30,
        }
    }
}

impl ClaimsConfig {
    /// Load configuration for a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed,
    /// or validated. A missing file is not an error (defaults are used).
    pub fn load(paths: &ClaimPaths) -> Result<ConfigLoadResult, ConfigError> {
        let env_override = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        Self::load_with(paths, env_override)
    }

    fn load_with(
        paths: &ClaimPaths,
        env_override: Option<PathBuf>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        // 1. Check $CLAIMWORK_CONFIG
        if let Some(path) = env_override {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        // 2. Check <data_dir>/config.toml
        let path = paths.config_path();
        if path.exists() {
            return Self::load_from(&path);
        }

        Ok(ConfigLoadResult {
            config: Self::default(),
            warnings: Vec::new(),
            loaded_from: None,
        })
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> Result<ConfigLoadResult, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut file: ClaimsConfigFile =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let warnings = file
            .migrate_legacy()
            .into_iter()
            .map(|message| ConfigWarning {
                message,
                path: path.to_path_buf(),
            })
            .collect();

        file.validate()?;

        Ok(ConfigLoadResult {
            config: Self::from_file(&file),
            warnings,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Apply a validated file on top of the defaults.
    pub fn from_file(file: &ClaimsConfigFile) -> Self {
        let mut config = Self::default();
        if let Some(v) = file.starting_claims {
            config.set_starting_claims(clamp_u32(v));
        }
        if let Some(v) = file.claims_per_hour {
            config.set_claims_per_hour(v);
        }
        if let Some(v) = file.max_claims {
            config.set_max_claims(clamp_u32(v));
        }
        if let Some(v) = file.claim_buffer_size {
            config.set_claim_buffer_size(clamp_u32(v));
        }
        if let Some(v) = file.pvp_in_player_claims {
            config.set_pvp_in_player_claims(v);
        }
        if let Some(v) = file.flush_interval_secs {
            config.set_flush_interval_secs(u64::try_from(v).unwrap_or(1));
        }
        config
    }

    /// The file form of this configuration, with every key written out.
    pub fn to_file(&self) -> ClaimsConfigFile {
        ClaimsConfigFile {
            starting_claims: Some(i64::from(self.starting_claims)),
            claims_per_hour: Some(self.claims_per_hour),
            max_claims: Some(i64::from(self.max_claims)),
            claim_buffer_size: Some(i64::from(self.claim_buffer_size)),
            pvp_in_player_claims: Some(self.pvp_in_player_claims),
            flush_interval_secs: Some(i64::try_from(self.flush_interval_secs).unwrap_or(i64::MAX)),
            ..Default::default()
        }
    }

    /// Write configuration atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents = toml::to_string_pretty(&self.to_file())
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn starting_claims(&self) -> u32 {
        self.starting_claims
    }

    pub fn claims_per_hour(&self) -> f64 {
        self.claims_per_hour
    }

    /// Server-wide cap on playtime-earned claims.
    pub fn max_claims(&self) -> u32 {
        self.max_claims
    }

    /// Buffer radius in chunks. Zero disables buffer enforcement.
    pub fn claim_buffer_size(&self) -> u32 {
        self.claim_buffer_size
    }

    pub fn pvp_in_player_claims(&self) -> bool {
        self.pvp_in_player_claims
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn set_starting_claims(&mut self, value: u32) {
        self.starting_claims = value;
    }

    /// Negative and non-finite rates become zero.
    pub fn set_claims_per_hour(&mut self, value: f64) {
        self.claims_per_hour = if value.is_finite() { value.max(0.0) } else { 0.0 };
    }

    pub fn set_max_claims(&mut self, value: u32) {
        self.max_claims = value.max(1);
    }

    pub fn set_claim_buffer_size(&mut self, value: u32) {
        self.claim_buffer_size = value;
    }

    pub fn set_pvp_in_player_claims(&mut self, value: bool) {
        self.pvp_in_player_claims = value;
    }

    pub fn set_flush_interval_secs(&mut self, value: u64) {
        self.flush_interval_secs = value.max(1);
    }
}

fn clamp_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
