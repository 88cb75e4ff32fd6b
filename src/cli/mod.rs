//! cli
//!
//! Command-line interface layer for `claimctl`.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Resolve the data directory and configuration
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Every command opens a [`ClaimStore`](crate::store::ClaimStore)
//! without a background flush thread, goes through the
//! [`ClaimManager`](crate::manager::ClaimManager) for rule-bearing changes,
//! and shuts the store down before returning so all changes are on disk.

pub mod args;
pub mod commands;

pub use args::Cli;

use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::core::paths::ClaimPaths;
use crate::ui::output::Verbosity;

/// Execution context shared by command handlers.
#[derive(Debug, Clone)]
pub struct Context {
    /// Data directory override.
    pub data_dir: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
}

impl Context {
    /// Resolve storage paths from the override or the default location.
    pub fn paths(&self) -> Result<ClaimPaths> {
        match &self.data_dir {
            Some(dir) => Ok(ClaimPaths::new(dir)),
            None => ClaimPaths::default_location().ok_or_else(|| {
                anyhow!("cannot determine a data directory; pass --data-dir or set CLAIMWORK_DATA_DIR")
            }),
        }
    }
}

/// Run the CLI application with already-parsed arguments.
///
/// Logging is installed by `main.rs` before this is called.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        data_dir: cli.data_dir.clone(),
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}
