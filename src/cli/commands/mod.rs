//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens a [`Session`] on the data directory (lock held)
//! 2. Resolves player arguments by UUID or known name
//! 3. Reads or changes claim data through the manager
//! 4. Closes the session, which writes everything back
//!
//! A handler that fails before closing still releases the lock, because the
//! store shuts itself down on drop.

mod config_cmd;
mod grant;
mod info;
mod lookup;
mod maintenance;
mod trust;

pub use config_cmd::config;
pub use grant::{grant_max, grant_slots};
pub use info::info;
pub use lookup::{area, owner};
pub use maintenance::{rebuild_index, unclaim_all};
pub use trust::{trust, untrust};

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing::debug;

use crate::cli::args::{Command, GrantAction};
use crate::cli::Context;
use crate::core::config::ClaimsConfig;
use crate::core::paths::ClaimPaths;
use crate::core::playtime::FixedPlaytime;
use crate::core::types::{PlayerId, WorldName};
use crate::manager::ClaimManager;
use crate::store::{ClaimStore, StoreOptions};
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Info { player, hours } => info::info(ctx, &player, hours),
        Command::Owner { world, x, z } => lookup::owner(ctx, &world, x, z),
        Command::Area {
            world,
            min_x,
            max_x,
            min_z,
            max_z,
        } => lookup::area(ctx, &world, min_x, max_x, min_z, max_z),
        Command::Grant { action } => match action {
            GrantAction::Slots { player, amount } => grant::grant_slots(ctx, &player, amount),
            GrantAction::Max { player, amount } => grant::grant_max(ctx, &player, amount),
        },
        Command::Trust {
            owner,
            player,
            level,
        } => trust::trust(ctx, &owner, &player, &level),
        Command::Untrust { owner, player } => trust::untrust(ctx, &owner, &player),
        Command::UnclaimAll { player } => maintenance::unclaim_all(ctx, &player),
        Command::RebuildIndex => maintenance::rebuild_index(ctx),
        Command::Config => config_cmd::config(ctx),
    }
}

/// An open data directory: resolved config, locked store, and manager.
pub(crate) struct Session {
    pub paths: ClaimPaths,
    pub manager: ClaimManager,
}

impl Session {
    /// Open the data directory with every player's playtime fixed at `hours`.
    pub(crate) fn open(ctx: &Context, hours: f64) -> Result<Self> {
        let paths = ctx.paths()?;
        let config = load_config(ctx, &paths)?;

        let store = ClaimStore::open(&paths, StoreOptions::offline()).with_context(|| {
            format!("Failed to open claim data in {}", paths.data_dir().display())
        })?;
        debug!(data_dir = %paths.data_dir().display(), "session opened");

        let manager = ClaimManager::new(
            Arc::new(store),
            config,
            Arc::new(FixedPlaytime::uniform(hours)),
        );
        Ok(Self { paths, manager })
    }

    pub(crate) fn store(&self) -> &ClaimStore {
        self.manager.store()
    }

    /// Resolve a player argument: a UUID, or a name from the name cache.
    pub(crate) fn resolve_player(&self, input: &str) -> Result<PlayerId> {
        if let Ok(id) = input.parse::<PlayerId>() {
            return Ok(id);
        }
        match self.store().find_player_by_name(input) {
            Some(id) => Ok(id),
            None => bail!("Unknown player '{}': not a UUID and not a known name", input),
        }
    }

    /// Write everything back and release the lock.
    pub(crate) fn close(self) -> Result<()> {
        let report = self.store().shutdown();
        if !report.is_clean() {
            bail!(
                "{} write(s) to {} failed; claim data may be stale",
                report.failures,
                self.paths.claims_dir().display()
            );
        }
        Ok(())
    }
}

/// Load the config for a data directory, surfacing migration warnings.
pub(crate) fn load_config(ctx: &Context, paths: &ClaimPaths) -> Result<ClaimsConfig> {
    let loaded = ClaimsConfig::load(paths).context("Failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            ctx.verbosity,
        );
    }
    Ok(loaded.config)
}

pub(crate) fn parse_world(world: &str) -> Result<WorldName> {
    WorldName::new(world).with_context(|| format!("Invalid world name '{}'", world))
}
