//! trust and untrust commands

use anyhow::{bail, Result};

use super::Session;
use crate::cli::Context;
use crate::core::trust::TrustLevel;
use crate::core::types::PlayerId;
use crate::ui::output;

/// Grant `player` a trust level in `owner`'s claims.
pub fn trust(ctx: &Context, owner: &str, player: &str, level: &str) -> Result<()> {
    let level = match TrustLevel::from_key(level) {
        Some(TrustLevel::None) => bail!("Use 'claimctl untrust' to remove trust"),
        Some(level) => level,
        None => bail!(
            "Unknown trust level '{}'; expected one of: {}",
            level,
            TrustLevel::grantable()
                .iter()
                .map(|l| l.key())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };

    let session = Session::open(ctx, 0.0)?;
    let owner_id = session.resolve_player(owner)?;
    let player_id = session.resolve_player(player)?;
    if owner_id == player_id {
        bail!("A player cannot trust themselves");
    }

    // A name argument is the freshest name we have for that player.
    let name = if player.parse::<PlayerId>().is_ok() {
        session.store().get_name(player_id)
    } else {
        player.to_string()
    };

    session.manager.add_trust(owner_id, player_id, &name, level);
    output::print(
        format!(
            "{} now has {} access in {}'s claims ({})",
            name,
            level,
            session.store().get_name(owner_id),
            level.description()
        ),
        ctx.verbosity,
    );

    session.close()
}

/// Revoke `player`'s trust in `owner`'s claims.
pub fn untrust(ctx: &Context, owner: &str, player: &str) -> Result<()> {
    let session = Session::open(ctx, 0.0)?;
    let owner_id = session.resolve_player(owner)?;
    let player_id = session.resolve_player(player)?;

    match session.manager.remove_trust(owner_id, player_id) {
        Some(name) => output::print(
            format!(
                "Removed {} from {}'s trusted players",
                name,
                session.store().get_name(owner_id)
            ),
            ctx.verbosity,
        ),
        None => output::warn(
            format!(
                "{} was not trusted by {}",
                player,
                session.store().get_name(owner_id)
            ),
            ctx.verbosity,
        ),
    }

    session.close()
}
