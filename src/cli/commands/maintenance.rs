//! unclaim-all and rebuild-index commands

use anyhow::{Context as _, Result};

use super::Session;
use crate::cli::Context;
use crate::ui::output;

/// Release every claim of a player.
pub fn unclaim_all(ctx: &Context, player: &str) -> Result<()> {
    let session = Session::open(ctx, 0.0)?;
    let id = session.resolve_player(player)?;

    let count = session.manager.unclaim_all(id);
    output::print(
        format!(
            "Released {} claim(s) of {}",
            count,
            session.store().get_name(id)
        ),
        ctx.verbosity,
    );

    session.close()
}

/// Rebuild the spatial index from every record file.
pub fn rebuild_index(ctx: &Context) -> Result<()> {
    let session = Session::open(ctx, 0.0)?;

    let report = session
        .store()
        .rebuild_index()
        .context("Failed to rebuild the claim index")?;
    output::print(
        format!(
            "Rebuilt index: {} record(s), {} claimed chunk(s)",
            report.records, report.cells
        ),
        ctx.verbosity,
    );
    if report.conflicts > 0 {
        output::warn(
            format!(
                "{} overlapping claim(s) dropped; the earliest claim kept each chunk",
                report.conflicts
            ),
            ctx.verbosity,
        );
    }

    session.close()
}
