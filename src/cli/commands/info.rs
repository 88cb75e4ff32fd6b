//! info command - Show a player's claims, trust list, bonuses and quota

use anyhow::Result;

use super::Session;
use crate::cli::Context;
use crate::ui::output::{self, Verbosity};

/// Show everything stored for one player.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `player` - UUID or known name
/// * `hours` - Playtime to assume for the quota figures
pub fn info(ctx: &Context, player: &str, hours: f64) -> Result<()> {
    let session = Session::open(ctx, hours)?;
    let id = session.resolve_player(player)?;
    let manager = &session.manager;
    let record = manager.record(id);
    let verbosity = ctx.verbosity;

    println!("Player: {} ({})", session.store().get_name(id), id);

    let mut claims = record.claims();
    claims.sort_by(|a, b| (&a.world, a.pos).cmp(&(&b.world, b.pos)));
    println!("Claims: {}", claims.len());
    let lines: Vec<String> = claims
        .iter()
        .map(|claim| {
            let mut line = format!(
                "{} {} since {}",
                claim.world,
                claim.pos,
                claim.claimed_at.format("%Y-%m-%d %H:%M")
            );
            if claim.admin {
                line.push_str(" (admin)");
            }
            line
        })
        .collect();
    if !lines.is_empty() {
        output::print(output::format_list(&lines, "  "), verbosity);
    }

    let trusted = record.trusted_players();
    println!("Trusted: {}", trusted.len());
    let lines: Vec<String> = trusted
        .iter()
        .map(|t| format!("{} ({}) - {}", t.name, t.id, t.level))
        .collect();
    if !lines.is_empty() {
        output::print(output::format_list(&lines, "  "), verbosity);
    }

    println!("Bonus claim slots: {}", record.bonus_claim_slots());
    println!("Bonus max claims: {}", record.bonus_max_claims());
    println!(
        "Unlimited: {}",
        if record.has_unlimited_claims() { "yes" } else { "no" }
    );

    if verbosity != Verbosity::Quiet {
        println!(
            "Quota at {}h: {}",
            hours,
            output::format_quota(manager.max_claims(id))
        );
        println!(
            "Next claim: {}",
            output::format_wait(manager.hours_until_next_claim(id))
        );
    }

    session.close()
}
