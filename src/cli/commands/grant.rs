//! grant command - Bonus claim slots and cap raises

use anyhow::Result;

use super::Session;
use crate::cli::args::MaxGrant;
use crate::cli::Context;
use crate::ui::output;

/// Add claim slots on top of the player's cap.
pub fn grant_slots(ctx: &Context, player: &str, amount: u32) -> Result<()> {
    let session = Session::open(ctx, 0.0)?;
    let id = session.resolve_player(player)?;

    let total = session.manager.add_bonus_claim_slots(id, amount);
    output::print(
        format!(
            "Granted {} claim slot(s) to {}; bonus slots now {}",
            amount,
            session.store().get_name(id),
            total
        ),
        ctx.verbosity,
    );

    session.close()
}

/// Raise the player's cap by `amount`, or lift it entirely.
pub fn grant_max(ctx: &Context, player: &str, amount: MaxGrant) -> Result<()> {
    let session = Session::open(ctx, 0.0)?;
    let id = session.resolve_player(player)?;
    let name = session.store().get_name(id);

    let message = match amount {
        MaxGrant::Unlimited => {
            session.manager.set_unlimited_claims(id, true);
            format!("{} now has unlimited claims", name)
        }
        MaxGrant::Amount(n) => {
            let total = session.manager.add_bonus_max_claims(id, n);
            format!("Raised {}'s cap by {}; bonus max claims now {}", name, n, total)
        }
    };
    output::print(message, ctx.verbosity);

    session.close()
}
