//! config command - Print the resolved configuration
//!
//! Does not open the store, so it works while another process holds the
//! data directory lock.

use anyhow::{Context as _, Result};

use super::load_config;
use crate::cli::Context;

/// Print the resolved configuration as TOML.
pub fn config(ctx: &Context) -> Result<()> {
    let paths = ctx.paths()?;
    let config = load_config(ctx, &paths)?;

    println!("# data directory: {}", paths.data_dir().display());
    let rendered =
        toml::to_string_pretty(&config.to_file()).context("Failed to render configuration")?;
    print!("{}", rendered);

    Ok(())
}
