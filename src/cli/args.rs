//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--data-dir <path>`: Data directory (default `$CLAIMWORK_DATA_DIR` or `~/.claimwork`)
//! - `--log <filter>`: Tracing filter directive (default `warn`)
//! - `--debug`: Shorthand for `--log debug`
//! - `--quiet` / `-q`: Minimal output

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

/// claimctl - offline maintenance for chunk claim data
#[derive(Parser, Debug)]
#[command(name = "claimctl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding config.toml and claims/
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Tracing filter directive, e.g. "info" or "claimwork=debug"
    #[arg(long, global = true, value_name = "FILTER")]
    pub log: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// The tracing filter to install when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> String {
        match (&self.log, self.debug) {
            (Some(filter), _) => filter.clone(),
            (None, true) => "debug".to_string(),
            (None, false) => "warn".to_string(),
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show a player's claims, trust list, bonuses and quota
    #[command(after_help = "\
EXAMPLES:
    claimctl info Alex
    claimctl info 1b4e28ba-2fa1-11d2-883f-0016d3cca427 --hours 12.5")]
    Info {
        /// Player UUID or known name
        player: String,

        /// Hours played, used for the quota figures
        #[arg(long, default_value_t = 0.0)]
        hours: f64,
    },

    /// Show the owner of a chunk
    Owner {
        world: String,
        /// Chunk x coordinate
        #[arg(allow_negative_numbers = true)]
        x: i32,
        /// Chunk z coordinate
        #[arg(allow_negative_numbers = true)]
        z: i32,
    },

    /// List claimed chunks in an inclusive rectangle
    Area {
        world: String,
        #[arg(allow_negative_numbers = true)]
        min_x: i32,
        #[arg(allow_negative_numbers = true)]
        max_x: i32,
        #[arg(allow_negative_numbers = true)]
        min_z: i32,
        #[arg(allow_negative_numbers = true)]
        max_z: i32,
    },

    /// Grant bonus claims
    Grant {
        #[command(subcommand)]
        action: GrantAction,
    },

    /// Trust a player in an owner's claims
    #[command(after_help = "\
LEVELS:
    use, container, workstation, damage, build (default)")]
    Trust {
        /// Claim owner (UUID or known name)
        owner: String,
        /// Player to trust (UUID or known name)
        player: String,
        /// Trust level
        #[arg(default_value = "build")]
        level: String,
    },

    /// Revoke a player's trust in an owner's claims
    Untrust {
        /// Claim owner (UUID or known name)
        owner: String,
        /// Player to revoke (UUID or known name)
        player: String,
    },

    /// Release every claim of a player
    #[command(name = "unclaim-all")]
    UnclaimAll {
        /// Player UUID or known name
        player: String,
    },

    /// Rebuild the spatial index from the per-player records
    #[command(name = "rebuild-index")]
    RebuildIndex,

    /// Print the resolved configuration
    Config,
}

/// Bonus grant variants.
#[derive(Subcommand, Debug)]
pub enum GrantAction {
    /// Extra claim slots added on top of the cap
    Slots {
        player: String,
        amount: u32,
    },

    /// Raise the player's cap, or make it unlimited
    Max {
        player: String,
        /// A number, or "unlimited"
        amount: MaxGrant,
    },
}

/// Argument of `grant max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxGrant {
    Amount(u32),
    Unlimited,
}

impl FromStr for MaxGrant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("unlimited") {
            return Ok(Self::Unlimited);
        }
        s.parse::<u32>()
            .map(Self::Amount)
            .map_err(|_| format!("expected a number or \"unlimited\", got '{}'", s))
    }
}

impl fmt::Display for MaxGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(n) => write!(f, "{}", n),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}
