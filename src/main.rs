//! claimctl - offline maintenance for chunk claim data

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use claimwork::cli::{self, Cli};
use claimwork::ui::output;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}
