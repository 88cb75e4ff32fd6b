//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Regular output goes to stdout and respects the quiet flag. Warnings and
//! errors go to stderr; errors are always shown.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a quota, where `u32::MAX` means unlimited.
pub fn format_quota(quota: u32) -> String {
    if quota == u32::MAX {
        "unlimited".to_string()
    } else {
        quota.to_string()
    }
}

/// Format an hours-until-next-claim value.
pub fn format_wait(hours: f64) -> String {
    if hours < 0.0 {
        "never (quota cap reached)".to_string()
    } else if hours == 0.0 {
        "now".to_string()
    } else {
        let minutes = (hours * 60.0).ceil() as u64;
        format!("in {}h {:02}m", minutes / 60, minutes % 60)
    }
}
