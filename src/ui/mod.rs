//! ui
//!
//! User-facing output for `claimctl`.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display

pub mod output;
