//! Claimwork - chunk claims for a voxel game server
//!
//! Players claim 32×32 columns of a world ("chunks"), grant other players
//! graded trust inside them, and earn more claims the longer they play.
//!
//! # Architecture
//!
//! The codebase is layered:
//!
//! - [`core`] - Domain types, configuration, paths, and the data-dir lock
//! - [`store`] - Claim ownership store: spatial index, per-player records,
//!   write-behind persistence
//! - [`manager`] - Claim rules: buffer zones, quotas, trust checks, PvP,
//!   grouping for display
//! - [`cli`] - The `claimctl` maintenance binary
//! - [`ui`] - Output helpers for the binary
//!
//! # Correctness Invariants
//!
//! 1. A chunk has at most one owner at any moment, even under concurrent claims
//! 2. The spatial index and the per-player records agree
//! 3. Durable writes are atomic; a crash never leaves a half-written file
//! 4. Claim and permission checks never wait on a durable write

pub mod cli;
pub mod core;
pub mod manager;
pub mod store;
pub mod ui;
