//! core
//!
//! Core domain types and ambient infrastructure for claim ownership.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PlayerId, WorldName, ChunkPos
//! - [`trust`] - Ordered trust levels and permission comparison
//! - [`claim`] - Claim and TrustedPlayer values
//! - [`player_claims`] - One owner's claims, trust map, and bonuses
//! - [`playtime`] - Injected playtime source
//! - [`config`] - Claim rule configuration and loading
//! - [`paths`] - Centralized path routing for claim storage
//! - [`lock`] - Exclusive data directory lock
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Records are internally synchronized and hand out snapshots
//! - Nothing in here performs I/O on a gameplay hot path

pub mod claim;
pub mod config;
pub mod lock;
pub mod paths;
pub mod player_claims;
pub mod playtime;
pub mod trust;
pub mod types;
