//! store
//!
//! Claim Ownership Store: the single source of truth for who owns what.
//!
//! # Modules
//!
//! - [`schema`] - Durable JSON shapes and legacy record migration
//! - [`repository`] - Document storage backends (file, memory)
//! - [`index`] - Per-world sharded spatial index
//! - [`writeback`] - Dirty tracking for deferred writes
//! - [`flusher`] - Background flush thread
//! - [`claim_store`] - The [`ClaimStore`] façade
//!
//! # Architecture
//!
//! ```text
//!   callers ──► ClaimStore ──► SpatialIndex       (hot path, memory only)
//!                   │      ──► record cache
//!                   │      ──► DirtySet
//!                   ▼
//!              FlushWorker ──► ClaimRepository    (every interval + shutdown)
//! ```
//!
//! Reads and mutations never touch durable storage, except for the first
//! access to an owner whose record is not cached yet.

pub mod claim_store;
pub mod flusher;
pub mod index;
pub mod repository;
pub mod schema;
pub mod writeback;

pub use claim_store::{
    AddClaimOutcome, ClaimStore, FlushReport, OwnerClaims, RebuildReport, StoreOptions,
};
pub use repository::{ClaimRepository, FileClaimRepository, MemoryClaimRepository};
pub use schema::RecordError;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::lock::LockError;
use crate::core::types::{ChunkPos, PlayerId, WorldName};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The chunk is already owned by someone else.
    #[error("chunk {pos} in world '{world}' is already claimed by {owner}")]
    Conflict {
        world: WorldName,
        pos: ChunkPos,
        owner: PlayerId,
    },

    #[error("storage I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: String,
        source: serde_json::Error,
    },

    #[error("failed to start flush worker: {0}")]
    Worker(std::io::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn serialize(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialize {
            what: what.into(),
            source,
        }
    }
}
