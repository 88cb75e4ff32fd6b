//! store::writeback
//!
//! Dirty tracking for deferred writes.
//!
//! Mutations only mark state dirty; the flush path drains what is dirty and
//! writes it. Every check-and-clear is a single atomic step, so a mark that
//! lands while a flush is running is either drained by that flush or left
//! for the next one, never lost.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::core::types::PlayerId;

/// Per-owner dirty set plus global flags for the index and name cache.
#[derive(Debug, Default)]
pub struct DirtySet {
    owners: Mutex<HashSet<PlayerId>>,
    index: AtomicBool,
    names: AtomicBool,
}

impl DirtySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_owner(&self, owner: PlayerId) {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner);
    }

    pub fn mark_index(&self) {
        self.index.store(true, Ordering::Release);
    }

    pub fn mark_names(&self) {
        self.names.store(true, Ordering::Release);
    }

    /// Take every dirty owner, leaving the set empty.
    pub fn drain_owners(&self) -> Vec<PlayerId> {
        let mut owners = self.owners.lock().unwrap_or_else(PoisonError::into_inner);
        owners.drain().collect()
    }

    /// Clear the index flag, returning whether it was set.
    pub fn take_index(&self) -> bool {
        self.index.swap(false, Ordering::AcqRel)
    }

    /// Clear the names flag, returning whether it was set.
    pub fn take_names(&self) -> bool {
        self.names.swap(false, Ordering::AcqRel)
    }

    pub fn is_owner_dirty(&self, owner: PlayerId) -> bool {
        self.owners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&owner)
    }

    /// Whether anything at all is waiting to be written.
    pub fn is_dirty(&self) -> bool {
        self.index.load(Ordering::Acquire)
            || self.names.load(Ordering::Acquire)
            || !self
                .owners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
    }
}
