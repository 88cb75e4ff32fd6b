//! store::repository
//!
//! Durable storage backends for claim documents.
//!
//! # Design
//!
//! A repository is a dumb document store: it reads and writes the serialized
//! owner records, index, and name cache as opaque strings. Encoding and
//! legacy migration live in [`schema`](super::schema); caching and dirty
//! tracking live in the store.
//!
//! - [`FileClaimRepository`]: one JSON file per document under
//!   `<data_dir>/claims/`, written atomically (temp file + rename)
//! - [`MemoryClaimRepository`]: in-process maps, with switchable write
//!   failures for exercising the retry path
//!
//! # Example
//!
//! ```
//! use claimwork::core::types::PlayerId;
//! use claimwork::store::{ClaimRepository, MemoryClaimRepository};
//!
//! let repo = MemoryClaimRepository::new();
//! let owner = PlayerId::random();
//!
//! assert!(repo.load_record(owner).unwrap().is_none());
//! repo.save_record(owner, "{}").unwrap();
//! assert_eq!(repo.load_record(owner).unwrap().as_deref(), Some("{}"));
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::StoreError;
use crate::core::paths::ClaimPaths;
use crate::core::types::PlayerId;

/// Trait for durable claim storage.
///
/// Implementations must be thread-safe: the flush worker and caller threads
/// may use the same repository concurrently. Missing documents are
/// `Ok(None)`, not errors.
pub trait ClaimRepository: Send + Sync {
    /// Load an owner record.
    fn load_record(&self, owner: PlayerId) -> Result<Option<String>, StoreError>;

    /// Store an owner record, replacing any previous version.
    fn save_record(&self, owner: PlayerId, contents: &str) -> Result<(), StoreError>;

    /// Load the spatial index document.
    fn load_index(&self) -> Result<Option<String>, StoreError>;

    /// Store the spatial index document.
    fn save_index(&self, contents: &str) -> Result<(), StoreError>;

    /// Load the name cache document.
    fn load_names(&self) -> Result<Option<String>, StoreError>;

    /// Store the name cache document.
    fn save_names(&self, contents: &str) -> Result<(), StoreError>;

    /// Every owner with a stored record, sorted.
    fn list_records(&self) -> Result<Vec<PlayerId>, StoreError>;

    /// Whether the last session ended with a clean shutdown.
    fn clean_shutdown(&self) -> Result<bool, StoreError>;

    /// Set or clear the clean-shutdown marker.
    fn set_clean_shutdown(&self, clean: bool) -> Result<(), StoreError>;
}

// =============================================================================
// File-backed repository
// =============================================================================

/// File-based claim repository.
#[derive(Debug, Clone)]
pub struct FileClaimRepository {
    paths: ClaimPaths,
}

impl FileClaimRepository {
    pub fn new(paths: ClaimPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ClaimPaths {
        &self.paths
    }

    fn read(path: &Path) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    /// Write a document atomically (temp file + fsync + rename).
    fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }

        let temp_path = temp_path_for(path);
        let mut file = fs::File::create(&temp_path).map_err(|e| StoreError::io(&temp_path, e))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| StoreError::io(&temp_path, e))?;
        file.sync_all().map_err(|e| StoreError::io(&temp_path, e))?;

        fs::rename(&temp_path, path).map_err(|e| StoreError::io(path, e))?;
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl ClaimRepository for FileClaimRepository {
    fn load_record(&self, owner: PlayerId) -> Result<Option<String>, StoreError> {
        Self::read(&self.paths.record_path(owner))
    }

    fn save_record(&self, owner: PlayerId, contents: &str) -> Result<(), StoreError> {
        Self::write_atomic(&self.paths.record_path(owner), contents)
    }

    fn load_index(&self) -> Result<Option<String>, StoreError> {
        Self::read(&self.paths.index_path())
    }

    fn save_index(&self, contents: &str) -> Result<(), StoreError> {
        Self::write_atomic(&self.paths.index_path(), contents)
    }

    fn load_names(&self) -> Result<Option<String>, StoreError> {
        Self::read(&self.paths.names_path())
    }

    fn save_names(&self, contents: &str) -> Result<(), StoreError> {
        Self::write_atomic(&self.paths.names_path(), contents)
    }

    fn list_records(&self) -> Result<Vec<PlayerId>, StoreError> {
        let dir = self.paths.claims_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut owners = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&dir, e))?;
            if let Some(owner) = ClaimPaths::record_owner(&entry.path()) {
                owners.push(owner);
            }
        }
        owners.sort();
        Ok(owners)
    }

    fn clean_shutdown(&self) -> Result<bool, StoreError> {
        let path = self.paths.clean_marker_path();
        path.try_exists().map_err(|e| StoreError::io(&path, e))
    }

    fn set_clean_shutdown(&self, clean: bool) -> Result<(), StoreError> {
        let path = self.paths.clean_marker_path();
        if clean {
            return Self::write_atomic(&path, "");
        }
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }
}

// =============================================================================
// In-memory repository
// =============================================================================

/// In-memory claim repository.
#[derive(Debug, Default)]
pub struct MemoryClaimRepository {
    records: Mutex<HashMap<PlayerId, String>>,
    index: Mutex<Option<String>>,
    names: Mutex<Option<String>>,
    clean: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryClaimRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail until switched off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_writable(&self, what: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::io(
                Path::new(what),
                io::Error::other("writes disabled"),
            ));
        }
        Ok(())
    }

    fn store(&self, slot: &Mutex<Option<String>>, contents: &str, what: &str) -> Result<(), StoreError> {
        self.check_writable(what)?;
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ClaimRepository for MemoryClaimRepository {
    fn load_record(&self, owner: PlayerId) -> Result<Option<String>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&owner)
            .cloned())
    }

    fn save_record(&self, owner: PlayerId, contents: &str) -> Result<(), StoreError> {
        self.check_writable("memory:record")?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(owner, contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_index(&self) -> Result<Option<String>, StoreError> {
        Ok(self.index.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_index(&self, contents: &str) -> Result<(), StoreError> {
        self.store(&self.index, contents, "memory:index")
    }

    fn load_names(&self) -> Result<Option<String>, StoreError> {
        Ok(self.names.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save_names(&self, contents: &str) -> Result<(), StoreError> {
        self.store(&self.names, contents, "memory:names")
    }

    fn list_records(&self) -> Result<Vec<PlayerId>, StoreError> {
        let mut owners: Vec<PlayerId> = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        owners.sort();
        Ok(owners)
    }

    fn clean_shutdown(&self) -> Result<bool, StoreError> {
        Ok(self.clean.load(Ordering::SeqCst))
    }

    /// Not counted by [`write_count`](Self::write_count).
    fn set_clean_shutdown(&self, clean: bool) -> Result<(), StoreError> {
        self.check_writable("memory:marker")?;
        self.clean.store(clean, Ordering::SeqCst);
        Ok(())
    }
}
