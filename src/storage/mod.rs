// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Storage
//!
//! The authentication core persists nothing itself. It talks to an
//! [`IdentityStore`], the persistence collaborator, through three calls:
//! find by subject, existence check, and save.
//!
//! ## Implementations
//!
//! - [`FileIdentityStore`] - one JSON file per identity under `DATA_DIR`
//! - [`InMemoryIdentityStore`] - process-local map, for tests and local runs
//!
//! ## Storage Layout (file store)
//!
//! ```text
//! {DATA_DIR}/
//!   identities/
//!     {sha256(subject_id), base64url}.json
//! ```
//!
//! Store calls are synchronous and may block on I/O. Async callers go through
//! [`run_blocking`] so a slow disk never stalls the runtime.

pub mod file;
pub mod memory;
pub mod paths;

use std::sync::Arc;

pub use file::FileIdentityStore;
pub use memory::InMemoryIdentityStore;
pub use paths::StoragePaths;

use crate::auth::Identity;

/// Error type for identity storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Storage root missing or not usable
    #[error("Storage not initialized")]
    NotInitialized,
    /// Stored data failed a consistency check
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
    /// A lock guarding in-memory state was poisoned by a panicking writer
    #[error("Storage lock poisoned")]
    LockPoisoned,
    /// A blocking storage task was cancelled or panicked
    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator for identities.
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by subject identifier.
    fn find_by_subject_id(&self, subject_id: &str) -> StorageResult<Option<Identity>>;

    /// Check whether a subject identifier is registered.
    fn exists_by_subject_id(&self, subject_id: &str) -> StorageResult<bool>;

    /// Insert or replace an identity, keyed by its subject identifier.
    fn save(&self, identity: Identity) -> StorageResult<Identity>;

    /// Verify the store is usable.
    fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}

/// Shared handle to an identity store.
pub type SharedIdentityStore = Arc<dyn IdentityStore>;

/// Run a blocking storage call on the blocking thread pool.
pub async fn run_blocking<T, F>(f: F) -> StorageResult<T>
where
    F: FnOnce() -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_blocking_returns_inner_result() {
        let value = run_blocking(|| Ok(41 + 1)).await.unwrap();
        assert_eq!(value, 42);

        let err = run_blocking::<(), _>(|| Err(StorageError::NotInitialized))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotInitialized));
    }

    #[tokio::test]
    async fn run_blocking_reports_panics_as_task_errors() {
        let err = run_blocking::<(), _>(|| panic!("boom")).await.unwrap_err();
        assert!(matches!(err, StorageError::Task(_)));
    }
}
