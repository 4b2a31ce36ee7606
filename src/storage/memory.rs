// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory identity store.
//!
//! Used by tests and by local runs without `DATA_DIR`. Contents are lost when
//! the process exits.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{IdentityStore, StorageError, StorageResult};
use crate::auth::Identity;

#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<HashMap<String, Identity>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities.
    pub fn len(&self) -> usize {
        self.identities.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove an identity. Identities are never deleted by the server; tests
    /// use this to simulate a record disappearing under a live token.
    pub fn remove(&self, subject_id: &str) -> StorageResult<Option<Identity>> {
        let mut map = self
            .identities
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.remove(subject_id))
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn find_by_subject_id(&self, subject_id: &str) -> StorageResult<Option<Identity>> {
        let map = self
            .identities
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.get(subject_id).cloned())
    }

    fn exists_by_subject_id(&self, subject_id: &str) -> StorageResult<bool> {
        let map = self
            .identities
            .read()
            .map_err(|_| StorageError::LockPoisoned)?;
        Ok(map.contains_key(subject_id))
    }

    fn save(&self, identity: Identity) -> StorageResult<Identity> {
        let mut map = self
            .identities
            .write()
            .map_err(|_| StorageError::LockPoisoned)?;
        map.insert(identity.subject_id.clone(), identity.clone());
        Ok(identity)
    }
}
