// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only identity resolution.

use std::sync::Arc;

use super::Identity;
use crate::storage::{run_blocking, SharedIdentityStore, StorageResult};

/// Resolves subject identifiers to stored identities.
///
/// Never writes. Store I/O runs on the blocking pool.
#[derive(Clone)]
pub struct IdentityLookup {
    store: SharedIdentityStore,
}

impl IdentityLookup {
    pub fn new(store: SharedIdentityStore) -> Self {
        Self { store }
    }

    /// Resolve `subject_id`; `Ok(None)` when it is not registered.
    pub async fn resolve(&self, subject_id: &str) -> StorageResult<Option<Identity>> {
        let store = Arc::clone(&self.store);
        let subject_id = subject_id.to_string();
        run_blocking(move || store.find_by_subject_id(&subject_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::storage::{IdentityStore, InMemoryIdentityStore};

    #[tokio::test]
    async fn resolves_registered_subject() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let alice = store
            .save(Identity::new("alice@example.com", "hash".into(), Role::default()))
            .unwrap();

        let lookup = IdentityLookup::new(store);
        assert_eq!(lookup.resolve("alice@example.com").await.unwrap(), Some(alice));
    }

    #[tokio::test]
    async fn unknown_subject_is_none() {
        let lookup = IdentityLookup::new(Arc::new(InMemoryIdentityStore::new()));
        assert_eq!(lookup.resolve("ghost@example.com").await.unwrap(), None);
    }

    #[tokio::test]
    async fn resolve_reflects_current_role() {
        let store = Arc::new(InMemoryIdentityStore::new());
        let mut alice = store
            .save(Identity::new("alice@example.com", "hash".into(), Role::default()))
            .unwrap();
        let lookup = IdentityLookup::new(store.clone());

        alice.role = Role::from_input(Some("ADMIN"));
        store.save(alice).unwrap();

        let resolved = lookup.resolve("alice@example.com").await.unwrap().unwrap();
        assert_eq!(resolved.role.as_str(), "ADMIN");
    }
}
