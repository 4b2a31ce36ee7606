// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! File-backed identity store.
//!
//! Each identity is one pretty-printed JSON file. Writes go to a temp file
//! first and are renamed into place, so a crash mid-write never leaves a
//! truncated record behind.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use super::{IdentityStore, StorageError, StoragePaths, StorageResult};
use crate::auth::Identity;

/// Identity store persisting to the local filesystem.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    paths: StoragePaths,
}

impl FileIdentityStore {
    /// Open the store rooted at `root`, creating the directory layout.
    ///
    /// Safe to call on an existing layout.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let paths = StoragePaths::new(root);
        fs::create_dir_all(paths.identities_dir())?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<T> {
        let file = File::open(path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(value)
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }

        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

impl IdentityStore for FileIdentityStore {
    fn find_by_subject_id(&self, subject_id: &str) -> StorageResult<Option<Identity>> {
        let path = self.paths.identity(subject_id);
        let identity: Identity = match self.read_json(&path) {
            Ok(identity) => identity,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None)
            }
            Err(e) => return Err(e),
        };

        // Digest collisions are not expected, but a record must match its key.
        if identity.subject_id != subject_id {
            return Err(StorageError::IntegrityViolation(format!(
                "record at {} does not belong to the requested subject",
                path.display()
            )));
        }
        Ok(Some(identity))
    }

    fn exists_by_subject_id(&self, subject_id: &str) -> StorageResult<bool> {
        Ok(self.find_by_subject_id(subject_id)?.is_some())
    }

    fn save(&self, identity: Identity) -> StorageResult<Identity> {
        let path = self.paths.identity(&identity.subject_id);
        self.write_json(&path, &identity)?;
        tracing::debug!(identity_id = %identity.id, "identity record written");
        Ok(identity)
    }

    /// Write-read-delete probe under the storage root.
    fn health_check(&self) -> StorageResult<()> {
        let dir = self.paths.identities_dir();
        if !dir.is_dir() {
            return Err(StorageError::NotInitialized);
        }

        let probe = self
            .paths
            .root()
            .join(format!(".health_check.{}", uuid::Uuid::new_v4()));
        let data = b"health_check_data";
        fs::write(&probe, data)?;
        let read = fs::read(&probe)?;
        fs::remove_file(&probe)?;

        if read != data {
            return Err(StorageError::IntegrityViolation(
                "Health check data mismatch".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use tempfile::TempDir;

    fn test_store() -> (FileIdentityStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = FileIdentityStore::open(temp_dir.path()).expect("Failed to open store");
        (store, temp_dir)
    }

    fn identity(subject: &str) -> Identity {
        Identity::new(subject, "$2b$04$hash".to_string(), Role::default())
    }

    #[test]
    fn open_creates_layout() {
        let (store, _dir) = test_store();
        assert!(store.paths().identities_dir().is_dir());
    }

    #[test]
    fn save_then_find() {
        let (store, _dir) = test_store();
        let saved = store.save(identity("alice@example.com")).unwrap();

        let found = store.find_by_subject_id("alice@example.com").unwrap();
        assert_eq!(found, Some(saved));
        assert!(store.exists_by_subject_id("alice@example.com").unwrap());
    }

    #[test]
    fn missing_subject_is_none() {
        let (store, _dir) = test_store();
        assert_eq!(store.find_by_subject_id("nobody@example.com").unwrap(), None);
        assert!(!store.exists_by_subject_id("nobody@example.com").unwrap());
    }

    #[test]
    fn save_replaces_existing_record() {
        let (store, _dir) = test_store();
        let mut alice = store.save(identity("alice@example.com")).unwrap();
        alice.role = Role::from_input(Some("ADMIN"));
        store.save(alice.clone()).unwrap();

        let found = store.find_by_subject_id("alice@example.com").unwrap().unwrap();
        assert_eq!(found.role.as_str(), "ADMIN");
        assert_eq!(found.id, alice.id);
    }

    #[test]
    fn records_survive_reopen() {
        let (store, dir) = test_store();
        store.save(identity("alice@example.com")).unwrap();

        let reopened = FileIdentityStore::open(dir.path()).unwrap();
        assert!(reopened.exists_by_subject_id("alice@example.com").unwrap());
    }

    #[test]
    fn no_temp_files_left_after_save() {
        let (store, _dir) = test_store();
        store.save(identity("alice@example.com")).unwrap();

        let leftovers: Vec<_> = fs::read_dir(store.paths().identities_dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.path().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn corrupt_record_is_an_error_not_a_miss() {
        let (store, _dir) = test_store();
        fs::write(store.paths().identity("alice@example.com"), b"{not json").unwrap();

        let result = store.find_by_subject_id("alice@example.com");
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[test]
    fn mismatched_record_is_integrity_violation() {
        let (store, _dir) = test_store();
        let bob = identity("bob@example.com");
        let json = serde_json::to_vec(&bob).unwrap();
        fs::write(store.paths().identity("alice@example.com"), json).unwrap();

        let result = store.find_by_subject_id("alice@example.com");
        assert!(matches!(result, Err(StorageError::IntegrityViolation(_))));
    }

    #[test]
    fn health_check_works() {
        let (store, _dir) = test_store();
        store.health_check().expect("Health check should pass");
    }

    #[test]
    fn health_check_fails_when_layout_removed() {
        let (store, _dir) = test_store();
        fs::remove_dir_all(store.paths().identities_dir()).unwrap();
        assert!(matches!(store.health_check(), Err(StorageError::NotInitialized)));
    }
}
