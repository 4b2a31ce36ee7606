// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the identity file store.

use std::path::{Path, PathBuf};

use base64ct::{Base64UrlUnpadded, Encoding};
use sha2::{Digest, Sha256};

/// Storage path utilities.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// Create a new StoragePaths rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all stored data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory containing all identity records.
    pub fn identities_dir(&self) -> PathBuf {
        self.root.join("identities")
    }

    /// Path of the record for `subject_id`.
    ///
    /// Subjects are arbitrary user input, so the file name is a digest of the
    /// subject rather than the subject itself.
    pub fn identity(&self, subject_id: &str) -> PathBuf {
        self.identities_dir()
            .join(format!("{}.json", subject_file_stem(subject_id)))
    }
}

/// URL-safe SHA-256 digest of a subject identifier.
pub fn subject_file_stem(subject_id: &str) -> String {
    let digest = Sha256::digest(subject_id.as_bytes());
    Base64UrlUnpadded::encode_string(&digest)
}
