// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential hashing.
//!
//! Secrets are stored as salted bcrypt hashes. Verification against a
//! corrupt or foreign hash yields `false`, so a bad row in the store can only
//! cause an authentication failure, never a server error.
//!
//! bcrypt only reads the first [`MAX_SECRET_BYTES`] bytes of its input. Longer
//! secrets are refused by the non-truncating bcrypt calls rather than being
//! silently cut, so two secrets sharing a long prefix never verify as equal.

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Longest secret, in UTF-8 bytes, that bcrypt hashes in full.
pub const MAX_SECRET_BYTES: usize = 72;

/// Error returned when a secret cannot be hashed.
#[derive(Debug, thiserror::Error)]
#[error("credential hashing failed: {0}")]
pub struct HashError(String);

/// One-way encoding of user secrets.
pub trait CredentialEncoder: Send + Sync {
    /// Produce a salted, one-way hash of `secret`.
    fn hash(&self, secret: &str) -> Result<String, HashError>;

    /// Check `secret` against a hash produced by [`CredentialEncoder::hash`].
    fn verify(&self, secret: &str, credential_hash: &str) -> bool;
}

/// bcrypt-backed [`CredentialEncoder`].
#[derive(Debug, Clone, Copy)]
pub struct BcryptEncoder {
    cost: u32,
}

impl BcryptEncoder {
    /// Create an encoder with the given cost factor.
    ///
    /// The cost must be within bcrypt's accepted range; configuration loading
    /// enforces this before the encoder is built.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl CredentialEncoder for BcryptEncoder {
    fn hash(&self, secret: &str) -> Result<String, HashError> {
        bcrypt::non_truncating_hash(secret, self.cost).map_err(|e| HashError(e.to_string()))
    }

    fn verify(&self, secret: &str, credential_hash: &str) -> bool {
        if secret.len() > MAX_SECRET_BYTES {
            return false;
        }
        match bcrypt::non_truncating_verify(secret, credential_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "stored credential hash could not be parsed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum cost keeps the tests fast.
    fn encoder() -> BcryptEncoder {
        BcryptEncoder::new(4)
    }

    #[test]
    fn verify_accepts_original_secret() {
        let encoder = encoder();
        let hash = encoder.hash("secret123").unwrap();
        assert!(encoder.verify("secret123", &hash));
    }

    #[test]
    fn verify_rejects_other_secret() {
        let encoder = encoder();
        let hash = encoder.hash("secret123").unwrap();
        assert!(!encoder.verify("secret124", &hash));
        assert!(!encoder.verify("", &hash));
    }

    #[test]
    fn hash_is_salted_and_never_plaintext() {
        let encoder = encoder();
        let first = encoder.hash("secret123").unwrap();
        let second = encoder.hash("secret123").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("secret123"));
        assert!(first.starts_with("$2"));
    }

    #[test]
    fn malformed_hash_verifies_false() {
        let encoder = encoder();
        assert!(!encoder.verify("secret123", ""));
        assert!(!encoder.verify("secret123", "not-a-bcrypt-hash"));
        assert!(!encoder.verify("secret123", "$2b$04$tooshort"));
    }

    #[test]
    fn secrets_sharing_a_long_prefix_do_not_match() {
        let encoder = encoder();
        let prefix = "p".repeat(MAX_SECRET_BYTES);
        let hash = encoder.hash(&prefix).unwrap();

        assert!(encoder.verify(&prefix, &hash));
        assert!(!encoder.verify(&format!("{prefix}-and-more"), &hash));
    }

    #[test]
    fn overlong_secret_is_not_hashed() {
        let encoder = encoder();
        let secret = "x".repeat(MAX_SECRET_BYTES + 1);
        assert!(encoder.hash(&secret).is_err());
    }

    #[test]
    fn default_cost_matches_constant() {
        assert_eq!(BcryptEncoder::default().cost(), DEFAULT_BCRYPT_COST);
    }
}
