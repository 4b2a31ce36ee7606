// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::password::{CredentialEncoder, MAX_SECRET_BYTES};
use super::token::TokenService;
use super::{AuthError, Identity, IdentityLookup, Role};
use crate::storage::{run_blocking, SharedIdentityStore};

/// Secret hashed once at startup and checked when a login names an unknown
/// subject, so both failure paths spend the same bcrypt time.
const TIMING_DUMMY_SECRET: &str = "timing-equalization-dummy-secret";

/// Entry point for credential exchange.
pub struct AuthGate {
    store: SharedIdentityStore,
    lookup: IdentityLookup,
    encoder: Arc<dyn CredentialEncoder>,
    tokens: Arc<TokenService>,
    dummy_hash: String,
    registration: Mutex<()>,
}

impl AuthGate {
    pub fn new(
        store: SharedIdentityStore,
        encoder: Arc<dyn CredentialEncoder>,
        tokens: Arc<TokenService>,
    ) -> Result<Self, AuthError> {
        let dummy_hash = encoder.hash(TIMING_DUMMY_SECRET)?;
        Ok(Self {
            lookup: IdentityLookup::new(Arc::clone(&store)),
            store,
            encoder,
            tokens,
            dummy_hash,
            registration: Mutex::new(()),
        })
    }

    /// Register a new identity.
    ///
    /// A blank role becomes `USER`. Secrets longer than [`MAX_SECRET_BYTES`]
    /// are refused. The secret is hashed before the registration lock is
    /// taken; only the existence check and the save are serialized, so a
    /// subject can only ever be registered once.
    pub async fn register(
        &self,
        subject_id: &str,
        secret: &str,
        role: Option<&str>,
    ) -> Result<Identity, AuthError> {
        let subject_id = subject_id.trim();
        if subject_id.is_empty() || secret.is_empty() {
            return Err(AuthError::InvalidRequest(
                "email and password are required".to_string(),
            ));
        }
        if secret.len() > MAX_SECRET_BYTES {
            return Err(AuthError::InvalidRequest(format!(
                "password must be at most {MAX_SECRET_BYTES} bytes"
            )));
        }
        let role = Role::from_input(role);

        // Skip the bcrypt work for an obvious duplicate.
        if self.subject_exists(subject_id).await? {
            tracing::info!(subject = %subject_id, "registration rejected: subject exists");
            return Err(AuthError::DuplicateSubject(subject_id.to_string()));
        }

        let encoder = Arc::clone(&self.encoder);
        let secret = secret.to_string();
        let credential_hash = tokio::task::spawn_blocking(move || encoder.hash(&secret))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;

        let _guard = self.registration.lock().await;

        if self.subject_exists(subject_id).await? {
            tracing::info!(subject = %subject_id, "registration rejected: subject exists");
            return Err(AuthError::DuplicateSubject(subject_id.to_string()));
        }

        let identity = Identity::new(subject_id, credential_hash, role);
        let store = Arc::clone(&self.store);
        let saved = run_blocking(move || store.save(identity)).await?;

        tracing::info!(
            subject = %saved.subject_id,
            identity_id = %saved.id,
            role = %saved.role,
            "identity registered"
        );
        Ok(saved)
    }

    async fn subject_exists(&self, subject_id: &str) -> Result<bool, AuthError> {
        let store = Arc::clone(&self.store);
        let subject = subject_id.to_string();
        Ok(run_blocking(move || store.exists_by_subject_id(&subject)).await?)
    }

    /// Exchange credentials for a signed access token.
    ///
    /// Unknown subject and wrong secret both return
    /// [`AuthError::InvalidCredentials`].
    pub async fn login(&self, subject_id: &str, secret: &str) -> Result<String, AuthError> {
        let subject_id = subject_id.trim();
        let identity = if subject_id.is_empty() {
            None
        } else {
            self.lookup.resolve(subject_id).await?
        };

        let (stored_hash, known) = match &identity {
            Some(identity) => (identity.credential_hash.clone(), true),
            None => (self.dummy_hash.clone(), false),
        };

        let encoder = Arc::clone(&self.encoder);
        let secret = secret.to_string();
        let matches = tokio::task::spawn_blocking(move || encoder.verify(&secret, &stored_hash))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        if !(known && matches) {
            tracing::info!(subject = %subject_id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(subject_id, None)?;
        tracing::info!(subject = %subject_id, "login succeeded, token issued");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::FixedClock;
    use crate::auth::password::BcryptEncoder;
    use crate::auth::token::{TokenConfig, TokenError};
    use crate::storage::{IdentityStore, InMemoryIdentityStore, StorageError, StorageResult};
    use std::time::Duration;

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        gate: AuthGate,
        store: Arc<InMemoryIdentityStore>,
        tokens: Arc<TokenService>,
        clock: Arc<FixedClock>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryIdentityStore::new());
        let clock = Arc::new(FixedClock::new(NOW));
        let config =
            TokenConfig::new("gate-test-signing-key-0123456789", Duration::from_secs(60)).unwrap();
        let tokens = Arc::new(TokenService::with_clock(config, clock.clone()));
        let gate = AuthGate::new(
            store.clone(),
            Arc::new(BcryptEncoder::new(4)),
            tokens.clone(),
        )
        .unwrap();
        Fixture {
            gate,
            store,
            tokens,
            clock,
        }
    }

    /// Store whose every call fails, to check errors propagate.
    struct BrokenStore;

    impl IdentityStore for BrokenStore {
        fn find_by_subject_id(&self, _: &str) -> StorageResult<Option<Identity>> {
            Err(StorageError::NotInitialized)
        }
        fn exists_by_subject_id(&self, _: &str) -> StorageResult<bool> {
            Err(StorageError::NotInitialized)
        }
        fn save(&self, _: Identity) -> StorageResult<Identity> {
            Err(StorageError::NotInitialized)
        }
    }

    #[tokio::test]
    async fn register_hashes_secret_and_defaults_role() {
        let f = fixture();
        let identity = f.gate.register("alice@example.com", "secret123", None).await.unwrap();

        assert_eq!(identity.subject_id, "alice@example.com");
        assert_eq!(identity.role.as_str(), "USER");
        assert_ne!(identity.credential_hash, "secret123");
        assert!(BcryptEncoder::new(4).verify("secret123", &identity.credential_hash));

        let stored = f.store.find_by_subject_id("alice@example.com").unwrap();
        assert_eq!(stored, Some(identity));
    }

    #[tokio::test]
    async fn register_keeps_explicit_role_and_defaults_blank() {
        let f = fixture();
        let admin = f.gate.register("admin@example.com", "pw", Some("ADMIN")).await.unwrap();
        assert_eq!(admin.role.as_str(), "ADMIN");

        let blank = f.gate.register("blank@example.com", "pw", Some("  ")).await.unwrap();
        assert_eq!(blank.role.as_str(), "USER");
    }

    #[tokio::test]
    async fn duplicate_registration_fails() {
        let f = fixture();
        f.gate.register("alice@example.com", "secret123", None).await.unwrap();

        let err = f
            .gate
            .register("alice@example.com", "other", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateSubject(ref s) if s == "alice@example.com"));
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_registrations_admit_one() {
        let f = Arc::new(fixture());
        let mut handles = Vec::new();
        for i in 0..8 {
            let f = Arc::clone(&f);
            handles.push(tokio::spawn(async move {
                f.gate
                    .register("race@example.com", &format!("pw{i}"), None)
                    .await
            }));
        }

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }
        assert_eq!(ok, 1);
        assert_eq!(f.store.len(), 1);
    }

    /// Encoder whose registration hashes wait until two are in flight at once.
    struct RendezvousEncoder {
        inner: BcryptEncoder,
        barrier: std::sync::Barrier,
    }

    impl CredentialEncoder for RendezvousEncoder {
        fn hash(&self, secret: &str) -> Result<String, crate::auth::password::HashError> {
            if secret != TIMING_DUMMY_SECRET {
                self.barrier.wait();
            }
            self.inner.hash(secret)
        }
        fn verify(&self, secret: &str, credential_hash: &str) -> bool {
            self.inner.verify(secret, credential_hash)
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn hashing_runs_outside_the_registration_lock() {
        let config =
            TokenConfig::new("gate-test-signing-key-0123456789", Duration::from_secs(60)).unwrap();
        let encoder = Arc::new(RendezvousEncoder {
            inner: BcryptEncoder::new(4),
            barrier: std::sync::Barrier::new(2),
        });
        let store = Arc::new(InMemoryIdentityStore::new());
        let gate = AuthGate::new(store.clone(), encoder, Arc::new(TokenService::new(config)))
            .unwrap();
        let gate = Arc::new(gate);

        let registrations = ["alice@example.com", "bob@example.com"].map(|subject| {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.register(subject, "secret123", None).await })
        });

        let both = async {
            for handle in registrations {
                handle.await.unwrap().unwrap();
            }
        };
        tokio::time::timeout(Duration::from_secs(10), both)
            .await
            .expect("two registrations hash concurrently");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn register_rejects_overlong_secret() {
        let f = fixture();
        let secret = "x".repeat(MAX_SECRET_BYTES + 1);

        let err = f.gate.register("alice@example.com", &secret, None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest(_)));
        assert_eq!(err.error_code(), "invalid_request");
        assert!(f.store.is_empty());

        let at_limit = "x".repeat(MAX_SECRET_BYTES);
        f.gate.register("alice@example.com", &at_limit, None).await.unwrap();
        f.gate.login("alice@example.com", &at_limit).await.unwrap();
        let err = f.gate.login("alice@example.com", &secret).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_rejects_blank_input() {
        let f = fixture();
        let err = f.gate.register("  ", "secret", None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest(_)));
        let err = f.gate.register("alice@example.com", "", None).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidRequest(_)));
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn login_issues_token_for_subject() {
        let f = fixture();
        f.gate.register("alice@example.com", "secret123", None).await.unwrap();

        let token = f.gate.login("alice@example.com", "secret123").await.unwrap();
        let verified = f.tokens.verify(&token).unwrap();
        assert_eq!(verified.subject, "alice@example.com");
        assert_eq!(verified.issued_at, NOW);
        assert_eq!(verified.expires_at, NOW + 60);

        f.clock.advance(60);
        assert_eq!(f.tokens.verify(&token), Err(TokenError::Expired));
    }

    #[tokio::test]
    async fn wrong_secret_and_unknown_subject_are_identical() {
        let f = fixture();
        f.gate.register("alice@example.com", "secret123", None).await.unwrap();

        let wrong_secret = f.gate.login("alice@example.com", "nope").await.unwrap_err();
        let unknown = f.gate.login("ghost@example.com", "secret123").await.unwrap_err();
        let blank = f.gate.login("", "secret123").await.unwrap_err();

        for err in [&wrong_secret, &unknown, &blank] {
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(wrong_secret.to_string(), unknown.to_string());
        assert_eq!(wrong_secret.status_code(), unknown.status_code());
        assert_eq!(wrong_secret.error_code(), unknown.error_code());
    }

    #[tokio::test]
    async fn dummy_secret_never_logs_in_unknown_subject() {
        let f = fixture();
        let err = f
            .gate
            .login("ghost@example.com", TIMING_DUMMY_SECRET)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_invalid_credentials() {
        let f = fixture();
        f.store
            .save(Identity::new("alice@example.com", "garbage".into(), Role::default()))
            .unwrap();

        let err = f.gate.login("alice@example.com", "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let config =
            TokenConfig::new("gate-test-signing-key-0123456789", Duration::from_secs(60)).unwrap();
        let gate = AuthGate::new(
            Arc::new(BrokenStore),
            Arc::new(BcryptEncoder::new(4)),
            Arc::new(TokenService::new(config)),
        )
        .unwrap();

        let err = gate.login("alice@example.com", "secret123").await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));

        let err = gate.register("alice@example.com", "secret123", None).await.unwrap_err();
        assert!(matches!(err, AuthError::Storage(_)));
    }
}
