// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Identity records and the authenticated request context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::roles::Role;

/// A registered user as persisted by the identity store.
///
/// `credential_hash` is the output of the credential encoder, never the
/// plaintext secret. It is serialized so stores can persist it, but it must
/// never be copied into an API response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Internal identifier (UUID v4).
    pub id: String,
    /// Unique subject identifier (the user's email).
    pub subject_id: String,
    /// Opaque bcrypt hash of the secret.
    pub credential_hash: String,
    /// Role label; `USER` unless set at registration.
    pub role: Role,
    /// When the identity was registered.
    pub created_at: DateTime<Utc>,
}

impl Identity {
    pub fn new(subject_id: impl Into<String>, credential_hash: String, role: Role) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            credential_hash,
            role,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("subject_id", &self.subject_id)
            .field("credential_hash", &"<redacted>")
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Authenticated identity attached to a single request.
///
/// Built by the request authenticator after the bearer token verified and the
/// subject was re-resolved. Lives in the request extensions and is dropped with
/// the request.
#[derive(Debug, Clone)]
pub struct AuthenticatedContext {
    /// The identity as currently stored (not as it was at token issuance).
    pub identity: Identity,
    /// Authority labels derived from the identity's role.
    pub authorities: Vec<String>,
    /// Expiry of the token that authenticated this request (Unix seconds).
    pub token_expires_at: i64,
}

impl AuthenticatedContext {
    pub fn new(identity: Identity, token_expires_at: i64) -> Self {
        let authorities = vec![identity.role.authority()];
        Self {
            identity,
            authorities,
            token_expires_at,
        }
    }

    /// Subject identifier of the caller.
    pub fn subject_id(&self) -> &str {
        &self.identity.subject_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_identity(role: &str) -> Identity {
        Identity::new(
            "alice@example.com",
            "$2b$04$abcdefghijklmnopqrstuuJ6q2L2lC4g7pQ0k5vV1r9a8Yt3cS2mO".to_string(),
            Role::from_input(Some(role)),
        )
    }

    #[test]
    fn debug_output_redacts_credential_hash() {
        let identity = sample_identity("USER");
        let debug = format!("{identity:?}");
        assert!(debug.contains("alice@example.com"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("$2b$"));
    }

    #[test]
    fn new_identities_get_distinct_ids() {
        let a = sample_identity("USER");
        let b = sample_identity("USER");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn context_derives_authority_from_role() {
        let context = AuthenticatedContext::new(sample_identity("ADMIN"), 1_700_000_000);
        assert_eq!(context.subject_id(), "alice@example.com");
        assert_eq!(context.authorities, vec!["ROLE_ADMIN".to_string()]);
    }
}
