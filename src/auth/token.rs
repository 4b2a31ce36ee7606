// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed access tokens.
//!
//! Tokens are compact HS256 JWS strings carrying `sub`, `iat` and `exp`, plus
//! any extra claims supplied at issuance. The signing key and lifetime are
//! fixed when the [`TokenService`] is built and never change afterwards.
//!
//! Verification order matters: structure and signature are checked first, and
//! only a token that is authentic is checked for expiry. Expiry is exclusive
//! at whole-second precision (`now >= exp` means expired).

use std::sync::Arc;
use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::clock::{Clock, SystemClock};
use crate::config::ConfigError;

/// Keys below this length are accepted but weaker than HS256 expects.
const RECOMMENDED_KEY_LEN: usize = 32;

/// Claim names owned by the token service; extra claims cannot override them.
const RESERVED_CLAIMS: [&str; 3] = ["sub", "iat", "exp"];

/// Token verification and issuance failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Not a well-formed signed token (bad segments, encoding, or claims).
    #[error("token is malformed")]
    Malformed,
    /// Structurally valid, but the signature does not match the signing key.
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// Authentic but past its expiry.
    #[error("token has expired")]
    Expired,
    /// The token could not be signed.
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "token_malformed",
            TokenError::SignatureInvalid => "token_signature_invalid",
            TokenError::Expired => "token_expired",
            TokenError::Signing(_) => "token_signing_failed",
        }
    }
}

/// Immutable token settings, validated once at startup.
#[derive(Clone)]
pub struct TokenConfig {
    signing_key: Vec<u8>,
    lifetime: Duration,
}

impl TokenConfig {
    /// Validate and build the token configuration.
    ///
    /// The key must be non-empty and the lifetime at least one second, since
    /// timestamps carry whole seconds only.
    pub fn new(signing_key: impl Into<Vec<u8>>, lifetime: Duration) -> Result<Self, ConfigError> {
        let signing_key = signing_key.into();
        if signing_key.is_empty() {
            return Err(ConfigError::invalid(
                crate::config::JWT_SECRET_ENV,
                "signing key must not be empty",
            ));
        }
        if lifetime.as_secs() == 0 {
            return Err(ConfigError::invalid(
                crate::config::JWT_EXPIRATION_ENV,
                "token lifetime must be at least one second",
            ));
        }
        if signing_key.len() < RECOMMENDED_KEY_LEN {
            tracing::warn!(
                key_len = signing_key.len(),
                recommended = RECOMMENDED_KEY_LEN,
                "token signing key is shorter than recommended for HS256"
            );
        }
        Ok(Self {
            signing_key,
            lifetime,
        })
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("signing_key", &"<redacted>")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Wire claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Claims of a token that passed verification.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedToken {
    pub subject: String,
    pub issued_at: i64,
    pub expires_at: i64,
    /// Extra claims supplied at issuance.
    pub claims: Map<String, Value>,
}

/// Issues and verifies signed, expiring tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime_secs: i64,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    /// Build a service on the system clock.
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a service on a caller-supplied clock.
    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock after the signature.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(&config.signing_key),
            decoding_key: DecodingKey::from_secret(&config.signing_key),
            validation,
            lifetime_secs: i64::try_from(config.lifetime.as_secs()).unwrap_or(i64::MAX),
            clock,
        }
    }

    /// Issue a token for `subject`, valid from now for the configured lifetime.
    pub fn issue(
        &self,
        subject: &str,
        extra_claims: Option<Map<String, Value>>,
    ) -> Result<String, TokenError> {
        let issued_at = self.clock.now();
        let mut extra = extra_claims.unwrap_or_default();
        extra.retain(|name, _| !RESERVED_CLAIMS.contains(&name.as_str()));

        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.lifetime_secs),
            extra,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify_decode_error(token, e.kind()))?;

        let claims = data.claims;
        if self.clock.now() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(VerifiedToken {
            subject: claims.sub,
            issued_at: claims.iat,
            expires_at: claims.exp,
            claims: claims.extra,
        })
    }

    /// Configured lifetime in seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }
}

/// Map a jsonwebtoken failure onto [`TokenError`].
///
/// jsonwebtoken rejects a signature segment with non-canonical base64 before
/// it compares signatures. When the header and claims are well formed, any
/// such failure is still a signature failure, not a malformed token.
fn classify_decode_error(token: &str, kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ if signed_parts_are_well_formed(token) => TokenError::SignatureInvalid,
        _ => TokenError::Malformed,
    }
}

/// Whether `token` has three segments, an HS256 header and parseable claims.
fn signed_parts_are_well_formed(token: &str) -> bool {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, claims, _signature] = segments.as_slice() else {
        return false;
    };

    let header_is_hs256 = Base64UrlUnpadded::decode_vec(header)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .is_some_and(|header| header["alg"] == "HS256");

    header_is_hs256
        && Base64UrlUnpadded::decode_vec(claims)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<TokenClaims>(&bytes).ok())
            .is_some()
}
