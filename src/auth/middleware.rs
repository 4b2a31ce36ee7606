// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-request bearer authentication.
//!
//! Every inbound request passes through [`authenticate_request`] before any
//! handler runs. A request starts unauthenticated; if it carries a valid
//! `Authorization: Bearer <token>` whose subject still resolves, an
//! [`AuthenticatedContext`] is inserted into the request extensions.
//!
//! Nothing here rejects a request. A missing header, a bad token, or a
//! vanished subject all leave the request unauthenticated, and the access
//! policy layer decides what happens next. Only store failures end the
//! request early, with a 500.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::token::TokenService;
use super::{AuthError, AuthenticatedContext, IdentityLookup};
use crate::error::ApiError;
use crate::state::AppState;

/// Scheme marker expected in the `Authorization` header.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Verifies bearer tokens and re-resolves their subjects.
#[derive(Clone)]
pub struct RequestAuthenticator {
    tokens: Arc<TokenService>,
    lookup: IdentityLookup,
}

impl RequestAuthenticator {
    pub fn new(tokens: Arc<TokenService>, lookup: IdentityLookup) -> Self {
        Self { tokens, lookup }
    }

    /// Authenticate a request from its headers.
    ///
    /// `Ok(None)` means "continue unauthenticated". `Err` is reserved for
    /// internal failures, which must not be mistaken for a bad token.
    pub async fn authenticate(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedContext>, AuthError> {
        let Some(token) = bearer_token(headers) else {
            return Ok(None);
        };

        match self.verify(token).await {
            Ok(context) => Ok(Some(context)),
            Err(e) if e.is_internal() => Err(e),
            Err(e) => {
                tracing::debug!(
                    error_code = e.error_code(),
                    error = %e,
                    "bearer token rejected, continuing unauthenticated"
                );
                Ok(None)
            }
        }
    }

    async fn verify(&self, token: &str) -> Result<AuthenticatedContext, AuthError> {
        let verified = self.tokens.verify(token)?;

        let identity = self
            .lookup
            .resolve(&verified.subject)
            .await?
            .ok_or(AuthError::SubjectNotFound)?;

        // The role comes from the store, never from the token.
        if identity.subject_id != verified.subject {
            return Err(AuthError::SubjectNotFound);
        }

        Ok(AuthenticatedContext::new(identity, verified.expires_at))
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
///
/// Returns `None` when the header is absent, not valid UTF-8, or uses another
/// scheme.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
}

/// Authentication middleware function.
///
/// Runs once per request. A request that already carries a context is passed
/// through untouched.
pub async fn authenticate_request(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if request.extensions().get::<AuthenticatedContext>().is_none() {
        match state.authenticator.authenticate(request.headers()).await {
            Ok(Some(context)) => {
                tracing::debug!(subject = %context.subject_id(), "request authenticated");
                request.extensions_mut().insert(context);
            }
            Ok(None) => {}
            Err(e) => return ApiError::from(e).into_response(),
        }
    }

    next.run(request).await
}
