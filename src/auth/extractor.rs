// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated context.
//!
//! Use the `Auth` extractor in handlers that need the caller's identity:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(context): Auth) -> impl IntoResponse {
//!     // context is AuthenticatedContext
//! }
//! ```
//!
//! The extractors never verify tokens themselves. They read the context the
//! authentication middleware attached to the request.

use axum::{extract::FromRequestParts, http::request::Parts};

use super::{AuthError, AuthenticatedContext};
use crate::error::ApiError;

/// Extractor for the authenticated caller.
///
/// Rejects with 401 when the request carries no context, which only happens
/// if a handler is mounted on a public path.
pub struct Auth(pub AuthenticatedContext);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedContext>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}
