// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::http::StatusCode;

use super::password::HashError;
use super::token::TokenError;
use crate::storage::StorageError;

/// Message shared by every failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Message for requests rejected by the access policy.
pub const UNAUTHENTICATED_MESSAGE: &str = "Authentication required";

/// Authentication error type.
///
/// Token failures and `SubjectNotFound` are produced while authenticating a
/// request and only ever logged; the request then continues without an
/// identity and the access policy decides. The rest reach the client through
/// [`crate::error::ApiError`].
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Registration for a subject that already exists
    #[error("{0} is already registered")]
    DuplicateSubject(String),
    /// Unknown subject or wrong secret (deliberately indistinguishable)
    #[error("{}", INVALID_CREDENTIALS_MESSAGE)]
    InvalidCredentials,
    /// Bearer token failed verification
    #[error(transparent)]
    Token(#[from] TokenError),
    /// Token verified but its subject no longer resolves
    #[error("token subject no longer exists")]
    SubjectNotFound,
    /// Protected path reached without an authenticated identity
    #[error("{}", UNAUTHENTICATED_MESSAGE)]
    Unauthenticated,
    /// Request body failed validation
    #[error("{0}")]
    InvalidRequest(String),
    /// Identity store failure
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
    /// Any other internal failure
    #[error("internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::DuplicateSubject(_) => "duplicate_subject",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Token(e) => e.error_code(),
            AuthError::SubjectNotFound => "subject_not_found",
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidRequest(_) => "invalid_request",
            AuthError::Storage(_) | AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::DuplicateSubject(_) | AuthError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::InvalidCredentials
            | AuthError::SubjectNotFound
            | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Token(TokenError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Token(_) => StatusCode::UNAUTHORIZED,
            AuthError::Storage(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error is a server-side fault rather than a client mistake.
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<HashError> for AuthError {
    fn from(e: HashError) -> Self {
        AuthError::Internal(e.to_string())
    }
}
