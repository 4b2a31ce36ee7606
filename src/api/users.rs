// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Auth, AuthenticatedContext, Role};

pub const AUTHENTICATED_MESSAGE: &str = "User authenticated successfully";

/// Response for GET /api/user/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    pub email: String,
    /// Role as currently stored, not as it was at login.
    pub role: Role,
    pub authorities: Vec<String>,
    pub message: String,
}

impl From<AuthenticatedContext> for UserMeResponse {
    fn from(context: AuthenticatedContext) -> Self {
        Self {
            email: context.identity.subject_id,
            role: context.identity.role,
            authorities: context.authorities,
            message: AUTHENTICATED_MESSAGE.to_string(),
        }
    }
}

/// Get the current authenticated user's information.
#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_current_user(Auth(context): Auth) -> Json<UserMeResponse> {
    Json(context.into())
}
