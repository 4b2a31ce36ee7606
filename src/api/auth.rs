// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Registration and login endpoints.
//!
//! Both routes sit under `/api/auth`, which the access policy leaves public.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, state::AppState};

pub const REGISTERED_MESSAGE: &str = "Registration completed successfully";
pub const LOGIN_MESSAGE: &str = "Login successful";

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Login identifier.
    pub email: String,
    pub password: String,
    /// Defaults to `USER` when absent or blank.
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub message: String,
    /// Bearer token, present on successful login only.
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none", default)]
    pub access_token: Option<String>,
}

impl AuthResponse {
    fn message(message: &str) -> Self {
        Self {
            message: message.to_string(),
            access_token: None,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "Auth",
    responses(
        (status = 201, description = "Identity registered", body = AuthResponse),
        (status = 400, description = "Malformed body or email already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    state
        .gate
        .register(&request.email, &request.password, request.role.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::message(REGISTERED_MESSAGE)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "Auth",
    responses(
        (status = 200, description = "Credentials accepted", body = AuthResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Invalid email or password"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let token = state.gate.login(&request.email, &request.password).await?;

    Ok(Json(AuthResponse {
        message: LOGIN_MESSAGE.to_string(),
        access_token: Some(token),
    }))
}
