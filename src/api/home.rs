// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

pub const HOME_MESSAGE: &str = "Catering API is running";

/// Welcome text. Protected like every route outside the public set.
#[utoipa::path(
    get,
    path = "/",
    tag = "Home",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Service banner", body = String),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn home() -> &'static str {
    HOME_MESSAGE
}
