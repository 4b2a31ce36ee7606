// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path-based access policy.
//!
//! A static, ordered table decides whether a path is public or needs an
//! authenticated caller. The first matching rule wins; unmatched paths fall
//! back to the default rule, which requires authentication.
//!
//! Patterns are either exact (`/health`) or a subtree (`/api/auth/**`, which
//! matches `/api/auth` and everything below it but not `/api/authx`).

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::{AuthError, AuthenticatedContext};
use crate::error::ApiError;
use crate::state::AppState;

/// Paths reachable without authentication in the default policy.
pub const DEFAULT_PUBLIC_PATHS: [&str; 4] = [
    "/api/auth/**",
    "/health/**",
    "/docs/**",
    "/api-doc/**",
];

/// Paths the default policy protects by name. Anything else unmatched is
/// protected by the fallback rule.
pub const DEFAULT_PROTECTED_PATHS: [&str; 2] = ["/", "/api/user/**"];

/// What a matched path requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRule {
    /// Reachable by anyone.
    Public,
    /// Requires an authenticated context.
    Authenticated,
}

/// A path pattern in the policy table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    Subtree(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        match pattern.strip_suffix("/**") {
            Some(base) => PathPattern::Subtree(base.to_string()),
            None => PathPattern::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(exact) => path == exact,
            PathPattern::Subtree(base) => match path.strip_prefix(base.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
        }
    }
}

/// Ordered access rules with an authenticated-by-default fallback.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<(PathPattern, AccessRule)>,
    fallback: AccessRule,
}

impl AccessPolicy {
    /// A policy where every path requires authentication.
    pub fn deny_by_default() -> Self {
        Self {
            rules: Vec::new(),
            fallback: AccessRule::Authenticated,
        }
    }

    /// Mark paths matching `pattern` as public.
    pub fn permit(mut self, pattern: &str) -> Self {
        self.rules.push((PathPattern::parse(pattern), AccessRule::Public));
        self
    }

    /// Mark paths matching `pattern` as requiring authentication.
    pub fn require(mut self, pattern: &str) -> Self {
        self.rules.push((PathPattern::parse(pattern), AccessRule::Authenticated));
        self
    }

    /// The rule governing `path`.
    pub fn rule_for(&self, path: &str) -> AccessRule {
        self.rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, rule)| *rule)
            .unwrap_or(self.fallback)
    }

    /// Decide whether a request for `path` may proceed.
    pub fn check(
        &self,
        path: &str,
        context: Option<&AuthenticatedContext>,
    ) -> Result<(), AuthError> {
        match (self.rule_for(path), context) {
            (AccessRule::Public, _) | (AccessRule::Authenticated, Some(_)) => Ok(()),
            (AccessRule::Authenticated, None) => Err(AuthError::Unauthenticated),
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        let policy = DEFAULT_PUBLIC_PATHS
            .iter()
            .fold(Self::deny_by_default(), |policy, pattern| policy.permit(pattern));
        DEFAULT_PROTECTED_PATHS
            .iter()
            .fold(policy, |policy, pattern| policy.require(pattern))
    }
}

/// Access policy middleware function.
///
/// Must run after [`super::middleware::authenticate_request`].
pub async fn enforce_access_policy(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let context = request.extensions().get::<AuthenticatedContext>();

    if let Err(e) = state.policy.check(path, context) {
        tracing::debug!(path = %path, "request rejected by access policy");
        return ApiError::from(e).into_response();
    }

    next.run(request).await
}
