// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User roles.
//!
//! A role is a single free-form label stored on the identity (`"USER"`,
//! `"ADMIN"`, ...). Request handling works with *authorities*, which are the
//! role label in the `ROLE_` namespace.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Namespace prefix applied to a role when it is turned into an authority.
pub const AUTHORITY_PREFIX: &str = "ROLE_";

/// Role assigned when registration does not name one.
pub const DEFAULT_ROLE: &str = "USER";

/// Role label of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// Build a role from optional registration input.
    ///
    /// Missing or blank input falls back to [`DEFAULT_ROLE`]; anything else is
    /// kept as given, minus surrounding whitespace.
    pub fn from_input(input: Option<&str>) -> Self {
        match input.map(str::trim) {
            Some(role) if !role.is_empty() => Role(role.to_string()),
            _ => Role::default(),
        }
    }

    /// The raw role label.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The role as an authority label (`ROLE_` prefixed exactly once).
    pub fn authority(&self) -> String {
        if self.0.starts_with(AUTHORITY_PREFIX) {
            self.0.clone()
        } else {
            format!("{AUTHORITY_PREFIX}{}", self.0)
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role(DEFAULT_ROLE.to_string())
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
