// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Stateless bearer-token authentication for the catering API.
//!
//! ## Auth Flow
//!
//! 1. Client registers (`POST /api/auth/register`); the secret is stored as a
//!    bcrypt hash
//! 2. Client logs in (`POST /api/auth/login`) and receives a signed HS256
//!    token carrying `sub`, `iat` and `exp`
//! 3. Client sends `Authorization: Bearer <token>` on every other call
//! 4. Server, per request:
//!    - verifies signature, then expiry
//!    - re-resolves the subject from the identity store (current role)
//!    - attaches an [`AuthenticatedContext`] to the request
//!    - applies the [`AccessPolicy`]
//!
//! ## Security
//!
//! - No server-side sessions; expiry is the only way a token stops working
//! - Unknown subject and wrong password produce the same login failure
//! - Invalid tokens never fail a request directly; they leave it
//!   unauthenticated and the access policy rejects it if needed

pub mod clock;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod identity;
pub mod lookup;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod roles;
pub mod token;

pub use error::AuthError;
pub use extractor::Auth;
pub use gate::AuthGate;
pub use identity::{AuthenticatedContext, Identity};
pub use lookup::IdentityLookup;
pub use middleware::RequestAuthenticator;
pub use password::{BcryptEncoder, CredentialEncoder};
pub use policy::{AccessPolicy, AccessRule};
pub use roles::Role;
pub use token::{TokenConfig, TokenError, TokenService, VerifiedToken};
