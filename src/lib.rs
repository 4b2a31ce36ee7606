// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! EventPro Catering - Authentication Server
//!
//! Stateless bearer-token authentication for the catering events backend.
//! Clients register and log in with email and password, receive a signed
//! HS256 token, and present it on every other call.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Credential hashing, tokens, request authentication, access policy
//! - `config` - Environment configuration
//! - `storage` - Identity store (file-backed or in-memory)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
