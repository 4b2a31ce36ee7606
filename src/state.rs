// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::{
    AccessPolicy, AuthError, AuthGate, CredentialEncoder, IdentityLookup, RequestAuthenticator,
    TokenService,
};
use crate::storage::SharedIdentityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: SharedIdentityStore,
    pub tokens: Arc<TokenService>,
    pub gate: Arc<AuthGate>,
    pub authenticator: RequestAuthenticator,
    pub policy: Arc<AccessPolicy>,
}

impl AppState {
    pub fn new(
        store: SharedIdentityStore,
        encoder: Arc<dyn CredentialEncoder>,
        tokens: Arc<TokenService>,
    ) -> Result<Self, AuthError> {
        Self::with_policy(store, encoder, tokens, AccessPolicy::default())
    }

    pub fn with_policy(
        store: SharedIdentityStore,
        encoder: Arc<dyn CredentialEncoder>,
        tokens: Arc<TokenService>,
        policy: AccessPolicy,
    ) -> Result<Self, AuthError> {
        let gate = AuthGate::new(Arc::clone(&store), encoder, Arc::clone(&tokens))?;
        let authenticator =
            RequestAuthenticator::new(Arc::clone(&tokens), IdentityLookup::new(Arc::clone(&store)));

        Ok(Self {
            store,
            tokens,
            gate: Arc::new(gate),
            authenticator,
            policy: Arc::new(policy),
        })
    }
}
