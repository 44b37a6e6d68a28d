//! Per-role session store.
//!
//! Holds the opaque token for one role and writes every change straight
//! through to [`TokenStorage`]. An empty token means unauthenticated.

use std::sync::RwLock;

use tracing::debug;

use crate::error::{PanelError, PanelResult};
use crate::models::Role;
use crate::storage::TokenStorage;

pub struct SessionStore {
    role: Role,
    storage: TokenStorage,
    token: RwLock<String>,
}

impl SessionStore {
    /// Loads whatever token was persisted for `role`.
    pub fn load(role: Role, storage: TokenStorage) -> PanelResult<Self> {
        let token = storage.token(role)?.unwrap_or_default();
        debug!(role = role.as_str(), authenticated = !token.is_empty(), "session loaded");
        Ok(Self { role, storage, token: RwLock::new(token) })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> String {
        self.token.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    /// Persists `token`; an empty string clears the session.
    pub fn set_token(&self, token: &str) -> PanelResult<()> {
        self.storage.set_token(self.role, token)?;
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = token.to_string();
        debug!(role = self.role.as_str(), cleared = token.is_empty(), "session token updated");
        Ok(())
    }

    pub fn clear(&self) -> PanelResult<()> {
        self.set_token("")
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.read().unwrap_or_else(|poisoned| poisoned.into_inner()).is_empty()
    }

    /// Token for an authenticated request.
    pub fn require_token(&self) -> PanelResult<String> {
        let token = self.token();
        if token.is_empty() {
            Err(PanelError::NotAuthenticated)
        } else {
            Ok(token)
        }
    }

    pub fn storage(&self) -> &TokenStorage {
        &self.storage
    }
}
