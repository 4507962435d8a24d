//! Credential lookup port: API key → role.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::Role;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential backend unavailable: {0}")]
    Backend(String),
}

/// Read-only view of provisioned credentials.
///
/// Provisioning is outside the service; implementations only resolve keys.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Resolve `api_key` to its role, or `None` if the key is unknown.
    async fn role_for(&self, api_key: &str) -> Result<Option<Role>, CredentialError>;
}

#[async_trait]
impl<S> CredentialStore for Arc<S>
where
    S: CredentialStore + ?Sized,
{
    async fn role_for(&self, api_key: &str) -> Result<Option<Role>, CredentialError> {
        (**self).role_for(api_key).await
    }
}

/// In-memory credential table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<HashMap<String, Role>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, api_key: impl Into<String>, role: Role) -> Self {
        self.insert(api_key, role);
        self
    }

    pub fn insert(&self, api_key: impl Into<String>, role: Role) {
        let mut guard = match self.inner.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(api_key.into(), role);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn role_for(&self, api_key: &str) -> Result<Option<Role>, CredentialError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| CredentialError::Backend("credential table lock poisoned".to_string()))?;
        Ok(guard.get(api_key).cloned())
    }
}
