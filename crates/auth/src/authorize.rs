use std::sync::Arc;

use thiserror::Error;

use stockflow_core::ServiceError;

use crate::{AllowList, CredentialError, CredentialStore, Method, Role};

/// An authenticated caller, resolved from its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub api_key: String,
    pub role: Role,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("API key required")]
    MissingCredential,

    #[error("invalid API key")]
    UnknownCredential,

    #[error("method {method} not allowed for role '{role}'")]
    Forbidden { role: Role, method: Method },

    #[error(transparent)]
    Lookup(#[from] CredentialError),
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::MissingCredential | AuthzError::UnknownCredential => {
                ServiceError::unauthenticated(err.to_string())
            }
            AuthzError::Forbidden { .. } => ServiceError::permission_denied(err.to_string()),
            AuthzError::Lookup(_) => ServiceError::internal("failed to validate API key"),
        }
    }
}

/// Authorize a resolved role for a method.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(allow_list: &AllowList, role: &Role, method: Method) -> Result<(), AuthzError> {
    if allow_list.permits(role, method) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden {
            role: role.clone(),
            method,
        })
    }
}

/// Authenticates a credential and authorizes the requested method.
///
/// The gate holds no per-call state; it is consulted before any workflow code
/// runs, so a rejection can never leave a partial mutation behind.
#[derive(Clone)]
pub struct AuthorizationGate {
    credentials: Arc<dyn CredentialStore>,
    allow_list: Arc<AllowList>,
}

impl AuthorizationGate {
    pub fn new(credentials: Arc<dyn CredentialStore>, allow_list: AllowList) -> Self {
        Self {
            credentials,
            allow_list: Arc::new(allow_list),
        }
    }

    /// 1. missing credential → `MissingCredential`
    /// 2. unknown credential → `UnknownCredential`
    /// 3. method not granted to the role → `Forbidden`
    pub async fn check(&self, api_key: Option<&str>, method: Method) -> Result<Principal, AuthzError> {
        let api_key = match api_key {
            Some(k) if !k.is_empty() => k,
            _ => return Err(AuthzError::MissingCredential),
        };

        let role = match self.credentials.role_for(api_key).await {
            Ok(Some(role)) => role,
            Ok(None) => return Err(AuthzError::UnknownCredential),
            Err(e) => {
                tracing::error!(error = %e, "credential lookup failed");
                return Err(e.into());
            }
        };

        authorize(&self.allow_list, &role, method)?;

        Ok(Principal {
            api_key: api_key.to_string(),
            role,
        })
    }
}
