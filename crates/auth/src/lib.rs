//! `stockflow-auth`: credential authentication and role-based method gating.
//!
//! This crate is decoupled from HTTP and from any concrete storage: credentials
//! are resolved through the `CredentialStore` port and the role→method policy
//! is an injected `AllowList`.

pub mod allow_list;
pub mod authorize;
pub mod credentials;
pub mod methods;
pub mod roles;

pub use allow_list::AllowList;
pub use authorize::{AuthorizationGate, AuthzError, Principal};
pub use credentials::{CredentialError, CredentialStore, InMemoryCredentialStore};
pub use methods::Method;
pub use roles::Role;
