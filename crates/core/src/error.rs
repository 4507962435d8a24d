//! Service error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the service layer.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Classification of a failed call.
///
/// The string form (`as_str`) is what the audit trail records as the outcome
/// status, so the names are stable and must not change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    InvalidArgument,
    NotFound,
    FailedPrecondition,
    Unauthenticated,
    PermissionDenied,
    DeadlineExceeded,
    Internal,
}

impl Code {
    pub fn as_str(self) -> &'static str {
        match self {
            Code::InvalidArgument => "InvalidArgument",
            Code::NotFound => "NotFound",
            Code::FailedPrecondition => "FailedPrecondition",
            Code::Unauthenticated => "Unauthenticated",
            Code::PermissionDenied => "PermissionDenied",
            Code::DeadlineExceeded => "DeadlineExceeded",
            Code::Internal => "Internal",
        }
    }
}

impl core::fmt::Display for Code {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned to callers of a gated operation.
///
/// Messages are caller-facing. Infrastructure causes are logged where they
/// are converted into `Internal` and never leak into the message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Malformed or missing input, detected before any side effect.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// State machine or stock sufficiency violation.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Missing or unknown credential.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The credential's role may not invoke the method.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The call deadline expired; any open transaction was rolled back.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Storage or transaction failure.
    #[error("internal: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Self::FailedPrecondition(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn code(&self) -> Code {
        match self {
            ServiceError::InvalidArgument(_) => Code::InvalidArgument,
            ServiceError::NotFound(_) => Code::NotFound,
            ServiceError::FailedPrecondition(_) => Code::FailedPrecondition,
            ServiceError::Unauthenticated(_) => Code::Unauthenticated,
            ServiceError::PermissionDenied(_) => Code::PermissionDenied,
            ServiceError::DeadlineExceeded => Code::DeadlineExceeded,
            ServiceError::Internal(_) => Code::Internal,
        }
    }

    /// Caller-facing message without the code prefix.
    pub fn message(&self) -> String {
        match self {
            ServiceError::InvalidArgument(m)
            | ServiceError::NotFound(m)
            | ServiceError::FailedPrecondition(m)
            | ServiceError::Unauthenticated(m)
            | ServiceError::PermissionDenied(m)
            | ServiceError::Internal(m) => m.clone(),
            ServiceError::DeadlineExceeded => "deadline exceeded".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_use_canonical_names() {
        assert_eq!(ServiceError::invalid_argument("x").code().as_str(), "InvalidArgument");
        assert_eq!(ServiceError::failed_precondition("x").code().as_str(), "FailedPrecondition");
        assert_eq!(ServiceError::DeadlineExceeded.code().to_string(), "DeadlineExceeded");
    }

    #[test]
    fn message_strips_prefix() {
        let err = ServiceError::not_found("order not found");
        assert_eq!(err.message(), "order not found");
        assert_eq!(err.to_string(), "not found: order not found");
    }
}
