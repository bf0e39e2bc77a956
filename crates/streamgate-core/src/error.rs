//! Shared error type across streamgate crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Missing or malformed request fields.
    BadRequest,
    /// No subscription record for (subscriber, stream).
    SubscriptionNotFound,
    /// One or more access policies denied the request.
    RulesViolation,
    /// Collaborator fault or anything else the caller must not see.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "bad_request",
            ClientCode::SubscriptionNotFound => "subscription_not_found",
            ClientCode::RulesViolation => "rules_violation",
            ClientCode::Internal => "internal_error",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("subscription not found")]
    NotFound,
    #[error("rules violation: {}", .0.join(","))]
    PolicyViolation(Vec<String>),
    #[error("subscription lookup failed: {0}")]
    LookupFailed(String),
    #[error("access commit failed: {0}")]
    CommitFailed(String),
    #[error("data hash verification failed: {0}")]
    VerificationFailed(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl GateError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GateError::BadRequest(_) | GateError::UnsupportedVersion => ClientCode::BadRequest,
            GateError::NotFound => ClientCode::SubscriptionNotFound,
            GateError::PolicyViolation(_) => ClientCode::RulesViolation,
            GateError::LookupFailed(_)
            | GateError::CommitFailed(_)
            | GateError::VerificationFailed(_)
            | GateError::Internal(_) => ClientCode::Internal,
        }
    }
}
