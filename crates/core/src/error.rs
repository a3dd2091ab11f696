//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Which subscription quota an admission decision is about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Users,
    Projects,
}

impl QuotaKind {
    /// Singular noun used in operator-facing messages.
    pub fn noun(&self) -> &'static str {
        match self {
            QuotaKind::Users => "user",
            QuotaKind::Projects => "project",
        }
    }
}

impl core::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.noun())
    }
}

/// Domain-level error.
///
/// The taxonomy is closed: every failure an operation can surface maps to
/// exactly one of these. Infrastructure faults collapse into `Internal`
/// before they cross the domain boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The target resource does not exist within the caller's visibility.
    #[error("not found: {0}")]
    NotFound(String),

    /// The caller is authenticated but not permitted to do this.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A uniqueness or state conflict (e.g. duplicate subdomain).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A subscription limit would be exceeded. Distinct from `Forbidden`
    /// so callers can suggest a plan upgrade.
    #[error("subscription {0} limit reached")]
    QuotaExceeded(QuotaKind),

    /// Missing or invalid credentials.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Unexpected infrastructure failure. Details stay server-side.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn quota(kind: QuotaKind) -> Self {
        Self::QuotaExceeded(kind)
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable machine-readable code, as it appears in API envelopes and logs.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::NotFound(_) => "not_found",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::Conflict(_) => "conflict",
            DomainError::QuotaExceeded(_) => "quota_exceeded",
            DomainError::Unauthenticated(_) => "unauthenticated",
            DomainError::Internal(_) => "internal",
        }
    }

    /// Operator-facing message without the taxonomy prefix `Display` adds.
    /// Internal details never leave the server; callers see a generic line.
    pub fn message(&self) -> String {
        match self {
            DomainError::Validation(msg)
            | DomainError::NotFound(msg)
            | DomainError::Forbidden(msg)
            | DomainError::Conflict(msg)
            | DomainError::Unauthenticated(msg) => msg.clone(),
            DomainError::QuotaExceeded(kind) => format!("Subscription {kind} limit reached"),
            DomainError::Internal(_) => "Server Error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_error_names_the_limited_resource() {
        let err = DomainError::quota(QuotaKind::Projects);
        assert_eq!(err.to_string(), "subscription project limit reached");
        assert_eq!(err.message(), "Subscription project limit reached");
        assert_eq!(err.code(), "quota_exceeded");
    }

    #[test]
    fn internal_details_stay_server_side() {
        let err = DomainError::internal("pool exhausted on node 3");
        assert_eq!(err.message(), "Server Error");
        assert!(err.to_string().contains("pool exhausted"));
    }

    #[test]
    fn codes_are_stable() {
        let cases = [
            (DomainError::validation("x"), "validation"),
            (DomainError::not_found("x"), "not_found"),
            (DomainError::forbidden("x"), "forbidden"),
            (DomainError::conflict("x"), "conflict"),
            (DomainError::quota(QuotaKind::Users), "quota_exceeded"),
            (DomainError::unauthenticated("x"), "unauthenticated"),
            (DomainError::internal("x"), "internal"),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code);
        }
    }
}
