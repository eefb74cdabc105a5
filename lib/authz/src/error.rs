//! Authorization error types.
//!
//! The taxonomy keeps three conditions distinguishable at every layer:
//! a successful evaluation whose answer is "no" (`PermissionDenied`), an
//! evaluation that could not be completed (`Unavailable`), and a relationship
//! write that could not be confirmed (`WriteFailed`). An unavailable backend
//! is never coerced into a permit or a denial.

use crate::types::{ObjectType, Permission};
use palisade_core::UserId;
use std::fmt;

/// Authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    /// The policy was evaluated and the answer is "no".
    PermissionDenied {
        /// The user that requested access.
        user_id: UserId,
        /// The resource that was accessed.
        resource_id: String,
        /// The kind of resource.
        resource_type: ObjectType,
        /// The action that was requested.
        action: Permission,
    },
    /// The policy could not be evaluated (backend unreachable, timeout,
    /// malformed response).
    Unavailable {
        /// Error details.
        details: String,
    },
    /// A relationship write could not be confirmed. Safe to retry; create and
    /// delete are idempotent at the backend.
    WriteFailed {
        /// Error details.
        details: String,
    },
    /// Failed to connect to the relationship backend at startup.
    ConnectionFailed {
        /// Error details.
        details: String,
    },
}

impl AuthzError {
    /// Returns true if the policy was evaluated and answered "no".
    ///
    /// Denials are deterministic; retrying one is pointless.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Returns true if the policy could not be evaluated at all.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::ConnectionFailed { .. })
    }

    /// Returns true if a relationship write went unconfirmed.
    #[must_use]
    pub fn is_write_failure(&self) -> bool {
        matches!(self, Self::WriteFailed { .. })
    }
}

impl fmt::Display for AuthzError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied {
                user_id,
                resource_id,
                resource_type,
                action,
            } => {
                write!(
                    f,
                    "user '{user_id}' may not {action} {resource_type} '{resource_id}'"
                )
            }
            Self::Unavailable { details } => {
                write!(f, "authorization backend unavailable: {details}")
            }
            Self::WriteFailed { details } => {
                write!(f, "relationship write failed: {details}")
            }
            Self::ConnectionFailed { details } => {
                write!(f, "failed to connect to authorization backend: {details}")
            }
        }
    }
}

impl std::error::Error for AuthzError {}
