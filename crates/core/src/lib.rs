//! Shared primitives for all Rust crates in Warrant.

#![forbid(unsafe_code)]

/// Authentication primitives handed over by the identity layer.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::AuthenticatedIdentity;

/// Result type used across Warrant crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// Policy denials and store failures are separate variants so callers can
/// map them to different outcomes (forbidden vs. server error).
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A role, grant or backend definition is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A policy predicate rejected the acting user.
    #[error("{message}")]
    AccessDenied {
        /// Acting user name.
        user: String,
        /// Human-readable denial reason.
        message: String,
    },

    /// A type-level permission check failed.
    #[error("User \"{user}\" doesn't have required permission \"{permission}\"")]
    ResourceTypeAccessDenied {
        /// Acting user name.
        user: String,
        /// Missing permission type.
        permission: String,
    },

    /// An instance-level permission check failed.
    #[error(
        "User \"{user}\" doesn't have required permission \"{permission}\" on resource \"{resource_uid}\""
    )]
    ResourceAccessDenied {
        /// Acting user name.
        user: String,
        /// Missing permission type.
        permission: String,
        /// UID of the resource the check ran against.
        resource_uid: String,
    },

    /// The backing store could not be reached or queried.
    #[error("store failure: {0}")]
    Store(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns whether the error is a policy denial.
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::AccessDenied { .. }
                | Self::ResourceTypeAccessDenied { .. }
                | Self::ResourceAccessDenied { .. }
        )
    }

    /// Returns whether the error originates from the backing store.
    #[must_use]
    pub fn is_store_failure(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}
