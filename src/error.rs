//! Error handling for the archive core

use std::fmt;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::identity::IdentityError;

/// Unified error type for the archive core
#[derive(Error, Debug)]
pub enum Error {
    /// The caller's role does not satisfy the operation's requirement.
    /// Raised synchronously at the store entry point, never reaches the backend.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Form-level validation failure, raised before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record the operation depends on is missing from the local cache
    #[error("not found: {0}")]
    NotFound(String),

    /// Asynchronous failure from the backend gateway
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Asynchronous failure from the identity provider
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a new permission error
    pub fn permission<T: fmt::Display>(msg: T) -> Self {
        Error::Permission(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Message suitable for direct display to the user.
    ///
    /// Provider-specific codes are translated; anything unrecognized falls
    /// back to a generic message rather than leaking internals.
    pub fn user_message(&self) -> String {
        match self {
            Error::Permission(msg) | Error::Validation(msg) => msg.clone(),
            Error::NotFound(_) => "The requested record could not be found.".to_string(),
            Error::Identity(err) => err.user_message().to_string(),
            Error::Gateway(_) | Error::Json(_) => {
                "The operation failed. Please try again.".to_string()
            }
        }
    }
}

/// Convenience result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;
