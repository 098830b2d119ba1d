//! Identity provider abstraction
//!
//! Credential verification and session-change notification are delegated to
//! an external service; this module defines the consumed surface and the
//! provider's error-code taxonomy.

use async_trait::async_trait;
use thiserror::Error;

use crate::gateway::Subscription;

/// A provider-native user: the provider-assigned uid plus the email the
/// account was registered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
}

/// Errors raised by the identity provider, keyed by provider code
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("too many attempts")]
    TooManyAttempts,

    #[error("invalid email")]
    InvalidEmail,

    #[error("email already in use")]
    EmailInUse,

    #[error("weak password")]
    WeakPassword,

    #[error("account disabled")]
    AccountDisabled,

    /// Unrecognized provider failure
    #[error("provider error: {0}")]
    Provider(String),
}

impl IdentityError {
    /// Map a provider code to a user-facing message, with a generic fallback
    /// for unrecognized codes
    pub fn user_message(&self) -> &'static str {
        match self {
            IdentityError::InvalidCredentials => "The email or password is incorrect.",
            IdentityError::UserNotFound => "No account exists for this email.",
            IdentityError::TooManyAttempts => {
                "Too many failed attempts. Please try again later."
            }
            IdentityError::InvalidEmail => "The email address is not valid.",
            IdentityError::EmailInUse => "An account with this email already exists.",
            IdentityError::WeakPassword => "The password is too weak.",
            IdentityError::AccountDisabled => "This account has been disabled.",
            IdentityError::Provider(_) => "Sign-in failed. Please try again.",
        }
    }
}

/// Callback invoked on every authentication state transition
pub type AuthStateHandler = Box<dyn Fn(Option<ProviderUser>) + Send + Sync>;

/// External authentication service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify credentials and open a session
    async fn sign_in(&self, email: &str, password: &str)
        -> Result<ProviderUser, IdentityError>;

    /// Create a provider account
    async fn sign_up(&self, email: &str, password: &str)
        -> Result<ProviderUser, IdentityError>;

    /// Close the current session
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Register for authentication state changes; the handler fires with the
    /// current provider user, or `None` when signed out
    fn on_auth_state_changed(&self, handler: AuthStateHandler) -> Subscription;
}
