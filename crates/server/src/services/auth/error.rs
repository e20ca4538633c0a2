//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::avatar::AvatarError;
use crate::services::email::EmailError;
use crate::services::token::TokenError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] phonebook_core::EmailError),

    /// Invalid phone format.
    #[error("invalid phone: {0}")]
    InvalidPhone(#[from] phonebook_core::PhoneError),

    /// Unknown subscription plan.
    #[error("invalid subscription: {0}")]
    InvalidSubscription(#[from] phonebook_core::SubscriptionError),

    /// Subscription update without a known plan.
    #[error("missing subscription option")]
    MissingSubscription,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Required email field absent.
    #[error("missing required field email")]
    MissingEmail,

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Correct credentials, but the email was never verified.
    #[error("email not verified")]
    NotVerified,

    /// Missing, invalid, expired or superseded session token.
    #[error("not authorized")]
    Unauthorized,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Verification requested for an account that is already verified.
    #[error("already verified")]
    AlreadyVerified,

    /// Another login or logout changed the session first.
    #[error("concurrent session change")]
    SessionConflict,

    /// Verification mail could not be delivered.
    #[error("email delivery failed: {0}")]
    Email(#[from] EmailError),

    /// Avatar upload failed.
    #[error("avatar error: {0}")]
    Avatar(#[from] AvatarError),

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
