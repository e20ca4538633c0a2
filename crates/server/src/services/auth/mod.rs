//! Authentication service.
//!
//! Password accounts with email verification and a single bearer session per
//! user.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use uuid::Uuid;

use phonebook_core::{Email, Phone, Subscription, UserId};

use crate::config::PhonebookConfig;
use crate::db::{RepositoryError, UserStore};
use crate::models::user::{NewUser, User};
use crate::services::avatar::{AvatarStorage, AvatarUpload};
use crate::services::email::Mailer;
use crate::services::token::TokenService;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// Fields accepted by [`AuthService::register`], as sent by the client.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub subscription: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Authentication service.
///
/// Handles registration, email verification, login/logout and profile updates.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    mailer: &'a dyn Mailer,
    tokens: &'a TokenService,
    avatars: &'a AvatarStorage,
    config: &'a PhonebookConfig,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(
        users: &'a dyn UserStore,
        mailer: &'a dyn Mailer,
        tokens: &'a TokenService,
        avatars: &'a AvatarStorage,
        config: &'a PhonebookConfig,
    ) -> Self {
        Self {
            users,
            mailer,
            tokens,
            avatars,
            config,
        }
    }

    // =========================================================================
    // Registration & Verification
    // =========================================================================

    /// Register a new, unverified user and mail them a verification link.
    ///
    /// The user is persisted before the mail goes out. If delivery fails the
    /// account stays unverified and `AuthError::Email` is returned.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::WeakPassword`,
    /// `AuthError::InvalidSubscription` or `AuthError::InvalidPhone` for bad input.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(&self, registration: Registration<'_>) -> Result<User, AuthError> {
        let email = Email::parse(registration.email)?;
        validate_password(registration.password)?;
        let subscription = registration
            .subscription
            .map(str::parse::<Subscription>)
            .transpose()?
            .unwrap_or_default();
        let phone = registration.phone.map(Phone::parse).transpose()?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(registration.password)?;
        let new_user = NewUser {
            avatar_url: gravatar_url(&email),
            email,
            password_hash,
            phone,
            subscription,
            verification_token: Uuid::new_v4().to_string(),
        };

        let user = self.users.create(new_user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");

        self.send_verification(&user).await?;
        Ok(user)
    }

    /// Mark the user holding `verification_token` as verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no user holds the token.
    pub async fn verify_email(&self, verification_token: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .find_by_verification_token(verification_token)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let user = self.users.mark_verified(user.id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(user)
    }

    /// Send the existing verification link again.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingEmail` when no email is given,
    /// `AuthError::UserNotFound` for unknown addresses and
    /// `AuthError::AlreadyVerified` if there is nothing left to verify.
    pub async fn resend_verification(&self, email: Option<&str>) -> Result<(), AuthError> {
        let email = Email::parse(email.ok_or(AuthError::MissingEmail)?)?;

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.verified {
            return Err(AuthError::AlreadyVerified);
        }

        self.send_verification(&user).await
    }

    async fn send_verification(&self, user: &User) -> Result<(), AuthError> {
        let token = user.verification_token.as_deref().ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "unverified user {} has no verification token",
                user.id
            ))
        })?;
        let link = self.config.verification_link(token);

        self.mailer
            .send_verification(&user.email, &link)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %user.id, error = %e, "Failed to send verification email");
                AuthError::Email(e)
            })
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    /// Login with email and password, returning a fresh session token.
    ///
    /// The new token replaces any previous session of the user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong,
    /// `AuthError::NotVerified` for unverified accounts and
    /// `AuthError::SessionConflict` if a concurrent session change won.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let (user, password_hash) = self
            .users
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if !user.verified {
            return Err(AuthError::NotVerified);
        }

        let token = self.tokens.issue(user.id)?;
        if !self
            .users
            .swap_session_token(user.id, user.token_version, Some(&token))
            .await?
        {
            tracing::warn!(user_id = %user.id, "Login lost a race with another session change");
            return Err(AuthError::SessionConflict);
        }

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(token)
    }

    /// Clear the session of `user`.
    ///
    /// If the session already changed since `user` was loaded, the presented
    /// token is no longer current and there is nothing to clear.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the store fails.
    pub async fn logout(&self, user: &User) -> Result<(), AuthError> {
        let cleared = self
            .users
            .swap_session_token(user.id, user.token_version, None)
            .await?;

        if cleared {
            tracing::info!(user_id = %user.id, "User logged out");
        } else {
            tracing::debug!(user_id = %user.id, "Session already superseded at logout");
        }
        Ok(())
    }

    /// Resolve a bearer token to its user.
    ///
    /// The token must carry a valid signature, be unexpired, and still be the
    /// user's current session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthorized` on any mismatch.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AuthError::Unauthorized
        })?;
        let user_id = claims.user_id().map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if user.token.as_deref() != Some(token) {
            return Err(AuthError::Unauthorized);
        }

        Ok(user)
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Change the subscription plan.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingSubscription` unless `subscription` names a
    /// known plan, and `AuthError::UserNotFound` if the user is gone.
    pub async fn update_subscription(
        &self,
        user_id: UserId,
        subscription: Option<&str>,
    ) -> Result<User, AuthError> {
        let subscription = subscription
            .and_then(|s| s.parse::<Subscription>().ok())
            .ok_or(AuthError::MissingSubscription)?;

        self.users
            .update_subscription(user_id, subscription)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Store a new avatar and point the user at it. Returns the public URL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Avatar` if the upload is unusable or cannot be
    /// stored, and `AuthError::UserNotFound` if the user is gone.
    pub async fn update_avatar(
        &self,
        user_id: UserId,
        upload: AvatarUpload,
    ) -> Result<String, AuthError> {
        let avatar_url = self.avatars.store(user_id, upload).await?;

        self.users
            .update_avatar(user_id, &avatar_url)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(avatar_url)
    }
}

/// Default avatar for `email`.
#[must_use]
pub fn gravatar_url(email: &Email) -> String {
    format!(
        "https://www.gravatar.com/avatar/{:x}",
        md5::compute(email.as_bytes())
    )
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
