//! Account management commands.
//!
//! # Usage
//!
//! ```bash
//! # Mark an account as verified without the email link
//! phonebook-cli user verify -e someone@example.com
//!
//! # Invalidate the current session token
//! phonebook-cli user logout -e someone@example.com
//! ```

use phonebook_core::Email;
use phonebook_server::db::{PgUserStore, UserStore};

use super::{CommandError, connect};

async fn load_store() -> Result<PgUserStore, CommandError> {
    Ok(PgUserStore::new(connect().await?))
}

async fn find_user(
    store: &PgUserStore,
    email: &str,
) -> Result<phonebook_server::models::User, CommandError> {
    let email = Email::parse(email)?;
    store
        .find_by_email(&email)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_string()))
}

/// Mark the account as verified.
pub async fn verify(email: &str) -> Result<(), CommandError> {
    let store = load_store().await?;
    let user = find_user(&store, email).await?;

    if user.verified {
        tracing::info!("{} is already verified", user.email);
        return Ok(());
    }

    let user = store.mark_verified(user.id).await?;
    tracing::info!("Verified {} (ID: {})", user.email, user.id);
    Ok(())
}

/// Clear the session token so the current bearer token stops working.
pub async fn logout(email: &str) -> Result<(), CommandError> {
    let store = load_store().await?;
    let user = find_user(&store, email).await?;

    if user.token.is_none() {
        tracing::info!("{} has no active session", user.email);
        return Ok(());
    }

    if store
        .swap_session_token(user.id, user.token_version, None)
        .await?
    {
        tracing::info!("Session of {} revoked", user.email);
    } else {
        tracing::warn!("Session of {} changed concurrently, run again", user.email);
    }
    Ok(())
}
