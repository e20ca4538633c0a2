//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use phonebook_core::{Email, Phone, Subscription, UserId};

/// A registered account (domain type).
///
/// The password hash is deliberately absent. It is only ever read through
/// [`UserStore::find_credentials`](crate::db::UserStore::find_credentials).
#[derive(Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Normalized email address, unique across users.
    pub email: Email,
    /// Optional contact phone given at registration.
    pub phone: Option<Phone>,
    /// Subscription tier.
    pub subscription: Subscription,
    /// Current session token. `None` means logged out.
    pub token: Option<String>,
    /// Bumped on every session change; guards token writes.
    pub token_version: i64,
    /// Whether the email address has been verified.
    pub verified: bool,
    /// Outstanding verification token, cleared once verified.
    pub verification_token: Option<String>,
    /// Public avatar location.
    pub avatar_url: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("subscription", &self.subscription)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_version", &self.token_version)
            .field("verified", &self.verified)
            .finish_non_exhaustive()
    }
}

/// Everything needed to insert a new, unverified user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: Email,
    pub password_hash: String,
    pub phone: Option<Phone>,
    pub subscription: Subscription,
    pub verification_token: String,
    pub avatar_url: String,
}

/// Body of `GET /auth/current`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub email: Email,
    pub phone: Option<Phone>,
    pub subscription: Subscription,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            phone: user.phone.clone(),
            subscription: user.subscription,
        }
    }
}

/// Public view of an account. Never carries secrets.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: Email,
    pub phone: Option<Phone>,
    pub subscription: Subscription,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    pub verify: bool,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone: user.phone,
            subscription: user.subscription,
            avatar_url: user.avatar_url,
            verify: user.verified,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(1),
            email: Email::parse("a@b.co").unwrap(),
            phone: None,
            subscription: Subscription::Starter,
            token: Some("header.payload.signature".to_string()),
            token_version: 3,
            verified: true,
            verification_token: None,
            avatar_url: "/avatars/1.png".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let output = format!("{:?}", sample_user());
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("header.payload.signature"));
    }

    #[test]
    fn test_current_user_shape() {
        let json = serde_json::to_value(CurrentUser::from(&sample_user())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "a@b.co", "phone": null, "subscription": "starter"})
        );
    }

    #[test]
    fn test_user_view_hides_session() {
        let json = serde_json::to_value(UserView::from(sample_user())).unwrap();
        assert_eq!(json["avatarURL"], "/avatars/1.png");
        assert_eq!(json["verify"], true);
        assert!(json.get("token").is_none());
    }
}
