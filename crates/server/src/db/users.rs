//! User persistence.
//!
//! Session tokens are written with a compare-and-swap on `token_version`:
//! a write only lands if the caller saw the latest version, so two racing
//! logins cannot silently clobber each other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use phonebook_core::{Email, Phone, Subscription, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::user::{NewUser, User};

/// Storage operations on user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new unverified user.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Load a user together with their password hash.
    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Set `verify = true` and clear the verification token.
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    async fn mark_verified(&self, id: UserId) -> Result<User, RepositoryError>;

    /// Replace the session token if `token_version` still equals `expected_version`.
    ///
    /// Returns `false` when another session change got there first.
    async fn swap_session_token(
        &self,
        id: UserId,
        expected_version: i64,
        token: Option<&str>,
    ) -> Result<bool, RepositoryError>;

    async fn update_subscription(
        &self,
        id: UserId,
        subscription: Subscription,
    ) -> Result<Option<User>, RepositoryError>;

    async fn update_avatar(
        &self,
        id: UserId,
        avatar_url: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Cheap round-trip used by `/health/ready`.
    async fn health_check(&self) -> Result<(), RepositoryError>;
}

const USER_COLUMNS: &str = "id, email, phone, subscription, token, token_version, verify, \
                            verification_token, avatar_url, created_at, updated_at";

/// Columns decode into the validated core types, so a malformed value
/// surfaces as a decode error rather than reaching the domain.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: UserId,
    email: Email,
    phone: Option<Phone>,
    subscription: Subscription,
    token: Option<String>,
    token_version: i64,
    verify: bool,
    verification_token: Option<String>,
    avatar_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            phone: row.phone,
            subscription: row.subscription,
            token: row.token,
            token_version: row.token_version,
            verified: row.verify,
            verification_token: row.verification_token,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// `PostgreSQL`-backed [`UserStore`].
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, lookup: Lookup<'_>) -> Result<Option<User>, RepositoryError> {
        let predicate = match lookup {
            Lookup::Id(_) => "id = $1",
            Lookup::Email(_) => "email = $1",
            Lookup::VerificationToken(_) => "verification_token = $1",
        };
        let sql = format!("SELECT {USER_COLUMNS} FROM phonebook.user WHERE {predicate}");

        let query = sqlx::query_as::<_, UserRow>(&sql);
        let query = match lookup {
            Lookup::Id(id) => query.bind(id),
            Lookup::Email(email) => query.bind(email),
            Lookup::VerificationToken(token) => query.bind(token),
        };

        query
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(Into::into)
    }
}

#[derive(Clone, Copy)]
enum Lookup<'a> {
    Id(UserId),
    Email(&'a Email),
    VerificationToken(&'a str),
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO phonebook.user \
                 (email, password, phone, subscription, verification_token, avatar_url) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.phone)
            .bind(new_user.subscription)
            .bind(&new_user.verification_token)
            .bind(&new_user.avatar_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, "email"))?;

        Ok(User::from(row))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.find_one(Lookup::Id(id)).await
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.find_one(Lookup::Email(email)).await
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, password FROM phonebook.user WHERE email = $1");
        let row = sqlx::query_as::<_, CredentialRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some((User::from(r.user), r.password))),
            None => Ok(None),
        }
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.find_one(Lookup::VerificationToken(token)).await
    }

    async fn mark_verified(&self, id: UserId) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE phonebook.user \
             SET verify = TRUE, verification_token = NULL, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn swap_session_token(
        &self,
        id: UserId,
        expected_version: i64,
        token: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE phonebook.user \
             SET token = $3, token_version = token_version + 1, updated_at = NOW() \
             WHERE id = $1 AND token_version = $2",
        )
        .bind(id)
        .bind(expected_version)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_subscription(
        &self,
        id: UserId,
        subscription: Subscription,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "UPDATE phonebook.user SET subscription = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(subscription)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(Into::into)
    }

    async fn update_avatar(
        &self,
        id: UserId,
        avatar_url: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!(
            "UPDATE phonebook.user SET avatar_url = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(avatar_url)
            .fetch_optional(&self.pool)
            .await
            .map(|row| row.map(User::from))
            .map_err(Into::into)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
