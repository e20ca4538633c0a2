//! Contact persistence.
//!
//! Every query is scoped by owner. A contact that exists but belongs to
//! someone else is indistinguishable from one that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;

use phonebook_core::{ContactId, UserId};

use super::RepositoryError;
use crate::models::contact::{Contact, ContactDraft, ContactFilter};

/// Storage operations on contacts, always on behalf of one owner.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// A page of the owner's contacts in creation order.
    async fn list(
        &self,
        owner: UserId,
        filter: ContactFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Contact>, RepositoryError>;

    /// Number of the owner's contacts passing `filter`.
    async fn count(&self, owner: UserId, filter: ContactFilter) -> Result<i64, RepositoryError>;

    async fn get(&self, owner: UserId, id: ContactId) -> Result<Option<Contact>, RepositoryError>;

    async fn create(&self, owner: UserId, draft: ContactDraft)
    -> Result<Contact, RepositoryError>;

    /// Overwrite name, email and phone. `favorite` only changes when present.
    async fn update(
        &self,
        owner: UserId,
        id: ContactId,
        draft: ContactDraft,
    ) -> Result<Option<Contact>, RepositoryError>;

    async fn set_favorite(
        &self,
        owner: UserId,
        id: ContactId,
        favorite: bool,
    ) -> Result<Option<Contact>, RepositoryError>;

    /// Returns `false` if nothing was deleted.
    async fn delete(&self, owner: UserId, id: ContactId) -> Result<bool, RepositoryError>;
}

const CONTACT_COLUMNS: &str = "id, name, email, phone, favorite, owner, created_at, updated_at";

/// `PostgreSQL`-backed [`ContactStore`].
#[derive(Clone)]
pub struct PgContactStore {
    pool: PgPool,
}

impl PgContactStore {
    /// Create a new contact store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for PgContactStore {
    async fn list(
        &self,
        owner: UserId,
        filter: ContactFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Contact>, RepositoryError> {
        let sql = format!(
            "SELECT {CONTACT_COLUMNS} FROM phonebook.contact \
             WHERE owner = $1 AND ($2::BOOLEAN IS NULL OR favorite = $2) \
             ORDER BY created_at, id \
             OFFSET $3 LIMIT $4"
        );
        let contacts = sqlx::query_as::<_, Contact>(&sql)
            .bind(owner)
            .bind(filter.favorite)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(contacts)
    }

    async fn count(&self, owner: UserId, filter: ContactFilter) -> Result<i64, RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM phonebook.contact \
             WHERE owner = $1 AND ($2::BOOLEAN IS NULL OR favorite = $2)",
        )
        .bind(owner)
        .bind(filter.favorite)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }

    async fn get(&self, owner: UserId, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let sql =
            format!("SELECT {CONTACT_COLUMNS} FROM phonebook.contact WHERE id = $1 AND owner = $2");
        sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn create(
        &self,
        owner: UserId,
        draft: ContactDraft,
    ) -> Result<Contact, RepositoryError> {
        let sql = format!(
            "INSERT INTO phonebook.contact (name, email, phone, favorite, owner) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {CONTACT_COLUMNS}"
        );
        let contact = sqlx::query_as::<_, Contact>(&sql)
            .bind(&draft.name)
            .bind(&draft.email)
            .bind(&draft.phone)
            .bind(draft.favorite.unwrap_or(false))
            .bind(owner)
            .fetch_one(&self.pool)
            .await?;

        Ok(contact)
    }

    async fn update(
        &self,
        owner: UserId,
        id: ContactId,
        draft: ContactDraft,
    ) -> Result<Option<Contact>, RepositoryError> {
        let sql = format!(
            "UPDATE phonebook.contact \
             SET name = $3, email = $4, phone = $5, \
                 favorite = COALESCE($6, favorite), updated_at = NOW() \
             WHERE id = $1 AND owner = $2 \
             RETURNING {CONTACT_COLUMNS}"
        );
        sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(owner)
            .bind(&draft.name)
            .bind(&draft.email)
            .bind(&draft.phone)
            .bind(draft.favorite)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn set_favorite(
        &self,
        owner: UserId,
        id: ContactId,
        favorite: bool,
    ) -> Result<Option<Contact>, RepositoryError> {
        let sql = format!(
            "UPDATE phonebook.contact SET favorite = $3, updated_at = NOW() \
             WHERE id = $1 AND owner = $2 \
             RETURNING {CONTACT_COLUMNS}"
        );
        sqlx::query_as::<_, Contact>(&sql)
            .bind(id)
            .bind(owner)
            .bind(favorite)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    async fn delete(&self, owner: UserId, id: ContactId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM phonebook.contact WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
