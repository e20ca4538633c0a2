//! Contact service: validation, ownership and pagination on top of a
//! [`ContactStore`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use phonebook_core::{
    ContactEmail, ContactId, ContactName, ContactNameError, EmailError, Phone, PhoneError, UserId,
};

use crate::db::{ContactStore, RepositoryError};
use crate::models::contact::{Contact, ContactDraft, ContactFilter};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;

/// Errors from contact operations.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("{0}")]
    InvalidName(#[from] ContactNameError),

    #[error("{0}")]
    InvalidPhone(#[from] PhoneError),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// `page` or `limit` below 1.
    #[error("Invalid page or limit")]
    InvalidPagination,

    #[error("missing field favorite")]
    MissingFavorite,

    /// Missing, or owned by someone else.
    #[error("Contact not found")]
    NotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contact fields as sent by the client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub favorite: Option<bool>,
}

impl ContactInput {
    /// Check required fields and patterns.
    ///
    /// # Errors
    ///
    /// Returns the first failing field as a `ContactError`.
    pub fn validate(self) -> Result<ContactDraft, ContactError> {
        let name = ContactName::parse(self.name.as_deref().unwrap_or_default())?;
        let phone = Phone::parse(self.phone.as_deref().unwrap_or_default())?;
        let email = self.email.as_deref().map(ContactEmail::parse).transpose()?;

        Ok(ContactDraft {
            name,
            email,
            phone,
            favorite: self.favorite,
        })
    }
}

/// Query string of `GET /contacts`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub favorite: Option<bool>,
}

/// One page of contacts.
#[derive(Debug, Clone, Serialize)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    /// Number of contacts matching the filter, across all pages.
    pub total: i64,
    /// Page actually returned, after clamping.
    pub page: i64,
    pub limit: i64,
}

/// Contact operations on behalf of an authenticated owner.
pub struct ContactService<'a> {
    contacts: &'a dyn ContactStore,
}

impl<'a> ContactService<'a> {
    #[must_use]
    pub fn new(contacts: &'a dyn ContactStore) -> Self {
        Self { contacts }
    }

    /// List the owner's contacts.
    ///
    /// A page past the end is clamped to the last page (page 1 when empty).
    ///
    /// # Errors
    ///
    /// Returns `ContactError::InvalidPagination` if `page` or `limit` is below 1.
    pub async fn list(&self, owner: UserId, query: ListQuery) -> Result<ContactPage, ContactError> {
        let requested_page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if requested_page < 1 || limit < 1 {
            return Err(ContactError::InvalidPagination);
        }

        let filter = ContactFilter {
            favorite: query.favorite,
        };
        let total = self.contacts.count(owner, filter).await?;
        let page = clamp_page(requested_page, limit, total);
        let offset = (page - 1).saturating_mul(limit);

        let contacts = self.contacts.list(owner, filter, offset, limit).await?;

        Ok(ContactPage {
            contacts,
            total,
            page,
            limit,
        })
    }

    /// # Errors
    ///
    /// Returns `ContactError::NotFound` if the owner has no such contact.
    pub async fn get(&self, owner: UserId, id: ContactId) -> Result<Contact, ContactError> {
        self.contacts
            .get(owner, id)
            .await?
            .ok_or(ContactError::NotFound)
    }

    /// # Errors
    ///
    /// Returns a validation `ContactError` for bad input.
    pub async fn create(&self, owner: UserId, input: ContactInput) -> Result<Contact, ContactError> {
        let draft = input.validate()?;
        let contact = self.contacts.create(owner, draft).await?;

        tracing::info!(owner = %owner, contact_id = %contact.id, "Contact created");
        Ok(contact)
    }

    /// Replace a contact's fields. `favorite` is left alone when absent.
    ///
    /// # Errors
    ///
    /// Returns a validation `ContactError` for bad input and
    /// `ContactError::NotFound` if the owner has no such contact.
    pub async fn update(
        &self,
        owner: UserId,
        id: ContactId,
        input: ContactInput,
    ) -> Result<Contact, ContactError> {
        let draft = input.validate()?;
        self.contacts
            .update(owner, id, draft)
            .await?
            .ok_or(ContactError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `ContactError::MissingFavorite` when `favorite` is absent and
    /// `ContactError::NotFound` if the owner has no such contact.
    pub async fn set_favorite(
        &self,
        owner: UserId,
        id: ContactId,
        favorite: Option<bool>,
    ) -> Result<Contact, ContactError> {
        let favorite = favorite.ok_or(ContactError::MissingFavorite)?;
        self.contacts
            .set_favorite(owner, id, favorite)
            .await?
            .ok_or(ContactError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `ContactError::NotFound` if the owner has no such contact.
    pub async fn delete(&self, owner: UserId, id: ContactId) -> Result<(), ContactError> {
        if !self.contacts.delete(owner, id).await? {
            return Err(ContactError::NotFound);
        }

        tracing::info!(owner = %owner, contact_id = %id, "Contact deleted");
        Ok(())
    }
}

/// Clamp `page` to `max(1, ceil(total / limit))`.
fn clamp_page(page: i64, limit: i64, total: i64) -> i64 {
    let last_page = if total <= 0 { 1 } else { (total - 1) / limit + 1 };
    page.min(last_page)
}
