//! Contact domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use phonebook_core::{ContactEmail, ContactId, ContactName, Phone, UserId};

/// A contact in a user's phonebook (domain type).
#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub name: ContactName,
    pub email: Option<ContactEmail>,
    pub phone: Phone,
    pub favorite: bool,
    /// User the contact belongs to. Only this user can see or change it.
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated contact fields for create and full update.
///
/// `favorite: None` means "leave as is" on update and `false` on create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: ContactName,
    pub email: Option<ContactEmail>,
    pub phone: Phone,
    pub favorite: Option<bool>,
}

/// Listing filter applied on top of owner scoping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactFilter {
    /// Only contacts with this favorite flag, when set.
    pub favorite: Option<bool>,
}

impl ContactFilter {
    /// Whether `contact` passes the filter.
    #[must_use]
    pub fn matches(&self, contact: &Contact) -> bool {
        self.favorite.is_none_or(|favorite| contact.favorite == favorite)
    }
}
