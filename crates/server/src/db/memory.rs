//! In-memory stores for tests and local development.
//!
//! They implement the same traits as the `PostgreSQL` stores, including the
//! unique-email constraint and the session token compare-and-swap.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use phonebook_core::{ContactId, Email, Subscription, UserId};

use super::{ContactStore, RepositoryError, UserStore};
use crate::models::contact::{Contact, ContactDraft, ContactFilter};
use crate::models::user::{NewUser, User};

#[derive(Default)]
struct UserTable {
    next_id: i32,
    rows: BTreeMap<UserId, (User, String)>,
}

/// In-memory [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<UserTable>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn find_where(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        table
            .rows
            .values()
            .find(|(user, _)| predicate(user))
            .map(|(user, _)| user.clone())
    }

    fn modify(&self, id: UserId, change: impl FnOnce(&mut User)) -> Option<User> {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let (user, _) = table.rows.get_mut(&id)?;
        change(user);
        user.updated_at = Utc::now();
        Some(user.clone())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if table.rows.values().any(|(u, _)| u.email == new_user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        table.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: UserId::new(table.next_id),
            email: new_user.email,
            phone: new_user.phone,
            subscription: new_user.subscription,
            token: None,
            token_version: 0,
            verified: false,
            verification_token: Some(new_user.verification_token),
            avatar_url: new_user.avatar_url,
            created_at: now,
            updated_at: now,
        };
        table
            .rows
            .insert(user.id, (user.clone(), new_user.password_hash));
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_where(|u| u.id == id))
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_where(|u| &u.email == email))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .rows
            .values()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }

    async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_where(|u| u.verification_token.as_deref() == Some(token)))
    }

    async fn mark_verified(&self, id: UserId) -> Result<User, RepositoryError> {
        self.modify(id, |u| {
            u.verified = true;
            u.verification_token = None;
        })
        .ok_or(RepositoryError::NotFound)
    }

    async fn swap_session_token(
        &self,
        id: UserId,
        expected_version: i64,
        token: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some((user, _)) = table.rows.get_mut(&id) else {
            return Ok(false);
        };
        if user.token_version != expected_version {
            return Ok(false);
        }
        user.token = token.map(str::to_owned);
        user.token_version += 1;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_subscription(
        &self,
        id: UserId,
        subscription: Subscription,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.modify(id, |u| u.subscription = subscription))
    }

    async fn update_avatar(
        &self,
        id: UserId,
        avatar_url: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.modify(id, |u| avatar_url.clone_into(&mut u.avatar_url)))
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[derive(Default)]
struct ContactTable {
    next_id: i32,
    rows: BTreeMap<ContactId, Contact>,
}

/// In-memory [`ContactStore`]. Ids are allocated in creation order.
#[derive(Default)]
pub struct MemoryContactStore {
    inner: RwLock<ContactTable>,
}

impl MemoryContactStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn modify(
        &self,
        owner: UserId,
        id: ContactId,
        change: impl FnOnce(&mut Contact),
    ) -> Option<Contact> {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let contact = table.rows.get_mut(&id).filter(|c| c.owner == owner)?;
        change(contact);
        contact.updated_at = Utc::now();
        Some(contact.clone())
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn list(
        &self,
        owner: UserId,
        filter: ContactFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Contact>, RepositoryError> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table
            .rows
            .values()
            .filter(|c| c.owner == owner && filter.matches(c))
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn count(&self, owner: UserId, filter: ContactFilter) -> Result<i64, RepositoryError> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let total = table
            .rows
            .values()
            .filter(|c| c.owner == owner && filter.matches(c))
            .count();
        i64::try_from(total).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
    }

    async fn get(&self, owner: UserId, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let table = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(table.rows.get(&id).filter(|c| c.owner == owner).cloned())
    }

    async fn create(
        &self,
        owner: UserId,
        draft: ContactDraft,
    ) -> Result<Contact, RepositoryError> {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        table.next_id += 1;
        let now = Utc::now();
        let contact = Contact {
            id: ContactId::new(table.next_id),
            name: draft.name,
            email: draft.email,
            phone: draft.phone,
            favorite: draft.favorite.unwrap_or(false),
            owner,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn update(
        &self,
        owner: UserId,
        id: ContactId,
        draft: ContactDraft,
    ) -> Result<Option<Contact>, RepositoryError> {
        Ok(self.modify(owner, id, |c| {
            c.name = draft.name;
            c.email = draft.email;
            c.phone = draft.phone;
            if let Some(favorite) = draft.favorite {
                c.favorite = favorite;
            }
        }))
    }

    async fn set_favorite(
        &self,
        owner: UserId,
        id: ContactId,
        favorite: bool,
    ) -> Result<Option<Contact>, RepositoryError> {
        Ok(self.modify(owner, id, |c| c.favorite = favorite))
    }

    async fn delete(&self, owner: UserId, id: ContactId) -> Result<bool, RepositoryError> {
        let mut table = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if table.rows.get(&id).is_some_and(|c| c.owner == owner) {
            table.rows.remove(&id);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use phonebook_core::{ContactName, Phone};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_string(),
            phone: None,
            subscription: Subscription::Starter,
            verification_token: format!("verify-{email}"),
            avatar_url: "//www.gravatar.com/avatar/x".to_string(),
        }
    }

    fn draft(name: &str) -> ContactDraft {
        ContactDraft {
            name: ContactName::parse(name).unwrap(),
            email: None,
            phone: Phone::parse("0501234567").unwrap(),
            favorite: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create(new_user("a@b.co")).await.unwrap();

        let result = store.create(new_user("a@b.co")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_swap_session_token_requires_current_version() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@b.co")).await.unwrap();

        assert!(store.swap_session_token(user.id, 0, Some("t1")).await.unwrap());
        // A writer holding the stale version loses
        assert!(!store.swap_session_token(user.id, 0, Some("t2")).await.unwrap());

        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.token.as_deref(), Some("t1"));
        assert_eq!(user.token_version, 1);
    }

    #[tokio::test]
    async fn test_mark_verified_clears_token() {
        let store = MemoryUserStore::new();
        let user = store.create(new_user("a@b.co")).await.unwrap();

        let found = store
            .find_by_verification_token("verify-a@b.co")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        let verified = store.mark_verified(user.id).await.unwrap();
        assert!(verified.verified);
        assert!(verified.verification_token.is_none());
        assert!(
            store
                .find_by_verification_token("verify-a@b.co")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_contacts_are_owner_scoped() {
        let store = MemoryContactStore::new();
        let alice = UserId::new(1);
        let bob = UserId::new(2);
        let contact = store.create(alice, draft("Ada Lovelace")).await.unwrap();

        assert!(store.get(bob, contact.id).await.unwrap().is_none());
        assert!(store.set_favorite(bob, contact.id, true).await.unwrap().is_none());
        assert!(!store.delete(bob, contact.id).await.unwrap());
        assert_eq!(store.count(bob, ContactFilter::default()).await.unwrap(), 0);

        assert!(store.delete(alice, contact.id).await.unwrap());
        assert!(store.get(alice, contact.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pages_in_creation_order() {
        let store = MemoryContactStore::new();
        let owner = UserId::new(1);
        for name in ["Ada Lovelace", "Alan Turing", "Grace Hopper"] {
            store.create(owner, draft(name)).await.unwrap();
        }

        let page = store
            .list(owner, ContactFilter::default(), 1, 1)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name.as_str(), "Alan Turing");
    }

    #[tokio::test]
    async fn test_update_keeps_favorite_when_absent() {
        let store = MemoryContactStore::new();
        let owner = UserId::new(1);
        let contact = store.create(owner, draft("Ada Lovelace")).await.unwrap();
        store.set_favorite(owner, contact.id, true).await.unwrap();

        let updated = store
            .update(owner, contact.id, draft("Alan Turing"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_str(), "Alan Turing");
        assert!(updated.favorite);
    }
}
