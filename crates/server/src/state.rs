//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PhonebookConfig;
use crate::db::{ContactStore, UserStore};
use crate::services::auth::AuthService;
use crate::services::avatar::AvatarStorage;
use crate::services::contacts::ContactService;
use crate::services::email::Mailer;
use crate::services::token::TokenService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the stores, the mailer and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PhonebookConfig,
    users: Arc<dyn UserStore>,
    contacts: Arc<dyn ContactStore>,
    mailer: Arc<dyn Mailer>,
    tokens: TokenService,
    avatars: AvatarStorage,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `users` - User store (`PostgreSQL` in production)
    /// * `contacts` - Contact store
    /// * `mailer` - Verification mail delivery
    #[must_use]
    pub fn new(
        config: PhonebookConfig,
        users: Arc<dyn UserStore>,
        contacts: Arc<dyn ContactStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let tokens = TokenService::from_config(&config.auth);
        let avatars = AvatarStorage::new(&config.storage);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                users,
                contacts,
                mailer,
                tokens,
                avatars,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &PhonebookConfig {
        &self.inner.config
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &dyn UserStore {
        self.inner.users.as_ref()
    }

    /// Get a reference to the avatar storage.
    #[must_use]
    pub fn avatars(&self) -> &AvatarStorage {
        &self.inner.avatars
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(
            self.inner.users.as_ref(),
            self.inner.mailer.as_ref(),
            &self.inner.tokens,
            &self.inner.avatars,
            &self.inner.config,
        )
    }

    /// Contact service bound to this state.
    #[must_use]
    pub fn contacts(&self) -> ContactService<'_> {
        ContactService::new(self.inner.contacts.as_ref())
    }
}
