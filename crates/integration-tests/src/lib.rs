//! Integration tests for the Phonebook API.
//!
//! Each test spawns the real router on an ephemeral port, backed by the
//! in-memory stores and a recording mailer, and talks to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p phonebook-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Registration, verification, sessions and profile updates
//! - `contacts_api` - Owner-scoped contact CRUD, paging and favorites

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};

use phonebook_core::Email;
use phonebook_server::config::{AuthConfig, PhonebookConfig, StorageConfig};
use phonebook_server::db::{MemoryContactStore, MemoryUserStore};
use phonebook_server::routes;
use phonebook_server::services::email::{EmailError, Mailer};
use phonebook_server::state::AppState;

pub const PASSWORD: &str = "hunter22";

/// Mailer that keeps every verification link it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    /// Make every following send fail.
    pub fn fail_from_now_on(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Number of mails sent to `email`.
    pub fn sent_to(&self, email: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(to, _)| to == email)
            .count()
    }

    /// Most recent verification link sent to `email`.
    pub fn last_link(&self, email: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, link)| link.clone())
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification(&self, to: &Email, link: &str) -> Result<(), EmailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmailError::InvalidAddress(to.to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), link.to_string()));
        Ok(())
    }
}

/// A running server plus the handles tests need to inspect it.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub mailer: Arc<RecordingMailer>,
    pub avatar_dir: PathBuf,
}

impl TestApp {
    /// Start a fresh server with empty stores.
    pub async fn spawn() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let scratch = std::env::temp_dir().join(format!("phonebook-it-{}", uuid::Uuid::new_v4()));
        let storage = StorageConfig {
            upload_dir: scratch.join("tmp"),
            avatar_dir: scratch.join("avatars"),
            ..StorageConfig::default()
        };
        let avatar_dir = storage.avatar_dir.clone();

        let config = PhonebookConfig {
            database_url: SecretString::from("postgres://unused"),
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            auth: AuthConfig {
                jwt_secret: SecretString::from("Zq8#Lm2$Vx7!Rt4@Hp9&Kd3*Wn6^Bs1%"),
                token_ttl_minutes: 60,
            },
            storage,
            email: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(
            config,
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryContactStore::new()),
            mailer.clone(),
        );

        let app = routes::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: Client::new(),
            mailer,
            avatar_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn register(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    /// Follow the last verification link mailed to `email`.
    pub async fn follow_verification_link(&self, email: &str) -> Response {
        let link = self.mailer.last_link(email).unwrap();
        self.client.get(link).send().await.unwrap()
    }

    /// Register, verify and log in; returns the bearer token.
    pub async fn signed_in_user(&self, email: &str) -> String {
        assert_eq!(self.register(email, PASSWORD).await.status(), StatusCode::CREATED);
        assert_eq!(
            self.follow_verification_link(email).await.status(),
            StatusCode::OK
        );
        let response = self.login(email, PASSWORD).await;
        assert_eq!(response.status(), StatusCode::OK);
        response.json::<String>().await.unwrap()
    }

    pub async fn get(&self, path: &str, token: &str) -> Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &str,
        body: &Value,
    ) -> Response {
        self.client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// Create a contact and return its JSON representation.
    pub async fn create_contact(&self, token: &str, name: &str, phone: &str) -> Value {
        let response = self
            .send_json(
                reqwest::Method::POST,
                "/contacts",
                token,
                &json!({ "name": name, "phone": phone }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }
}

/// Read the `message` field of an error body.
pub async fn message(response: Response) -> String {
    let body: Value = response.json().await.unwrap();
    body["message"].as_str().unwrap().to_string()
}
