//! CLI subcommand implementations.

pub mod migrate;
pub mod user;

use thiserror::Error;

use phonebook_server::config::{ConfigError, database_url_from_env};

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Database URL not configured.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Store operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] phonebook_server::db::RepositoryError),

    /// Email argument failed validation.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] phonebook_core::EmailError),

    /// No account with this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),
}

/// Connect to the server's database (after loading `.env`).
pub(crate) async fn connect() -> Result<sqlx::PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    Ok(phonebook_server::db::create_pool(&database_url).await?)
}
