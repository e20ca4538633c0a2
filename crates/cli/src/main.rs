//! Phonebook CLI - Database migrations and account management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! phonebook-cli migrate
//!
//! # Verify an account by hand
//! phonebook-cli user verify -e someone@example.com
//!
//! # Revoke an account's session
//! phonebook-cli user logout -e someone@example.com
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "phonebook-cli")]
#[command(author, version, about = "Phonebook CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage user accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Mark an account's email as verified
    Verify {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Invalidate an account's current session token
    Logout {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::User { action } => match action {
            UserAction::Verify { email } => commands::user::verify(&email).await?,
            UserAction::Logout { email } => commands::user::logout(&email).await?,
        },
    }
    Ok(())
}
