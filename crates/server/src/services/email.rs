//! Verification mail delivery.
//!
//! Uses SMTP via lettre for delivery with Askama HTML templates. When SMTP is
//! not configured, [`LogMailer`] logs the recipient at INFO and the link at
//! DEBUG, so local development works without a mail server.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use phonebook_core::Email;

use crate::config::EmailConfig;

const VERIFICATION_SUBJECT: &str = "Verify your Phonebook email";

/// HTML template for the verification email.
#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmailHtml<'a> {
    email: &'a str,
    link: &'a str,
}

/// Plain text template for the verification email.
#[derive(Template)]
#[template(path = "email/verification.txt")]
struct VerificationEmailText<'a> {
    email: &'a str,
    link: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Something that can deliver the verification link to a user.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send the verification link to `to`.
    async fn send_verification(&self, to: &Email, link: &str) -> Result<(), EmailError>;
}

/// Render the plain text and HTML bodies of the verification email.
///
/// # Errors
///
/// Returns `EmailError::Template` if a template fails to render.
pub fn render_verification(to: &Email, link: &str) -> Result<(String, String), EmailError> {
    let email = to.as_str();
    let text = VerificationEmailText { email, link }.render()?;
    let html = VerificationEmailHtml { email, link }.render()?;
    Ok((text, html))
}

/// SMTP mailer.
#[derive(Clone)]
pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification(&self, to: &Email, link: &str) -> Result<(), EmailError> {
        let (text, html) = render_verification(to, link)?;
        self.send_multipart_email(to.as_str(), VERIFICATION_SUBJECT, text, html)
            .await
    }
}

/// Development mailer that only logs the verification link.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification(&self, to: &Email, link: &str) -> Result<(), EmailError> {
        // Render anyway so template problems surface before SMTP is switched on
        render_verification(to, link)?;
        tracing::info!(to = %to, "SMTP not configured, verification email not sent");
        tracing::debug!(to = %to, link = %link, "Unsent verification link");
        Ok(())
    }
}
