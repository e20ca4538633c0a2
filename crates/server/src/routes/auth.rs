//! Authentication route handlers.
//!
//! Registration, email verification, bearer sessions and profile updates.

use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection, multipart::MultipartRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use phonebook_core::Email;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::AuthUser;
use crate::models::user::{CurrentUser, UserView};
use crate::services::auth::{AuthError, Registration};
use crate::services::avatar::{AvatarError, AvatarUpload};
use crate::state::AppState;

/// Multipart field carrying the avatar image.
const AVATAR_FIELD: &str = "avatar";

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub subscription: Option<String>,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Resend verification request body.
#[derive(Debug, Deserialize)]
pub struct ResendVerificationRequest {
    pub email: Option<String>,
}

/// Subscription update request body.
#[derive(Debug, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Register a new account and send the verification email.
///
/// Responds 201 with the normalized email as a JSON string.
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Email>)> {
    let Json(body) = body?;

    let user = state
        .auth()
        .register(Registration {
            email: &body.email,
            password: &body.password,
            subscription: body.subscription.as_deref(),
            phone: body.phone.as_deref(),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.email)))
}

/// Follow a verification link.
pub async fn verify_email(
    State(state): State<AppState>,
    Path(verification_token): Path<String>,
) -> Result<Json<Value>> {
    state.auth().verify_email(&verification_token).await?;
    Ok(Json(json!({ "message": "Verification successful" })))
}

/// Send the verification link again.
pub async fn resend_verification(
    State(state): State<AppState>,
    body: std::result::Result<Json<ResendVerificationRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let email = body.ok().and_then(|Json(b)| b.email);
    state.auth().resend_verification(email.as_deref()).await?;
    Ok(Json(json!({ "message": "Verification email sent" })))
}

/// Exchange credentials for a session token, returned as a JSON string.
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<String>> {
    let Json(body) = body?;
    let token = state.auth().login(&body.email, &body.password).await?;
    Ok(Json(token))
}

/// End the current session.
pub async fn logout(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<Value>> {
    state.auth().logout(&user).await?;
    clear_sentry_user();
    Ok(Json(json!({ "message": "logged out" })))
}

/// Who the bearer token belongs to.
pub async fn current(AuthUser(user): AuthUser) -> Json<CurrentUser> {
    Json(CurrentUser::from(&user))
}

/// Change the subscription plan.
pub async fn update_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: std::result::Result<Json<SubscriptionRequest>, JsonRejection>,
) -> Result<Json<UserView>> {
    let subscription = body.ok().and_then(|Json(b)| b.subscription);
    let user = state
        .auth()
        .update_subscription(user.id, subscription.as_deref())
        .await?;
    Ok(Json(UserView::from(user)))
}

/// Upload a new avatar image (multipart field `avatar`).
pub async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut multipart = multipart?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AVATAR_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field.bytes().await?;
        upload = Some(AvatarUpload {
            file_name,
            content_type,
            bytes,
        });
        break;
    }

    let upload = upload.ok_or(AuthError::Avatar(AvatarError::MissingFile))?;
    let avatar_url = state.auth().update_avatar(user.id, upload).await?;

    Ok(Json(json!({ "avatarURL": avatar_url })))
}
