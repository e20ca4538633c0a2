//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (store ping)
//! GET    /avatars/{file}          - Uploaded avatars
//!
//! # Auth
//! POST   /auth/register           - Create account, send verification email
//! GET    /auth/verify/{token}     - Verify email
//! POST   /auth/verify             - Resend verification email
//! POST   /auth/login              - Get a session token
//! GET    /auth/logout             - End session (bearer)
//! GET    /auth/current            - Current user (bearer)
//! PATCH  /auth/subscription       - Change plan (bearer)
//! PATCH  /auth/avatar             - Upload avatar (bearer, multipart)
//!
//! # Contacts (bearer, owner-scoped)
//! GET    /contacts                - List (page, limit, favorite)
//! POST   /contacts                - Create
//! GET    /contacts/{id}           - Show
//! PUT    /contacts/{id}           - Replace
//! DELETE /contacts/{id}           - Delete
//! PATCH  /contacts/{id}/favorite  - Set favorite flag
//! ```

pub mod auth;
pub mod contacts;

use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::{Request, Response, StatusCode},
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::services::avatar::AVATAR_URL_PREFIX;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/verify", post(auth::resend_verification))
        .route("/verify/{token}", get(auth::verify_email))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/current", get(auth::current))
        .route("/subscription", patch(auth::update_subscription))
        .route("/avatar", patch(auth::update_avatar))
}

/// Create the contact routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(contacts::index).post(contacts::create))
        .route(
            "/{id}",
            get(contacts::show)
                .put(contacts::update)
                .delete(contacts::delete),
        )
        .route("/{id}/favorite", patch(contacts::update_favorite))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/auth", auth_routes())
        .nest("/contacts", contact_routes())
}

/// Build the complete application: routes, avatar files, body limit,
/// request IDs and HTTP tracing.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config().storage.max_upload_bytes;
    let avatars = ServeDir::new(state.avatars().avatar_dir());

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
                user_id = tracing::field::Empty,
                status = tracing::field::Empty,
                latency_ms = tracing::field::Empty,
            )
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, span: &Span| {
                span.record("status", response.status().as_u16());
                span.record(
                    "latency_ms",
                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                );
                DefaultOnResponse::default().on_response(response, latency, span);
            },
        );

    // Outermost first: the trace span must exist before the request id is recorded
    routes()
        .nest_service(AVATAR_URL_PREFIX, avatars)
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(from_fn(request_id_middleware))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the user store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.users().health_check().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
