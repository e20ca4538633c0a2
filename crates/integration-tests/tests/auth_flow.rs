//! Integration tests for registration, verification and sessions.
//!
//! Run with: cargo test -p phonebook-integration-tests --test auth_flow

#![allow(clippy::unwrap_used)]

use phonebook_integration_tests::{PASSWORD, TestApp, message};
use reqwest::{Method, StatusCode, multipart};
use serde_json::{Value, json};

// ============================================================================
// Registration & Verification
// ============================================================================

#[tokio::test]
async fn test_register_returns_normalized_email_and_mails_link() {
    let app = TestApp::spawn().await;

    let response = app.register("  Ada@Example.COM ", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.json::<String>().await.unwrap(), "ada@example.com");

    assert_eq!(app.mailer.sent_to("ada@example.com"), 1);
    let link = app.mailer.last_link("ada@example.com").unwrap();
    assert!(link.starts_with(&app.url("/auth/verify/")));
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", PASSWORD).await;

    let response = app.register("ADA@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(message(response).await, "Email in use");
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = TestApp::spawn().await;

    let response = app.register("not-an-email", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.register("ada@example.com", "123").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({
            "email": "ada@example.com",
            "password": PASSWORD,
            "subscription": "platinum"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .post(app.url("/auth/register"))
        .json(&json!({ "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(app.mailer.sent_to("ada@example.com"), 0);
}

#[tokio::test]
async fn test_mail_failure_reports_bad_gateway() {
    let app = TestApp::spawn().await;
    app.mailer.fail_from_now_on();

    let response = app.register("ada@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(message(response).await, "Failed to send verification email");

    // The account exists, so registering again is a conflict
    let response = app.register("ada@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_verification_link_is_single_use() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", PASSWORD).await;

    let response = app.follow_verification_link("ada@example.com").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(message(response).await, "Verification successful");

    let response = app.follow_verification_link("ada@example.com").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(response).await, "User not found");
}

#[tokio::test]
async fn test_resend_verification() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", PASSWORD).await;

    let resend = |body: Value| {
        app.client
            .post(app.url("/auth/verify"))
            .json(&body)
            .send()
    };

    let response = resend(json!({})).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(response).await, "missing required field email");

    let response = resend(json!({ "email": "nobody@example.com" })).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = resend(json!({ "email": "ada@example.com" })).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(message(response).await, "Verification email sent");
    assert_eq!(app.mailer.sent_to("ada@example.com"), 2);

    app.follow_verification_link("ada@example.com").await;

    let response = resend(json!({ "email": "ada@example.com" })).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        message(response).await,
        "Verification has already been passed"
    );
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_login_requires_verified_email_and_correct_password() {
    let app = TestApp::spawn().await;
    app.register("ada@example.com", PASSWORD).await;

    let response = app.login("ada@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Email is not verified");

    app.follow_verification_link("ada@example.com").await;

    let response = app.login("ada@example.com", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Email or password is wrong");

    let response = app.login("nobody@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Email or password is wrong");

    let response = app.login("ada@example.com", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.json::<String>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_current_user() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let response = app.get("/auth/current", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "email": "ada@example.com", "phone": null, "subscription": "starter" })
    );
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "req-42")
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-42");
}

#[tokio::test]
async fn test_unusable_request_id_is_replaced() {
    let app = TestApp::spawn().await;

    for sent in ["x".repeat(500), "two words".to_string()] {
        let response = app
            .client
            .get(app.url("/health"))
            .header("x-request-id", &sent)
            .send()
            .await
            .unwrap();
        let echoed = response.headers()["x-request-id"].to_str().unwrap();
        assert_ne!(echoed, sent);
        assert!(uuid::Uuid::parse_str(echoed).is_ok());
    }
}

#[tokio::test]
async fn test_bearer_token_is_required() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/auth/current"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(message(response).await, "Not authorized");

    let response = app.get("/auth/current", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_token() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let response = app.get("/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/auth/current", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = app.get("/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_new_login_replaces_previous_session() {
    let app = TestApp::spawn().await;
    let first = app.signed_in_user("ada@example.com").await;

    let second: String = app
        .login("ada@example.com", PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    assert_ne!(first, second);

    assert_eq!(
        app.get("/auth/current", &first).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        app.get("/auth/current", &second).await.status(),
        StatusCode::OK
    );
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn test_update_subscription() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let response = app
        .send_json(
            Method::PATCH,
            "/auth/subscription",
            &token,
            &json!({ "subscription": "pro" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["subscription"], "pro");
    assert_eq!(body["email"], "ada@example.com");

    for bad in [json!({ "subscription": "platinum" }), json!({})] {
        let response = app
            .send_json(Method::PATCH, "/auth/subscription", &token, &bad)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(message(response).await, "missing subscription option");
    }
}

#[tokio::test]
async fn test_avatar_upload_is_stored_and_served() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;
    let image = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    let part = multipart::Part::bytes(image.clone())
        .file_name("me.PNG")
        .mime_str("image/png")
        .unwrap();
    let response = app
        .client
        .patch(app.url("/auth/avatar"))
        .bearer_auth(&token)
        .multipart(multipart::Form::new().part("avatar", part))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let avatar_url = body["avatarURL"].as_str().unwrap().to_string();
    assert!(avatar_url.starts_with("/avatars/"));
    assert!(avatar_url.ends_with(".png"));

    let served = app.client.get(app.url(&avatar_url)).send().await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().as_ref(), image.as_slice());
    assert!(app.avatar_dir.read_dir().unwrap().next().is_some());
}

#[tokio::test]
async fn test_avatar_upload_rejects_bad_files() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let text = multipart::Part::text("hello")
        .file_name("notes.txt")
        .mime_str("text/plain")
        .unwrap();
    let response = app
        .client
        .patch(app.url("/auth/avatar"))
        .bearer_auth(&token)
        .multipart(multipart::Form::new().part("avatar", text))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .patch(app.url("/auth/avatar"))
        .bearer_auth(&token)
        .multipart(multipart::Form::new().text("other", "value"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_and_unknown_routes() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let response = app
        .client
        .get(app.url("/health/ready"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.client.get(app.url("/nope")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(response).await, "Not found");
}
