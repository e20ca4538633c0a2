//! Integration tests for the contacts API.
//!
//! Run with: cargo test -p phonebook-integration-tests --test contacts_api

#![allow(clippy::unwrap_used)]

use phonebook_integration_tests::{TestApp, message};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};

fn contact_path(contact: &Value) -> String {
    format!("/contacts/{}", contact["id"])
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_create_and_show_contact() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let response = app
        .send_json(
            Method::POST,
            "/contacts",
            &token,
            &json!({
                "name": "Alan Turing",
                "email": "Alan@Example.com",
                "phone": "+380501234567"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["name"], "Alan Turing");
    assert_eq!(created["email"], "Alan@Example.com");
    assert_eq!(created["favorite"], false);
    assert!(created["createdAt"].is_string());

    let response = app.get(&contact_path(&created), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.json::<Value>().await.unwrap(), created);
}

#[tokio::test]
async fn test_create_validates_fields() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    for body in [
        json!({ "phone": "0501234567" }),
        json!({ "name": "alan turing", "phone": "0501234567" }),
        json!({ "name": "Alan Turing" }),
        json!({ "name": "Alan Turing", "phone": "12345" }),
        json!({ "name": "Alan Turing", "phone": "0501234567", "email": "nope" }),
    ] {
        let response = app
            .send_json(Method::POST, "/contacts", &token, &body)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }

    let page: Value = app.get("/contacts", &token).await.json().await.unwrap();
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_update_keeps_favorite_when_absent() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;
    let contact = app
        .create_contact(&token, "Alan Turing", "0501234567")
        .await;
    let path = contact_path(&contact);

    app.send_json(
        Method::PATCH,
        &format!("{path}/favorite"),
        &token,
        &json!({ "favorite": true }),
    )
    .await;

    let response = app
        .send_json(
            Method::PUT,
            &path,
            &token,
            &json!({ "name": "Grace Hopper", "phone": "0671234567" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["name"], "Grace Hopper");
    assert_eq!(updated["phone"], "0671234567");
    assert_eq!(updated["favorite"], true);
    assert_eq!(updated["id"], contact["id"]);
}

#[tokio::test]
async fn test_delete_contact() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;
    let contact = app
        .create_contact(&token, "Alan Turing", "0501234567")
        .await;
    let path = contact_path(&contact);

    let response = app
        .client
        .delete(app.url(&path))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get(&path, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(message(response).await, "Contact not found");
}

#[tokio::test]
async fn test_invalid_contact_id_is_bad_request() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let response = app.get("/contacts/not-a-number", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Favorites
// ============================================================================

#[tokio::test]
async fn test_favorite_requires_flag() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;
    let contact = app
        .create_contact(&token, "Alan Turing", "0501234567")
        .await;
    let path = format!("{}/favorite", contact_path(&contact));

    let response = app
        .send_json(Method::PATCH, &path, &token, &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(message(response).await, "missing field favorite");

    let response = app
        .send_json(Method::PATCH, &path, &token, &json!({ "favorite": true }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["favorite"], true);

    let response = app
        .send_json(Method::PATCH, "/contacts/999/favorite", &token, &json!({ "favorite": true }))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_paginates_and_filters() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    let mut created = Vec::new();
    for name in ["Alan Turing", "Grace Hopper", "Linus Torvalds"] {
        created.push(app.create_contact(&token, name, "0501234567").await);
    }
    app.send_json(
        Method::PATCH,
        &format!("{}/favorite", contact_path(&created[1])),
        &token,
        &json!({ "favorite": true }),
    )
    .await;

    let page: Value = app.get("/contacts", &token).await.json().await.unwrap();
    assert_eq!(page["total"], 3);
    assert_eq!(page["page"], 1);
    assert_eq!(page["limit"], 10);
    let names: Vec<&str> = page["contacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Alan Turing", "Grace Hopper", "Linus Torvalds"]);

    let page: Value = app
        .get("/contacts?page=2&limit=2", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["contacts"].as_array().unwrap().len(), 1);
    assert_eq!(page["contacts"][0]["name"], "Linus Torvalds");

    // Past the end: clamped to the last page
    let page: Value = app
        .get("/contacts?page=50&limit=2", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["page"], 2);

    let page: Value = app
        .get("/contacts?favorite=true", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["total"], 1);
    assert_eq!(page["contacts"][0]["id"], created[1]["id"]);
}

#[tokio::test]
async fn test_list_rejects_bad_paging() {
    let app = TestApp::spawn().await;
    let token = app.signed_in_user("ada@example.com").await;

    for query in ["page=0", "limit=0", "page=-3", "limit=abc"] {
        let response = app.get(&format!("/contacts?{query}"), &token).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {query}");
    }
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn test_contacts_are_private_to_owner() {
    let app = TestApp::spawn().await;
    let ada = app.signed_in_user("ada@example.com").await;
    let bob = app.signed_in_user("bob@example.com").await;

    let contact = app.create_contact(&ada, "Alan Turing", "0501234567").await;
    let path = contact_path(&contact);

    let page: Value = app.get("/contacts", &bob).await.json().await.unwrap();
    assert_eq!(page["total"], 0);

    assert_eq!(app.get(&path, &bob).await.status(), StatusCode::NOT_FOUND);
    let response = app
        .send_json(
            Method::PUT,
            &path,
            &bob,
            &json!({ "name": "Grace Hopper", "phone": "0501234567" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app
        .client
        .delete(app.url(&path))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get(&path, &ada).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_contacts_require_authentication() {
    let app = TestApp::spawn().await;

    let response = app.client.get(app.url("/contacts")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
