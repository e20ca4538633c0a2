//! Contact route handlers.
//!
//! Every handler is guarded by [`AuthUser`] and only ever touches the
//! caller's own contacts.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;

use phonebook_core::ContactId;

use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::contact::Contact;
use crate::services::contacts::{ContactInput, ContactPage, ListQuery};
use crate::state::AppState;

/// Favorite flag update body.
#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub favorite: Option<bool>,
}

type PathId = std::result::Result<Path<ContactId>, PathRejection>;
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// List the caller's contacts with `page`, `limit` and `favorite` query parameters.
pub async fn index(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ContactPage>> {
    let Query(query) = query?;
    let page = state.contacts().list(user.id, query).await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: PathId,
) -> Result<Json<Contact>> {
    let Path(id) = id?;
    let contact = state.contacts().get(user.id, id).await?;
    Ok(Json(contact))
}

pub async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    body: JsonBody<ContactInput>,
) -> Result<(StatusCode, Json<Contact>)> {
    let Json(input) = body?;
    let contact = state.contacts().create(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: PathId,
    body: JsonBody<ContactInput>,
) -> Result<Json<Contact>> {
    let Path(id) = id?;
    let Json(input) = body?;
    let contact = state.contacts().update(user.id, id, input).await?;
    Ok(Json(contact))
}

/// Set the favorite flag. A missing or non-boolean `favorite` is a 400.
pub async fn update_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: PathId,
    body: JsonBody<FavoriteRequest>,
) -> Result<Json<Contact>> {
    let Path(id) = id?;
    let favorite = body.ok().and_then(|Json(b)| b.favorite);
    let contact = state
        .contacts()
        .set_favorite(user.id, id, favorite)
        .await?;
    Ok(Json(contact))
}

pub async fn delete(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    id: PathId,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.contacts().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
