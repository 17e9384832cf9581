// SPDX-License-Identifier: MIT

//! Public card viewer routes.
//!
//! Resolves `(username[, slug])` with the same addressing scheme the
//! URL resolver writes: the bare username path is the primary card,
//! the slugged path is a secondary card. Inactive cards are hidden.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::models::{Card, CardPayload};
use crate::services::identity::is_valid_username;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/c/{username}", get(view_primary_card))
        .route("/c/{username}/{slug}", get(view_card))
}

/// Publicly visible card fields.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PublicCardResponse {
    pub username: String,
    pub slug: String,
    pub url: String,
    pub payload: CardPayload,
}

fn public_card(username: String, card: Card) -> Result<Json<PublicCardResponse>> {
    if !card.is_active {
        return Err(AppError::NotFound("Card not found".to_string()));
    }
    Ok(Json(PublicCardResponse {
        username,
        slug: card.slug,
        url: card.url,
        payload: card.payload,
    }))
}

/// Resolve the owning user of a public username path.
async fn owner_for(state: &AppState, username: &str) -> Result<crate::models::User> {
    if !is_valid_username(username) {
        return Err(AppError::BadRequest("Invalid username".to_string()));
    }

    let reservation = state
        .db
        .get_username_reservation(username)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))?;

    state
        .db
        .get_user(&reservation.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))
}

/// View a user's primary card at `/c/{username}`.
async fn view_primary_card(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<PublicCardResponse>> {
    let user = owner_for(&state, &username).await?;

    let primary_slug = user
        .primary_card_id
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))?;

    let card = state
        .db
        .get_card(&user.id, &primary_slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))?;

    public_card(user.username, card)
}

/// View a secondary card at `/c/{username}/{slug}`.
///
/// The primary card is only addressable at the bare username path, so
/// each card has exactly one public address.
async fn view_card(
    State(state): State<Arc<AppState>>,
    Path((username, slug)): Path<(String, String)>,
) -> Result<Json<PublicCardResponse>> {
    let user = owner_for(&state, &username).await?;

    let card = state
        .db
        .get_card(&user.id, &slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Card not found".to_string()))?;

    if card.is_primary {
        return Err(AppError::NotFound("Card not found".to_string()));
    }

    public_card(user.username, card)
}
