// SPDX-License-Identifier: MIT

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Card, CardPayload};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/cards", get(list_cards).post(create_card))
        .route("/api/cards/{slug}/primary", post(set_primary))
        .route("/api/cards/{slug}", delete(delete_card))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub username: String,
    pub is_pro: bool,
    pub primary_card_id: Option<String>,
    pub card_count: u32,
    pub pending_first_card: bool,
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(UserResponse {
        user_id: profile.id,
        username: profile.username,
        is_pro: profile.is_pro,
        primary_card_id: profile.primary_card_id,
        card_count: profile.card_count,
        pending_first_card: profile.pending_first_card,
    }))
}

// ─── Cards ───────────────────────────────────────────────────

/// Card as returned to the owner.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardResponse {
    pub slug: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub url: String,
    pub payload: CardPayload,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            slug: card.slug,
            is_primary: card.is_primary,
            is_active: card.is_active,
            url: card.url,
            payload: card.payload,
            created_at: card.created_at,
            updated_at: card.updated_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CardsResponse {
    pub cards: Vec<CardResponse>,
}

/// List the caller's cards, oldest first.
async fn list_cards(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CardsResponse>> {
    let cards = state.db.list_cards_for_user(&user.user_id).await?;

    Ok(Json(CardsResponse {
        cards: cards.into_iter().map(CardResponse::from).collect(),
    }))
}

/// Card creation request: the contact payload only. Slug, primary flag
/// and URL are assigned by the server.
#[derive(Deserialize)]
pub struct CreateCardRequest {
    #[serde(default)]
    pub payload: CardPayload,
}

/// Create a card for the caller.
async fn create_card(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateCardRequest>,
) -> Result<Json<CardResponse>> {
    body.payload
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid card payload: {}", e)))?;

    let card = state
        .card_service
        .create_card(&user.user_id, body.payload)
        .await?;

    Ok(Json(card.into()))
}

/// Make the named card the caller's primary card (pro feature).
async fn set_primary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Json<CardResponse>> {
    let card = state.card_service.set_primary(&user.user_id, &slug).await?;
    Ok(Json(card.into()))
}

/// Delete one of the caller's cards.
async fn delete_card(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>> {
    state.card_service.delete_card(&user.user_id, &slug).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
