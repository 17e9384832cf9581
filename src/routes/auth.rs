// SPDX-License-Identifier: MIT

//! Identity-provider callback boundary.
//!
//! The provider verifies credentials and calls back with a stable
//! opaque subject. First sign-in allocates a username and creates the
//! user document; repeat sign-ins are idempotent. The callback is
//! authenticated with a shared secret header.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_session_jwt, SESSION_COOKIE};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/callback", post(auth_callback))
        .route("/auth/logout", get(logout))
}

/// Callback body from the identity provider.
#[derive(Deserialize)]
pub struct CallbackRequest {
    /// Stable opaque subject identifying the signed-in user
    pub subject: String,
}

/// Session response after a successful callback.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub user_id: String,
    pub username: String,
    pub is_pro: bool,
    pub pending_first_card: bool,
}

/// Handle the identity-provider callback: create the user on first
/// sign-in and issue a session cookie.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<CallbackRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let provided = headers
        .get("x-identity-secret")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if provided != state.config.identity_callback_secret {
        tracing::warn!("Identity callback with bad shared secret");
        return Err(AppError::Unauthorized);
    }

    if body.subject.is_empty() {
        return Err(AppError::BadRequest("Missing subject".to_string()));
    }

    let user = state.identity_service.create_user(&body.subject).await?;

    let token = create_session_jwt(&user.id, &state.config.jwt_signing_key)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(SessionResponse {
            user_id: user.id,
            username: user.username,
            is_pro: user.is_pro,
            pending_first_card: user.pending_first_card,
        }),
    ))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.remove(Cookie::from(SESSION_COOKIE)),
        Json(serde_json::json!({ "success": true })),
    )
}
