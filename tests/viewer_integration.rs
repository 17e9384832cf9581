// SPDX-License-Identifier: MIT

//! Public card viewer integration tests (emulator only).
//!
//! The viewer addresses cards exactly as the URL resolver writes them:
//! `/c/{username}` is the primary card, `/c/{username}/{slug}` a
//! secondary one.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tapfolio::config::Config;
use tapfolio::models::CardPayload;
use tapfolio::routes::create_router;
use tapfolio::AppState;
use tower::ServiceExt;

mod common;
use common::{test_db, test_services, unique_user_id};

async fn emulator_app() -> (axum::Router, Arc<AppState>) {
    let db = test_db().await;
    let (identity_service, card_service) = test_services(&db);
    let state = Arc::new(AppState {
        config: Config::test_default(),
        db,
        identity_service,
        card_service,
    });
    (create_router(state.clone()), state)
}

#[tokio::test]
async fn test_primary_card_is_served_at_bare_username_path() {
    require_emulator!();

    let (app, state) = emulator_app().await;
    let subject = unique_user_id("viewer");

    let user = state.identity_service.create_user(&subject).await.unwrap();
    state
        .card_service
        .create_card(&subject, CardPayload::default())
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/c/{}", user.username))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_secondary_card_is_served_at_slugged_path() {
    require_emulator!();

    let (app, state) = emulator_app().await;
    let subject = unique_user_id("viewer2");

    let user = state.identity_service.create_user(&subject).await.unwrap();
    state
        .card_service
        .create_card(&subject, CardPayload::default())
        .await
        .unwrap();

    let mut profile = state.db.get_user(&subject).await.unwrap().unwrap();
    profile.is_pro = true;
    state.db.upsert_user(&profile).await.unwrap();

    let second = state
        .card_service
        .create_card(&subject, CardPayload::default())
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/c/{}/{}", user.username, second.slug))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_primary_card_is_not_served_at_slugged_path() {
    // The primary card has exactly one public address: the bare path.
    require_emulator!();

    let (app, state) = emulator_app().await;
    let subject = unique_user_id("viewer3");

    let user = state.identity_service.create_user(&subject).await.unwrap();
    let first = state
        .card_service
        .create_card(&subject, CardPayload::default())
        .await
        .unwrap();
    assert!(first.is_primary);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/c/{}/{}", user.username, first.slug))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_username_is_not_found() {
    require_emulator!();

    let (app, _) = emulator_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/c/zzzzzz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
