// SPDX-License-Identifier: MIT

//! Tapfolio: digital business card backend.
//!
//! This crate provides the card identity & consistency core: username
//! allocation, per-user slug allocation, tier-gated card creation, and
//! enforcement of the exactly-one-primary-card invariant.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CardService, IdentityService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub identity_service: IdentityService,
    pub card_service: CardService,
}
