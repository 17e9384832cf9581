// SPDX-License-Identifier: MIT

//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// The document ID is the opaque subject supplied by the identity
/// provider; `username` is the public handle and is globally unique
/// (claimed via the `usernames` reservation collection).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable opaque identity-provider subject (also the document ID)
    pub id: String,
    /// Globally unique handle; path segment of the primary card URL
    pub username: String,
    /// Pro subscription flag, written by the billing integration
    pub is_pro: bool,
    /// Slug of this user's primary card, if any card exists
    pub primary_card_id: Option<String>,
    /// Denormalized count of this user's cards.
    /// Maintained inside the same transaction as every card create or
    /// delete so the tier gate's re-check gets conflict detection.
    pub card_count: u32,
    /// Set at signup, cleared when the first card is promoted
    pub pending_first_card: bool,
    /// When the user first signed in (RFC3339)
    pub created_at: String,
    /// Last mutation timestamp (RFC3339)
    pub updated_at: String,
}

impl User {
    /// A fresh account as created by the first identity-provider callback.
    pub fn new(id: String, username: String, now: String) -> Self {
        Self {
            id,
            username,
            is_pro: false,
            primary_card_id: None,
            card_count: 0,
            pending_first_card: true,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Marker document in the `usernames` collection, keyed by username.
///
/// Written in the same transaction as the user document, after a
/// transactional read has verified the name is unclaimed, so a
/// concurrent claim of the same username aborts instead of silently
/// overwriting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameReservation {
    /// The reserved username (also the document ID)
    pub username: String,
    /// Owning user ID
    pub user_id: String,
    /// When the reservation was made (RFC3339)
    pub reserved_at: String,
}
