// SPDX-License-Identifier: MIT

//! Card model for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// A business card stored in Firestore.
///
/// The document ID is `{owner_id}_{slug}`, which makes the per-owner
/// slug uniqueness a document-existence check: a second card with the
/// same slug for the same owner cannot be inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Short token unique within the owner's card set.
    /// Equals the owner's username iff this is the owner's original card.
    pub slug: String,
    /// Owning user ID
    pub owner_id: String,
    /// Whether this is the owner's primary card (at most one per user)
    pub is_primary: bool,
    /// Inactive cards are hidden from the public viewer
    pub is_active: bool,
    /// Denormalized canonical path, recomputed whenever `is_primary`
    /// changes. Only this subsystem writes it.
    pub url: String,
    /// Contact fields shown on the card. Validated at the API boundary;
    /// never inspected by the identity/consistency logic.
    pub payload: CardPayload,
    /// When the card was created (RFC3339)
    pub created_at: String,
    /// Last mutation timestamp (RFC3339)
    pub updated_at: String,
}

impl Card {
    /// Firestore document ID for a card.
    pub fn doc_id(owner_id: &str, slug: &str) -> String {
        format!("{}_{}", owner_id, slug)
    }
}

/// Contact fields carried on a card.
///
/// All fields are optional; the OCR pipeline and the card editor fill
/// them in incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CardPayload {
    #[validate(length(max = 100))]
    pub display_name: Option<String>,
    #[validate(length(max = 100))]
    pub job_title: Option<String>,
    #[validate(length(max = 100))]
    pub company: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}
