// SPDX-License-Identifier: MIT

//! Per-user card slug allocation.
//!
//! Slugs are short random tokens unique only within the owner's card
//! set, checked with a point lookup on the `{owner_id}_{slug}` document
//! ID. The allocator is bypassed for the very first card, whose slug is
//! forced to the owner's username by the card service.

use rand::Rng;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::services::identity::ALPHABET;

/// Length of generated card slugs.
pub const SLUG_LEN: usize = 3;
/// Maximum allocation attempts before failing closed.
pub const MAX_SLUG_ATTEMPTS: u32 = 5;

/// Generate a random slug candidate.
pub fn slug_candidate() -> String {
    let mut rng = rand::thread_rng();
    (0..SLUG_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Allocate a slug unused within the owner's card set.
///
/// The uniqueness scope is the owner only; two different users may hold
/// the same slug. The subsequent card insert re-checks existence inside
/// the creation transaction, so a lost race surfaces as `Conflict`
/// rather than an overwrite.
pub async fn allocate_slug(db: &FirestoreDb, owner_id: &str) -> Result<String> {
    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = slug_candidate();

        if db.get_card(owner_id, &candidate).await?.is_none() {
            return Ok(candidate);
        }

        tracing::debug!(attempt, owner_id, candidate = %candidate, "Slug candidate taken, retrying");
    }

    Err(AppError::RetryExhausted("slug allocation"))
}
