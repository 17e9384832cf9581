// SPDX-License-Identifier: MIT

//! Card lifecycle service: creation, primary switching, deletion.
//!
//! Owns the exactly-one-primary-card invariant. Every mutation that
//! touches `is_primary`, `primary_card_id` or `card_count` goes through
//! one of the atomic commits in the db layer; there are no independent
//! single-document updates of those fields.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Card, CardPayload, User};
use crate::services::{slug, tier, url};
use crate::time_utils::now_rfc3339;

/// Bounded retries for the primary-switch transaction before
/// surfacing `Conflict` to the caller.
const MAX_TXN_ATTEMPTS: u32 = 3;

/// Card lifecycle operations for one store.
#[derive(Clone)]
pub struct CardService {
    db: FirestoreDb,
}

impl CardService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Create a card for a user.
    ///
    /// The first card is promoted: its slug is forced to the username,
    /// it becomes primary, and the user's primary pointer is set in the
    /// same transaction. Subsequent cards get a random slug and are
    /// secondary. The tier limit is checked here for a fast rejection
    /// and re-validated inside the creation transaction on a fresh user
    /// read, so concurrent creations cannot overshoot it.
    pub async fn create_card(&self, user_id: &str, payload: CardPayload) -> Result<Card> {
        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

        tier::check_can_create(&user)?;

        let first_card = user.pending_first_card || user.card_count == 0;
        let slug = if first_card {
            // First-card promotion bypasses the allocator entirely.
            user.username.clone()
        } else {
            slug::allocate_slug(&self.db, user_id).await?
        };

        let now = now_rfc3339();
        let card = Card {
            slug: slug.clone(),
            owner_id: user_id.to_string(),
            is_primary: first_card,
            is_active: true,
            url: url::resolve(&user.username, &slug, first_card),
            payload,
            created_at: now.clone(),
            updated_at: now,
        };

        self.db
            .create_card_atomic(&card, tier::check_can_create)
            .await?;

        Ok(card)
    }

    /// Switch the user's primary card to `target_slug` (pro feature).
    ///
    /// Runs as a single atomic transaction demoting the current primary,
    /// promoting the target, and repointing the user document, with URLs
    /// recomputed for both cards. Idempotent when the target is already
    /// primary. Retried internally on contention, then `Conflict`.
    pub async fn set_primary(&self, user_id: &str, target_slug: &str) -> Result<Card> {
        for attempt in 1..=MAX_TXN_ATTEMPTS {
            let user = self
                .db
                .get_user(user_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))?;

            if !user.is_pro {
                return Err(AppError::NotAuthorized(
                    "Switching the primary card is a pro feature".to_string(),
                ));
            }

            let target = self
                .db
                .get_card(user_id, target_slug)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Card {} not found", target_slug)))?;

            if target.is_primary {
                tracing::debug!(
                    user_id,
                    slug = target_slug,
                    "Target card already primary (no-op)"
                );
                return Ok(target);
            }

            let current_slug = user.primary_card_id.clone().ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "User {} has cards but no primary pointer",
                    user_id
                ))
            })?;

            let current = self
                .db
                .get_card(user_id, &current_slug)
                .await?
                .ok_or_else(|| {
                    AppError::Internal(anyhow::anyhow!(
                        "Primary card {} missing for user {}",
                        current_slug,
                        user_id
                    ))
                })?;

            let now = now_rfc3339();

            let mut demoted = current;
            demoted.is_primary = false;
            demoted.url = url::resolve(&user.username, &demoted.slug, false);
            demoted.updated_at = now.clone();

            let mut promoted = target;
            promoted.is_primary = true;
            promoted.url = url::resolve(&user.username, &promoted.slug, true);
            promoted.updated_at = now.clone();

            let mut updated_user = user;
            updated_user.primary_card_id = Some(promoted.slug.clone());
            updated_user.updated_at = now;

            match self
                .db
                .commit_primary_swap(&updated_user, &demoted, &promoted)
                .await
            {
                Ok(()) => return Ok(promoted),
                Err(AppError::Conflict(msg)) if attempt < MAX_TXN_ATTEMPTS => {
                    tracing::warn!(user_id, attempt, error = %msg, "Primary swap contention, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Conflict(
            "Primary switch failed after repeated contention".to_string(),
        ))
    }

    /// Delete a card.
    ///
    /// The primary card may only be deleted when it is the user's sole
    /// card; the account then reverts to the awaiting-first-card state
    /// and the next creation re-runs first-card promotion. With other
    /// cards present, callers must reassign the primary first.
    pub async fn delete_card(&self, user_id: &str, slug: &str) -> Result<()> {
        let card = self
            .db
            .get_card(user_id, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Card {} not found", slug)))?;

        // The sole-card policy is enforced on the fresh user read inside
        // the transaction.
        self.db.delete_card_atomic(&card).await?;
        Ok(())
    }

    /// Helper for tests and re-validation: the invariant check that
    /// every observable state must satisfy for one user.
    pub fn primary_invariant_holds(user: &User, cards: &[Card]) -> bool {
        let primaries: Vec<&Card> = cards.iter().filter(|c| c.is_primary).collect();
        match (cards.len(), primaries.len()) {
            (0, 0) => user.primary_card_id.is_none(),
            (_, 1) => user.primary_card_id.as_deref() == Some(primaries[0].slug.as_str()),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(primary: Option<&str>, count: u32) -> User {
        User {
            id: "u1".to_string(),
            username: "ab12cd".to_string(),
            is_pro: true,
            primary_card_id: primary.map(String::from),
            card_count: count,
            pending_first_card: count == 0,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn card(slug: &str, is_primary: bool) -> Card {
        Card {
            slug: slug.to_string(),
            owner_id: "u1".to_string(),
            is_primary,
            is_active: true,
            url: url::resolve("ab12cd", slug, is_primary),
            payload: CardPayload::default(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_invariant_no_cards() {
        assert!(CardService::primary_invariant_holds(&user(None, 0), &[]));
        assert!(!CardService::primary_invariant_holds(
            &user(Some("ab12cd"), 0),
            &[]
        ));
    }

    #[test]
    fn test_invariant_single_primary() {
        let cards = vec![card("ab12cd", true), card("x7q", false)];
        assert!(CardService::primary_invariant_holds(
            &user(Some("ab12cd"), 2),
            &cards
        ));
        assert!(!CardService::primary_invariant_holds(
            &user(Some("x7q"), 2),
            &cards
        ));
    }

    #[test]
    fn test_invariant_rejects_two_primaries() {
        let cards = vec![card("ab12cd", true), card("x7q", true)];
        assert!(!CardService::primary_invariant_holds(
            &user(Some("ab12cd"), 2),
            &cards
        ));
    }

    #[test]
    fn test_invariant_rejects_zero_primaries_with_cards() {
        let cards = vec![card("ab12cd", false)];
        assert!(!CardService::primary_invariant_holds(
            &user(None, 1),
            &cards
        ));
    }
}
