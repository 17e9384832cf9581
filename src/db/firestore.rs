// SPDX-License-Identifier: MIT

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + primary-card pointer + card counter)
//! - Username reservations (global uniqueness claims)
//! - Cards (per-user slug namespace, primary flag, denormalized URL)
//!
//! The multi-document invariants (exactly one primary card, card count
//! vs. tier limit) are maintained by the transactional methods at the
//! bottom of this file; callers never update the affected documents
//! independently.

use crate::db::collections;
use crate::error::AppError;
use crate::models::user::UsernameReservation;
use crate::models::{Card, User};

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Map a Firestore error onto the application error model.
///
/// Used by the plain reads and single-document writes; the transactional
/// methods map their commit failures to `Conflict` themselves.
fn map_store_err(e: firestore::errors::FirestoreError) -> AppError {
    AppError::Unavailable(e.to_string())
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            AppError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client.as_ref().ok_or_else(|| {
            AppError::Unavailable("Database not connected (offline mode)".to_string())
        })
    }

    /// Clone of the client whose reads are enlisted in `transaction`.
    ///
    /// Reads through this clone carry the transaction ID as their
    /// consistency selector, so the commit fails if any document read
    /// through it is modified concurrently. Plain reads on the base
    /// client would leave the commit without read preconditions.
    fn transactional_reader(
        client: &firestore::FirestoreDb,
        transaction: &firestore::FirestoreTransaction<'_>,
    ) -> firestore::FirestoreDb {
        client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        )
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their identity-provider subject.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(map_store_err)
    }

    /// Create or update a user document.
    ///
    /// Only used for single-document updates (signup, billing flag);
    /// card-affecting user mutations go through the transactional
    /// methods below.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .execute()
            .await
            .map_err(map_store_err)?;
        Ok(())
    }

    // ─── Username Reservations ───────────────────────────────────

    /// Look up a username reservation (point read).
    pub async fn get_username_reservation(
        &self,
        username: &str,
    ) -> Result<Option<UsernameReservation>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERNAMES)
            .obj()
            .one(username)
            .await
            .map_err(map_store_err)
    }

    /// Atomically create a user together with their username reservation.
    ///
    /// Both documents are read transactionally and must be absent: a
    /// racing allocator claiming the same candidate, or a concurrent
    /// callback creating the same user under a different name, aborts
    /// this commit with `Conflict`. Both documents land in one commit,
    /// so a failure between the claim and the user write cannot strand
    /// a reservation.
    pub async fn create_user_atomic(
        &self,
        user: &User,
        reservation: &UsernameReservation,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to begin transaction: {}", e)))?;
        let reader = Self::transactional_reader(client, &transaction);

        let taken: Option<UsernameReservation> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERNAMES)
            .obj()
            .one(&reservation.username)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read reservation in transaction: {}", e))
            })?;

        if taken.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(format!(
                "Username {} is already reserved",
                reservation.username
            )));
        }

        let existing: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user.id)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read user in transaction: {}", e))
            })?;

        if existing.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(format!("User {} already exists", user.id)));
        }

        client
            .fluent()
            .update()
            .in_col(collections::USERNAMES)
            .document_id(&reservation.username)
            .object(reservation)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add reservation to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Conflict(format!("User creation commit failed: {}", e)))?;

        tracing::info!(
            user_id = %user.id,
            username = %reservation.username,
            "User and username reservation created atomically"
        );

        Ok(())
    }

    // ─── Card Operations ─────────────────────────────────────────

    /// Get a card by owner and slug (point read on the composite ID).
    pub async fn get_card(&self, owner_id: &str, slug: &str) -> Result<Option<Card>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CARDS)
            .obj()
            .one(&Card::doc_id(owner_id, slug))
            .await
            .map_err(map_store_err)
    }

    /// List all cards owned by a user, oldest first.
    pub async fn list_cards_for_user(&self, owner_id: &str) -> Result<Vec<Card>, AppError> {
        let owner = owner_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CARDS)
            .filter(move |q| q.field("owner_id").eq(owner.clone()))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(map_store_err)
    }

    // ─── Atomic Card Mutations ───────────────────────────────────

    /// Atomically write a new card together with the updated user document.
    ///
    /// The user document is re-read transactionally and the tier limit
    /// re-validated on that fresh copy; a concurrent mutation of the user
    /// aborts the commit, so the count-then-write sequence cannot
    /// overshoot the limit. For first-card promotion the card carries
    /// `is_primary = true` and the user gets the new `primary_card_id` in
    /// the same commit; no reader sees a card without its owner's counter
    /// and primary pointer agreeing with it.
    ///
    /// `limit_check` runs against the fresh user read; its error aborts
    /// the transaction.
    pub async fn create_card_atomic(
        &self,
        card: &Card,
        limit_check: impl Fn(&User) -> Result<(), AppError>,
    ) -> Result<User, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to begin transaction: {}", e)))?;
        let reader = Self::transactional_reader(client, &transaction);

        let current: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&card.owner_id)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(mut user) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "User {} not found",
                card.owner_id
            )));
        };

        if let Err(e) = limit_check(&user) {
            let _ = transaction.rollback().await;
            return Err(e);
        }

        // A lost slug race is a conflict, never an overwrite.
        let existing: Option<Card> = reader
            .fluent()
            .select()
            .by_id_in(collections::CARDS)
            .obj()
            .one(&Card::doc_id(&card.owner_id, &card.slug))
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read card in transaction: {}", e))
            })?;

        if existing.is_some() {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(format!(
                "Card slug {} already exists for this user",
                card.slug
            )));
        }

        user.card_count += 1;
        user.updated_at = card.created_at.clone();
        if card.is_primary {
            user.primary_card_id = Some(card.slug.clone());
            user.pending_first_card = false;
        }

        client
            .fluent()
            .update()
            .in_col(collections::CARDS)
            .document_id(Card::doc_id(&card.owner_id, &card.slug))
            .object(card)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add card to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Conflict(format!("Card creation commit failed: {}", e)))?;

        tracing::info!(
            owner_id = %card.owner_id,
            slug = %card.slug,
            is_primary = card.is_primary,
            card_count = user.card_count,
            "Card created atomically"
        );

        Ok(user)
    }

    /// Atomically swap the primary card: demote the current primary,
    /// promote the target, and repoint the user document.
    ///
    /// A single attempt; the caller bounds retries and maps the final
    /// failure to `Conflict`. The user's primary pointer is re-read
    /// transactionally and must still name the card being demoted,
    /// otherwise the attempt aborts with `Conflict` so the caller can
    /// recompute from fresh state. Every card mutation also writes the
    /// owning user document, so the transactional user read makes any
    /// concurrent card change abort this commit. All three documents
    /// commit together, so a reader never observes zero or two primary
    /// cards for the user.
    pub async fn commit_primary_swap(
        &self,
        user: &User,
        demoted: &Card,
        promoted: &Card,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to begin transaction: {}", e)))?;
        let reader = Self::transactional_reader(client, &transaction);

        let fresh: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user.id)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read user in transaction: {}", e))
            })?;

        let pointer_unchanged = fresh
            .as_ref()
            .and_then(|u| u.primary_card_id.as_deref())
            .is_some_and(|slug| slug == demoted.slug);

        if !pointer_unchanged {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(
                "Primary pointer moved during swap".to_string(),
            ));
        }

        for card in [demoted, promoted] {
            client
                .fluent()
                .update()
                .in_col(collections::CARDS)
                .document_id(Card::doc_id(&card.owner_id, &card.slug))
                .object(card)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Unavailable(format!("Failed to add card to transaction: {}", e))
                })?;
        }

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Conflict(format!("Primary swap commit failed: {}", e)))?;

        tracing::info!(
            user_id = %user.id,
            demoted = %demoted.slug,
            promoted = %promoted.slug,
            "Primary card swapped atomically"
        );

        Ok(())
    }

    /// Atomically delete a card together with the updated user document.
    ///
    /// Both documents are re-read transactionally: the counter is
    /// decremented on the fresh user copy, the primary flag is taken from
    /// the fresh card (not the caller's, which may predate a concurrent
    /// primary swap), and deleting the primary card is aborted if other
    /// cards still exist.
    pub async fn delete_card_atomic(&self, card: &Card) -> Result<User, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Unavailable(format!("Failed to begin transaction: {}", e)))?;
        let reader = Self::transactional_reader(client, &transaction);

        let current: Option<User> = reader
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&card.owner_id)
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read user in transaction: {}", e))
            })?;

        let Some(mut user) = current else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!(
                "User {} not found",
                card.owner_id
            )));
        };

        let fresh: Option<Card> = reader
            .fluent()
            .select()
            .by_id_in(collections::CARDS)
            .obj()
            .one(&Card::doc_id(&card.owner_id, &card.slug))
            .await
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to read card in transaction: {}", e))
            })?;

        let Some(card) = fresh else {
            let _ = transaction.rollback().await;
            return Err(AppError::NotFound(format!("Card {} not found", card.slug)));
        };

        if card.is_primary && user.card_count > 1 {
            let _ = transaction.rollback().await;
            return Err(AppError::Conflict(
                "Reassign the primary card before deleting it".to_string(),
            ));
        }

        user.card_count = user.card_count.saturating_sub(1);
        user.updated_at = crate::time_utils::now_rfc3339();
        if card.is_primary {
            user.primary_card_id = None;
            user.pending_first_card = true;
        }

        client
            .fluent()
            .delete()
            .from(collections::CARDS)
            .document_id(Card::doc_id(&card.owner_id, &card.slug))
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add deletion to transaction: {}", e))
            })?;

        client
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Unavailable(format!("Failed to add user to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Conflict(format!("Card deletion commit failed: {}", e)))?;

        tracing::info!(
            owner_id = %card.owner_id,
            slug = %card.slug,
            card_count = user.card_count,
            "Card deleted atomically"
        );

        Ok(user)
    }
}
