// SPDX-License-Identifier: MIT

//! Username allocation and first-sign-in user creation.
//!
//! Usernames are random fixed-length tokens, checked for global
//! uniqueness against the `usernames` reservation collection and then
//! claimed in the same transaction that creates the user document. A
//! lost race on the claim counts as a collision and the loop moves on
//! to a fresh candidate.

use rand::Rng;

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::user::UsernameReservation;
use crate::models::User;
use crate::time_utils::now_rfc3339;

/// Length of generated usernames.
pub const USERNAME_LEN: usize = 6;
/// Candidate alphabet for generated usernames and slugs.
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
/// Maximum allocation attempts before failing closed.
pub const MAX_USERNAME_ATTEMPTS: u32 = 5;

/// Generate a random username candidate.
pub fn username_candidate() -> String {
    let mut rng = rand::thread_rng();
    (0..USERNAME_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether a string is a well-formed username (3-20 chars of `[a-z0-9-]`).
///
/// Generated usernames always pass; this guards externally supplied
/// path segments on the public viewer route.
pub fn is_valid_username(username: &str) -> bool {
    (3..=20).contains(&username.len())
        && username
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Username allocation and account creation.
#[derive(Clone)]
pub struct IdentityService {
    db: FirestoreDb,
}

impl IdentityService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Create the account for a first-time identity-provider callback.
    ///
    /// Idempotent for repeated callbacks with the same subject: an
    /// existing user document is returned unchanged.
    ///
    /// The point lookup filters out taken candidates cheaply; the
    /// transactional claim is what actually allocates the name, writing
    /// the reservation and the user document in one commit so a failure
    /// between the two cannot strand a reservation. A concurrent
    /// allocator racing on the same candidate loses cleanly and this
    /// loop retries with a fresh one.
    pub async fn create_user(&self, subject: &str) -> Result<User> {
        if let Some(existing) = self.db.get_user(subject).await? {
            tracing::debug!(user_id = subject, "Returning existing user for callback");
            return Ok(existing);
        }

        for attempt in 1..=MAX_USERNAME_ATTEMPTS {
            let candidate = username_candidate();

            if self
                .db
                .get_username_reservation(&candidate)
                .await?
                .is_some()
            {
                tracing::debug!(attempt, candidate = %candidate, "Username candidate taken, retrying");
                continue;
            }

            let now = now_rfc3339();
            let reservation = UsernameReservation {
                username: candidate.clone(),
                user_id: subject.to_string(),
                reserved_at: now.clone(),
            };
            let user = User::new(subject.to_string(), candidate, now);

            match self.db.create_user_atomic(&user, &reservation).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user.id,
                        username = %user.username,
                        "User created, awaiting first card"
                    );
                    return Ok(user);
                }
                Err(AppError::Conflict(_)) => {
                    // Either the candidate was claimed or a concurrent
                    // callback already created this user.
                    if let Some(existing) = self.db.get_user(subject).await? {
                        tracing::debug!(
                            user_id = subject,
                            "Lost signup race to a concurrent callback"
                        );
                        return Ok(existing);
                    }
                    tracing::debug!(attempt, candidate = %user.username, "Lost username claim race, retrying");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::RetryExhausted("username allocation"))
    }
}
