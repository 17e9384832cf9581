// SPDX-License-Identifier: MIT

//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    /// Username reservations (keyed by username, claimed with create semantics)
    pub const USERNAMES: &str = "usernames";
    /// Cards (keyed by `{owner_id}_{slug}`)
    pub const CARDS: &str = "cards";
}
