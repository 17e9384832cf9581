// SPDX-License-Identifier: MIT

//! Data models for the application.

pub mod card;
pub mod user;

pub use card::{Card, CardPayload};
pub use user::{User, UsernameReservation};
