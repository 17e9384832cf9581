// SPDX-License-Identifier: MIT

//! Business services for the identity & consistency core.

pub mod cards;
pub mod identity;
pub mod slug;
pub mod tier;
pub mod url;

pub use cards::CardService;
pub use identity::IdentityService;
