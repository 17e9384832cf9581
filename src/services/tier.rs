// SPDX-License-Identifier: MIT

//! Tier-based admission control for card creation.

use crate::error::AppError;
use crate::models::User;

/// Maximum cards on the free tier.
pub const FREE_LIMIT: u32 = 1;
/// Maximum cards on the pro tier.
pub const PRO_LIMIT: u32 = 10;

/// Card limit for a subscription tier.
pub fn limit_for(is_pro: bool) -> u32 {
    if is_pro {
        PRO_LIMIT
    } else {
        FREE_LIMIT
    }
}

/// Human-readable tier name, used in error responses.
pub fn tier_name(is_pro: bool) -> &'static str {
    if is_pro {
        "pro"
    } else {
        "free"
    }
}

/// Whether the user may create another card.
pub fn can_create(user: &User) -> bool {
    user.card_count < limit_for(user.is_pro)
}

/// Admission check before card creation.
///
/// Callers run this immediately before allocating a slug, and again on
/// the fresh user document re-read inside the creation transaction.
pub fn check_can_create(user: &User) -> Result<(), AppError> {
    if can_create(user) {
        Ok(())
    } else {
        Err(AppError::LimitExceeded {
            tier: tier_name(user.is_pro),
            limit: limit_for(user.is_pro),
        })
    }
}
