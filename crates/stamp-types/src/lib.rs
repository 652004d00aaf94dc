//! # stamp-types
//!
//! Shared domain types used across the stampd workspace: the loyalty
//! programme entities, the ledger views returned to callers, the audit
//! event envelope and the tagged reply every operation resolves to.

pub mod access;
pub mod events;
pub mod ledger;
pub mod program;
pub mod reply;

pub use access::{Caller, Capability};
pub use reply::{Coded, ErrorCode, Reply};

/// Common identifier aliases. All identifiers are opaque strings.
pub type BusinessId = String;
pub type LoyaltyCardId = String;
pub type CustomerId = String;
pub type CustomerCardId = String;
pub type RewardId = String;
pub type PromotionId = String;
pub type StaffMembershipId = String;

/// Random bytes behind every redemption token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// Random bytes behind every entity identifier.
pub const ID_BYTES: usize = 16;

/// Stamps required by a freshly created default card.
pub const DEFAULT_STAMPS_REQUIRED: u32 = 10;

/// Reward description of a freshly created default card.
pub const DEFAULT_REWARD_DESCRIPTION: &str = "Free item";

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
