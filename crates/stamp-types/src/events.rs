//! Audit event types.
//!
//! Every state-changing ledger operation appends one or more events. The
//! same envelope is pushed to daemon subscribers once the transaction that
//! wrote it has committed.

use serde::{Deserialize, Serialize};

use crate::BusinessId;

/// An immutable audit record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub business_id: BusinessId,
    pub event_type: EventType,
    /// `None` for system or anonymous actors.
    pub actor_id: Option<String>,
    pub customer_id: Option<String>,
    pub created_at: u64,
    pub metadata: serde_json::Value,
}

/// All event types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    // Programme lifecycle
    BusinessCreated,
    BusinessUpdated,
    LoyaltyCardCreated,
    LoyaltyCardUpdated,
    PromotionCreated,
    PromotionUpdated,

    // Staff
    StaffAdded,
    StaffUpdated,

    // Enrollment and passes
    CustomerEnrolled,
    WalletPassIssued,
    WalletPassRevoked,
    PromotionTokenIssued,

    // Ledger
    StampAdded,
    RewardIssued,
    RewardClaimIssued,
    RewardRedeemed,
}

impl EventType {
    /// Stable string form stored in the event log.
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::BusinessCreated => "business_created",
            EventType::BusinessUpdated => "business_updated",
            EventType::LoyaltyCardCreated => "loyalty_card_created",
            EventType::LoyaltyCardUpdated => "loyalty_card_updated",
            EventType::PromotionCreated => "promotion_created",
            EventType::PromotionUpdated => "promotion_updated",
            EventType::StaffAdded => "staff_added",
            EventType::StaffUpdated => "staff_updated",
            EventType::CustomerEnrolled => "customer_enrolled",
            EventType::WalletPassIssued => "wallet_pass_issued",
            EventType::WalletPassRevoked => "wallet_pass_revoked",
            EventType::PromotionTokenIssued => "promotion_token_issued",
            EventType::StampAdded => "stamp_added",
            EventType::RewardIssued => "reward_issued",
            EventType::RewardClaimIssued => "reward_claim_issued",
            EventType::RewardRedeemed => "reward_redeemed",
        }
    }

    /// Parse the stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        ALL_EVENT_TYPES.iter().copied().find(|t| t.as_str() == s)
    }

    /// Coarse category used by subscription filters.
    pub fn category(self) -> &'static str {
        match self {
            EventType::BusinessCreated
            | EventType::BusinessUpdated
            | EventType::LoyaltyCardCreated
            | EventType::LoyaltyCardUpdated
            | EventType::PromotionCreated
            | EventType::PromotionUpdated
            | EventType::StaffAdded
            | EventType::StaffUpdated => "program",
            EventType::CustomerEnrolled
            | EventType::WalletPassIssued
            | EventType::WalletPassRevoked
            | EventType::PromotionTokenIssued => "pass",
            EventType::StampAdded
            | EventType::RewardIssued
            | EventType::RewardClaimIssued
            | EventType::RewardRedeemed => "ledger",
        }
    }
}

const ALL_EVENT_TYPES: &[EventType] = &[
    EventType::BusinessCreated,
    EventType::BusinessUpdated,
    EventType::LoyaltyCardCreated,
    EventType::LoyaltyCardUpdated,
    EventType::PromotionCreated,
    EventType::PromotionUpdated,
    EventType::StaffAdded,
    EventType::StaffUpdated,
    EventType::CustomerEnrolled,
    EventType::WalletPassIssued,
    EventType::WalletPassRevoked,
    EventType::PromotionTokenIssued,
    EventType::StampAdded,
    EventType::RewardIssued,
    EventType::RewardClaimIssued,
    EventType::RewardRedeemed,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_form_matches_serde() {
        for t in ALL_EVENT_TYPES {
            let json = serde_json::to_value(t).expect("serialize");
            assert_eq!(json, serde_json::json!(t.as_str()));
            assert_eq!(EventType::parse(t.as_str()), Some(*t));
        }
    }

    #[test]
    fn test_unknown_event_type() {
        assert_eq!(EventType::parse("stamp_removed"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(EventType::StampAdded.category(), "ledger");
        assert_eq!(EventType::WalletPassRevoked.category(), "pass");
        assert_eq!(EventType::StaffUpdated.category(), "program");
    }
}
