//! Ledger structures: enrollments, passes and rewards.

use serde::{Deserialize, Serialize};

use crate::{BusinessId, CustomerCardId, CustomerId, LoyaltyCardId, RewardId};

/// One customer's enrollment in a loyalty card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerCard {
    pub id: CustomerCardId,
    pub customer_id: CustomerId,
    pub loyalty_card_id: LoyaltyCardId,
    pub current_stamps: u32,
    pub total_stamps: u64,
    pub total_rewards_earned: u64,
    pub last_scan_at: Option<u64>,
    pub created_at: u64,
}

/// Progress of a customer card, returned after every scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    pub customer_card_id: CustomerCardId,
    pub stamps: u32,
    pub remaining: u32,
    pub rewards_available: u32,
    pub last_scan_at: Option<u64>,
    /// Set when this scan crossed the threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward_id: Option<RewardId>,
}

/// Response to an enrollment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrolledCard {
    pub customer_card_id: CustomerCardId,
    pub current_stamps: u32,
}

/// Wallet pass lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStatus {
    Active,
    Revoked,
}

impl PassStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PassStatus::Active => "active",
            PassStatus::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(PassStatus::Active),
            "revoked" => Some(PassStatus::Revoked),
            _ => None,
        }
    }
}

/// A reusable opaque token bound to one customer card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPass {
    pub id: String,
    pub customer_card_id: CustomerCardId,
    pub business_id: BusinessId,
    pub token: String,
    pub status: PassStatus,
    pub created_at: u64,
    pub revoked_at: Option<u64>,
}

/// Response to a pass or scan-token issuance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    /// `true` when an existing active token was returned.
    pub reused: bool,
}

/// A freshly minted replacement token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassToken {
    pub token: String,
}

/// Bare acknowledgement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Ack = Ack { ok: true };
}

/// Reward lifecycle state. `Consumed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    Issued,
    Consumed,
}

impl RewardStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardStatus::Issued => "issued",
            RewardStatus::Consumed => "consumed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issued" => Some(RewardStatus::Issued),
            "consumed" => Some(RewardStatus::Consumed),
            _ => None,
        }
    }
}

/// A one-time redeemable unit earned at the stamp threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub customer_card_id: CustomerCardId,
    pub business_id: BusinessId,
    pub status: RewardStatus,
    pub issued_at: u64,
    pub consumed_at: Option<u64>,
    pub consumed_by: Option<String>,
    /// Never serialized; handed out only by claim-token generation.
    #[serde(skip)]
    pub claim_token: Option<String>,
}

/// A one-time token for redeeming one reward.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimToken {
    pub claim_token: String,
}

/// Result of a successful reward-claim redemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemedReward {
    pub reward_id: RewardId,
    pub redeemed_at: u64,
}
