//! Typed operation parameters.
//!
//! Field names follow the wire protocol (camelCase). Identity never
//! travels in parameters; it is passed separately as a [`stamp_types::Caller`].

use serde::Deserialize;
use stamp_types::program::StaffRole;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureCustomerCard {
    pub customer_id: String,
    pub loyalty_card_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureBusiness {
    pub owner_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Absent fields keep their value; an empty `accent_color` clears it.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusiness {
    pub business_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

/// Addresses the wallet pass of one customer card.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassTarget {
    pub business_id: String,
    pub customer_card_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionScan {
    pub qr_token: String,
    /// Recorded in event metadata only; never an authorization input.
    #[serde(default)]
    pub actor_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemWalletPass {
    pub business_id: String,
    pub token: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardTarget {
    pub reward_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRewardClaim {
    pub business_id: String,
    #[serde(alias = "claim_token")]
    pub claim_token: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddStaffMember {
    pub business_id: String,
    pub staff_id: String,
    #[serde(default)]
    pub role: StaffRole,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStaffActive {
    #[serde(alias = "staffId")]
    pub staff_membership_id: String,
    pub active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessTarget {
    pub business_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotion {
    pub business_id: String,
    pub name: String,
    pub promo_type: String,
    /// Defaults to now.
    #[serde(default)]
    pub starts_at: Option<u64>,
    #[serde(default)]
    pub ends_at: Option<u64>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPromotionActive {
    pub promotion_id: String,
    pub active: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionTokenTarget {
    pub promotion_id: String,
    pub customer_card_id: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLoyaltyCard {
    pub loyalty_card_id: String,
    #[serde(default)]
    pub stamps_required: Option<u32>,
    #[serde(default)]
    pub reward_description: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTarget {
    pub customer_card_id: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEvents {
    pub business_id: String,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_token_accepts_both_spellings() {
        let camel: RedeemRewardClaim =
            serde_json::from_value(serde_json::json!({"businessId": "b1", "claimToken": "t"}))
                .expect("camel");
        let snake: RedeemRewardClaim =
            serde_json::from_value(serde_json::json!({"businessId": "b1", "claim_token": "t"}))
                .expect("snake");
        assert_eq!(camel.claim_token, snake.claim_token);
    }

    #[test]
    fn test_optional_fields_default() {
        let p: AddStaffMember =
            serde_json::from_value(serde_json::json!({"businessId": "b1", "staffId": "s"}))
                .expect("parse");
        assert_eq!(p.role, StaffRole::Staff);

        let scan: PromotionScan =
            serde_json::from_value(serde_json::json!({"qrToken": "abc"})).expect("parse");
        assert!(scan.actor_id.is_none());
    }
}
