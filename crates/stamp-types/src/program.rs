//! Loyalty programme structures: businesses, cards, staff and promotions.

use serde::{Deserialize, Serialize};

use crate::{BusinessId, LoyaltyCardId, PromotionId, StaffMembershipId};

/// A tenant owning loyalty programmes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Business {
    pub id: BusinessId,
    pub owner_id: String,
    pub display_name: String,
    pub accent_color: Option<String>,
    pub created_at: u64,
}

/// Response to the idempotent business bootstrap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessSetup {
    pub business_id: BusinessId,
    pub loyalty_card_id: LoyaltyCardId,
}

/// A stamp-card programme definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyCard {
    pub id: LoyaltyCardId,
    pub business_id: BusinessId,
    pub stamps_required: u32,
    pub reward_description: String,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: u64,
}

/// Staff role within a business. Both roles carry redemption authority.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    #[default]
    Staff,
    Manager,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Staff => "staff",
            StaffRole::Manager => "manager",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "staff" => Some(StaffRole::Staff),
            "manager" => Some(StaffRole::Manager),
            _ => None,
        }
    }
}

/// A business-scoped, revocable grant of redemption authority.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffMembership {
    pub id: StaffMembershipId,
    pub business_id: BusinessId,
    pub staff_id: String,
    pub role: StaffRole,
    pub is_active: bool,
    pub created_at: u64,
}

/// A time-boxed promotion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    pub id: PromotionId,
    pub business_id: BusinessId,
    pub name: String,
    pub promo_type: String,
    pub starts_at: u64,
    /// `None` means open-ended.
    pub ends_at: Option<u64>,
    pub is_active: bool,
    pub created_at: u64,
}

impl Promotion {
    /// Whether the promotion accepts scans at `now`.
    pub fn is_live(&self, now: u64) -> bool {
        self.is_active && self.starts_at <= now && self.ends_at.map_or(true, |end| now < end)
    }
}

/// Response to promotion creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPromotion {
    pub promotion_id: PromotionId,
}

/// The public view of a promotion shown on a business's join page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPromotion {
    pub id: PromotionId,
    pub name: String,
    pub promo_type: String,
    pub ends_at: Option<u64>,
}

impl From<Promotion> for PublicPromotion {
    fn from(p: Promotion) -> Self {
        Self {
            id: p.id,
            name: p.name,
            promo_type: p.promo_type,
            ends_at: p.ends_at,
        }
    }
}
