//! Staff, promotion and loyalty card administration handlers.

use std::sync::Arc;

use serde_json::Value;
use stamp_ledger::params::{
    AddStaffMember, BusinessTarget, CreatePromotion, PromotionTokenTarget, SetPromotionActive,
    SetStaffActive, UpdateBusiness, UpdateLoyaltyCard,
};
use stamp_types::Caller;

use super::{call, parse, Result};
use crate::DaemonState;

pub async fn update_business(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: UpdateBusiness = parse(params)?;
    call(state, move |ledger| ledger.update_business(&caller, params)).await
}

pub async fn add_staff_member(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: AddStaffMember = parse(params)?;
    call(state, move |ledger| ledger.add_staff_member(&caller, params)).await
}

pub async fn set_staff_active(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: SetStaffActive = parse(params)?;
    call(state, move |ledger| ledger.set_staff_active(&caller, params)).await
}

pub async fn list_staff(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: BusinessTarget = parse(params)?;
    call(state, move |ledger| ledger.list_staff(&caller, params)).await
}

pub async fn create_promotion(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: CreatePromotion = parse(params)?;
    call(state, move |ledger| ledger.create_promotion(&caller, params)).await
}

pub async fn set_promotion_active(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let params: SetPromotionActive = parse(params)?;
    call(state, move |ledger| ledger.set_promotion_active(&caller, params)).await
}

pub async fn generate_promotion_scan_token(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let params: PromotionTokenTarget = parse(params)?;
    call(state, move |ledger| ledger.generate_promotion_scan_token(&caller, params)).await
}

/// Public join-page listing. No caller identity is consulted.
pub async fn get_public_active_promotions(state: &Arc<DaemonState>, params: &Value) -> Result {
    let params: BusinessTarget = parse(params)?;
    call(state, move |ledger| ledger.get_public_active_promotions(params)).await
}

pub async fn update_loyalty_card(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: UpdateLoyaltyCard = parse(params)?;
    call(state, move |ledger| ledger.update_loyalty_card(&caller, params)).await
}
