//! Scan, stamp and redemption handlers.

use std::sync::Arc;

use serde_json::Value;
use stamp_ledger::params::{PromotionScan, RedeemRewardClaim, RedeemWalletPass, RewardTarget};
use stamp_types::Caller;

use super::{call, parse, Result};
use crate::DaemonState;

/// Unauthenticated scanner entry point.
pub async fn process_promotion_scan(state: &Arc<DaemonState>, params: &Value) -> Result {
    let params: PromotionScan = parse(params)?;
    call(state, move |ledger| ledger.process_promotion_scan(params)).await
}

pub async fn redeem_wallet_pass_token(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let params: RedeemWalletPass = parse(params)?;
    call(state, move |ledger| ledger.redeem_wallet_pass_token(&caller, params)).await
}

pub async fn generate_reward_claim_token(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let params: RewardTarget = parse(params)?;
    call(state, move |ledger| ledger.generate_reward_claim_token(&caller, params)).await
}

pub async fn redeem_reward_claim_token(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let params: RedeemRewardClaim = parse(params)?;
    call(state, move |ledger| ledger.redeem_reward_claim_token(&caller, params)).await
}
