//! Wallet pass handlers.

use std::sync::Arc;

use serde_json::Value;
use stamp_ledger::params::PassTarget;
use stamp_types::Caller;

use super::{call, parse, Result};
use crate::DaemonState;

/// Return the active pass token, minting one if needed.
pub async fn generate_wallet_pass(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let target: PassTarget = parse(params)?;
    call(state, move |ledger| ledger.generate_wallet_pass(&caller, target)).await
}

/// Rotate the pass token.
pub async fn regenerate_wallet_pass(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let target: PassTarget = parse(params)?;
    call(state, move |ledger| ledger.regenerate_wallet_pass(&caller, target)).await
}

/// Revoke the active pass.
pub async fn revoke_wallet_pass(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let target: PassTarget = parse(params)?;
    call(state, move |ledger| ledger.revoke_wallet_pass(&caller, target)).await
}
