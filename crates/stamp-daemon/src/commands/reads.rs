//! Read-only view handlers.

use std::sync::Arc;

use serde_json::Value;
use stamp_ledger::params::{CardTarget, ListEvents};
use stamp_types::Caller;

use super::{call, parse, Result};
use crate::DaemonState;

pub async fn get_customer_card(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: CardTarget = parse(params)?;
    call(state, move |ledger| ledger.get_customer_card(&caller, params)).await
}

pub async fn list_rewards(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: CardTarget = parse(params)?;
    call(state, move |ledger| ledger.list_rewards(&caller, params)).await
}

pub async fn list_events(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: ListEvents = parse(params)?;
    call(state, move |ledger| ledger.list_events(&caller, params)).await
}
