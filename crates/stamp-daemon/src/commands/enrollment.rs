//! Business bootstrap and customer enrollment handlers.

use std::sync::Arc;

use serde_json::Value;
use stamp_ledger::params::{EnsureBusiness, EnsureCustomerCard};
use stamp_types::Caller;

use super::{call, parse, Result};
use crate::DaemonState;

/// Ensure the caller's business and its default loyalty card exist.
pub async fn ensure_business_and_default_card(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
) -> Result {
    let params: EnsureBusiness = parse(params)?;
    call(state, move |ledger| ledger.ensure_business_and_default_card(&caller, params)).await
}

/// Ensure a customer is enrolled in a loyalty card.
pub async fn ensure_customer_card(state: &Arc<DaemonState>, caller: Caller, params: &Value) -> Result {
    let params: EnsureCustomerCard = parse(params)?;
    call(state, move |ledger| ledger.ensure_customer_card(&caller, params)).await
}

#[cfg(test)]
mod tests {
    use crate::commands::testing;
    use serde_json::json;

    #[tokio::test]
    async fn test_bootstrap_then_enroll() {
        let state = testing::state();
        let setup = testing::call(
            &state,
            Some("owner-1"),
            "ensureBusinessAndDefaultCard",
            json!({"ownerId": "owner-1"}),
        )
        .await;
        assert_eq!(setup["success"], true);
        let card_id = setup["data"]["loyalty_card_id"].as_str().expect("card id").to_string();

        let enrolled = testing::call(
            &state,
            Some("alice"),
            "ensureCustomerCard",
            json!({"customerId": "alice", "loyaltyCardId": card_id}),
        )
        .await;
        assert_eq!(enrolled["success"], true);
        assert_eq!(enrolled["data"]["current_stamps"], 0);
    }

    #[tokio::test]
    async fn test_anonymous_bootstrap_rejected() {
        let state = testing::state();
        let reply = testing::call(
            &state,
            None,
            "ensureBusinessAndDefaultCard",
            json!({"ownerId": "owner-1"}),
        )
        .await;
        assert_eq!(reply["success"], false);
        assert_eq!(reply["error"], "auth_required");
    }
}
