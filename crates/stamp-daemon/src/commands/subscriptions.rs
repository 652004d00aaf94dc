//! Event subscription handlers.
//!
//! A subscription lives on its connection: `subscribeEvents` attaches a
//! filtered receiver, after which the connection loop interleaves
//! `event` notifications with ordinary responses.

use std::sync::Arc;

use serde_json::Value;
use stamp_types::Caller;
use tokio::sync::broadcast::{self, error::RecvError};

use super::{call, parse, Result};
use crate::events::{EventFilter, Published};
use crate::rpc::RpcNotification;
use crate::DaemonState;

/// Notification method carrying one committed event.
pub const EVENT_METHOD: &str = "event";

/// A connection's live subscription.
pub struct Subscription {
    pub id: String,
    pub filter: EventFilter,
    rx: broadcast::Receiver<Published>,
}

/// Subscribe the connection to a business's events. Owner only.
///
/// Replaces any previous subscription on the same connection.
pub async fn subscribe(
    state: &Arc<DaemonState>,
    caller: Caller,
    params: &Value,
    slot: &mut Option<Subscription>,
) -> Result {
    let filter: EventFilter = parse(params)?;

    let business_id = filter.business_id.clone();
    let authorized = call(state, move |ledger| ledger.require_owner(&caller, &business_id)).await?;
    if authorized["success"] != true {
        return Ok(authorized);
    }

    let mut id = [0u8; 16];
    rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut id);
    let id = hex::encode(id);

    tracing::info!(subscription_id = %id, business_id = %filter.business_id, "event subscription opened");
    *slot = Some(Subscription {
        id: id.clone(),
        filter,
        rx: state.event_bus.subscribe(),
    });

    Ok(serde_json::json!({
        "success": true,
        "data": { "subscription_id": id },
    }))
}

/// Drop the connection's subscription, if any.
pub fn unsubscribe(slot: &mut Option<Subscription>) -> Value {
    let dropped = slot.take().is_some();
    serde_json::json!({
        "success": true,
        "data": { "unsubscribed": dropped },
    })
}

/// Wait for the next event matching the subscription. Pends forever when
/// there is none; returns `None` once the bus is gone.
pub async fn next_notification(slot: &mut Option<Subscription>) -> Option<RpcNotification> {
    let Some(sub) = slot.as_mut() else {
        return std::future::pending().await;
    };

    loop {
        match sub.rx.recv().await {
            Ok(published) if sub.filter.matches(&published.event) => {
                return Some(RpcNotification::new(
                    EVENT_METHOD,
                    serde_json::json!({
                        "subscription_id": sub.id,
                        "seq": published.seq,
                        "event": published.event,
                    }),
                ));
            }
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(subscription_id = %sub.id, skipped, "subscriber lagging, events dropped");
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing;
    use serde_json::json;

    #[tokio::test]
    async fn test_owner_receives_committed_events() {
        let state = testing::state();
        let setup = testing::call(
            &state,
            Some("owner-1"),
            "ensureBusinessAndDefaultCard",
            json!({"ownerId": "owner-1"}),
        )
        .await;
        let business_id = setup["data"]["business_id"].clone();
        let loyalty_card_id = setup["data"]["loyalty_card_id"].clone();

        let mut slot = None;
        let ack = subscribe(
            &state,
            Caller::identified("owner-1"),
            &json!({"businessId": business_id, "categories": ["pass"]}),
            &mut slot,
        )
        .await
        .expect("subscribe");
        assert_eq!(ack["success"], true);

        testing::call(
            &state,
            Some("alice"),
            "ensureCustomerCard",
            json!({"customerId": "alice", "loyaltyCardId": loyalty_card_id}),
        )
        .await;

        let note = next_notification(&mut slot).await.expect("notification");
        assert_eq!(note.method, EVENT_METHOD);
        assert_eq!(note.params["event"]["event_type"], "customer_enrolled");
    }

    #[tokio::test]
    async fn test_non_owner_cannot_subscribe() {
        let state = testing::state();
        let setup = testing::call(
            &state,
            Some("owner-1"),
            "ensureBusinessAndDefaultCard",
            json!({"ownerId": "owner-1"}),
        )
        .await;

        let mut slot = None;
        let reply = subscribe(
            &state,
            Caller::identified("alice"),
            &json!({"businessId": setup["data"]["business_id"]}),
            &mut slot,
        )
        .await
        .expect("protocol success");
        assert_eq!(reply["error"], "forbidden");
        assert!(slot.is_none());
        assert_eq!(unsubscribe(&mut slot)["data"]["unsubscribed"], false);
    }
}
