//! Read-only views.

use stamp_db::queries::{customers, events, rewards};
use stamp_types::events::Event;
use stamp_types::ledger::{LedgerState, Reward};
use stamp_types::Caller;

use crate::access::{self, CARD_PARTIES, OWNER_ONLY};
use crate::params::{CardTarget, ListEvents};
use crate::{Ledger, Result};

/// Event page size when the caller gives none.
pub const DEFAULT_EVENT_LIMIT: u32 = 100;

/// Largest event page served in one call.
pub const MAX_EVENT_LIMIT: u32 = 1_000;

impl Ledger {
    /// Current progress of a customer card.
    pub fn get_customer_card(&self, caller: &Caller, params: CardTarget) -> Result<LedgerState> {
        access::identity(caller)?;
        self.store.read(|conn| {
            let ctx = customers::context(conn, &params.customer_card_id)?;
            let capability =
                access::resolve_capability(conn, &ctx.business_id, caller, Some(&ctx.card.customer_id))?;
            access::require(caller, capability, CARD_PARTIES, "view customer card")?;

            Ok(LedgerState {
                rewards_available: rewards::count_available(conn, &ctx.card.id)?,
                remaining: ctx.stamps_required.saturating_sub(ctx.card.current_stamps),
                stamps: ctx.card.current_stamps,
                last_scan_at: ctx.card.last_scan_at,
                customer_card_id: ctx.card.id,
                reward_id: None,
            })
        })
    }

    /// Rewards of a customer card, newest first.
    pub fn list_rewards(&self, caller: &Caller, params: CardTarget) -> Result<Vec<Reward>> {
        access::identity(caller)?;
        self.store.read(|conn| {
            let ctx = customers::context(conn, &params.customer_card_id)?;
            let capability =
                access::resolve_capability(conn, &ctx.business_id, caller, Some(&ctx.card.customer_id))?;
            access::require(caller, capability, CARD_PARTIES, "list rewards")?;
            Ok(rewards::list_for_card(conn, &ctx.card.id)?)
        })
    }

    /// The business's audit log, newest first. Owner only.
    pub fn list_events(&self, caller: &Caller, params: ListEvents) -> Result<Vec<Event>> {
        access::identity(caller)?;
        let limit = params
            .limit
            .unwrap_or(DEFAULT_EVENT_LIMIT)
            .clamp(1, MAX_EVENT_LIMIT);
        self.store.read(|conn| {
            let capability = access::resolve_capability(conn, &params.business_id, caller, None)?;
            access::require(caller, capability, OWNER_ONLY, "read event log")?;
            Ok(events::recent(conn, &params.business_id, limit)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{PassTarget, RedeemWalletPass};
    use crate::testing::{self, customer, owner};
    use crate::LedgerError;
    use stamp_types::events::EventType;

    #[test]
    fn test_customer_card_view() {
        let (ledger, _) = testing::ledger();
        let (setup, card) = testing::enrolled(&ledger);
        let token = ledger
            .generate_wallet_pass(&customer(), PassTarget {
                business_id: setup.business_id.clone(),
                customer_card_id: card.clone(),
            })
            .expect("pass")
            .token;
        ledger
            .redeem_wallet_pass_token(&owner(), RedeemWalletPass {
                business_id: setup.business_id,
                token,
            })
            .expect("stamp");

        let state = ledger
            .get_customer_card(&customer(), CardTarget { customer_card_id: card.clone() })
            .expect("view");
        assert_eq!(state.stamps, 1);
        assert_eq!(state.remaining, 9);
        assert_eq!(state.last_scan_at, Some(1_000));
        assert_eq!(state.rewards_available, 0);

        assert!(matches!(
            ledger.get_customer_card(&Caller::identified("mallory"), CardTarget { customer_card_id: card }),
            Err(LedgerError::Forbidden(_))
        ));
    }

    #[test]
    fn test_missing_card() {
        let (ledger, _) = testing::ledger();
        testing::business(&ledger);
        assert!(matches!(
            ledger.list_rewards(&customer(), CardTarget { customer_card_id: "nope".into() }),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_event_log_owner_only() {
        let (ledger, _) = testing::ledger();
        let (setup, _) = testing::enrolled(&ledger);
        let list = |who: &Caller| {
            ledger.list_events(who, ListEvents {
                business_id: setup.business_id.clone(),
                limit: None,
            })
        };
        assert!(matches!(list(&customer()), Err(LedgerError::Forbidden(_))));

        let events = list(&owner()).expect("events");
        let types: Vec<EventType> = events.iter().map(|e| e.event_type).collect();
        assert_eq!(
            types,
            vec![
                EventType::CustomerEnrolled,
                EventType::LoyaltyCardCreated,
                EventType::BusinessCreated,
            ]
        );
    }
}
