//! Stamp accrual.
//!
//! Both scan entry points (the unauthenticated promotion scan and the
//! staff-side wallet pass redemption) go through [`accrue`]: one stamp,
//! and when the threshold is reached, a reset and exactly one reward, all
//! in the caller's transaction.

use rusqlite::Connection;
use serde_json::json;
use stamp_db::queries::{customers, passes, promotions, rewards};
use stamp_types::events::EventType;
use stamp_types::ledger::LedgerState;
use stamp_types::Caller;

use crate::access::{self, BUSINESS_SIDE};
use crate::journal::Journal;
use crate::params::{PromotionScan, RedeemWalletPass};
use crate::tokens::new_id;
use crate::{Ledger, LedgerError, Result};

/// What presented the scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanSource<'a> {
    /// A wallet pass token presented at an unauthenticated scanner.
    WalletPass,
    /// A promotion-scoped token.
    Promotion(&'a str),
    /// A wallet pass token redeemed by owner or staff.
    Counter,
}

impl<'a> ScanSource<'a> {
    fn label(self) -> &'static str {
        match self {
            ScanSource::WalletPass => "wallet_pass",
            ScanSource::Promotion(_) => "promotion",
            ScanSource::Counter => "counter",
        }
    }

    fn promotion_id(self) -> Option<&'a str> {
        match self {
            ScanSource::Promotion(id) => Some(id),
            _ => None,
        }
    }
}

/// Add one stamp to `customer_card_id`, issuing a reward when the card
/// reaches its threshold.
pub fn accrue(
    conn: &Connection,
    journal: &mut Journal,
    customer_card_id: &str,
    actor: Option<&str>,
    source: ScanSource<'_>,
) -> Result<LedgerState> {
    let ctx = customers::context(conn, customer_card_id)?;
    if !ctx.program_active {
        return Err(LedgerError::PromotionInactive("loyalty card disabled".into()));
    }
    let now = journal.now();
    let customer_id = ctx.card.customer_id.as_str();

    let mut stamps = customers::add_stamp(conn, customer_card_id, now)?;
    let mut reward_id = None;
    if stamps >= ctx.stamps_required {
        if !customers::reset_for_reward(conn, customer_card_id, ctx.stamps_required)? {
            return Err(LedgerError::Conflict("stamp count changed during accrual".into()));
        }
        let id = new_id();
        rewards::insert(conn, &id, customer_card_id, &ctx.business_id, now)?;
        stamps = 0;
        reward_id = Some(id);
    }

    journal.record(
        conn,
        &ctx.business_id,
        EventType::StampAdded,
        actor,
        Some(customer_id),
        json!({
            "customer_card_id": customer_card_id,
            "source": source.label(),
            "promotion_id": source.promotion_id(),
            "stamps": stamps,
        }),
    )?;
    if let Some(id) = &reward_id {
        journal.record(
            conn,
            &ctx.business_id,
            EventType::RewardIssued,
            actor,
            Some(customer_id),
            json!({ "customer_card_id": customer_card_id, "reward_id": id }),
        )?;
        tracing::info!(customer_card_id, reward_id = %id, "reward issued");
    }

    Ok(LedgerState {
        customer_card_id: customer_card_id.to_string(),
        stamps,
        remaining: ctx.stamps_required.saturating_sub(stamps),
        rewards_available: rewards::count_available(conn, customer_card_id)?,
        last_scan_at: Some(now),
        reward_id,
    })
}

impl Ledger {
    /// Scan a QR token at an unauthenticated scanner.
    ///
    /// The token is resolved first as an active wallet pass, then as a
    /// promotion scan token. Promotion tokens only accrue while their
    /// promotion is live.
    pub fn process_promotion_scan(&self, params: PromotionScan) -> Result<LedgerState> {
        if params.qr_token.is_empty() {
            return Err(LedgerError::InvalidToken);
        }
        let actor = params.actor_id.as_deref().filter(|a| !a.is_empty());

        let mut journal = Journal::new(self.now());
        let state = self.store.write(|tx| {
            if let Some(pass) = passes::find_active_by_token(tx, &params.qr_token)? {
                return accrue(tx, &mut journal, &pass.customer_card_id, actor, ScanSource::WalletPass);
            }

            let binding = promotions::resolve_token(tx, &params.qr_token)?
                .ok_or(LedgerError::InvalidToken)?;
            let promotion = promotions::get(tx, &binding.promotion_id)?;
            if !promotion.is_live(journal.now()) {
                return Err(LedgerError::PromotionInactive(promotion.name));
            }
            accrue(
                tx,
                &mut journal,
                &binding.customer_card_id,
                actor,
                ScanSource::Promotion(&promotion.id),
            )
        })?;

        tracing::debug!(customer_card_id = %state.customer_card_id, stamps = state.stamps, "scan accrued");
        self.publish(journal.into_events());
        Ok(state)
    }

    /// Redeem a wallet pass token at the counter. Owner or active staff only.
    pub fn redeem_wallet_pass_token(
        &self,
        caller: &Caller,
        params: RedeemWalletPass,
    ) -> Result<LedgerState> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        let state = self.store.write(|tx| {
            let capability = access::resolve_capability(tx, &params.business_id, caller, None)?;
            access::require(caller, capability, BUSINESS_SIDE, "redeem wallet pass")?;

            let pass = passes::find_active_by_token(tx, &params.token)?
                .filter(|pass| pass.business_id == params.business_id)
                .ok_or(LedgerError::InvalidToken)?;
            accrue(tx, &mut journal, &pass.customer_card_id, Some(actor), ScanSource::Counter)
        })?;

        tracing::debug!(customer_card_id = %state.customer_card_id, actor, "wallet pass redeemed");
        self.publish(journal.into_events());
        Ok(state)
    }
}
