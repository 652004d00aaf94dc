//! Wallet passes: one reusable scan token per customer card.
//!
//! At most one pass per card is active at a time; the partial unique index
//! on `wallet_passes` enforces it even when two issuers race.

use rusqlite::Connection;
use serde_json::json;
use stamp_db::queries::{customers, passes};
use stamp_types::events::EventType;
use stamp_types::ledger::{Ack, IssuedToken, PassToken};
use stamp_types::Caller;

use crate::access::{self, CARD_PARTIES};
use crate::journal::Journal;
use crate::params::PassTarget;
use crate::tokens::{mint_token, new_id};
use crate::{Ledger, LedgerError, Result};

/// Authorize `caller` against the card addressed by `target`.
/// Returns the card's customer id.
fn authorize(conn: &Connection, caller: &Caller, target: &PassTarget, action: &str) -> Result<String> {
    let ctx = customers::context(conn, &target.customer_card_id)?;
    if ctx.business_id != target.business_id {
        return Err(LedgerError::NotFound("customer card".into()));
    }
    let capability =
        access::resolve_capability(conn, &ctx.business_id, caller, Some(&ctx.card.customer_id))?;
    access::require(caller, capability, CARD_PARTIES, action)?;
    Ok(ctx.card.customer_id)
}

fn issue(
    conn: &Connection,
    journal: &mut Journal,
    actor: &str,
    customer_id: &str,
    target: &PassTarget,
) -> Result<Option<String>> {
    let token = mint_token();
    let inserted = passes::insert_active(
        conn,
        &new_id(),
        &target.customer_card_id,
        &target.business_id,
        &token,
        journal.now(),
    )?;
    if !inserted {
        return Ok(None);
    }
    journal.record(
        conn,
        &target.business_id,
        EventType::WalletPassIssued,
        Some(actor),
        Some(customer_id),
        json!({ "customer_card_id": target.customer_card_id }),
    )?;
    Ok(Some(token))
}

fn revoke(
    conn: &Connection,
    journal: &mut Journal,
    actor: &str,
    customer_id: &str,
    target: &PassTarget,
) -> Result<bool> {
    let Some(pass_id) = passes::revoke_active(conn, &target.customer_card_id, journal.now())? else {
        return Ok(false);
    };
    journal.record(
        conn,
        &target.business_id,
        EventType::WalletPassRevoked,
        Some(actor),
        Some(customer_id),
        json!({ "customer_card_id": target.customer_card_id, "pass_id": pass_id }),
    )?;
    Ok(true)
}

impl Ledger {
    /// Return the card's active pass token, minting one if none exists.
    pub fn generate_wallet_pass(&self, caller: &Caller, target: PassTarget) -> Result<IssuedToken> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        let issued = self.store.write(|tx| {
            let customer_id = authorize(tx, caller, &target, "issue wallet pass")?;

            if let Some(pass) = passes::find_active(tx, &target.customer_card_id)? {
                return Ok(IssuedToken {
                    token: pass.token,
                    reused: true,
                });
            }
            if let Some(token) = issue(tx, &mut journal, actor, &customer_id, &target)? {
                return Ok(IssuedToken { token, reused: false });
            }
            let pass = passes::find_active(tx, &target.customer_card_id)?
                .ok_or_else(|| LedgerError::Conflict("wallet pass vanished after insert".into()))?;
            Ok(IssuedToken {
                token: pass.token,
                reused: true,
            })
        })?;

        if !issued.reused {
            tracing::info!(customer_card_id = %target.customer_card_id, "wallet pass issued");
        }
        self.publish(journal.into_events());
        Ok(issued)
    }

    /// Revoke the active pass (if any) and issue a fresh one atomically.
    pub fn regenerate_wallet_pass(&self, caller: &Caller, target: PassTarget) -> Result<PassToken> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        let token = self.store.write(|tx| {
            let customer_id = authorize(tx, caller, &target, "rotate wallet pass")?;
            revoke(tx, &mut journal, actor, &customer_id, &target)?;
            issue(tx, &mut journal, actor, &customer_id, &target)?
                .ok_or_else(|| LedgerError::Conflict("active wallet pass already exists".into()))
        })?;

        tracing::info!(customer_card_id = %target.customer_card_id, "wallet pass rotated");
        self.publish(journal.into_events());
        Ok(PassToken { token })
    }

    /// Revoke the card's active pass. Its token stops resolving immediately.
    pub fn revoke_wallet_pass(&self, caller: &Caller, target: PassTarget) -> Result<Ack> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        self.store.write(|tx| {
            let customer_id = authorize(tx, caller, &target, "revoke wallet pass")?;
            if !revoke(tx, &mut journal, actor, &customer_id, &target)? {
                return Err(LedgerError::NotFound("active wallet pass".into()));
            }
            Ok(())
        })?;

        tracing::info!(customer_card_id = %target.customer_card_id, "wallet pass revoked");
        self.publish(journal.into_events());
        Ok(Ack::OK)
    }
}
