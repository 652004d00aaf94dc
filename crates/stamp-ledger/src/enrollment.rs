//! Business bootstrap and customer enrollment. Both are idempotent.

use serde_json::json;
use stamp_db::queries::{businesses, cards, customers};
use stamp_types::events::EventType;
use stamp_types::ledger::EnrolledCard;
use stamp_types::program::BusinessSetup;
use stamp_types::Caller;

use crate::access::{self, CARD_PARTIES};
use crate::journal::Journal;
use crate::params::{EnsureBusiness, EnsureCustomerCard};
use crate::tokens::new_id;
use crate::{Ledger, LedgerError, Result};

impl Ledger {
    /// Return the caller's business and its default loyalty card, creating
    /// either if missing. Concurrent calls converge on the same rows.
    pub fn ensure_business_and_default_card(
        &self,
        caller: &Caller,
        params: EnsureBusiness,
    ) -> Result<BusinessSetup> {
        let id = access::identity(caller)?;
        if params.owner_id.is_empty() {
            return Err(LedgerError::AuthRequired);
        }
        if id != params.owner_id {
            return Err(LedgerError::Forbidden("bootstrap another owner's business".into()));
        }

        let mut journal = Journal::new(self.now());
        let setup = self.store.write(|tx| {
            let now = journal.now();
            let name = params
                .display_name
                .as_deref()
                .unwrap_or(&self.settings.default_business_name);

            let created = businesses::insert_if_absent(tx, &new_id(), id, name, now)?;
            let business = businesses::find_by_owner(tx, id)?
                .ok_or_else(|| LedgerError::Conflict("business vanished after insert".into()))?;
            if created {
                journal.record(
                    tx,
                    &business.id,
                    EventType::BusinessCreated,
                    Some(id),
                    None,
                    json!({ "display_name": business.display_name }),
                )?;
            }

            let card_created = cards::insert_default_if_absent(
                tx,
                &new_id(),
                &business.id,
                self.settings.default_stamps_required,
                &self.settings.default_reward_description,
                now,
            )?;
            let card = cards::default_for_business(tx, &business.id)?
                .ok_or_else(|| LedgerError::Conflict("default card vanished after insert".into()))?;
            if card_created {
                journal.record(
                    tx,
                    &business.id,
                    EventType::LoyaltyCardCreated,
                    Some(id),
                    None,
                    json!({
                        "loyalty_card_id": card.id,
                        "stamps_required": card.stamps_required,
                    }),
                )?;
            }

            Ok(BusinessSetup {
                business_id: business.id,
                loyalty_card_id: card.id,
            })
        })?;

        tracing::info!(business_id = %setup.business_id, owner = id, "business ready");
        self.publish(journal.into_events());
        Ok(setup)
    }

    /// Return the customer's enrollment in a loyalty card, creating it if
    /// missing. Allowed for the customer themself or the business side.
    pub fn ensure_customer_card(
        &self,
        caller: &Caller,
        params: EnsureCustomerCard,
    ) -> Result<EnrolledCard> {
        let id = access::identity(caller)?;
        if params.customer_id.is_empty() {
            return Err(LedgerError::AuthRequired);
        }

        let mut journal = Journal::new(self.now());
        let enrolled = self.store.write(|tx| {
            let card = cards::get(tx, &params.loyalty_card_id)?;
            if !card.is_active {
                return Err(LedgerError::NotFound("loyalty card".into()));
            }
            let capability =
                access::resolve_capability(tx, &card.business_id, caller, Some(&params.customer_id))?;
            access::require(caller, capability, CARD_PARTIES, "enroll customer")?;

            if let Some(existing) = customers::find_card(tx, &params.customer_id, &card.id)? {
                return Ok(existing);
            }

            customers::ensure_customer(tx, &params.customer_id, journal.now())?;
            let created = customers::insert_card_if_absent(
                tx,
                &new_id(),
                &params.customer_id,
                &card.id,
                journal.now(),
            )?;
            let enrolled = customers::find_card(tx, &params.customer_id, &card.id)?
                .ok_or_else(|| LedgerError::Conflict("enrollment vanished after insert".into()))?;
            if created {
                journal.record(
                    tx,
                    &card.business_id,
                    EventType::CustomerEnrolled,
                    Some(id),
                    Some(&params.customer_id),
                    json!({
                        "customer_card_id": enrolled.id,
                        "loyalty_card_id": card.id,
                    }),
                )?;
            }
            Ok(enrolled)
        })?;

        tracing::debug!(customer_card_id = %enrolled.id, "customer card ready");
        self.publish(journal.into_events());
        Ok(EnrolledCard {
            customer_card_id: enrolled.id,
            current_stamps: enrolled.current_stamps,
        })
    }
}
