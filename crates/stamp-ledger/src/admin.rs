//! Owner-side administration: staff, promotions and loyalty cards.

use rusqlite::Connection;
use serde_json::json;
use stamp_db::queries::{businesses, cards, customers, promotions, staff};
use stamp_types::events::EventType;
use stamp_types::ledger::{Ack, IssuedToken};
use stamp_types::program::{
    Business, CreatedPromotion, LoyaltyCard, Promotion, PublicPromotion, StaffMembership,
};
use stamp_types::Caller;

use crate::access::{self, CARD_PARTIES, OWNER_ONLY};
use crate::journal::Journal;
use crate::params::{
    AddStaffMember, BusinessTarget, CreatePromotion, PromotionTokenTarget, SetPromotionActive,
    SetStaffActive, UpdateBusiness, UpdateLoyaltyCard,
};
use crate::tokens::{mint_token, new_id};
use crate::{Ledger, LedgerError, Result};

fn require_owner(conn: &Connection, caller: &Caller, business_id: &str, action: &str) -> Result<()> {
    let capability = access::resolve_capability(conn, business_id, caller, None)?;
    access::require(caller, capability, OWNER_ONLY, action)?;
    Ok(())
}

impl Ledger {
    /// Fail unless `caller` owns `business_id`.
    pub fn require_owner(&self, caller: &Caller, business_id: &str) -> Result<()> {
        access::identity(caller)?;
        self.store
            .read(|conn| require_owner(conn, caller, business_id, "observe business"))
    }

    /// Change the business's display name or accent colour.
    pub fn update_business(&self, caller: &Caller, params: UpdateBusiness) -> Result<Business> {
        let actor = access::identity(caller)?;
        if params.display_name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(LedgerError::Conflict("display name required".into()));
        }

        let mut journal = Journal::new(self.now());
        let business = self.store.write(|tx| {
            require_owner(tx, caller, &params.business_id, "update business")?;
            let current = businesses::get(tx, &params.business_id)?;

            let display_name = params.display_name.as_deref().unwrap_or(&current.display_name);
            let accent_color = match params.accent_color.as_deref() {
                Some("") => None,
                Some(color) => Some(color),
                None => current.accent_color.as_deref(),
            };
            businesses::update_details(tx, &current.id, display_name, accent_color)?;

            let updated = businesses::get(tx, &current.id)?;
            journal.record(
                tx,
                &updated.id,
                EventType::BusinessUpdated,
                Some(actor),
                None,
                json!({
                    "display_name": updated.display_name,
                    "accent_color": updated.accent_color,
                }),
            )?;
            Ok(updated)
        })?;

        tracing::info!(business_id = %business.id, "business updated");
        self.publish(journal.into_events());
        Ok(business)
    }

    /// Grant staff authority. Re-adding an existing member reactivates it.
    pub fn add_staff_member(
        &self,
        caller: &Caller,
        params: AddStaffMember,
    ) -> Result<StaffMembership> {
        let actor = access::identity(caller)?;
        if params.staff_id.is_empty() {
            return Err(LedgerError::Conflict("staff identity required".into()));
        }

        let mut journal = Journal::new(self.now());
        let membership = self.store.write(|tx| {
            require_owner(tx, caller, &params.business_id, "add staff")?;
            if businesses::owner_of(tx, &params.business_id)?.as_deref() == Some(params.staff_id.as_str()) {
                return Err(LedgerError::Conflict("owner cannot be added as staff".into()));
            }

            let membership = staff::upsert(
                tx,
                &new_id(),
                &params.business_id,
                &params.staff_id,
                params.role,
                journal.now(),
            )?;
            journal.record(
                tx,
                &params.business_id,
                EventType::StaffAdded,
                Some(actor),
                None,
                json!({
                    "membership_id": membership.id,
                    "staff_id": membership.staff_id,
                    "role": membership.role.as_str(),
                }),
            )?;
            Ok(membership)
        })?;

        tracing::info!(business_id = %membership.business_id, staff_id = %membership.staff_id, "staff granted");
        self.publish(journal.into_events());
        Ok(membership)
    }

    /// Activate or deactivate a staff membership.
    pub fn set_staff_active(&self, caller: &Caller, params: SetStaffActive) -> Result<Ack> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        self.store.write(|tx| {
            let membership = staff::get(tx, &params.staff_membership_id)?;
            require_owner(tx, caller, &membership.business_id, "change staff")?;
            staff::set_active(tx, &membership.id, params.active)?;
            journal.record(
                tx,
                &membership.business_id,
                EventType::StaffUpdated,
                Some(actor),
                None,
                json!({
                    "membership_id": membership.id,
                    "staff_id": membership.staff_id,
                    "active": params.active,
                }),
            )
        })?;

        tracing::info!(membership_id = %params.staff_membership_id, active = params.active, "staff membership changed");
        self.publish(journal.into_events());
        Ok(Ack::OK)
    }

    /// List the business's staff memberships. Owner only.
    pub fn list_staff(&self, caller: &Caller, params: BusinessTarget) -> Result<Vec<StaffMembership>> {
        access::identity(caller)?;
        self.store.read(|conn| {
            require_owner(conn, caller, &params.business_id, "list staff")?;
            Ok(staff::list(conn, &params.business_id)?)
        })
    }

    /// Create a promotion. The window is `[starts_at, ends_at)`.
    pub fn create_promotion(
        &self,
        caller: &Caller,
        params: CreatePromotion,
    ) -> Result<CreatedPromotion> {
        let actor = access::identity(caller)?;
        if params.name.trim().is_empty() {
            return Err(LedgerError::Conflict("promotion name required".into()));
        }

        let mut journal = Journal::new(self.now());
        let promotion = self.store.write(|tx| {
            require_owner(tx, caller, &params.business_id, "create promotion")?;

            let now = journal.now();
            let starts_at = params.starts_at.unwrap_or(now);
            if params.ends_at.is_some_and(|end| end <= starts_at) {
                return Err(LedgerError::Conflict("promotion ends before it starts".into()));
            }

            let promotion = Promotion {
                id: new_id(),
                business_id: params.business_id.clone(),
                name: params.name.trim().to_string(),
                promo_type: params.promo_type.clone(),
                starts_at,
                ends_at: params.ends_at,
                is_active: true,
                created_at: now,
            };
            promotions::insert(tx, &promotion)?;
            journal.record(
                tx,
                &promotion.business_id,
                EventType::PromotionCreated,
                Some(actor),
                None,
                json!({
                    "promotion_id": promotion.id,
                    "promo_type": promotion.promo_type,
                    "starts_at": promotion.starts_at,
                    "ends_at": promotion.ends_at,
                }),
            )?;
            Ok(promotion)
        })?;

        tracing::info!(business_id = %promotion.business_id, promotion_id = %promotion.id, "promotion created");
        self.publish(journal.into_events());
        Ok(CreatedPromotion {
            promotion_id: promotion.id,
        })
    }

    /// Enable or disable a promotion.
    pub fn set_promotion_active(&self, caller: &Caller, params: SetPromotionActive) -> Result<Ack> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        self.store.write(|tx| {
            let promotion = promotions::get(tx, &params.promotion_id)?;
            require_owner(tx, caller, &promotion.business_id, "change promotion")?;
            promotions::set_active(tx, &promotion.id, params.active)?;
            journal.record(
                tx,
                &promotion.business_id,
                EventType::PromotionUpdated,
                Some(actor),
                None,
                json!({ "promotion_id": promotion.id, "active": params.active }),
            )
        })?;

        self.publish(journal.into_events());
        Ok(Ack::OK)
    }

    /// Return the scan token bound to (promotion, customer card), minting
    /// it on first request.
    pub fn generate_promotion_scan_token(
        &self,
        caller: &Caller,
        params: PromotionTokenTarget,
    ) -> Result<IssuedToken> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        let issued = self.store.write(|tx| {
            let promotion = promotions::get(tx, &params.promotion_id)?;
            let ctx = customers::context(tx, &params.customer_card_id)?;
            if ctx.business_id != promotion.business_id {
                return Err(LedgerError::NotFound("customer card".into()));
            }
            let capability = access::resolve_capability(
                tx,
                &promotion.business_id,
                caller,
                Some(&ctx.card.customer_id),
            )?;
            access::require(caller, capability, CARD_PARTIES, "issue promotion token")?;

            if let Some(token) = promotions::find_token(tx, &promotion.id, &ctx.card.id)? {
                return Ok(IssuedToken { token, reused: true });
            }
            let token = mint_token();
            if promotions::insert_token_if_absent(tx, &token, &promotion.id, &ctx.card.id, journal.now())? {
                journal.record(
                    tx,
                    &promotion.business_id,
                    EventType::PromotionTokenIssued,
                    Some(actor),
                    Some(&ctx.card.customer_id),
                    json!({ "promotion_id": promotion.id, "customer_card_id": ctx.card.id }),
                )?;
                return Ok(IssuedToken { token, reused: false });
            }
            let token = promotions::find_token(tx, &promotion.id, &ctx.card.id)?
                .ok_or_else(|| LedgerError::Conflict("promotion token vanished after insert".into()))?;
            Ok(IssuedToken { token, reused: true })
        })?;

        self.publish(journal.into_events());
        Ok(issued)
    }

    /// Live promotions of a business, public view. No caller required.
    pub fn get_public_active_promotions(&self, params: BusinessTarget) -> Result<Vec<PublicPromotion>> {
        let now = self.now();
        self.store.read(|conn| {
            businesses::get(conn, &params.business_id)?;
            let live = promotions::list_live(conn, &params.business_id, now)?;
            Ok(live.into_iter().map(PublicPromotion::from).collect())
        })
    }

    /// Change a loyalty card's reward, activation or threshold. The
    /// threshold is frozen once any customer has a stamp or reward on it.
    pub fn update_loyalty_card(
        &self,
        caller: &Caller,
        params: UpdateLoyaltyCard,
    ) -> Result<LoyaltyCard> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        let card = self.store.write(|tx| {
            let card = cards::get(tx, &params.loyalty_card_id)?;
            require_owner(tx, caller, &card.business_id, "update loyalty card")?;

            if let Some(required) = params.stamps_required {
                if required == 0 {
                    return Err(LedgerError::Conflict("stamps_required must be positive".into()));
                }
                if required != card.stamps_required
                    && !cards::set_stamps_required(tx, &card.id, required)?
                {
                    return Err(LedgerError::Conflict(
                        "stamps_required is fixed once stamps are recorded".into(),
                    ));
                }
            }

            let description = params
                .reward_description
                .as_deref()
                .unwrap_or(&card.reward_description);
            let active = params.active.unwrap_or(card.is_active);
            cards::set_details(tx, &card.id, description, active)?;

            let updated = cards::get(tx, &card.id)?;
            journal.record(
                tx,
                &updated.business_id,
                EventType::LoyaltyCardUpdated,
                Some(actor),
                None,
                json!({
                    "loyalty_card_id": updated.id,
                    "stamps_required": updated.stamps_required,
                    "is_active": updated.is_active,
                }),
            )?;
            Ok(updated)
        })?;

        tracing::info!(loyalty_card_id = %card.id, "loyalty card updated");
        self.publish(journal.into_events());
        Ok(card)
    }
}
