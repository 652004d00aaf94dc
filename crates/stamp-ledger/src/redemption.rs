//! Reward claim tokens and single-use consumption.
//!
//! A reward moves from issued to consumed exactly once. Consumption is a
//! conditional update on `consumed_at IS NULL`; of any number of concurrent
//! redeemers, the one whose update touches a row wins and everyone else
//! sees `AlreadyRedeemed`.

use serde_json::json;
use stamp_db::queries::{customers, rewards};
use stamp_types::events::EventType;
use stamp_types::ledger::{ClaimToken, RedeemedReward};
use stamp_types::Caller;

use crate::access::{self, BUSINESS_SIDE, CARD_PARTIES};
use crate::journal::Journal;
use crate::params::{RedeemRewardClaim, RewardTarget};
use crate::tokens::mint_token;
use crate::{Ledger, LedgerError, Result};

impl Ledger {
    /// Return the claim token of an unconsumed reward, minting it on first
    /// request. The token is stable until the reward is consumed.
    pub fn generate_reward_claim_token(
        &self,
        caller: &Caller,
        params: RewardTarget,
    ) -> Result<ClaimToken> {
        let actor = access::identity(caller)?;

        let mut journal = Journal::new(self.now());
        let claim_token = self.store.write(|tx| {
            let reward = rewards::get(tx, &params.reward_id)?;
            let card = customers::get_card(tx, &reward.customer_card_id)?;
            let capability =
                access::resolve_capability(tx, &reward.business_id, caller, Some(&card.customer_id))?;
            access::require(caller, capability, CARD_PARTIES, "claim reward")?;

            let minted = mint_token();
            let effective = rewards::attach_claim_token(tx, &reward.id, &minted)?
                .ok_or_else(|| LedgerError::NotFound("unredeemed reward".into()))?;
            if effective == minted {
                journal.record(
                    tx,
                    &reward.business_id,
                    EventType::RewardClaimIssued,
                    Some(actor),
                    Some(&card.customer_id),
                    json!({ "reward_id": reward.id }),
                )?;
            }
            Ok(effective)
        })?;

        self.publish(journal.into_events());
        Ok(ClaimToken { claim_token })
    }

    /// Consume the reward behind a claim token. Owner or active staff only.
    pub fn redeem_reward_claim_token(
        &self,
        caller: &Caller,
        params: RedeemRewardClaim,
    ) -> Result<RedeemedReward> {
        let actor = access::identity(caller)?;
        if params.claim_token.is_empty() {
            return Err(LedgerError::InvalidToken);
        }

        let mut journal = Journal::new(self.now());
        let redeemed = self.store.write(|tx| {
            let capability = access::resolve_capability(tx, &params.business_id, caller, None)?;
            access::require(caller, capability, BUSINESS_SIDE, "redeem reward")?;

            let reward = rewards::find_by_claim_token(tx, &params.claim_token)?
                .filter(|reward| reward.business_id == params.business_id)
                .ok_or(LedgerError::InvalidToken)?;

            let now = journal.now();
            if !rewards::consume(tx, &reward.id, now, actor)? {
                return Err(LedgerError::AlreadyRedeemed);
            }

            let card = customers::get_card(tx, &reward.customer_card_id)?;
            journal.record(
                tx,
                &reward.business_id,
                EventType::RewardRedeemed,
                Some(actor),
                Some(&card.customer_id),
                json!({
                    "reward_id": reward.id,
                    "customer_card_id": reward.customer_card_id,
                }),
            )?;
            Ok(RedeemedReward {
                reward_id: reward.id,
                redeemed_at: now,
            })
        });

        match &redeemed {
            Ok(r) => tracing::info!(reward_id = %r.reward_id, actor, "reward redeemed"),
            Err(LedgerError::AlreadyRedeemed) => {
                tracing::warn!(business_id = %params.business_id, actor, "duplicate reward redemption rejected")
            }
            Err(_) => {}
        }
        let redeemed = redeemed?;
        self.publish(journal.into_events());
        Ok(redeemed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{
        AddStaffMember, PassTarget, PromotionScan, UpdateLoyaltyCard,
    };
    use crate::testing::{self, customer, owner};
    use stamp_types::program::{BusinessSetup, StaffRole};

    /// Enroll, shrink the threshold to 1 and scan once. Returns the reward id.
    fn earn_reward(ledger: &Ledger) -> (BusinessSetup, String) {
        let (setup, card) = testing::enrolled(ledger);
        ledger
            .update_loyalty_card(&owner(), UpdateLoyaltyCard {
                loyalty_card_id: setup.loyalty_card_id.clone(),
                stamps_required: Some(1),
                ..Default::default()
            })
            .expect("threshold");
        let token = ledger
            .generate_wallet_pass(&customer(), PassTarget {
                business_id: setup.business_id.clone(),
                customer_card_id: card,
            })
            .expect("pass")
            .token;
        let state = ledger
            .process_promotion_scan(PromotionScan {
                qr_token: token,
                actor_id: None,
            })
            .expect("scan");
        let reward_id = state.reward_id.expect("reward issued");
        (setup, reward_id)
    }

    fn claim(ledger: &Ledger, reward_id: &str) -> String {
        ledger
            .generate_reward_claim_token(&customer(), RewardTarget {
                reward_id: reward_id.into(),
            })
            .expect("claim token")
            .claim_token
    }

    fn redeem(ledger: &Ledger, who: &Caller, business_id: &str, token: &str) -> Result<RedeemedReward> {
        ledger.redeem_reward_claim_token(who, RedeemRewardClaim {
            business_id: business_id.into(),
            claim_token: token.into(),
        })
    }

    #[test]
    fn test_claim_token_is_stable() {
        let (ledger, _) = testing::ledger();
        let (_, reward_id) = earn_reward(&ledger);
        assert_eq!(claim(&ledger, &reward_id), claim(&ledger, &reward_id));
    }

    #[test]
    fn test_redeem_once() {
        let (ledger, _) = testing::ledger();
        let (setup, reward_id) = earn_reward(&ledger);
        let token = claim(&ledger, &reward_id);

        let redeemed = redeem(&ledger, &owner(), &setup.business_id, &token).expect("first redeem");
        assert_eq!(redeemed.reward_id, reward_id);
        assert_eq!(redeemed.redeemed_at, 1_000);

        assert!(matches!(
            redeem(&ledger, &owner(), &setup.business_id, &token),
            Err(LedgerError::AlreadyRedeemed)
        ));
        // Consumed rewards cannot mint claims any more.
        assert!(matches!(
            ledger.generate_reward_claim_token(&customer(), RewardTarget { reward_id }),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_customer_cannot_redeem_own_claim() {
        let (ledger, _) = testing::ledger();
        let (setup, reward_id) = earn_reward(&ledger);
        let token = claim(&ledger, &reward_id);
        assert!(matches!(
            redeem(&ledger, &customer(), &setup.business_id, &token),
            Err(LedgerError::Forbidden(_))
        ));
        assert!(matches!(
            redeem(&ledger, &Caller::anonymous(), &setup.business_id, &token),
            Err(LedgerError::AuthRequired)
        ));
    }

    #[test]
    fn test_staff_redeems() {
        let (ledger, _) = testing::ledger();
        let (setup, reward_id) = earn_reward(&ledger);
        ledger
            .add_staff_member(&owner(), AddStaffMember {
                business_id: setup.business_id.clone(),
                staff_id: "barista".into(),
                role: StaffRole::Manager,
            })
            .expect("staff");
        let token = claim(&ledger, &reward_id);
        redeem(&ledger, &Caller::identified("barista"), &setup.business_id, &token).expect("redeem");

        let rewards = ledger
            .list_rewards(&customer(), crate::params::CardTarget {
                customer_card_id: ledger_card(&ledger, &reward_id),
            })
            .expect("rewards");
        assert_eq!(rewards[0].consumed_by.as_deref(), Some("barista"));
    }

    fn ledger_card(ledger: &Ledger, reward_id: &str) -> String {
        ledger
            .store
            .read(|conn| Ok(rewards::get(conn, reward_id)?.customer_card_id))
            .expect("reward card")
    }

    #[test]
    fn test_unknown_or_foreign_claim_invalid() {
        let (ledger, _) = testing::ledger();
        let (setup, reward_id) = earn_reward(&ledger);
        let token = claim(&ledger, &reward_id);

        assert!(matches!(
            redeem(&ledger, &owner(), &setup.business_id, "forged"),
            Err(LedgerError::InvalidToken)
        ));

        let other_owner = Caller::identified("owner-2");
        let other = ledger
            .ensure_business_and_default_card(&other_owner, crate::params::EnsureBusiness {
                owner_id: "owner-2".into(),
                display_name: None,
            })
            .expect("second business");
        assert!(matches!(
            redeem(&ledger, &other_owner, &other.business_id, &token),
            Err(LedgerError::InvalidToken)
        ));
    }
}
