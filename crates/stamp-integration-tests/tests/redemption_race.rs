//! Integration test: one-time reward redemption under contention.
//!
//! A customer earns a reward and presents its claim token at several
//! counters at once. Exactly one redemption succeeds; every other attempt
//! is rejected as already redeemed and the reward is consumed once.

use std::sync::Barrier;
use std::thread;

use stamp_integration_tests::{bootstrap, customer, enroll, owner, TestDb};
use stamp_ledger::params::{PassTarget, PromotionScan, RedeemRewardClaim, RewardTarget, UpdateLoyaltyCard};
use stamp_ledger::Ledger;
use stamp_types::{Coded, ErrorCode};

const COUNTERS: usize = 6;

/// Earn one reward on a threshold-2 card and return its claim token.
fn earn_reward(ledger: &Ledger) -> (String, String) {
    let setup = bootstrap(ledger);
    ledger
        .update_loyalty_card(
            &owner(),
            UpdateLoyaltyCard {
                loyalty_card_id: setup.loyalty_card_id.clone(),
                stamps_required: Some(2),
                ..Default::default()
            },
        )
        .expect("lower threshold");
    let card = enroll(ledger, &setup);
    let pass = ledger
        .generate_wallet_pass(
            &customer(),
            PassTarget {
                business_id: setup.business_id.clone(),
                customer_card_id: card,
            },
        )
        .expect("issue pass");

    let scan = || PromotionScan {
        qr_token: pass.token.clone(),
        actor_id: None,
    };
    ledger.process_promotion_scan(scan()).expect("first stamp");
    let state = ledger.process_promotion_scan(scan()).expect("second stamp");
    let reward_id = state.reward_id.expect("threshold issues a reward");

    let claim = ledger
        .generate_reward_claim_token(&customer(), RewardTarget { reward_id })
        .expect("claim token");
    (setup.business_id, claim.claim_token)
}

#[test]
fn concurrent_claim_redemption_succeeds_once() {
    let db = TestDb::new();
    let (business_id, claim_token) = earn_reward(&db.ledger());

    let ledgers: Vec<_> = (0..COUNTERS).map(|_| db.ledger()).collect();
    let barrier = Barrier::new(COUNTERS);

    let outcomes: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = ledgers
            .iter()
            .map(|ledger| {
                let barrier = &barrier;
                let params = RedeemRewardClaim {
                    business_id: business_id.clone(),
                    claim_token: claim_token.clone(),
                };
                s.spawn(move || {
                    barrier.wait();
                    ledger.redeem_reward_claim_token(&owner(), params)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("counter thread"))
            .collect()
    });

    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    let already_redeemed = outcomes
        .iter()
        .filter(|o| matches!(o, Err(e) if e.code() == ErrorCode::AlreadyRedeemed))
        .count();
    assert_eq!(successes, 1, "outcomes: {outcomes:?}");
    assert_eq!(already_redeemed, COUNTERS - 1, "outcomes: {outcomes:?}");

    assert_eq!(db.count("rewards", "status = 'consumed'"), 1);
    assert_eq!(db.count("events", "event_type = 'reward_redeemed'"), 1);
}

#[test]
fn redeemed_claim_token_stays_spent() {
    let db = TestDb::new();
    let ledger = db.ledger();
    let (business_id, claim_token) = earn_reward(&ledger);

    let params = || RedeemRewardClaim {
        business_id: business_id.clone(),
        claim_token: claim_token.clone(),
    };
    ledger
        .redeem_reward_claim_token(&owner(), params())
        .expect("first redemption");

    // A later handle sees the committed consumption.
    let err = db
        .ledger()
        .redeem_reward_claim_token(&owner(), params())
        .expect_err("second redemption");
    assert_eq!(err.code(), ErrorCode::AlreadyRedeemed);
}
