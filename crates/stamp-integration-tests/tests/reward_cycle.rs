//! Integration test: stamp accrual through a full reward cycle.
//!
//! On a card that needs five stamps, the fifth scan resets the count to
//! zero and issues exactly one reward; the next scan starts the new cycle.

use stamp_integration_tests::{bootstrap, customer, enroll, owner, TestDb};
use stamp_ledger::params::{
    CardTarget, PassTarget, PromotionScan, RedeemRewardClaim, RewardTarget, UpdateLoyaltyCard,
};
use stamp_types::ledger::RewardStatus;

const STAMPS_REQUIRED: u32 = 5;

#[test]
fn fifth_stamp_issues_one_reward_and_resets() {
    let db = TestDb::new();
    let ledger = db.ledger();
    let setup = bootstrap(&ledger);
    ledger
        .update_loyalty_card(
            &owner(),
            UpdateLoyaltyCard {
                loyalty_card_id: setup.loyalty_card_id.clone(),
                stamps_required: Some(STAMPS_REQUIRED),
                ..Default::default()
            },
        )
        .expect("set threshold");
    let card = enroll(&ledger, &setup);
    let token = ledger
        .generate_wallet_pass(
            &customer(),
            PassTarget {
                business_id: setup.business_id.clone(),
                customer_card_id: card.clone(),
            },
        )
        .expect("issue pass")
        .token;
    let scan = || {
        ledger
            .process_promotion_scan(PromotionScan {
                qr_token: token.clone(),
                actor_id: Some("scanner-1".into()),
            })
            .expect("scan")
    };

    // =========================================================
    // Stamps 1..4: progress without a reward
    // =========================================================
    for expected in 1..STAMPS_REQUIRED {
        let state = scan();
        assert_eq!(state.stamps, expected);
        assert_eq!(state.remaining, STAMPS_REQUIRED - expected);
        assert!(state.reward_id.is_none());
    }

    // =========================================================
    // Stamp 5: reset and exactly one reward
    // =========================================================
    let state = scan();
    assert_eq!(state.stamps, 0);
    assert_eq!(state.remaining, STAMPS_REQUIRED);
    assert_eq!(state.rewards_available, 1);
    let reward_id = state.reward_id.expect("reward issued at threshold");

    let rewards = ledger
        .list_rewards(&customer(), CardTarget { customer_card_id: card.clone() })
        .expect("list rewards");
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].id, reward_id);
    assert_eq!(rewards[0].status, RewardStatus::Issued);

    // =========================================================
    // Stamp 6: the next cycle begins
    // =========================================================
    let state = scan();
    assert_eq!(state.stamps, 1);
    assert!(state.reward_id.is_none());
    assert_eq!(state.rewards_available, 1);

    let view = ledger
        .get_customer_card(&customer(), CardTarget { customer_card_id: card.clone() })
        .expect("card view");
    assert_eq!(view.stamps, 1);

    assert_eq!(db.count("events", "event_type = 'stamp_added'"), 6);
    assert_eq!(db.count("events", "event_type = 'reward_issued'"), 1);

    // =========================================================
    // Redeem: the reward leaves the available count
    // =========================================================
    let claim = ledger
        .generate_reward_claim_token(&customer(), RewardTarget { reward_id })
        .expect("claim token")
        .claim_token;
    ledger
        .redeem_reward_claim_token(
            &owner(),
            RedeemRewardClaim {
                business_id: setup.business_id.clone(),
                claim_token: claim,
            },
        )
        .expect("redeem");

    let view = ledger
        .get_customer_card(&customer(), CardTarget { customer_card_id: card })
        .expect("card view");
    assert_eq!(view.rewards_available, 0);
}

#[test]
fn threshold_is_fixed_once_stamps_exist() {
    let db = TestDb::new();
    let ledger = db.ledger();
    let setup = bootstrap(&ledger);
    let card = enroll(&ledger, &setup);
    let token = ledger
        .generate_wallet_pass(
            &customer(),
            PassTarget {
                business_id: setup.business_id.clone(),
                customer_card_id: card,
            },
        )
        .expect("issue pass")
        .token;
    ledger
        .process_promotion_scan(PromotionScan {
            qr_token: token,
            actor_id: None,
        })
        .expect("scan");

    let err = ledger
        .update_loyalty_card(
            &owner(),
            UpdateLoyaltyCard {
                loyalty_card_id: setup.loyalty_card_id,
                stamps_required: Some(STAMPS_REQUIRED + 1),
                ..Default::default()
            },
        )
        .expect_err("threshold change after stamps");
    assert_eq!(stamp_types::Coded::code(&err), stamp_types::ErrorCode::Conflict);
}
