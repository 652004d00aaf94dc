//! Integration test: enrollment races.
//!
//! Several handles, each with its own connection to the same database
//! file, enroll the same customer at the same moment. Exactly one customer
//! card must exist afterwards and every caller must be handed its id.

use std::sync::Barrier;
use std::thread;

use stamp_integration_tests::{bootstrap, customer, TestDb, CUSTOMER, OWNER};
use stamp_ledger::params::{EnsureBusiness, EnsureCustomerCard};

const RACERS: usize = 8;

#[test]
fn concurrent_enrollment_creates_one_card() {
    let db = TestDb::new();
    let setup = bootstrap(&db.ledger());

    let ledgers: Vec<_> = (0..RACERS).map(|_| db.ledger()).collect();
    let barrier = Barrier::new(RACERS);

    let card_ids: Vec<String> = thread::scope(|s| {
        let handles: Vec<_> = ledgers
            .iter()
            .map(|ledger| {
                let barrier = &barrier;
                let loyalty_card_id = setup.loyalty_card_id.clone();
                s.spawn(move || {
                    barrier.wait();
                    ledger
                        .ensure_customer_card(
                            &customer(),
                            EnsureCustomerCard {
                                customer_id: CUSTOMER.into(),
                                loyalty_card_id,
                            },
                        )
                        .expect("enrollment succeeds for every racer")
                        .customer_card_id
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("racer thread"))
            .collect()
    });

    assert!(
        card_ids.iter().all(|id| *id == card_ids[0]),
        "every racer must observe the same card: {card_ids:?}"
    );
    assert_eq!(db.count("customer_cards", &format!("customer_id = '{CUSTOMER}'")), 1);
    assert_eq!(db.count("customers", &format!("id = '{CUSTOMER}'")), 1);
    assert_eq!(
        db.count("events", "event_type = 'customer_enrolled'"),
        1,
        "only the winning insert is journaled"
    );
}

#[test]
fn concurrent_business_bootstrap_creates_one_business() {
    let db = TestDb::new();
    let ledgers: Vec<_> = (0..RACERS).map(|_| db.ledger()).collect();
    let barrier = Barrier::new(RACERS);

    let setups: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = ledgers
            .iter()
            .map(|ledger| {
                let barrier = &barrier;
                s.spawn(move || {
                    barrier.wait();
                    ledger
                        .ensure_business_and_default_card(
                            &stamp_integration_tests::owner(),
                            EnsureBusiness {
                                owner_id: OWNER.into(),
                                display_name: None,
                            },
                        )
                        .expect("bootstrap succeeds for every racer")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("racer thread"))
            .collect()
    });

    assert!(setups.iter().all(|setup| *setup == setups[0]));
    assert_eq!(db.count("businesses", &format!("owner_id = '{OWNER}'")), 1);
    assert_eq!(db.count("loyalty_cards", "is_default = 1"), 1);
}
