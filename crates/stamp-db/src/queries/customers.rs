//! Customer and customer card query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use stamp_types::ledger::CustomerCard;

use crate::{from_sql_int, to_sql_int, DbError, Result};

const CARD_COLUMNS: &str = "id, customer_id, loyalty_card_id, current_stamps, total_stamps, \
                            total_rewards_earned, last_scan_at, created_at";

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<CustomerCard> {
    Ok(CustomerCard {
        id: row.get(0)?,
        customer_id: row.get(1)?,
        loyalty_card_id: row.get(2)?,
        current_stamps: row.get(3)?,
        total_stamps: from_sql_int(row.get(4)?),
        total_rewards_earned: from_sql_int(row.get(5)?),
        last_scan_at: row.get::<_, Option<i64>>(6)?.map(from_sql_int),
        created_at: from_sql_int(row.get(7)?),
    })
}

/// Record a customer identity if it is not known yet.
pub fn ensure_customer(conn: &Connection, id: &str, created_at: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO customers (id, created_at) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
        rusqlite::params![id, to_sql_int(created_at)],
    )?;
    Ok(())
}

/// Insert an enrollment unless (customer, loyalty card) already has one.
///
/// Returns `false` when the unique constraint absorbed the insert.
pub fn insert_card_if_absent(
    conn: &Connection,
    id: &str,
    customer_id: &str,
    loyalty_card_id: &str,
    created_at: u64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO customer_cards (id, customer_id, loyalty_card_id, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT DO NOTHING",
        rusqlite::params![id, customer_id, loyalty_card_id, to_sql_int(created_at)],
    )?;
    Ok(inserted == 1)
}

/// Get a customer card by id.
pub fn get_card(conn: &Connection, id: &str) -> Result<CustomerCard> {
    conn.query_row(
        &format!("SELECT {CARD_COLUMNS} FROM customer_cards WHERE id = ?1"),
        [id],
        card_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("customer card".into()),
        other => DbError::Sqlite(other),
    })
}

/// Find the enrollment of a customer in a loyalty card.
pub fn find_card(
    conn: &Connection,
    customer_id: &str,
    loyalty_card_id: &str,
) -> Result<Option<CustomerCard>> {
    let card = conn
        .query_row(
            &format!(
                "SELECT {CARD_COLUMNS} FROM customer_cards
                 WHERE customer_id = ?1 AND loyalty_card_id = ?2"
            ),
            [customer_id, loyalty_card_id],
            card_from_row,
        )
        .optional()?;
    Ok(card)
}

/// Add one stamp and return the new stamp count.
pub fn add_stamp(conn: &Connection, id: &str, scanned_at: u64) -> Result<u32> {
    conn.query_row(
        "UPDATE customer_cards
         SET current_stamps = current_stamps + 1,
             total_stamps = total_stamps + 1,
             last_scan_at = ?2
         WHERE id = ?1
         RETURNING current_stamps",
        rusqlite::params![id, to_sql_int(scanned_at)],
        |row| row.get(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("customer card".into()),
        other => DbError::Sqlite(other),
    })
}

/// Reset the stamp counter of a card that reached its threshold.
///
/// Returns `false` when the card is below `stamps_required`.
pub fn reset_for_reward(conn: &Connection, id: &str, stamps_required: u32) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE customer_cards
         SET current_stamps = 0,
             total_rewards_earned = total_rewards_earned + 1
         WHERE id = ?1 AND current_stamps >= ?2",
        rusqlite::params![id, stamps_required],
    )?;
    Ok(updated == 1)
}

/// A customer card joined with the programme it belongs to.
#[derive(Debug)]
pub struct CardContext {
    pub card: CustomerCard,
    pub business_id: String,
    pub stamps_required: u32,
    pub program_active: bool,
}

/// Load a customer card together with its loyalty card's business and threshold.
pub fn context(conn: &Connection, id: &str) -> Result<CardContext> {
    conn.query_row(
        "SELECT cc.id, cc.customer_id, cc.loyalty_card_id, cc.current_stamps, cc.total_stamps,
                cc.total_rewards_earned, cc.last_scan_at, cc.created_at,
                lc.business_id, lc.stamps_required, lc.is_active
         FROM customer_cards cc
         JOIN loyalty_cards lc ON lc.id = cc.loyalty_card_id
         WHERE cc.id = ?1",
        [id],
        |row| {
            Ok(CardContext {
                card: card_from_row(row)?,
                business_id: row.get(8)?,
                stamps_required: row.get(9)?,
                program_active: row.get(10)?,
            })
        },
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("customer card".into()),
        other => DbError::Sqlite(other),
    })
}
