//! Loyalty card query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use stamp_types::program::LoyaltyCard;

use crate::{from_sql_int, to_sql_int, DbError, Result};

const COLUMNS: &str =
    "id, business_id, stamps_required, reward_description, is_active, is_default, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<LoyaltyCard> {
    Ok(LoyaltyCard {
        id: row.get(0)?,
        business_id: row.get(1)?,
        stamps_required: row.get(2)?,
        reward_description: row.get(3)?,
        is_active: row.get(4)?,
        is_default: row.get(5)?,
        created_at: from_sql_int(row.get(6)?),
    })
}

/// Insert the default card of a business unless it already has one.
pub fn insert_default_if_absent(
    conn: &Connection,
    id: &str,
    business_id: &str,
    stamps_required: u32,
    reward_description: &str,
    created_at: u64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO loyalty_cards
             (id, business_id, stamps_required, reward_description, is_default, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5)
         ON CONFLICT DO NOTHING",
        rusqlite::params![
            id,
            business_id,
            stamps_required,
            reward_description,
            to_sql_int(created_at),
        ],
    )?;
    Ok(inserted == 1)
}

/// Get a loyalty card by id.
pub fn get(conn: &Connection, id: &str) -> Result<LoyaltyCard> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM loyalty_cards WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("loyalty card".into()),
        other => DbError::Sqlite(other),
    })
}

/// The default card of a business.
pub fn default_for_business(conn: &Connection, business_id: &str) -> Result<Option<LoyaltyCard>> {
    let card = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM loyalty_cards WHERE business_id = ?1 AND is_default = 1"),
            [business_id],
            from_row,
        )
        .optional()?;
    Ok(card)
}

/// Update the mutable presentation fields of a card.
pub fn set_details(
    conn: &Connection,
    id: &str,
    reward_description: &str,
    is_active: bool,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE loyalty_cards SET reward_description = ?2, is_active = ?3 WHERE id = ?1",
        rusqlite::params![id, reward_description, is_active],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("loyalty card".into()));
    }
    Ok(())
}

/// Change the stamp threshold, only while no customer card has recorded a stamp.
///
/// Returns `false` when stamps have already been recorded against the card.
pub fn set_stamps_required(conn: &Connection, id: &str, stamps_required: u32) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE loyalty_cards SET stamps_required = ?2
         WHERE id = ?1
           AND NOT EXISTS (
               SELECT 1 FROM customer_cards
               WHERE loyalty_card_id = ?1 AND (total_stamps > 0 OR total_rewards_earned > 0)
           )",
        rusqlite::params![id, stamps_required],
    )?;
    Ok(updated == 1)
}
