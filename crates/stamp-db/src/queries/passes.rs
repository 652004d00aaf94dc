//! Wallet pass query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use stamp_types::ledger::{PassStatus, WalletPass};

use super::parse_text;
use crate::{from_sql_int, to_sql_int, Result};

const COLUMNS: &str = "id, customer_card_id, business_id, token, status, created_at, revoked_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<WalletPass> {
    Ok(WalletPass {
        id: row.get(0)?,
        customer_card_id: row.get(1)?,
        business_id: row.get(2)?,
        token: row.get(3)?,
        status: parse_text(4, row.get(4)?, PassStatus::parse)?,
        created_at: from_sql_int(row.get(5)?),
        revoked_at: row.get::<_, Option<i64>>(6)?.map(from_sql_int),
    })
}

/// Insert an active pass unless the card already has one.
///
/// Returns `false` when the one-active-pass index absorbed the insert.
pub fn insert_active(
    conn: &Connection,
    id: &str,
    customer_card_id: &str,
    business_id: &str,
    token: &str,
    created_at: u64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO wallet_passes (id, customer_card_id, business_id, token, status, created_at)
         VALUES (?1, ?2, ?3, ?4, 'active', ?5)
         ON CONFLICT DO NOTHING",
        rusqlite::params![id, customer_card_id, business_id, token, to_sql_int(created_at)],
    )?;
    Ok(inserted == 1)
}

/// The active pass of a customer card.
pub fn find_active(conn: &Connection, customer_card_id: &str) -> Result<Option<WalletPass>> {
    let pass = conn
        .query_row(
            &format!(
                "SELECT {COLUMNS} FROM wallet_passes
                 WHERE customer_card_id = ?1 AND status = 'active'"
            ),
            [customer_card_id],
            from_row,
        )
        .optional()?;
    Ok(pass)
}

/// Look up an active pass by its token.
pub fn find_active_by_token(conn: &Connection, token: &str) -> Result<Option<WalletPass>> {
    let pass = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM wallet_passes WHERE token = ?1 AND status = 'active'"),
            [token],
            from_row,
        )
        .optional()?;
    Ok(pass)
}

/// Revoke the active pass of a card. Returns the revoked pass id, if any.
pub fn revoke_active(
    conn: &Connection,
    customer_card_id: &str,
    revoked_at: u64,
) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "UPDATE wallet_passes SET status = 'revoked', revoked_at = ?2
             WHERE customer_card_id = ?1 AND status = 'active'
             RETURNING id",
            rusqlite::params![customer_card_id, to_sql_int(revoked_at)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}
