//! Promotion and promotion scan-token query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use stamp_types::program::Promotion;

use crate::{from_sql_int, to_sql_int, DbError, Result};

const COLUMNS: &str = "id, business_id, name, promo_type, starts_at, ends_at, is_active, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Promotion> {
    Ok(Promotion {
        id: row.get(0)?,
        business_id: row.get(1)?,
        name: row.get(2)?,
        promo_type: row.get(3)?,
        starts_at: from_sql_int(row.get(4)?),
        ends_at: row.get::<_, Option<i64>>(5)?.map(from_sql_int),
        is_active: row.get(6)?,
        created_at: from_sql_int(row.get(7)?),
    })
}

/// Insert a promotion.
pub fn insert(conn: &Connection, promotion: &Promotion) -> Result<()> {
    conn.execute(
        "INSERT INTO promotions
             (id, business_id, name, promo_type, starts_at, ends_at, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            promotion.id,
            promotion.business_id,
            promotion.name,
            promotion.promo_type,
            to_sql_int(promotion.starts_at),
            promotion.ends_at.map(to_sql_int),
            promotion.is_active,
            to_sql_int(promotion.created_at),
        ],
    )?;
    Ok(())
}

/// Get a promotion by id.
pub fn get(conn: &Connection, id: &str) -> Result<Promotion> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM promotions WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("promotion".into()),
        other => DbError::Sqlite(other),
    })
}

/// Enable or disable a promotion.
pub fn set_active(conn: &Connection, id: &str, active: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE promotions SET is_active = ?2 WHERE id = ?1",
        rusqlite::params![id, active],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("promotion".into()));
    }
    Ok(())
}

/// Active promotions of a business whose window contains `now`.
pub fn list_live(conn: &Connection, business_id: &str, now: u64) -> Result<Vec<Promotion>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM promotions
         WHERE business_id = ?1
           AND is_active = 1
           AND starts_at <= ?2
           AND (ends_at IS NULL OR ends_at > ?2)
         ORDER BY starts_at, name"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![business_id, to_sql_int(now)], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Bind a scan token to (promotion, customer card) unless the pair has one.
pub fn insert_token_if_absent(
    conn: &Connection,
    token: &str,
    promotion_id: &str,
    customer_card_id: &str,
    created_at: u64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO promotion_tokens (token, promotion_id, customer_card_id, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT DO NOTHING",
        rusqlite::params![token, promotion_id, customer_card_id, to_sql_int(created_at)],
    )?;
    Ok(inserted == 1)
}

/// The scan token bound to (promotion, customer card).
pub fn find_token(
    conn: &Connection,
    promotion_id: &str,
    customer_card_id: &str,
) -> Result<Option<String>> {
    let token = conn
        .query_row(
            "SELECT token FROM promotion_tokens WHERE promotion_id = ?1 AND customer_card_id = ?2",
            [promotion_id, customer_card_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(token)
}

/// A resolved promotion scan token.
#[derive(Debug, PartialEq, Eq)]
pub struct TokenBinding {
    pub promotion_id: String,
    pub customer_card_id: String,
}

/// Resolve a scan token to its (promotion, customer card) binding.
pub fn resolve_token(conn: &Connection, token: &str) -> Result<Option<TokenBinding>> {
    let binding = conn
        .query_row(
            "SELECT promotion_id, customer_card_id FROM promotion_tokens WHERE token = ?1",
            [token],
            |row| {
                Ok(TokenBinding {
                    promotion_id: row.get(0)?,
                    customer_card_id: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(binding)
}
