//! Reward query functions.
//!
//! Consumption is a compare-and-swap on `consumed_at IS NULL`; callers
//! branch on the returned flag, never on whether the row exists.

use rusqlite::{Connection, OptionalExtension, Row};
use stamp_types::ledger::{Reward, RewardStatus};

use super::parse_text;
use crate::{from_sql_int, to_sql_int, DbError, Result};

const COLUMNS: &str =
    "id, customer_card_id, business_id, status, issued_at, consumed_at, consumed_by, claim_token";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Reward> {
    Ok(Reward {
        id: row.get(0)?,
        customer_card_id: row.get(1)?,
        business_id: row.get(2)?,
        status: parse_text(3, row.get(3)?, RewardStatus::parse)?,
        issued_at: from_sql_int(row.get(4)?),
        consumed_at: row.get::<_, Option<i64>>(5)?.map(from_sql_int),
        consumed_by: row.get(6)?,
        claim_token: row.get(7)?,
    })
}

/// Insert a reward in the `issued` state.
pub fn insert(
    conn: &Connection,
    id: &str,
    customer_card_id: &str,
    business_id: &str,
    issued_at: u64,
) -> Result<()> {
    conn.execute(
        "INSERT INTO rewards (id, customer_card_id, business_id, status, issued_at)
         VALUES (?1, ?2, ?3, 'issued', ?4)",
        rusqlite::params![id, customer_card_id, business_id, to_sql_int(issued_at)],
    )?;
    Ok(())
}

/// Get a reward by id.
pub fn get(conn: &Connection, id: &str) -> Result<Reward> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM rewards WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("reward".into()),
        other => DbError::Sqlite(other),
    })
}

/// Attach `token` as the claim token of an unconsumed reward.
///
/// Keeps an already attached token. Returns the effective claim token, or
/// `None` when the reward is missing or consumed.
pub fn attach_claim_token(conn: &Connection, id: &str, token: &str) -> Result<Option<String>> {
    let effective = conn
        .query_row(
            "UPDATE rewards SET claim_token = COALESCE(claim_token, ?2)
             WHERE id = ?1 AND consumed_at IS NULL
             RETURNING claim_token",
            rusqlite::params![id, token],
            |row| row.get(0),
        )
        .optional()?;
    Ok(effective)
}

/// Look up a reward by claim token, whatever its state.
pub fn find_by_claim_token(conn: &Connection, token: &str) -> Result<Option<Reward>> {
    let reward = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM rewards WHERE claim_token = ?1"),
            [token],
            from_row,
        )
        .optional()?;
    Ok(reward)
}

/// Transition a reward from `issued` to `consumed`.
///
/// Returns `false` when another consumer got there first.
pub fn consume(conn: &Connection, id: &str, consumed_at: u64, consumed_by: &str) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE rewards SET status = 'consumed', consumed_at = ?2, consumed_by = ?3
         WHERE id = ?1 AND consumed_at IS NULL",
        rusqlite::params![id, to_sql_int(consumed_at), consumed_by],
    )?;
    Ok(updated == 1)
}

/// Number of unconsumed rewards on a card.
pub fn count_available(conn: &Connection, customer_card_id: &str) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM rewards WHERE customer_card_id = ?1 AND consumed_at IS NULL",
        [customer_card_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// All rewards of a card, newest first.
pub fn list_for_card(conn: &Connection, customer_card_id: &str) -> Result<Vec<Reward>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM rewards WHERE customer_card_id = ?1
         ORDER BY issued_at DESC, rowid DESC"
    ))?;

    let rows = stmt
        .query_map([customer_card_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::{businesses, cards, customers};

    fn test_db() -> Connection {
        let conn = crate::open_memory().expect("open test db");
        businesses::insert_if_absent(&conn, "b1", "owner-1", "Shop", 1).expect("business");
        cards::insert_default_if_absent(&conn, "l1", "b1", 3, "Free coffee", 1).expect("card");
        customers::ensure_customer(&conn, "c1", 1).expect("customer");
        customers::insert_card_if_absent(&conn, "cc1", "c1", "l1", 1).expect("enroll");
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = test_db();
        insert(&conn, "r1", "cc1", "b1", 100).expect("insert");
        insert(&conn, "r2", "cc1", "b1", 200).expect("insert");
        assert_eq!(count_available(&conn, "cc1").expect("count"), 2);

        let rewards = list_for_card(&conn, "cc1").expect("list");
        assert_eq!(rewards[0].id, "r2"); // Most recent first
        assert_eq!(rewards[0].status, RewardStatus::Issued);
    }

    #[test]
    fn test_claim_token_is_stable() {
        let conn = test_db();
        insert(&conn, "r1", "cc1", "b1", 100).expect("insert");

        let first = attach_claim_token(&conn, "r1", "claim-a").expect("attach");
        let second = attach_claim_token(&conn, "r1", "claim-b").expect("attach again");
        assert_eq!(first.as_deref(), Some("claim-a"));
        assert_eq!(second.as_deref(), Some("claim-a"));
        assert_eq!(attach_claim_token(&conn, "nope", "claim-c").expect("missing"), None);
    }

    #[test]
    fn test_consume_exactly_once() {
        let conn = test_db();
        insert(&conn, "r1", "cc1", "b1", 100).expect("insert");

        assert!(consume(&conn, "r1", 150, "staff-1").expect("first consume"));
        assert!(!consume(&conn, "r1", 160, "staff-2").expect("second consume"));

        let reward = get(&conn, "r1").expect("get");
        assert_eq!(reward.status, RewardStatus::Consumed);
        assert_eq!(reward.consumed_at, Some(150));
        assert_eq!(reward.consumed_by.as_deref(), Some("staff-1"));
        assert_eq!(count_available(&conn, "cc1").expect("count"), 0);
    }

    #[test]
    fn test_no_claim_token_after_consumption() {
        let conn = test_db();
        insert(&conn, "r1", "cc1", "b1", 100).expect("insert");
        consume(&conn, "r1", 150, "staff-1").expect("consume");
        assert_eq!(attach_claim_token(&conn, "r1", "late").expect("attach"), None);
    }

    #[test]
    fn test_find_by_claim_token() {
        let conn = test_db();
        insert(&conn, "r1", "cc1", "b1", 100).expect("insert");
        attach_claim_token(&conn, "r1", "claim-a").expect("attach");

        let reward = find_by_claim_token(&conn, "claim-a").expect("find").expect("present");
        assert_eq!(reward.id, "r1");
        assert!(find_by_claim_token(&conn, "claim-z").expect("find").is_none());
    }
}
