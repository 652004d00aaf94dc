//! Business query functions.

use rusqlite::{Connection, OptionalExtension, Row};
use stamp_types::program::Business;

use crate::{from_sql_int, to_sql_int, DbError, Result};

const COLUMNS: &str = "id, owner_id, display_name, accent_color, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Business> {
    Ok(Business {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        display_name: row.get(2)?,
        accent_color: row.get(3)?,
        created_at: from_sql_int(row.get(4)?),
    })
}

/// Insert a business unless the owner already has one.
///
/// Returns `false` when the owner's unique constraint absorbed the insert.
pub fn insert_if_absent(
    conn: &Connection,
    id: &str,
    owner_id: &str,
    display_name: &str,
    created_at: u64,
) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT INTO businesses (id, owner_id, display_name, created_at)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT DO NOTHING",
        rusqlite::params![id, owner_id, display_name, to_sql_int(created_at)],
    )?;
    Ok(inserted == 1)
}

/// Get a business by id.
pub fn get(conn: &Connection, id: &str) -> Result<Business> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM businesses WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("business".into()),
        other => DbError::Sqlite(other),
    })
}

/// Find the business owned by `owner_id`.
pub fn find_by_owner(conn: &Connection, owner_id: &str) -> Result<Option<Business>> {
    let business = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM businesses WHERE owner_id = ?1"),
            [owner_id],
            from_row,
        )
        .optional()?;
    Ok(business)
}

/// Update a business's display settings. `None` clears the accent colour.
pub fn update_details(
    conn: &Connection,
    id: &str,
    display_name: &str,
    accent_color: Option<&str>,
) -> Result<()> {
    let updated = conn.execute(
        "UPDATE businesses SET display_name = ?2, accent_color = ?3 WHERE id = ?1",
        rusqlite::params![id, display_name, accent_color],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("business".into()));
    }
    Ok(())
}

/// Owner identity of a business, if it exists.
pub fn owner_of(conn: &Connection, business_id: &str) -> Result<Option<String>> {
    let owner = conn
        .query_row(
            "SELECT owner_id FROM businesses WHERE id = ?1",
            [business_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(owner)
}
