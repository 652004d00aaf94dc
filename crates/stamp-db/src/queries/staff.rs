//! Staff membership query functions.

use rusqlite::{Connection, Row};
use stamp_types::program::{StaffMembership, StaffRole};

use super::parse_text;
use crate::{from_sql_int, to_sql_int, DbError, Result};

const COLUMNS: &str = "id, business_id, staff_id, role, is_active, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<StaffMembership> {
    Ok(StaffMembership {
        id: row.get(0)?,
        business_id: row.get(1)?,
        staff_id: row.get(2)?,
        role: parse_text(3, row.get(3)?, StaffRole::parse)?,
        is_active: row.get(4)?,
        created_at: from_sql_int(row.get(5)?),
    })
}

/// Grant (or re-grant) staff authority. An existing membership keeps its id
/// and is reactivated with the new role.
pub fn upsert(
    conn: &Connection,
    id: &str,
    business_id: &str,
    staff_id: &str,
    role: StaffRole,
    created_at: u64,
) -> Result<StaffMembership> {
    let membership = conn.query_row(
        &format!(
            "INSERT INTO staff_memberships (id, business_id, staff_id, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)
             ON CONFLICT (business_id, staff_id)
             DO UPDATE SET role = excluded.role, is_active = 1
             RETURNING {COLUMNS}"
        ),
        rusqlite::params![id, business_id, staff_id, role.as_str(), to_sql_int(created_at)],
        from_row,
    )?;
    Ok(membership)
}

/// Get a membership by id.
pub fn get(conn: &Connection, id: &str) -> Result<StaffMembership> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM staff_memberships WHERE id = ?1"),
        [id],
        from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound("staff membership".into()),
        other => DbError::Sqlite(other),
    })
}

/// Activate or deactivate a membership.
pub fn set_active(conn: &Connection, id: &str, active: bool) -> Result<()> {
    let updated = conn.execute(
        "UPDATE staff_memberships SET is_active = ?2 WHERE id = ?1",
        rusqlite::params![id, active],
    )?;
    if updated == 0 {
        return Err(DbError::NotFound("staff membership".into()));
    }
    Ok(())
}

/// Whether `staff_id` holds an active membership in the business.
pub fn is_active_member(conn: &Connection, business_id: &str, staff_id: &str) -> Result<bool> {
    let active: bool = conn.query_row(
        "SELECT EXISTS (
             SELECT 1 FROM staff_memberships
             WHERE business_id = ?1 AND staff_id = ?2 AND is_active = 1
         )",
        [business_id, staff_id],
        |row| row.get(0),
    )?;
    Ok(active)
}

/// List memberships of a business.
pub fn list(conn: &Connection, business_id: &str) -> Result<Vec<StaffMembership>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM staff_memberships WHERE business_id = ?1 ORDER BY created_at, staff_id"
    ))?;

    let rows = stmt
        .query_map([business_id], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
