//! Event log query functions. The log is append-only.

use rusqlite::{Connection, Row};
use stamp_types::events::{Event, EventType};

use super::parse_text;
use crate::{from_sql_int, to_sql_int, DbError, Result};

const COLUMNS: &str = "id, business_id, event_type, actor_id, customer_id, created_at, metadata";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    let metadata: String = row.get(6)?;
    Ok(Event {
        id: row.get(0)?,
        business_id: row.get(1)?,
        event_type: parse_text(2, row.get(2)?, EventType::parse)?,
        actor_id: row.get(3)?,
        customer_id: row.get(4)?,
        created_at: from_sql_int(row.get(5)?),
        metadata: serde_json::from_str(&metadata).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
    })
}

/// Append an event.
pub fn append(conn: &Connection, event: &Event) -> Result<()> {
    let metadata = serde_json::to_string(&event.metadata)
        .map_err(|e| DbError::Serialization(e.to_string()))?;
    conn.execute(
        "INSERT INTO events (id, business_id, event_type, actor_id, customer_id, created_at, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            event.id,
            event.business_id,
            event.event_type.as_str(),
            event.actor_id,
            event.customer_id,
            to_sql_int(event.created_at),
            metadata,
        ],
    )?;
    Ok(())
}

/// Most recent events of a business, newest first.
pub fn recent(conn: &Connection, business_id: &str, limit: u32) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM events WHERE business_id = ?1 ORDER BY seq DESC LIMIT ?2"
    ))?;

    let rows = stmt
        .query_map(rusqlite::params![business_id, limit], from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Count events of one type for a business.
pub fn count(conn: &Connection, business_id: &str, event_type: EventType) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM events WHERE business_id = ?1 AND event_type = ?2",
        [business_id, event_type.as_str()],
        |row| row.get(0),
    )?;
    Ok(from_sql_int(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn event(id: &str, event_type: EventType, created_at: u64) -> Event {
        Event {
            id: id.into(),
            business_id: "b1".into(),
            event_type,
            actor_id: Some("staff-1".into()),
            customer_id: None,
            created_at,
            metadata: serde_json::json!({"stamps": 1}),
        }
    }

    #[test]
    fn test_append_and_list() {
        let conn = test_db();
        append(&conn, &event("e1", EventType::StampAdded, 100)).expect("append");
        append(&conn, &event("e2", EventType::RewardIssued, 100)).expect("append");

        let events = recent(&conn, "b1", 10).expect("list");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "e2"); // Most recent first
        assert_eq!(events[1].metadata["stamps"], 1);
        assert_eq!(count(&conn, "b1", EventType::StampAdded).expect("count"), 1);
    }

    #[test]
    fn test_limit() {
        let conn = test_db();
        for i in 0..5 {
            append(&conn, &event(&format!("e{i}"), EventType::StampAdded, i)).expect("append");
        }
        assert_eq!(recent(&conn, "b1", 3).expect("list").len(), 3);
    }

    #[test]
    fn test_log_is_append_only() {
        let conn = test_db();
        append(&conn, &event("e1", EventType::StampAdded, 100)).expect("append");

        let update = conn.execute("UPDATE events SET actor_id = 'forged' WHERE id = 'e1'", []);
        assert!(update.is_err());
        let delete = conn.execute("DELETE FROM events WHERE id = 'e1'", []);
        assert!(delete.is_err());
        assert_eq!(recent(&conn, "b1", 10).expect("list").len(), 1);
    }
}
