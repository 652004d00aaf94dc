//! Audit event recording.
//!
//! Events are written inside the same transaction as the state change
//! they describe, and handed to the [`EventSink`] only once it commits.

use rusqlite::Connection;
use serde_json::Value;
use stamp_db::queries::events;
use stamp_types::events::{Event, EventType};

use crate::tokens::new_id;
use crate::Result;

/// Receives events after their transaction has committed.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &Event);
}

/// Events recorded during one transaction.
#[derive(Debug)]
pub struct Journal {
    now: u64,
    events: Vec<Event>,
}

impl Journal {
    pub fn new(now: u64) -> Self {
        Self {
            now,
            events: Vec::new(),
        }
    }

    /// The timestamp every change in this transaction carries.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Append an event to the log and remember it for publication.
    pub fn record(
        &mut self,
        conn: &Connection,
        business_id: &str,
        event_type: EventType,
        actor_id: Option<&str>,
        customer_id: Option<&str>,
        metadata: Value,
    ) -> Result<()> {
        let event = Event {
            id: new_id(),
            business_id: business_id.to_string(),
            event_type,
            actor_id: actor_id.map(str::to_string),
            customer_id: customer_id.map(str::to_string),
            created_at: self.now,
            metadata,
        };
        events::append(conn, &event)?;
        self.events.push(event);
        Ok(())
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}
