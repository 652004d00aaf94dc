//! Event fan-out to subscribers.
//!
//! The ledger hands every committed event to the bus; subscribed
//! connections receive them as JSON-RPC notifications. Each subscriber has
//! an independent buffer; a subscriber that falls behind skips ahead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stamp_ledger::EventSink;
use stamp_types::events::Event;
use tokio::sync::broadcast;

/// An event stamped with its position in the daemon's stream.
#[derive(Debug, Clone, Serialize)]
pub struct Published {
    pub seq: u64,
    pub event: Event,
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    /// Only events of this business.
    pub business_id: String,
    /// Category filter: "program", "pass", "ledger".
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Published>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(Published { seq, event });
    }

    /// Subscribe to events. Returns a receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.sender.subscribe()
    }

    /// Get the current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: &Event) {
        self.emit(event.clone());
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if event.business_id != self.business_id {
            return false;
        }
        if let Some(ref categories) = self.categories {
            let category = event.event_type.category();
            if !categories.iter().any(|c| c == category) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stamp_types::events::EventType;

    fn event(business_id: &str, event_type: EventType) -> Event {
        Event {
            id: "e1".to_string(),
            business_id: business_id.to_string(),
            event_type,
            actor_id: None,
            customer_id: None,
            created_at: 1000,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn test_event_bus_emit_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(&event("b1", EventType::StampAdded));

        let published = rx.try_recv().expect("receive event");
        assert_eq!(published.event.event_type, EventType::StampAdded);
        assert_eq!(published.seq, 1);
        assert_eq!(bus.sequence(), 1);
    }

    #[test]
    fn test_filter_by_business_and_category() {
        let filter = EventFilter {
            business_id: "b1".to_string(),
            categories: Some(vec!["ledger".to_string()]),
        };
        assert!(filter.matches(&event("b1", EventType::RewardRedeemed)));
        assert!(!filter.matches(&event("b1", EventType::StaffAdded)));
        assert!(!filter.matches(&event("b2", EventType::RewardRedeemed)));

        let everything = EventFilter {
            business_id: "b1".to_string(),
            categories: None,
        };
        assert!(everything.matches(&event("b1", EventType::StaffAdded)));
    }
}
