//! Event system for roster services
//!
//! An in-process event bus built on `tokio::sync::broadcast`. Services emit
//! events during mutations and sync runs; any number of subscribers (CLI
//! watch output, log shippers) can consume them. Emission never blocks: with
//! no subscribers the event is dropped, and lagging subscribers lose the
//! oldest events first.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Event bus for distributing service events
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given per-subscriber buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers (non-blocking)
    pub fn emit(&self, event: Event) {
        // send() errors when nobody is listening, which is fine
        let _ = self.sender.send(event);
    }

    /// Number of active subscribers; for diagnostics only
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Events emitted by roster services
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A state-holder mutation hit a store error
    MutationFailed {
        /// Entry point that failed ("add", "update", "delete", "clear")
        operation: String,
        error: String,
    },

    /// Background sync run started
    SyncStarted,

    /// Background sync run finished successfully
    SyncCompleted { result: String },

    /// Background sync run failed
    SyncFailed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::SyncStarted);

        let received = receiver.recv().await.unwrap();
        assert!(matches!(received, Event::SyncStarted));
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_the_same_event() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        event_bus.emit(Event::SyncCompleted {
            result: "done".to_string(),
        });

        for receiver in [&mut receiver1, &mut receiver2] {
            match receiver.recv().await.unwrap() {
                Event::SyncCompleted { result } => assert_eq!(result, "done"),
                other => panic!("wrong event: {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_does_not_block() {
        let event_bus = EventBus::new(10);
        event_bus.emit(Event::SyncFailed {
            error: "nobody listening".to_string(),
        });
        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_event_serialization() {
        let event = Event::MutationFailed {
            operation: "add".to_string(),
            error: "disk full".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("mutation_failed"));
        assert!(json.contains("disk full"));

        let back: Event = serde_json::from_str(&json).unwrap();
        match back {
            Event::MutationFailed { operation, error } => {
                assert_eq!(operation, "add");
                assert_eq!(error, "disk full");
            }
            other => panic!("wrong event: {:?}", other),
        }
    }
}
