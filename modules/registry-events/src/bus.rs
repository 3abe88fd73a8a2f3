use tokio::sync::broadcast;
use tracing::debug;

use crate::types::RegistryEvent;

/// Broadcast bus for domain events. Cheap to clone; all clones share the
/// same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RegistryEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers. A send with no
    /// subscribers is dropped, not an error.
    pub fn publish(&self, event: RegistryEvent) {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(subscribers) => {
                debug!(event_type, subscribers, "published event");
            }
            Err(_) => {
                debug!(event_type, "no subscribers, event dropped");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
