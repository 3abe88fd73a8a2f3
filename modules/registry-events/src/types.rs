use registry_common::{Notification, User};
use serde::{Deserialize, Serialize};

/// Domain events published by the registry core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RegistryEvent {
    /// A notification was ingested. `recipients` are the users attached to
    /// the reporting location and every location above it in the hierarchy,
    /// deduplicated; downstream alerting fans out to them.
    NotificationCreated {
        notification: Notification,
        recipients: Vec<User>,
    },
}

impl RegistryEvent {
    /// Stable string tag, matching the serde tag exactly.
    pub fn event_type(&self) -> &'static str {
        match self {
            RegistryEvent::NotificationCreated { .. } => "notification_created",
        }
    }
}
