use std::collections::HashSet;

use async_trait::async_trait;
use registry_common::{
    Baby, Location, Mother, NewNotification, Notification, Result, User,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::filter::DateRange;
use crate::store::RecordStore;

#[derive(Default)]
struct Inner {
    locations: Vec<Location>,
    users: Vec<User>,
    notifications: Vec<Notification>,
}

/// In-memory record store. The reference implementation of the seam:
/// service tests run against it, and it documents the store contract
/// without a database in the loop.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: RwLock<Inner>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_location(&self, location: Location) {
        self.inner.write().await.locations.push(location);
    }

    pub async fn add_user(&self, user: User) {
        self.inner.write().await.users.push(user);
    }

    pub async fn add_notification(&self, notification: Notification) {
        self.inner.write().await.notifications.push(notification);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load_locations(&self) -> Result<Vec<Location>> {
        Ok(self.inner.read().await.locations.clone())
    }

    async fn load_users_at(&self, location_ids: &HashSet<Uuid>) -> Result<Vec<User>> {
        Ok(self
            .inner
            .read()
            .await
            .users
            .iter()
            .filter(|u| {
                u.home_location_id
                    .map(|home| location_ids.contains(&home))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn fetch_notifications(&self, range: &DateRange) -> Result<Vec<Notification>> {
        Ok(self
            .inner
            .read()
            .await
            .notifications
            .iter()
            .filter(|n| range.contains(n.date_of_notification))
            .cloned()
            .collect())
    }

    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            date_of_notification: new.date_of_notification,
            location_id: new.location_id,
            mother: Mother {
                id: Uuid::new_v4(),
                place_of_delivery: new.mother.place_of_delivery,
            },
            babies: new
                .babies
                .into_iter()
                .map(|b| Baby {
                    id: Uuid::new_v4(),
                    sex: b.sex,
                    outcome: b.outcome,
                    birth_weight: b.birth_weight,
                })
                .collect(),
        };

        self.inner
            .write()
            .await
            .notifications
            .push(notification.clone());
        Ok(notification)
    }
}
