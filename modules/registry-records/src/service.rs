use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use registry_common::{
    parse_roles, NewNotification, Notification, RegistryError, Result,
};
use registry_events::{EventBus, RegistryEvent};
use registry_hierarchy::{project, project_for_user, resolve_accessible, LocationSubtree, LocationTree};
use tracing::{info, warn};
use uuid::Uuid;

use crate::filter::{eligible_notifications, paginate, DateRange, Page};
use crate::stats::{aggregate, StillbirthStats};
use crate::store::RecordStore;

/// The registry core, as seen by the HTTP layer. Wires the location tree,
/// scope resolution, record filtering, and aggregation over the record
/// store, and publishes domain events on ingestion.
///
/// Holds no mutable state of its own; every call loads what it needs and
/// computes independently, so concurrent requests never interfere.
#[derive(Clone)]
pub struct Registry {
    store: Arc<dyn RecordStore>,
    events: EventBus,
}

impl Registry {
    pub fn new(store: Arc<dyn RecordStore>, events: EventBus) -> Self {
        Self { store, events }
    }

    /// Build the location tree index from the store.
    pub async fn location_tree(&self) -> Result<LocationTree> {
        let locations = self.store.load_locations().await?;
        Ok(LocationTree::from_locations(locations))
    }

    /// Resolve the set of location ids the caller may see, optionally
    /// anchored at a requested location.
    pub async fn resolve_accessible_locations(
        &self,
        role_names: &[String],
        home_location_id: Uuid,
        requested: Option<Uuid>,
    ) -> Result<HashSet<Uuid>> {
        let tree = self.location_tree().await?;
        let roles = parse_roles(role_names);
        let scope = resolve_accessible(&tree, &roles, home_location_id, requested)?;
        Ok(scope.location_ids)
    }

    /// Stillbirth statistics over the accessible set: today snapshot for
    /// the injected `today`, plus the monthly series when both bounds are
    /// given. A single bound is `InvalidArgument`; the monthly view is
    /// only meaningful over a closed range.
    pub async fn stillbirth_stats(
        &self,
        accessible: &HashSet<Uuid>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<StillbirthStats> {
        let monthly_range = match (start_date, end_date) {
            (Some(_), Some(_)) => DateRange::new(start_date, end_date)?.bounded(),
            (None, None) => None,
            _ => {
                return Err(RegistryError::InvalidArgument(
                    "monthly statistics need both startDate and endDate".to_string(),
                ))
            }
        };

        let records = self.store.fetch_notifications(&DateRange::all_time()).await?;
        Ok(aggregate(&records, accessible, today, monthly_range))
    }

    /// Paginated stillbirth record listing over the accessible set.
    pub async fn stillbirth_records(
        &self,
        accessible: &HashSet<Uuid>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        page: u32,
        limit: u32,
    ) -> Result<Page<Notification>> {
        let range = DateRange::new(start_date, end_date)?;
        let records = self.store.fetch_notifications(&range).await?;
        let eligible: Vec<Notification> = eligible_notifications(&records, accessible, &range)
            .into_iter()
            .cloned()
            .collect();
        paginate(eligible, page, limit)
    }

    /// The pruned subtree rooted at a location.
    pub async fn location_subtree(&self, root_id: Uuid) -> Result<LocationSubtree> {
        let tree = self.location_tree().await?;
        project(&tree, root_id)
    }

    /// The browsable subtree for a user: home location with the role
    /// scope-root adjustment applied.
    pub async fn location_subtree_for_user(
        &self,
        role_names: &[String],
        home_location_id: Uuid,
    ) -> Result<LocationSubtree> {
        let tree = self.location_tree().await?;
        let roles = parse_roles(role_names);
        project_for_user(&tree, &roles, home_location_id)
    }

    /// Ingest one notification. The create is atomic; after it succeeds a
    /// `NotificationCreated` event goes out to the users along the
    /// location's ancestor chain, fire-and-forget.
    pub async fn create_notification(&self, new: NewNotification) -> Result<Notification> {
        let tree = self.location_tree().await?;
        tree.get(new.location_id)?;

        let saved = self.store.insert_notification(new).await?;

        let recipients = match self.notification_recipients(&tree, saved.location_id).await {
            Ok(users) => users,
            Err(e) => {
                // Recipient lookup must not fail the completed write.
                warn!(error = %e, notification_id = %saved.id, "failed to load event recipients");
                Vec::new()
            }
        };

        info!(
            notification_id = %saved.id,
            location_id = %saved.location_id,
            babies = saved.babies.len(),
            "notification created"
        );

        self.events.publish(RegistryEvent::NotificationCreated {
            notification: saved.clone(),
            recipients,
        });

        Ok(saved)
    }

    /// Users at the notification's location and every ancestor above it,
    /// deduplicated by user id.
    async fn notification_recipients(
        &self,
        tree: &LocationTree,
        location_id: Uuid,
    ) -> Result<Vec<registry_common::User>> {
        let ancestor_ids: HashSet<Uuid> = tree
            .ancestors_of(location_id)?
            .iter()
            .map(|l| l.id)
            .collect();

        let users = self.store.load_users_at(&ancestor_ids).await?;

        let mut seen = HashSet::new();
        Ok(users
            .into_iter()
            .filter(|u| seen.insert(u.id))
            .collect())
    }
}
