use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use registry_common::{
    Baby, Location, LocationKind, Mother, NewNotification, Notification, PlaceOfDelivery,
    RegistryError, Result, Sex, User,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::filter::DateRange;

/// Query seam over the external record store. The core only ever issues
/// read queries plus the single atomic notification create; everything
/// else about persistence lives behind this trait.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Every location in the hierarchy. The tree index is built from this.
    async fn load_locations(&self) -> Result<Vec<Location>>;

    /// Users whose home location is in the given set.
    async fn load_users_at(&self, location_ids: &HashSet<Uuid>) -> Result<Vec<User>>;

    /// Notifications (with nested mother and babies) dated within the
    /// range. Scope and stillbirth filtering happen in the core.
    async fn fetch_notifications(&self, range: &DateRange) -> Result<Vec<Notification>>;

    /// Atomic create of one notification with its mother and babies.
    /// Either everything is written or nothing is.
    async fn insert_notification(&self, new: NewNotification) -> Result<Notification>;
}

// ---------------------------------------------------------------------------
// Postgres implementation
// ---------------------------------------------------------------------------

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> RegistryError {
    RegistryError::Database(e.to_string())
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    id: Uuid,
    name: String,
    kind: String,
    parent_id: Option<Uuid>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    home_location_id: Option<Uuid>,
    roles: Vec<String>,
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    date_of_notification: NaiveDate,
    location_id: Uuid,
}

#[derive(sqlx::FromRow)]
struct MotherRow {
    id: Uuid,
    notification_id: Uuid,
    place_of_delivery: String,
}

#[derive(sqlx::FromRow)]
struct BabyRow {
    id: Uuid,
    notification_id: Uuid,
    sex: String,
    outcome: Option<String>,
    birth_weight: Option<f64>,
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn load_locations(&self) -> Result<Vec<Location>> {
        let rows: Vec<LocationRow> =
            sqlx::query_as("SELECT id, name, kind, parent_id FROM locations")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        rows.into_iter()
            .map(|row| {
                let kind = LocationKind::from_str_loose(&row.kind).ok_or_else(|| {
                    RegistryError::Database(format!(
                        "location {} has unknown kind {:?}",
                        row.id, row.kind
                    ))
                })?;
                Ok(Location {
                    id: row.id,
                    name: row.name,
                    kind,
                    parent_id: row.parent_id,
                })
            })
            .collect()
    }

    async fn load_users_at(&self, location_ids: &HashSet<Uuid>) -> Result<Vec<User>> {
        if location_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = location_ids.iter().copied().collect();

        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, home_location_id, roles FROM users WHERE home_location_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| User {
                id: row.id,
                home_location_id: row.home_location_id,
                roles: row.roles,
            })
            .collect())
    }

    async fn fetch_notifications(&self, range: &DateRange) -> Result<Vec<Notification>> {
        let base = "SELECT id, date_of_notification, location_id FROM notifications";
        let rows: Vec<NotificationRow> = match (range.start, range.end) {
            (Some(start), Some(end)) => sqlx::query_as(&format!(
                "{base} WHERE date_of_notification >= $1 AND date_of_notification <= $2"
            ))
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?,
            (Some(start), None) => {
                sqlx::query_as(&format!("{base} WHERE date_of_notification >= $1"))
                    .bind(start)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db_err)?
            }
            (None, Some(end)) => {
                sqlx::query_as(&format!("{base} WHERE date_of_notification <= $1"))
                    .bind(end)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(db_err)?
            }
            (None, None) => sqlx::query_as(base)
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?,
        };

        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let mother_rows: Vec<MotherRow> = sqlx::query_as(
            "SELECT id, notification_id, place_of_delivery FROM mothers
             WHERE notification_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let baby_rows: Vec<BabyRow> = sqlx::query_as(
            "SELECT id, notification_id, sex, outcome, birth_weight FROM babies
             WHERE notification_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut mothers: HashMap<Uuid, Mother> = mother_rows
            .into_iter()
            .map(|row| {
                (
                    row.notification_id,
                    Mother {
                        id: row.id,
                        place_of_delivery: PlaceOfDelivery::from_str_loose(&row.place_of_delivery),
                    },
                )
            })
            .collect();

        let mut babies: HashMap<Uuid, Vec<Baby>> = HashMap::new();
        for row in baby_rows {
            babies.entry(row.notification_id).or_default().push(Baby {
                id: row.id,
                sex: Sex::from_str_loose(&row.sex),
                outcome: row.outcome,
                birth_weight: row.birth_weight,
            });
        }

        rows.into_iter()
            .map(|row| {
                let mother = mothers.remove(&row.id).ok_or_else(|| {
                    RegistryError::Database(format!("notification {} has no mother row", row.id))
                })?;
                Ok(Notification {
                    id: row.id,
                    date_of_notification: row.date_of_notification,
                    location_id: row.location_id,
                    mother,
                    babies: babies.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let notification_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO notifications (id, date_of_notification, location_id)
             VALUES ($1, $2, $3)",
        )
        .bind(notification_id)
        .bind(new.date_of_notification)
        .bind(new.location_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let mother = Mother {
            id: Uuid::new_v4(),
            place_of_delivery: new.mother.place_of_delivery,
        };
        sqlx::query(
            "INSERT INTO mothers (id, notification_id, place_of_delivery)
             VALUES ($1, $2, $3)",
        )
        .bind(mother.id)
        .bind(notification_id)
        .bind(mother.place_of_delivery.to_string())
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let mut babies = Vec::with_capacity(new.babies.len());
        for new_baby in new.babies {
            let baby = Baby {
                id: Uuid::new_v4(),
                sex: new_baby.sex,
                outcome: new_baby.outcome,
                birth_weight: new_baby.birth_weight,
            };
            sqlx::query(
                "INSERT INTO babies (id, notification_id, sex, outcome, birth_weight)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(baby.id)
            .bind(notification_id)
            .bind(baby.sex.to_string())
            .bind(&baby.outcome)
            .bind(baby.birth_weight)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
            babies.push(baby);
        }

        tx.commit().await.map_err(db_err)?;

        Ok(Notification {
            id: notification_id,
            date_of_notification: new.date_of_notification,
            location_id: new.location_id,
            mother,
            babies,
        })
    }
}
