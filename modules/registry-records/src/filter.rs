use std::collections::HashSet;

use chrono::NaiveDate;
use registry_common::{Notification, RegistryError, Result};
use serde::Serialize;
use uuid::Uuid;

/// The qualifying predicate for every statistics and record-listing
/// operation in this domain: a baby is a stillbirth iff its outcome text
/// contains "stillbirth", case-insensitively. Substring on purpose, to
/// tolerate free-text variants like "Fresh Stillbirth".
pub fn is_stillbirth(outcome: Option<&str>) -> bool {
    outcome
        .map(|o| o.to_lowercase().contains("stillbirth"))
        .unwrap_or(false)
}

/// Inclusive calendar-date range. Either bound may be absent; an absent
/// bound is unbounded on that side. Comparison is by calendar date, never
/// by timestamp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(RegistryError::InvalidArgument(format!(
                    "end date {e} is before start date {s}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn all_time() -> Self {
        Self::default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }

    /// Both bounds, when the range is fully bounded.
    pub fn bounded(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.start.zip(self.end)
    }
}

/// Select the notifications eligible for stats or listing: located inside
/// the accessible set, dated inside the range, and carrying at least one
/// stillbirth baby.
pub fn eligible_notifications<'a>(
    notifications: &'a [Notification],
    accessible: &HashSet<Uuid>,
    range: &DateRange,
) -> Vec<&'a Notification> {
    notifications
        .iter()
        .filter(|n| accessible.contains(&n.location_id))
        .filter(|n| range.contains(n.date_of_notification))
        .filter(|n| n.babies.iter().any(|b| is_stillbirth(b.outcome.as_deref())))
        .collect()
}

/// One page of an ordered record listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    /// Total eligible records across all pages.
    pub total: u64,
}

/// Page a record set with the stable listing order: notification date
/// descending, then id descending. `page` and `limit` are 1-indexed
/// positive integers; anything else is `InvalidArgument`, never a silent
/// default.
pub fn paginate(mut records: Vec<Notification>, page: u32, limit: u32) -> Result<Page<Notification>> {
    if page < 1 {
        return Err(RegistryError::InvalidArgument(format!(
            "page must be a positive integer, got {page}"
        )));
    }
    if limit < 1 {
        return Err(RegistryError::InvalidArgument(format!(
            "limit must be a positive integer, got {limit}"
        )));
    }

    records.sort_by(|a, b| {
        b.date_of_notification
            .cmp(&a.date_of_notification)
            .then(b.id.cmp(&a.id))
    });

    let total = records.len() as u64;
    let offset = (page as usize - 1).saturating_mul(limit as usize);
    let items: Vec<Notification> = records
        .into_iter()
        .skip(offset)
        .take(limit as usize)
        .collect();

    Ok(Page {
        items,
        page,
        limit,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_common::{Baby, Mother, PlaceOfDelivery, Sex};

    fn notification(date: NaiveDate, location_id: Uuid, outcome: &str) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            date_of_notification: date,
            location_id,
            mother: Mother {
                id: Uuid::new_v4(),
                place_of_delivery: PlaceOfDelivery::Facility,
            },
            babies: vec![Baby {
                id: Uuid::new_v4(),
                sex: Sex::Female,
                outcome: Some(outcome.to_string()),
                birth_weight: None,
            }],
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn stillbirth_predicate_is_substring_and_case_insensitive() {
        assert!(is_stillbirth(Some("Fresh Stillbirth")));
        assert!(is_stillbirth(Some("MACERATED STILLBIRTH")));
        assert!(is_stillbirth(Some("suspected stillbirth, unconfirmed")));
        assert!(!is_stillbirth(Some("live birth")));
        assert!(!is_stillbirth(None));
    }

    #[test]
    fn inverted_range_is_invalid() {
        let err = DateRange::new(Some(date(2024, 5, 1)), Some(date(2024, 4, 1))).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidArgument(_)));
    }

    #[test]
    fn half_bounded_range_applies_only_that_bound() {
        let from_march = DateRange::new(Some(date(2024, 3, 1)), None).unwrap();
        assert!(from_march.contains(date(2024, 3, 1)));
        assert!(from_march.contains(date(2025, 1, 1)));
        assert!(!from_march.contains(date(2024, 2, 29)));

        let until_march = DateRange::new(None, Some(date(2024, 3, 31))).unwrap();
        assert!(until_march.contains(date(2020, 1, 1)));
        assert!(!until_march.contains(date(2024, 4, 1)));
    }

    #[test]
    fn eligibility_requires_scope_range_and_stillbirth() {
        let in_scope = Uuid::new_v4();
        let out_of_scope = Uuid::new_v4();
        let accessible = HashSet::from([in_scope]);
        let range = DateRange::new(Some(date(2024, 1, 1)), Some(date(2024, 12, 31))).unwrap();

        let records = vec![
            notification(date(2024, 6, 1), in_scope, "fresh stillbirth"),
            notification(date(2024, 6, 1), out_of_scope, "fresh stillbirth"),
            notification(date(2023, 6, 1), in_scope, "fresh stillbirth"),
            notification(date(2024, 6, 1), in_scope, "live birth"),
        ];

        let eligible = eligible_notifications(&records, &accessible, &range);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, records[0].id);
    }

    #[test]
    fn pagination_orders_by_date_then_id_descending() {
        let loc = Uuid::new_v4();
        let records = vec![
            notification(date(2024, 1, 1), loc, "stillbirth"),
            notification(date(2024, 3, 1), loc, "stillbirth"),
            notification(date(2024, 2, 1), loc, "stillbirth"),
        ];

        let page = paginate(records, 1, 2).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].date_of_notification, date(2024, 3, 1));
        assert_eq!(page.items[1].date_of_notification, date(2024, 2, 1));

        let same_day = vec![
            notification(date(2024, 1, 1), loc, "stillbirth"),
            notification(date(2024, 1, 1), loc, "stillbirth"),
        ];
        let page = paginate(same_day, 1, 2).unwrap();
        assert!(page.items[0].id > page.items[1].id);
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() {
        let loc = Uuid::new_v4();
        let records = vec![notification(date(2024, 1, 1), loc, "stillbirth")];
        let page = paginate(records, 5, 10).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
    }

    #[test]
    fn zero_page_or_limit_is_invalid() {
        assert!(matches!(
            paginate(vec![], 0, 10).unwrap_err(),
            RegistryError::InvalidArgument(_)
        ));
        assert!(matches!(
            paginate(vec![], 1, 0).unwrap_err(),
            RegistryError::InvalidArgument(_)
        ));
    }
}
