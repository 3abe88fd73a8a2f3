use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use registry_common::{Notification, Sex};
use serde::Serialize;
use uuid::Uuid;

use crate::filter::is_stillbirth;

/// Aggregate counts for stillbirth babies notified on one calendar date.
///
/// The `outcome` breakdown buckets by the full normalized outcome text
/// ("fresh stillbirth", "macerated stillbirth", or whatever free text was
/// recorded), unlike the monthly series which counts only the two
/// canonical subtypes. The asymmetry is specified behavior, carried over
/// from the existing reports, pending product confirmation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TodaySnapshot {
    pub total: u64,
    pub sex: BTreeMap<String, u64>,
    #[serde(rename = "type")]
    pub outcome: BTreeMap<String, u64>,
    pub place: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct SexBreakdown {
    pub male: u64,
    pub female: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct OutcomeBreakdown {
    pub fresh: u64,
    pub macerated: u64,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct PlaceBreakdown {
    pub facility: u64,
    pub home: u64,
}

/// One calendar-month bucket of the monthly series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    /// Stable, locale-independent label, e.g. "2024-03". Used as both the
    /// grouping key and the display value.
    pub month: String,
    pub total: u64,
    /// Mean of the non-null birth weights in the bucket, grams. None when
    /// no baby in the bucket has a recorded weight.
    pub avg_weight: Option<f64>,
    pub sex: SexBreakdown,
    #[serde(rename = "type")]
    pub outcome: OutcomeBreakdown,
    pub place: PlaceBreakdown,
}

/// The full statistics response: today snapshot plus monthly series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StillbirthStats {
    pub today: TodaySnapshot,
    pub monthly: Vec<MonthBucket>,
}

#[derive(Default)]
struct MonthAccumulator {
    total: u64,
    weight_sum: f64,
    weight_count: u64,
    sex: SexBreakdown,
    outcome: OutcomeBreakdown,
    place: PlaceBreakdown,
}

/// Compute the fixed statistics over stillbirth babies in the accessible
/// location set.
///
/// `today` is injected by the caller rather than read from the clock, so
/// the aggregation is deterministic. The monthly series covers
/// `monthly_range` inclusive when given, grouped by calendar month in
/// ascending order; with no range it is empty. An empty location set
/// yields a zeroed snapshot and empty series.
pub fn aggregate(
    notifications: &[Notification],
    accessible: &HashSet<Uuid>,
    today: NaiveDate,
    monthly_range: Option<(NaiveDate, NaiveDate)>,
) -> StillbirthStats {
    let mut snapshot = TodaySnapshot::default();
    let mut months: BTreeMap<(i32, u32), MonthAccumulator> = BTreeMap::new();

    for notification in notifications {
        if !accessible.contains(&notification.location_id) {
            continue;
        }
        let date = notification.date_of_notification;

        for baby in &notification.babies {
            if !is_stillbirth(baby.outcome.as_deref()) {
                continue;
            }

            if date == today {
                snapshot.total += 1;
                *snapshot.sex.entry(baby.sex.to_string()).or_default() += 1;
                *snapshot
                    .outcome
                    .entry(normalized_outcome(baby.outcome.as_deref()))
                    .or_default() += 1;
                *snapshot
                    .place
                    .entry(notification.mother.place_of_delivery.to_string())
                    .or_default() += 1;
            }

            if let Some((start, end)) = monthly_range {
                if date < start || date > end {
                    continue;
                }
                let acc = months.entry((date.year(), date.month())).or_default();
                acc.total += 1;
                if let Some(weight) = baby.birth_weight {
                    acc.weight_sum += weight;
                    acc.weight_count += 1;
                }
                match baby.sex {
                    Sex::Male => acc.sex.male += 1,
                    Sex::Female => acc.sex.female += 1,
                    Sex::Unknown => {}
                }
                match normalized_outcome(baby.outcome.as_deref()).as_str() {
                    "fresh stillbirth" => acc.outcome.fresh += 1,
                    "macerated stillbirth" => acc.outcome.macerated += 1,
                    _ => {}
                }
                match notification.mother.place_of_delivery {
                    registry_common::PlaceOfDelivery::Facility => acc.place.facility += 1,
                    registry_common::PlaceOfDelivery::Home => acc.place.home += 1,
                    registry_common::PlaceOfDelivery::Unknown => {}
                }
            }
        }
    }

    let monthly = months
        .into_iter()
        .map(|((year, month), acc)| MonthBucket {
            month: format!("{year:04}-{month:02}"),
            total: acc.total,
            avg_weight: if acc.weight_count > 0 {
                Some(acc.weight_sum / acc.weight_count as f64)
            } else {
                None
            },
            sex: acc.sex,
            outcome: acc.outcome,
            place: acc.place,
        })
        .collect();

    StillbirthStats {
        today: snapshot,
        monthly,
    }
}

fn normalized_outcome(outcome: Option<&str>) -> String {
    match outcome {
        Some(text) => text.trim().to_lowercase(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_common::{Baby, Mother, PlaceOfDelivery};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn baby(sex: Sex, outcome: &str, weight: Option<f64>) -> Baby {
        Baby {
            id: Uuid::new_v4(),
            sex,
            outcome: Some(outcome.to_string()),
            birth_weight: weight,
        }
    }

    fn notification(
        d: NaiveDate,
        location_id: Uuid,
        place: PlaceOfDelivery,
        babies: Vec<Baby>,
    ) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            date_of_notification: d,
            location_id,
            mother: Mother {
                id: Uuid::new_v4(),
                place_of_delivery: place,
            },
            babies,
        }
    }

    #[test]
    fn today_buckets_sum_to_total() {
        let loc = Uuid::new_v4();
        let today = date(2024, 3, 14);
        let records = vec![
            notification(
                today,
                loc,
                PlaceOfDelivery::Facility,
                vec![
                    baby(Sex::Male, "Fresh Stillbirth", None),
                    baby(Sex::Female, "Macerated Stillbirth", None),
                ],
            ),
            notification(
                today,
                loc,
                PlaceOfDelivery::Home,
                vec![baby(Sex::Unknown, "stillbirth", None)],
            ),
        ];

        let stats = aggregate(&records, &HashSet::from([loc]), today, None);
        assert_eq!(stats.today.total, 3);
        assert_eq!(stats.today.sex.values().sum::<u64>(), stats.today.total);
        assert_eq!(stats.today.outcome.values().sum::<u64>(), stats.today.total);
        assert_eq!(stats.today.place.values().sum::<u64>(), stats.today.total);
    }

    #[test]
    fn today_outcome_buckets_by_normalized_full_text() {
        let loc = Uuid::new_v4();
        let today = date(2024, 3, 14);
        let records = vec![notification(
            today,
            loc,
            PlaceOfDelivery::Facility,
            vec![
                baby(Sex::Male, "Fresh Stillbirth", None),
                baby(Sex::Female, "fresh stillbirth", None),
                baby(Sex::Female, "suspected stillbirth", None),
            ],
        )];

        let stats = aggregate(&records, &HashSet::from([loc]), today, None);
        assert_eq!(stats.today.outcome["fresh stillbirth"], 2);
        assert_eq!(stats.today.outcome["suspected stillbirth"], 1);
    }

    #[test]
    fn non_today_records_do_not_touch_the_snapshot() {
        let loc = Uuid::new_v4();
        let records = vec![notification(
            date(2024, 3, 13),
            loc,
            PlaceOfDelivery::Facility,
            vec![baby(Sex::Male, "fresh stillbirth", None)],
        )];

        let stats = aggregate(&records, &HashSet::from([loc]), date(2024, 3, 14), None);
        assert_eq!(stats.today.total, 0);
        assert!(stats.today.sex.is_empty());
    }

    #[test]
    fn monthly_series_is_ordered_and_labels_are_unique() {
        let loc = Uuid::new_v4();
        let scope = HashSet::from([loc]);
        let records = vec![
            notification(
                date(2024, 5, 10),
                loc,
                PlaceOfDelivery::Home,
                vec![baby(Sex::Male, "fresh stillbirth", None)],
            ),
            notification(
                date(2024, 3, 2),
                loc,
                PlaceOfDelivery::Facility,
                vec![baby(Sex::Female, "macerated stillbirth", None)],
            ),
            notification(
                date(2024, 3, 28),
                loc,
                PlaceOfDelivery::Facility,
                vec![baby(Sex::Male, "fresh stillbirth", None)],
            ),
        ];

        let stats = aggregate(
            &records,
            &scope,
            date(2024, 1, 1),
            Some((date(2024, 1, 1), date(2024, 12, 31))),
        );

        let labels: Vec<&str> = stats.monthly.iter().map(|b| b.month.as_str()).collect();
        assert_eq!(labels, vec!["2024-03", "2024-05"]);
        assert_eq!(stats.monthly[0].total, 2);
        assert_eq!(stats.monthly[0].sex.male, 1);
        assert_eq!(stats.monthly[0].sex.female, 1);
        assert_eq!(stats.monthly[0].outcome.fresh, 1);
        assert_eq!(stats.monthly[0].outcome.macerated, 1);
        assert_eq!(stats.monthly[0].place.facility, 2);
        assert_eq!(stats.monthly[0].place.home, 0);
    }

    #[test]
    fn avg_weight_is_mean_of_recorded_weights_or_none() {
        let loc = Uuid::new_v4();
        let scope = HashSet::from([loc]);
        let range = Some((date(2024, 1, 1), date(2024, 12, 31)));

        let weighted = vec![notification(
            date(2024, 4, 1),
            loc,
            PlaceOfDelivery::Facility,
            vec![
                baby(Sex::Male, "fresh stillbirth", Some(2500.0)),
                baby(Sex::Female, "fresh stillbirth", Some(3000.0)),
                baby(Sex::Female, "fresh stillbirth", None),
            ],
        )];
        let stats = aggregate(&weighted, &scope, date(2024, 1, 1), range);
        assert_eq!(stats.monthly[0].avg_weight, Some(2750.0));

        let unweighted = vec![notification(
            date(2024, 4, 1),
            loc,
            PlaceOfDelivery::Facility,
            vec![baby(Sex::Male, "fresh stillbirth", None)],
        )];
        let stats = aggregate(&unweighted, &scope, date(2024, 1, 1), range);
        assert_eq!(stats.monthly[0].avg_weight, None);
    }

    #[test]
    fn monthly_counts_only_canonical_subtypes() {
        let loc = Uuid::new_v4();
        let scope = HashSet::from([loc]);
        let records = vec![notification(
            date(2024, 4, 1),
            loc,
            PlaceOfDelivery::Facility,
            vec![baby(Sex::Male, "suspected stillbirth", None)],
        )];

        let stats = aggregate(
            &records,
            &scope,
            date(2024, 1, 1),
            Some((date(2024, 1, 1), date(2024, 12, 31))),
        );
        // Counted in the bucket total, but in neither canonical subtype.
        assert_eq!(stats.monthly[0].total, 1);
        assert_eq!(stats.monthly[0].outcome.fresh, 0);
        assert_eq!(stats.monthly[0].outcome.macerated, 0);
    }

    #[test]
    fn empty_scope_yields_zeroed_stats() {
        let loc = Uuid::new_v4();
        let records = vec![notification(
            date(2024, 4, 1),
            loc,
            PlaceOfDelivery::Facility,
            vec![baby(Sex::Male, "fresh stillbirth", None)],
        )];

        let stats = aggregate(
            &records,
            &HashSet::new(),
            date(2024, 4, 1),
            Some((date(2024, 1, 1), date(2024, 12, 31))),
        );
        assert_eq!(stats.today.total, 0);
        assert!(stats.monthly.is_empty());
    }

    #[test]
    fn serialized_shape_uses_type_and_camel_case_keys() {
        let loc = Uuid::new_v4();
        let today = date(2024, 3, 14);
        let records = vec![notification(
            today,
            loc,
            PlaceOfDelivery::Facility,
            vec![baby(Sex::Male, "fresh stillbirth", Some(2400.0))],
        )];

        let stats = aggregate(
            &records,
            &HashSet::from([loc]),
            today,
            Some((date(2024, 3, 1), date(2024, 3, 31))),
        );
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["today"]["type"]["fresh stillbirth"], 1);
        assert_eq!(json["monthly"][0]["avgWeight"], 2400.0);
        assert_eq!(json["monthly"][0]["type"]["fresh"], 1);
    }
}
