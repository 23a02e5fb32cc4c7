//! Exercise normalizer
//!
//! Activities are dispatched into one bucket each and accumulated per day.
//! Days that end with zero total minutes are not emitted.

use crate::config::EngineConfig;
use crate::schema::{detect_layout, slot_key, Layout, Metric, RawRecord};
use crate::types::{ExerciseBucket, ExerciseDay};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

use super::{DatedRecord, MetricNormalizer};

/// Daily exercise minutes per bucket
pub struct ExerciseNormalizer;

impl MetricNormalizer for ExerciseNormalizer {
    type Entry = ExerciseDay;

    fn metric(&self) -> Metric {
        Metric::Exercise
    }

    fn normalize(&self, records: &[DatedRecord<'_>], _config: &EngineConfig) -> Vec<ExerciseDay> {
        let mut days: BTreeMap<NaiveDate, ExerciseDay> = BTreeMap::new();

        for dated in records {
            let activities: Vec<(String, String)> =
                match detect_layout(dated.record, Metric::Exercise) {
                    Layout::Multi => (1..=Metric::Exercise.slot_count())
                        .map(|n| {
                            (
                                slot_key("Exercise_Type", n),
                                slot_key("Exercise_Minutes", n),
                            )
                        })
                        .collect(),
                    Layout::Single => {
                        vec![("Exercise_Type".into(), "Exercise_Minutes".into())]
                    }
                    Layout::Absent => continue,
                };

            for (type_key, minutes_key) in &activities {
                if let Some((bucket, minutes)) =
                    parse_activity(dated.record, type_key, minutes_key)
                {
                    days.entry(dated.date)
                        .or_insert_with(|| ExerciseDay::new(dated.date))
                        .add(bucket, minutes);
                }
            }
        }

        days.into_values()
            .filter(|day| day.total_minutes > 0.0)
            .collect()
    }
}

fn parse_activity(
    record: &RawRecord,
    type_key: &str,
    minutes_key: &str,
) -> Option<(ExerciseBucket, f64)> {
    let activity = record.text(type_key);
    let minutes = record.number(minutes_key);

    match (activity, minutes) {
        (Some(activity), Some(minutes)) if minutes > 0.0 => {
            Some((ExerciseBucket::classify(&activity), minutes))
        }
        (None, None) => None,
        (activity, minutes) => {
            debug!(
                column = type_key,
                ?activity,
                ?minutes,
                "Dropping exercise slot: needs a type and positive minutes"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::dated_records;
    use crate::normalizers::test_support::make_record;

    fn normalize(records: &[RawRecord]) -> Vec<ExerciseDay> {
        ExerciseNormalizer.normalize(&dated_records(records), &EngineConfig::default())
    }

    #[test]
    fn test_brisk_walking_lands_in_walking() {
        let records = vec![make_record("2024-07-01")
            .with("Exercise_Type_1", "Brisk Walking")
            .with("Exercise_Minutes_1", 30.0)];

        let days = normalize(&records);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].minutes.walking, 30.0);
        assert_eq!(days[0].total_minutes, 30.0);
    }

    #[test]
    fn test_slots_accumulate_per_day() {
        let records = vec![
            make_record("2024-07-02")
                .with("Exercise_Type_1", "Swimming")
                .with("Exercise_Minutes_1", 20.0)
                .with("Exercise_Type_2", "Strength training")
                .with("Exercise_Minutes_2", 15.0)
                .with("Exercise_Type_3", "Yoga")
                .with("Exercise_Minutes_3", 0.0)
                .with("Exercise_Type_4", "")
                .with("Exercise_Minutes_4", 10.0),
            make_record("2024-07-01")
                .with("Exercise_Type_1", "Cycling")
                .with("Exercise_Minutes_1", 25.0),
        ];

        let days = normalize(&records);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert_eq!(days[0].minutes.biking, 25.0);
        assert_eq!(days[1].minutes.swimming, 20.0);
        assert_eq!(days[1].minutes.muscle_strengthening, 15.0);
        assert_eq!(days[1].minutes.other, 0.0);
        for day in &days {
            assert_eq!(day.total_minutes, day.minutes.sum());
        }
    }

    #[test]
    fn test_zero_total_days_are_excluded() {
        let records = vec![
            make_record("2024-07-01")
                .with("Exercise_Type", "Walking")
                .with("Exercise_Minutes", 0.0),
            make_record("2024-07-02")
                .with("Exercise_Type", "Balance drills")
                .with("Exercise_Minutes", "12"),
        ];

        let days = normalize(&records);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].minutes.balance, 12.0);
    }
}
