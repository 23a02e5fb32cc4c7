//! Glucose normalizer
//!
//! Multi layout: `Glucose_n`, `Glucose_Time_n`, `Glucose_Range_n` and
//! `Glucose_Measurement_Type_n` for n in 1..=4, values in mmol/L.
//! Single layout: a bare `Glucose` column in mg/dL with no time.

use crate::config::EngineConfig;
use crate::schema::field::parse_time;
use crate::schema::{detect_layout, slot_key, Layout, Metric};
use crate::types::{GlucoseRange, GlucoseReading, MealContext};
use tracing::debug;

use super::{DatedRecord, MetricNormalizer};

/// Glucose readings from either layout
pub struct GlucoseNormalizer;

impl MetricNormalizer for GlucoseNormalizer {
    type Entry = GlucoseReading;

    fn metric(&self) -> Metric {
        Metric::Glucose
    }

    fn normalize(&self, records: &[DatedRecord<'_>], config: &EngineConfig) -> Vec<GlucoseReading> {
        let mut readings = Vec::new();

        for dated in records {
            match detect_layout(dated.record, Metric::Glucose) {
                Layout::Multi => {
                    for slot in 1..=Metric::Glucose.slot_count() {
                        if let Some(reading) = parse_slot(dated, slot) {
                            readings.push(reading);
                        }
                    }
                }
                Layout::Single => readings.extend(parse_single(dated, config)),
                Layout::Absent => {}
            }
        }

        readings.sort_by_key(|r| r.timestamp);
        readings
    }
}

fn parse_slot(dated: &DatedRecord<'_>, slot: usize) -> Option<GlucoseReading> {
    let record = dated.record;
    let value_key = slot_key("Glucose", slot);
    let raw_value = record.get(&value_key).filter(|v| !v.is_empty())?;

    let Some(value) = raw_value.as_f64().filter(|v| *v > 0.0) else {
        debug!(date = %dated.date, slot, "Dropping glucose slot: value not positive");
        return None;
    };

    let time = record
        .text(&slot_key("Glucose_Time", slot))
        .and_then(|t| parse_time(&t));
    let Some(time) = time else {
        debug!(date = %dated.date, slot, "Dropping glucose slot: missing or invalid time");
        return None;
    };

    let meal_context = record
        .text(&slot_key("Glucose_Measurement_Type", slot))
        .map_or(MealContext::Other, |t| MealContext::parse(&t));

    let (range_label, range) = match record.text(&slot_key("Glucose_Range", slot)) {
        Some(label) => {
            let range = GlucoseRange::parse(&label)
                .unwrap_or_else(|| GlucoseRange::from_mmol_l(value, meal_context));
            (label, range)
        }
        None => {
            let range = GlucoseRange::from_mmol_l(value, meal_context);
            (range.as_str().to_string(), range)
        }
    };

    Some(GlucoseReading {
        timestamp: dated.date.and_time(time),
        value,
        range_label,
        range,
        meal_context,
        time_known: true,
    })
}

fn parse_single(dated: &DatedRecord<'_>, config: &EngineConfig) -> Option<GlucoseReading> {
    let record = dated.record;
    let value = record.number("Glucose").filter(|v| *v > 0.0)?;

    let (range_label, range) = match record.text("Glucose_Range") {
        Some(label) => {
            let range = GlucoseRange::parse(&label).unwrap_or_else(|| GlucoseRange::from_mg_dl(value));
            (label, range)
        }
        None => {
            let range = GlucoseRange::from_mg_dl(value);
            (range.as_str().to_string(), range)
        }
    };

    let meal_context = record
        .text("Glucose_Measurement_Type")
        .map_or(MealContext::Other, |t| MealContext::parse(&t));

    Some(GlucoseReading {
        timestamp: dated.date.and_time(config.unknown_time),
        value,
        range_label,
        range,
        meal_context,
        time_known: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::dated_records;
    use crate::normalizers::test_support::make_record;
    use chrono::{NaiveDate, NaiveTime};

    fn normalize(records: &[crate::schema::RawRecord]) -> Vec<GlucoseReading> {
        GlucoseNormalizer.normalize(&dated_records(records), &EngineConfig::default())
    }

    #[test]
    fn test_multi_slot_reading() {
        let records = vec![make_record("2024-07-01")
            .with("Glucose_1", 5.5)
            .with("Glucose_Time_1", "08:30")
            .with("Glucose_Range_1", "In Range")];

        let readings = normalize(&records);
        assert_eq!(readings.len(), 1);
        let reading = &readings[0];
        assert_eq!(reading.value, 5.5);
        assert_eq!(reading.range_label, "In Range");
        assert_eq!(reading.range, GlucoseRange::InRange);
        assert!(reading.time_known);
        assert_eq!(
            reading.timestamp,
            NaiveDate::from_ymd_opt(2024, 7, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_bad_slots_are_dropped_individually() {
        let records = vec![make_record("2024-07-01")
            .with("Glucose_1", 5.5)
            .with("Glucose_Time_1", "25:00")
            .with("Glucose_2", 0.0)
            .with("Glucose_Time_2", "12:00")
            .with("Glucose_3", "abc")
            .with("Glucose_Time_3", "13:00")
            .with("Glucose_4", 9.1)
            .with("Glucose_Time_4", "19:15")
            .with("Glucose_Measurement_Type_4", "2-hour post meal")];

        let readings = normalize(&records);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].value, 9.1);
        assert_eq!(readings[0].meal_context, MealContext::PostMeal);
        assert_eq!(readings[0].range, GlucoseRange::InRange);
        assert_eq!(readings[0].range_label, "in range");
    }

    #[test]
    fn test_range_derived_from_meal_context() {
        let records = vec![make_record("2024-07-01")
            .with("Glucose_1", 7.8)
            .with("Glucose_Time_1", "07:00")
            .with("Glucose_Measurement_Type_1", "Pre meal")];
        let readings = normalize(&records);
        assert_eq!(readings[0].range, GlucoseRange::Above);
    }

    #[test]
    fn test_single_layout_uses_fixed_time() {
        let records = vec![
            make_record("2024-07-02").with("Glucose", 190.0),
            make_record("2024-07-01").with("Glucose", 65.0),
            make_record("2024-07-03").with("Glucose", ""),
        ];
        let readings = normalize(&records);

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].range, GlucoseRange::Below);
        assert_eq!(readings[1].range, GlucoseRange::Above);
        assert!(readings.iter().all(|r| !r.time_known));
        assert_eq!(
            readings[0].timestamp.time(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_absent_layout_yields_nothing() {
        let records = vec![make_record("2024-07-01").with("Mood", "happy")];
        assert!(normalize(&records).is_empty());
    }
}
