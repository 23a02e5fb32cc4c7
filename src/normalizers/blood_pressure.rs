//! Blood pressure normalizer

use crate::config::EngineConfig;
use crate::schema::field::parse_time;
use crate::schema::{detect_layout, slot_key, Layout, Metric, RawRecord};
use crate::types::{BloodPressureReading, BpRisk};
use chrono::NaiveTime;
use tracing::debug;

use super::{DatedRecord, MetricNormalizer};

/// Column names for one reading, numbered or bare
struct BpColumns {
    systolic: String,
    diastolic: String,
    time: String,
    risk: String,
    systolic_type: String,
    diastolic_type: String,
}

impl BpColumns {
    fn slot(n: usize) -> Self {
        Self {
            systolic: slot_key("Systolic", n),
            diastolic: slot_key("Diastolic", n),
            time: slot_key("BP_Time", n),
            risk: slot_key("BP_Risk", n),
            systolic_type: slot_key("Systolic_Type", n),
            diastolic_type: slot_key("Diastolic_Type", n),
        }
    }

    fn single() -> Self {
        Self {
            systolic: "Systolic".into(),
            diastolic: "Diastolic".into(),
            time: "BP_Time".into(),
            risk: "BP_Risk".into(),
            systolic_type: "Systolic_Type".into(),
            diastolic_type: "Diastolic_Type".into(),
        }
    }
}

/// Blood pressure readings from either layout
pub struct BloodPressureNormalizer;

impl MetricNormalizer for BloodPressureNormalizer {
    type Entry = BloodPressureReading;

    fn metric(&self) -> Metric {
        Metric::BloodPressure
    }

    fn normalize(
        &self,
        records: &[DatedRecord<'_>],
        config: &EngineConfig,
    ) -> Vec<BloodPressureReading> {
        let mut readings = Vec::new();

        for dated in records {
            match detect_layout(dated.record, Metric::BloodPressure) {
                Layout::Multi => {
                    for slot in 1..=Metric::BloodPressure.slot_count() {
                        let columns = BpColumns::slot(slot);
                        if let Some(reading) = parse_reading(dated, &columns, None) {
                            readings.push(reading);
                        }
                    }
                }
                Layout::Single => {
                    let columns = BpColumns::single();
                    readings.extend(parse_reading(dated, &columns, Some(config.unknown_time)));
                }
                Layout::Absent => {}
            }
        }

        readings.sort_by_key(|r| r.timestamp);
        readings
    }
}

fn positive(record: &RawRecord, key: &str) -> Option<f64> {
    record.number(key).filter(|v| *v > 0.0)
}

/// Parse one reading. Numbered slots need their own time; the bare layout
/// falls back to `fallback_time` when no time column is present.
fn parse_reading(
    dated: &DatedRecord<'_>,
    columns: &BpColumns,
    fallback_time: Option<NaiveTime>,
) -> Option<BloodPressureReading> {
    let record = dated.record;
    if record.text(&columns.systolic).is_none() && record.text(&columns.diastolic).is_none() {
        return None;
    }

    let (Some(systolic), Some(diastolic)) = (
        positive(record, &columns.systolic),
        positive(record, &columns.diastolic),
    ) else {
        debug!(
            date = %dated.date,
            column = %columns.systolic,
            "Dropping blood pressure reading: invalid values"
        );
        return None;
    };

    let parsed_time = record.text(&columns.time).and_then(|t| parse_time(&t));
    let (time, time_known) = match (parsed_time, fallback_time) {
        (Some(t), _) => (t, true),
        (None, Some(t)) => (t, false),
        (None, None) => {
            debug!(
                date = %dated.date,
                column = %columns.time,
                "Dropping blood pressure reading: missing or invalid time"
            );
            return None;
        }
    };

    let supplied = record.text(&columns.risk).and_then(|r| BpRisk::parse(&r));
    let risk = supplied.unwrap_or_else(|| BpRisk::classify(systolic, diastolic));

    Some(BloodPressureReading {
        timestamp: dated.date.and_time(time),
        systolic,
        diastolic,
        risk,
        risk_supplied: supplied.is_some(),
        systolic_type: record.text(&columns.systolic_type),
        diastolic_type: record.text(&columns.diastolic_type),
        time_known,
    })
}
