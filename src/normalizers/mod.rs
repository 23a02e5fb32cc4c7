//! Per-metric normalizers
//!
//! Each normalizer reads the dated records of one patient and emits typed
//! entries for its metric. Layout is detected per record, and a malformed
//! slot is dropped on its own without affecting its neighbours.

mod blood_pressure;
mod exercise;
mod glucose;
mod meals;
mod mood;
mod pain;
mod profile;
mod sleep;

pub use blood_pressure::BloodPressureNormalizer;
pub use exercise::ExerciseNormalizer;
pub use glucose::GlucoseNormalizer;
pub use meals::MealNormalizer;
pub use mood::MoodNormalizer;
pub use pain::PainNormalizer;
pub use profile::ProfileNormalizer;
pub use sleep::SleepNormalizer;

use crate::config::EngineConfig;
use crate::schema::{Metric, RawRecord, DATE_FIELD};
use chrono::NaiveDate;
use tracing::warn;

/// A raw record whose `Date` has already been parsed
#[derive(Debug, Clone, Copy)]
pub struct DatedRecord<'a> {
    pub date: NaiveDate,
    pub record: &'a RawRecord,
}

/// Trait for per-metric normalizers
pub trait MetricNormalizer {
    type Entry;

    fn metric(&self) -> Metric;

    /// Convert dated records into typed entries, in chronological order
    fn normalize(&self, records: &[DatedRecord<'_>], config: &EngineConfig) -> Vec<Self::Entry>;
}

/// Attach parsed dates to records. Records without a usable date are
/// excluded and logged.
pub fn dated_records(records: &[RawRecord]) -> Vec<DatedRecord<'_>> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| match record.date() {
            Some(date) => Some(DatedRecord { date, record }),
            None => {
                warn!(
                    index,
                    raw = ?record.text(DATE_FIELD),
                    "Excluding record without a valid date"
                );
                None
            }
        })
        .collect()
}

/// Split a parallel semicolon list, keeping positions so lists can be zipped
pub(crate) fn split_parallel(raw: Option<String>) -> Vec<String> {
    match raw {
        Some(text) => text.split(';').map(|s| s.trim().to_string()).collect(),
        None => Vec::new(),
    }
}
