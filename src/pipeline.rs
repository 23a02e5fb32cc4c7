//! Pipeline orchestration
//!
//! This module provides the public API for Vitalog. It runs one ingestion
//! pass over a patient's raw records, holds the resulting series for the
//! lifetime of a selection, and recomputes windows and summaries on every
//! navigation step.

use crate::config::EngineConfig;
use crate::encoder::{ReportEncoder, SummaryReport};
use crate::error::VitalsError;
use crate::normalizers::{
    dated_records, BloodPressureNormalizer, DatedRecord, ExerciseNormalizer, GlucoseNormalizer,
    MealNormalizer, MetricNormalizer, MoodNormalizer, PainNormalizer, ProfileNormalizer,
    SleepNormalizer,
};
use crate::schema::{Metric, RawRecord, PATIENT_ID_FIELD};
use crate::summary::{summarize_all, PatientSummary};
use crate::types::{
    BloodPressureReading, ExerciseDay, GlucoseReading, MealDay, MoodEntry, PainEntry,
    PatientProfile, SleepNight,
};
use crate::window::{DatasetBounds, Period, TimeWindow, WindowNavigator};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Counts from one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub records_total: usize,
    pub records_used: usize,
    /// Records dropped for lacking a valid date
    pub records_excluded: usize,
}

/// Normalized entries for one patient, produced once per selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSeries {
    pub profile: PatientProfile,
    pub glucose: Vec<GlucoseReading>,
    pub blood_pressure: Vec<BloodPressureReading>,
    pub exercise: Vec<ExerciseDay>,
    pub mood: Vec<MoodEntry>,
    pub pain: Vec<PainEntry>,
    pub sleep: Vec<SleepNight>,
    pub meals: Vec<MealDay>,
    pub bounds: DatasetBounds,
    pub stats: IngestStats,
}

impl PatientSeries {
    /// A series with no entries, bounded by the default coverage
    pub fn empty(patient_id: &str) -> Self {
        Self {
            profile: PatientProfile {
                id: patient_id.to_string(),
                name: None,
                age: None,
                gender: None,
                medications: Vec::new(),
                conditions: Default::default(),
            },
            glucose: Vec::new(),
            blood_pressure: Vec::new(),
            exercise: Vec::new(),
            mood: Vec::new(),
            pain: Vec::new(),
            sleep: Vec::new(),
            meals: Vec::new(),
            bounds: DatasetBounds::default(),
            stats: IngestStats::default(),
        }
    }

    pub fn entry_count(&self, metric: Metric) -> usize {
        match metric {
            Metric::Glucose => self.glucose.len(),
            Metric::BloodPressure => self.blood_pressure.len(),
            Metric::Exercise => self.exercise.len(),
            Metric::Mood => self.mood.len(),
            Metric::Pain => self.pain.len(),
            Metric::Sleep => self.sleep.len(),
            Metric::Meals => self.meals.len(),
        }
    }
}

fn run<N: MetricNormalizer>(
    normalizer: N,
    records: &[DatedRecord<'_>],
    config: &EngineConfig,
) -> Vec<N::Entry> {
    let entries = normalizer.normalize(records, config);
    debug!(
        metric = normalizer.metric().as_str(),
        entries = entries.len(),
        "Normalized metric"
    );
    entries
}

/// Patient identifier carried by the first record that has one
pub fn infer_patient_id(records: &[RawRecord]) -> Option<String> {
    records.iter().find_map(|r| r.text(PATIENT_ID_FIELD))
}

/// Run one ingestion pass over the ordered records of a single patient.
///
/// Pipeline stages:
/// 1. Date parsing - records without a valid `Date` are excluded
/// 2. Bounds - dataset coverage from the data or configuration
/// 3. Normalizers - one per metric, layout detected per record
/// 4. Profile - demographics, medications, conditions
///
/// # Example
/// ```ignore
/// let records = RecordAdapter::parse_csv_str(csv)?;
/// let series = normalize_records("P001", &records, &EngineConfig::default())?;
/// ```
pub fn normalize_records(
    patient_id: &str,
    records: &[RawRecord],
    config: &EngineConfig,
) -> Result<PatientSeries, VitalsError> {
    if records.is_empty() {
        return Err(VitalsError::EmptyRecords(patient_id.to_string()));
    }

    let dated = dated_records(records);
    if dated.is_empty() {
        return Err(VitalsError::DateParseError(format!(
            "none of the {} records for patient {patient_id} has a valid Date",
            records.len()
        )));
    }

    let data_bounds = DatasetBounds::from_dates(dated.iter().map(|d| d.date));
    let bounds = config.resolve_bounds(data_bounds);

    let series = PatientSeries {
        profile: ProfileNormalizer::normalize(patient_id, &dated, config),
        glucose: run(GlucoseNormalizer, &dated, config),
        blood_pressure: run(BloodPressureNormalizer, &dated, config),
        exercise: run(ExerciseNormalizer, &dated, config),
        mood: run(MoodNormalizer, &dated, config),
        pain: run(PainNormalizer, &dated, config),
        sleep: run(SleepNormalizer, &dated, config),
        meals: run(MealNormalizer, &dated, config),
        bounds,
        stats: IngestStats {
            records_total: records.len(),
            records_used: dated.len(),
            records_excluded: records.len() - dated.len(),
        },
    };

    info!(
        patient_id,
        records = series.stats.records_total,
        excluded = series.stats.records_excluded,
        glucose = series.glucose.len(),
        blood_pressure = series.blood_pressure.len(),
        exercise = series.exercise.len(),
        mood = series.mood.len(),
        pain = series.pain.len(),
        sleep = series.sleep.len(),
        meals = series.meals.len(),
        "Normalized patient records"
    );

    Ok(series)
}

/// Stateful view over one patient's series.
///
/// Holds the navigation state and recomputes windows and summaries on
/// demand; nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct PatientSession {
    series: PatientSeries,
    navigator: WindowNavigator,
}

impl PatientSession {
    /// Start a session at `reference_date`, or at the latest data date
    pub fn new(series: PatientSeries, reference_date: Option<NaiveDate>, period: Period) -> Self {
        let reference_date = reference_date.unwrap_or(series.bounds.end);
        let navigator = WindowNavigator::new(reference_date, period, series.bounds);
        Self { series, navigator }
    }

    /// Ingest records and open a session in one step
    pub fn from_records(
        patient_id: &str,
        records: &[RawRecord],
        config: &EngineConfig,
        reference_date: Option<NaiveDate>,
        period: Period,
    ) -> Result<Self, VitalsError> {
        let series = normalize_records(patient_id, records, config)?;
        Ok(Self::new(series, reference_date, period))
    }

    pub fn series(&self) -> &PatientSeries {
        &self.series
    }

    pub fn navigator(&self) -> &WindowNavigator {
        &self.navigator
    }

    pub fn go_to_previous(&mut self) {
        self.navigator.go_to_previous();
    }

    pub fn go_to_next(&mut self) {
        self.navigator.go_to_next();
    }

    pub fn set_period(&mut self, period: Period) {
        self.navigator.set_period(period);
    }

    pub fn date_range(&self) -> TimeWindow {
        self.navigator.date_range()
    }

    pub fn three_month_range(&self) -> TimeWindow {
        self.navigator.three_month_range()
    }

    /// Summaries for the selected week or month
    pub fn summary(&self) -> PatientSummary {
        summarize_all(&self.series, &self.date_range())
    }

    /// Summaries for the rolling three-month window
    pub fn three_month_summary(&self) -> PatientSummary {
        summarize_all(&self.series, &self.three_month_range())
    }

    /// Both summaries wrapped with producer and provenance metadata
    pub fn report(&self, encoder: &ReportEncoder) -> SummaryReport {
        encoder.encode(&self.series, self.summary(), self.three_month_summary())
    }
}

/// Ticket identifying one patient selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionTicket(u64);

impl SelectionTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Discards results of selections that were superseded while in flight.
///
/// Each new selection takes a ticket; only the result carrying the most
/// recent ticket is accepted.
#[derive(Debug, Default)]
pub struct SelectionGuard {
    latest: AtomicU64,
}

impl SelectionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new selection, superseding any earlier one
    pub fn begin(&self) -> SelectionTicket {
        SelectionTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: SelectionTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Pass `result` through if `ticket` is still the latest selection
    pub fn accept<T>(&self, ticket: SelectionTicket, result: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(ticket = ticket.0, "Discarding superseded selection result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoundsSource;
    use crate::schema::RecordAdapter;
    use crate::window::WindowKind;
    use std::sync::Arc;

    const PATIENT_CSV: &str = "\
Patient_ID,Date,Mood,Sleep_Quality,Sleep_Quality_Code,Sleep_Hours,Exercise_Type_1,Exercise_Minutes_1,Glucose_1,Glucose_Measurement_Type_1,Glucose_Range_1,Glucose_Time_1,Systolic_1,Diastolic_1,BP_Time_1,Medication_Names,Medication_Dosages,Chronic_Conditions
P001,2024-07-07,happy,Fairly good,1,6.0,Brisk Walking,30,5.5,Pre meal,In Range,08:30,128,82,07:45,Metformin; Lisinopril,500mg; 10mg,Type 2 Diabetes
P001,2024-07-08,sad,Very good,0,8.0,,,9.2,2-hour post meal,In Range,13:30,135,85,08:00,Metformin; Lisinopril,500mg; 10mg,Hypertension
P001,bad-date,happy,,,,,,,,,,,,,,,
P001,2024-08-20,angry,Very bad,3,4.5,Swimming,45,11.2,2-hour post meal,Above Range,19:00,150,95,20:00,Metformin; Lisinopril,500mg; 10mg,Hypertension
";

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_series() -> PatientSeries {
        let records = RecordAdapter::parse_csv_str(PATIENT_CSV).unwrap();
        normalize_records("P001", &records, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_normalize_records() {
        let series = make_series();

        assert_eq!(series.stats.records_total, 4);
        assert_eq!(series.stats.records_excluded, 1);
        assert_eq!(series.glucose.len(), 3);
        assert_eq!(series.blood_pressure.len(), 3);
        assert_eq!(series.exercise.len(), 2);
        assert_eq!(series.mood.len(), 3);
        assert_eq!(series.sleep.len(), 3);
        assert_eq!(series.profile.medications.len(), 2);
        assert_eq!(series.profile.conditions.len(), 2);
        assert_eq!(series.bounds.start, make_date(2024, 7, 7));
        assert_eq!(series.bounds.end, make_date(2024, 8, 20));
        assert_eq!(series.entry_count(Metric::Glucose), 3);
    }

    #[test]
    fn test_empty_records_rejected() {
        let result = normalize_records("P001", &[], &EngineConfig::default());
        assert!(matches!(result, Err(VitalsError::EmptyRecords(_))));
    }

    #[test]
    fn test_all_dates_invalid_rejected() {
        let records = vec![RawRecord::new().with("Date", "yesterday").with("Mood", "happy")];
        let result = normalize_records("P001", &records, &EngineConfig::default());
        assert!(matches!(result, Err(VitalsError::DateParseError(_))));
    }

    #[test]
    fn test_fixed_bounds_from_config() {
        let records = RecordAdapter::parse_csv_str(PATIENT_CSV).unwrap();
        let config = EngineConfig {
            bounds: BoundsSource::Fixed {
                start: make_date(2024, 7, 1),
                end: make_date(2025, 7, 31),
            },
            ..Default::default()
        };
        let series = normalize_records("P001", &records, &config).unwrap();
        assert_eq!(series.bounds, DatasetBounds::default());
    }

    #[test]
    fn test_session_week_summary() {
        // 2024-07-07 is a Sunday
        let session = PatientSession::new(make_series(), Some(make_date(2024, 7, 10)), Period::Week);
        let summary = session.summary();

        assert_eq!(summary.window.kind, WindowKind::Week);
        let sleep = summary.sleep.unwrap();
        assert_eq!(sleep.mean_hours, 7.0);
        assert_eq!(sleep.stats.days_tracked, 2);
        assert_eq!(sleep.quality_score, 0.5);
        assert_eq!(sleep.quality_label.as_str(), "Fairly good");

        let exercise = summary.exercise.unwrap();
        assert_eq!(exercise.total_minutes, 30.0);
        assert_eq!(exercise.minutes_by_bucket.walking, 30.0);
        assert!(summary.pain.is_none());
    }

    #[test]
    fn test_session_navigation() {
        let mut session =
            PatientSession::new(make_series(), Some(make_date(2024, 7, 10)), Period::Week);
        session.go_to_next();
        assert!(session.summary().is_empty());

        session.set_period(Period::Month);
        session.go_to_next();
        let august = session.summary();
        assert_eq!(august.window.kind, WindowKind::Month);
        assert_eq!(august.mood.unwrap().stats.count, 1);

        let rolling = session.three_month_summary();
        assert_eq!(rolling.window.start, make_date(2024, 7, 7).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(rolling.glucose.unwrap().stats.count, 2);
    }

    #[test]
    fn test_session_defaults_to_latest_date() {
        let session = PatientSession::new(make_series(), None, Period::Month);
        assert_eq!(session.navigator().reference_date(), make_date(2024, 8, 20));
    }

    #[test]
    fn test_infer_patient_id() {
        let records = RecordAdapter::parse_csv_str(PATIENT_CSV).unwrap();
        assert_eq!(infer_patient_id(&records).as_deref(), Some("P001"));
        assert_eq!(infer_patient_id(&[]), None);
    }

    #[test]
    fn test_selection_guard_discards_superseded() {
        let guard = SelectionGuard::new();
        let first = guard.begin();
        let second = guard.begin();

        assert_eq!(guard.accept(first, "old"), None);
        assert_eq!(guard.accept(second, "new"), Some("new"));
        assert!(second > first);
    }

    #[test]
    fn test_selection_guard_across_threads() {
        let guard = Arc::new(SelectionGuard::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                std::thread::spawn(move || guard.begin())
            })
            .collect();
        let tickets: Vec<SelectionTicket> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        let accepted: Vec<_> = tickets
            .iter()
            .filter_map(|t| guard.accept(*t, t.id()))
            .collect();
        assert_eq!(accepted, vec![8]);
    }
}
