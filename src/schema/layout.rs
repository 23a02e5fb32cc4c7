//! Record layout detection
//!
//! Each metric is inspected independently: one dataset may log glucose with
//! numbered slots while blood pressure stays in a single column.

use serde::{Deserialize, Serialize};

use super::raw_record::RawRecord;

/// Metrics tracked per patient-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Glucose,
    BloodPressure,
    Exercise,
    Mood,
    Pain,
    Sleep,
    Meals,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Glucose,
        Metric::BloodPressure,
        Metric::Exercise,
        Metric::Mood,
        Metric::Pain,
        Metric::Sleep,
        Metric::Meals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Glucose => "glucose",
            Metric::BloodPressure => "blood_pressure",
            Metric::Exercise => "exercise",
            Metric::Mood => "mood",
            Metric::Pain => "pain",
            Metric::Sleep => "sleep",
            Metric::Meals => "meals",
        }
    }

    /// Number of numbered slots in the multi-reading layout
    pub fn slot_count(&self) -> usize {
        match self {
            Metric::Glucose | Metric::BloodPressure => 4,
            Metric::Exercise => 5,
            _ => 1,
        }
    }

    /// Columns whose `_1` form marks the multi-reading layout
    fn multi_markers(&self) -> &'static [&'static str] {
        match self {
            Metric::Glucose => &["Glucose"],
            Metric::BloodPressure => &["Systolic"],
            Metric::Exercise => &["Exercise_Type", "Exercise_Minutes"],
            _ => &[],
        }
    }

    /// Columns that carry the metric in the single-value layout
    fn single_markers(&self) -> &'static [&'static str] {
        match self {
            Metric::Glucose => &["Glucose"],
            Metric::BloodPressure => &["Systolic", "Diastolic"],
            Metric::Exercise => &["Exercise_Type", "Exercise_Minutes"],
            Metric::Mood => &["Mood"],
            Metric::Pain => &["Pain_Location", "Pain_Level"],
            Metric::Sleep => &["Sleep_Hours", "Sleep_Quality"],
            Metric::Meals => &[
                "Breakfast_Time",
                "Lunch_Time",
                "Dinner_Time",
                "Late_Night_Snack_Time",
            ],
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase().replace(['-', ' '], "_");
        Metric::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lowered || (lowered == "bp" && *m == Metric::BloodPressure))
            .ok_or_else(|| format!("unknown metric '{s}'"))
    }
}

/// How a record stores one metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// One value per day, no explicit time
    Single,
    /// Up to N numbered values, each with its own time
    Multi,
    /// Neither layout's columns are present: zero readings, not an error
    Absent,
}

/// Build the numbered column name for a slot (`Glucose_Time` + 2 → `Glucose_Time_2`)
pub fn slot_key(base: &str, slot: usize) -> String {
    format!("{base}_{slot}")
}

/// Decide which layout `record` uses for `metric`
pub fn detect_layout(record: &RawRecord, metric: Metric) -> Layout {
    if metric
        .multi_markers()
        .iter()
        .any(|base| record.has(&slot_key(base, 1)))
    {
        return Layout::Multi;
    }
    if metric.single_markers().iter().any(|key| record.has(key)) {
        return Layout::Single;
    }
    Layout::Absent
}
