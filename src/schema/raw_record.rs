//! Raw patient-day record
//!
//! A flat, untyped mapping from column name to value. Two layouts coexist in
//! the wild for repeated same-day measurements: a bare `<Field>` column, or
//! numbered `<Field>_<n>` columns with a matching `<Field>_Time_<n>`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field::{parse_date, parse_number};

/// Column holding the record's calendar date
pub const DATE_FIELD: &str = "Date";

/// Column holding the patient identifier in combined exports
pub const PATIENT_ID_FIELD: &str = "Patient_ID";

/// A single raw cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Empty,
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl FieldValue {
    /// Numeric view; text is parsed leniently
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => parse_number(s),
            FieldValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Textual view, trimmed. Empty text is `None`.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            FieldValue::Empty => return None,
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Number(n) if !n.is_finite() => return None,
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", *n as i64)
            }
            FieldValue::Number(n) => n.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_text().is_none()
    }
}

/// One patient-day of raw fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used heavily by tests and in-memory hosts
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// True if the column exists at all, even when its cell is blank
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Trimmed, non-empty text for a column
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(FieldValue::as_text)
    }

    /// Finite number for a column
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(FieldValue::as_f64)
    }

    /// Parsed record date, if present and well formed
    pub fn date(&self) -> Option<NaiveDate> {
        self.text(DATE_FIELD).and_then(|d| parse_date(&d))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl FromIterator<(String, FieldValue)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        RawRecord {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_mixed_values() {
        let json = r#"{
            "Date": "2024-07-01",
            "Glucose_1": 5.5,
            "Glucose_Time_1": "08:30",
            "Breakfast_Protein": true,
            "Mood": null
        }"#;

        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.date(), NaiveDate::from_ymd_opt(2024, 7, 1));
        assert_eq!(record.number("Glucose_1"), Some(5.5));
        assert_eq!(record.text("Glucose_Time_1").as_deref(), Some("08:30"));
        assert_eq!(record.number("Breakfast_Protein"), Some(1.0));
        assert!(record.has("Mood"));
        assert_eq!(record.text("Mood"), None);
    }

    #[test]
    fn test_number_text_rendering() {
        let record = RawRecord::new()
            .with("Pain_Level", 7.0)
            .with("Sleep_Hours", 6.5)
            .with("Blank", "   ");

        assert_eq!(record.text("Pain_Level").as_deref(), Some("7"));
        assert_eq!(record.text("Sleep_Hours").as_deref(), Some("6.5"));
        assert_eq!(record.text("Blank"), None);
        assert_eq!(record.number("Missing"), None);
    }

    #[test]
    fn test_missing_or_bad_date() {
        let record = RawRecord::new().with("Date", "not a date");
        assert_eq!(record.date(), None);
        assert_eq!(RawRecord::new().date(), None);
    }
}
