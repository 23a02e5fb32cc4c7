//! Record ingestion
//!
//! Turns tabular exports (CSV, one row per patient-day) or JSON documents
//! into ordered `RawRecord` lists for a single patient.

use crate::error::VitalsError;
use crate::schema::field::parse_date;
use crate::schema::raw_record::{FieldValue, RawRecord, DATE_FIELD, PATIENT_ID_FIELD};
use std::io::Read;

/// Adapter for reading raw records from the supported input formats
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse CSV with a header row. Every cell is kept as text; blank cells
    /// become `FieldValue::Empty`.
    pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>, VitalsError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut records = Vec::new();

        for row in csv_reader.records() {
            let row = row?;
            let record: RawRecord = headers
                .iter()
                .zip(row.iter())
                .map(|(key, cell)| {
                    let value = if cell.is_empty() {
                        FieldValue::Empty
                    } else {
                        FieldValue::Text(cell.to_string())
                    };
                    (key.to_string(), value)
                })
                .collect();
            records.push(record);
        }

        Ok(records)
    }

    /// Parse CSV held in memory
    pub fn parse_csv_str(data: &str) -> Result<Vec<RawRecord>, VitalsError> {
        Self::parse_csv(data.as_bytes())
    }

    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<RawRecord>, VitalsError> {
        let records: Vec<RawRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record object per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawRecord>, VitalsError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(VitalsError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Keep only the rows of one patient from a combined export.
    ///
    /// Rows without a `Patient_ID` column are kept, so single-patient files
    /// pass through unchanged.
    pub fn select_patient(records: Vec<RawRecord>, patient_id: &str) -> Vec<RawRecord> {
        records
            .into_iter()
            .filter(|r| match r.text(PATIENT_ID_FIELD) {
                Some(id) => id == patient_id,
                None => true,
            })
            .collect()
    }

    /// Report records that will be excluded from normalization
    pub fn validate_records(records: &[RawRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let problem = match record.text(DATE_FIELD) {
                    None => RecordProblem::MissingDate,
                    Some(raw) if parse_date(&raw).is_none() => RecordProblem::InvalidDate(raw),
                    Some(_) => return None,
                };
                Some(ValidationResult { index, problem })
            })
            .collect()
    }
}

/// A record-level problem found during validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordProblem {
    #[error("record has no Date field")]
    MissingDate,

    #[error("record date '{0}' is not a valid calendar date")]
    InvalidDate(String),
}

/// Result of record validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub index: usize,
    pub problem: RecordProblem,
}
