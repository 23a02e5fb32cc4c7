//! Error types for Vitalog

use thiserror::Error;

/// Errors that fail a whole ingestion pass.
///
/// Field-level problems (an unparseable number, a malformed time, an
/// unrecognized label) never surface here; the affected slot is dropped.
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("No records supplied for patient {0}")]
    EmptyRecords(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Failed to parse record input: {0}")]
    ParseError(String),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
