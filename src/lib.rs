//! Vitalog - Normalization and windowed aggregation for daily patient health logs
//!
//! Vitalog turns loosely typed per-day patient records into typed health series
//! and summarizes them over navigable calendar windows through a deterministic
//! pipeline: record ingestion → per-metric normalization → window selection
//! → aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Ingestion**: CSV, JSON and NDJSON records with layout detection ([`schema`])
//! - **Normalization**: glucose, blood pressure, exercise, mood, pain, sleep,
//!   meals and the patient profile ([`normalizers`])
//! - **Windows**: Sunday-start weeks, calendar months and a clamped rolling
//!   three-month range ([`window`])
//! - **Summaries**: generic aggregation plus per-metric summaries ([`aggregate`], [`summary`])

pub mod aggregate;
pub mod config;
pub mod encoder;
pub mod error;
pub mod normalizers;
pub mod pipeline;
pub mod schema;
pub mod summary;
pub mod types;
pub mod window;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::EngineConfig;
pub use encoder::{ReportEncoder, SummaryReport};
pub use error::VitalsError;
pub use pipeline::{normalize_records, PatientSeries, PatientSession, SelectionGuard};
pub use summary::{summarize_all, PatientSummary};
pub use window::{DatasetBounds, Period, TimeWindow, WindowNavigator};

// Schema exports
pub use schema::{RawRecord, RecordAdapter};

/// Vitalog version embedded in all reports
pub const VITALOG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "vitalog";
