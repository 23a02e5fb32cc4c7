//! Raw record schema
//!
//! This module defines the untyped patient-day record, the field-level
//! parsers, per-metric layout detection, and ingestion from tabular and JSON
//! inputs.

mod adapter;
pub mod field;
mod layout;
mod raw_record;

pub use adapter::*;
pub use layout::*;
pub use raw_record::*;
