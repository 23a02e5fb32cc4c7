//! Report encoding
//!
//! Wraps the period and rolling three-month summaries of one patient with
//! producer and provenance metadata, ready for a presentation host.

use crate::error::VitalsError;
use crate::pipeline::PatientSeries;
use crate::schema::Metric;
use crate::summary::PatientSummary;
use crate::{PRODUCER_NAME, VITALOG_VERSION};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Current report schema version
pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub patient_id: String,
    pub records_total: usize,
    pub records_excluded: usize,
    pub dataset_start: NaiveDate,
    pub dataset_end: NaiveDate,
    /// Normalized entries per metric over the whole dataset
    pub entry_counts: BTreeMap<String, usize>,
    pub computed_at_utc: String,
}

/// Summary report for one patient and one navigation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub period: PatientSummary,
    pub three_month: PatientSummary,
}

/// Report encoder
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn encode(
        &self,
        series: &PatientSeries,
        period: PatientSummary,
        three_month: PatientSummary,
    ) -> SummaryReport {
        let entry_counts = Metric::ALL
            .iter()
            .map(|m| (m.as_str().to_string(), series.entry_count(*m)))
            .collect();

        SummaryReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: VITALOG_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            provenance: ReportProvenance {
                patient_id: series.profile.id.clone(),
                records_total: series.stats.records_total,
                records_excluded: series.stats.records_excluded,
                dataset_start: series.bounds.start,
                dataset_end: series.bounds.end,
                entry_counts,
                computed_at_utc: Utc::now().to_rfc3339(),
            },
            period,
            three_month,
        }
    }

    /// Encode to a pretty-printed JSON string
    pub fn encode_to_json(
        &self,
        series: &PatientSeries,
        period: PatientSummary,
        three_month: PatientSummary,
    ) -> Result<String, VitalsError> {
        let report = self.encode(series, period, three_month);
        serde_json::to_string_pretty(&report).map_err(VitalsError::JsonError)
    }
}
