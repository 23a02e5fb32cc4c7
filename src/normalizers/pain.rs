//! Pain normalizer

use crate::config::EngineConfig;
use crate::schema::field::{is_sentinel, parse_integer};
use crate::schema::Metric;
use crate::types::PainEntry;
use tracing::debug;

use super::{DatedRecord, MetricNormalizer};

const MAX_PAIN_LEVEL: i64 = 10;

pub struct PainNormalizer;

impl MetricNormalizer for PainNormalizer {
    type Entry = PainEntry;

    fn metric(&self) -> Metric {
        Metric::Pain
    }

    fn normalize(&self, records: &[DatedRecord<'_>], _config: &EngineConfig) -> Vec<PainEntry> {
        let mut entries = Vec::new();

        for dated in records {
            let Some(location) = dated
                .record
                .text("Pain_Location")
                .filter(|l| !is_sentinel(l))
            else {
                continue;
            };

            let level = dated
                .record
                .text("Pain_Level")
                .and_then(|l| parse_integer(&l))
                .filter(|l| (0..=MAX_PAIN_LEVEL).contains(l));

            match level {
                Some(level) => entries.push(PainEntry {
                    date: dated.date,
                    location: location.to_lowercase(),
                    intensity: level as u8,
                }),
                None => debug!(
                    date = %dated.date,
                    "Dropping pain entry: level missing or out of range"
                ),
            }
        }

        entries.sort_by_key(|e| e.date);
        entries
    }
}
