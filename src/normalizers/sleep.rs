//! Sleep normalizer
//!
//! The numeric quality code is authoritative; the label is derived from it.

use crate::config::EngineConfig;
use crate::schema::field::parse_integer;
use crate::schema::Metric;
use crate::types::{SleepNight, SleepQuality};
use tracing::debug;

use super::{DatedRecord, MetricNormalizer};

pub struct SleepNormalizer;

impl MetricNormalizer for SleepNormalizer {
    type Entry = SleepNight;

    fn metric(&self) -> Metric {
        Metric::Sleep
    }

    fn normalize(&self, records: &[DatedRecord<'_>], _config: &EngineConfig) -> Vec<SleepNight> {
        let mut nights = Vec::new();

        for dated in records {
            let record = dated.record;
            let hours = record.number("Sleep_Hours");
            let label = record.text("Sleep_Quality");
            if hours.is_none() && label.is_none() {
                continue;
            }

            let quality = record
                .text("Sleep_Quality_Code")
                .and_then(|c| parse_integer(&c))
                .and_then(SleepQuality::from_code);

            match (hours.filter(|h| *h >= 0.0), label, quality) {
                (Some(hours), Some(_), Some(quality)) => nights.push(SleepNight {
                    date: dated.date,
                    hours,
                    quality,
                    quality_code: quality.code(),
                }),
                _ => debug!(date = %dated.date, "Dropping sleep entry: incomplete fields"),
            }
        }

        nights.sort_by_key(|n| n.date);
        nights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::dated_records;
    use crate::normalizers::test_support::make_record;

    #[test]
    fn test_sleep_entries() {
        let records = vec![
            make_record("2024-07-01")
                .with("Sleep_Hours", 7.5)
                .with("Sleep_Quality", "Fairly good")
                .with("Sleep_Quality_Code", 1.0),
            make_record("2024-07-02")
                .with("Sleep_Hours", 6.0)
                .with("Sleep_Quality", "Very bad")
                .with("Sleep_Quality_Code", "4"),
            make_record("2024-07-03")
                .with("Sleep_Hours", 8.0)
                .with("Sleep_Quality_Code", 0.0),
            make_record("2024-07-04")
                .with("Sleep_Hours", -1.0)
                .with("Sleep_Quality", "Very good")
                .with("Sleep_Quality_Code", 0.0),
        ];

        let nights = SleepNormalizer.normalize(&dated_records(&records), &EngineConfig::default());
        assert_eq!(nights.len(), 1);
        assert_eq!(nights[0].hours, 7.5);
        assert_eq!(nights[0].quality, SleepQuality::FairlyGood);
        assert_eq!(nights[0].quality_code, 1);
    }
}
