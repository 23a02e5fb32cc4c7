//! Mood normalizer

use crate::config::EngineConfig;
use crate::schema::Metric;
use crate::types::{Mood, MoodEntry};
use tracing::debug;

use super::{DatedRecord, MetricNormalizer};

pub struct MoodNormalizer;

impl MetricNormalizer for MoodNormalizer {
    type Entry = MoodEntry;

    fn metric(&self) -> Metric {
        Metric::Mood
    }

    fn normalize(&self, records: &[DatedRecord<'_>], _config: &EngineConfig) -> Vec<MoodEntry> {
        let mut entries: Vec<MoodEntry> = records
            .iter()
            .filter_map(|dated| {
                let raw = dated.record.text("Mood")?;
                match Mood::parse(&raw) {
                    Some(mood) => Some(MoodEntry {
                        date: dated.date,
                        mood,
                    }),
                    None => {
                        debug!(date = %dated.date, mood = %raw, "Dropping unrecognized mood");
                        None
                    }
                }
            })
            .collect();
        entries.sort_by_key(|e| e.date);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizers::dated_records;
    use crate::normalizers::test_support::make_record;

    #[test]
    fn test_known_moods_only() {
        let records = vec![
            make_record("2024-07-01").with("Mood", "Happy"),
            make_record("2024-07-02").with("Mood", "contempt"),
            make_record("2024-07-03").with("Mood", ""),
            make_record("2024-07-04").with("Mood", "ANGRY"),
        ];
        let entries =
            MoodNormalizer.normalize(&dated_records(&records), &EngineConfig::default());
        let moods: Vec<Mood> = entries.iter().map(|e| e.mood).collect();
        assert_eq!(moods, vec![Mood::Happy, Mood::Angry]);
    }
}
