//! Windowed aggregation
//!
//! One engine serves every metric. A `MetricConfig` says which numeric value
//! to average, how to label an entry for the category distribution, the fixed
//! category order, and the rounding precision.

use crate::types::TimedEntry;
use crate::window::TimeWindow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Per-metric aggregation parameters
pub struct MetricConfig<E> {
    pub name: &'static str,
    /// Primary numeric value; entries returning `None` are left out of the mean
    pub value: Option<fn(&E) -> Option<f64>>,
    /// Decimal places kept in the mean
    pub precision: u32,
    /// Categorical label for the distribution
    pub category: Option<fn(&E) -> Option<String>>,
    /// Categories always reported, in display order, even at zero count
    pub categories: &'static [&'static str],
}

impl<E> Clone for MetricConfig<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for MetricConfig<E> {}

/// Count and share of one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
    /// Whole-number percentage of categorized entries
    pub percent: u32,
}

/// Statistics shared by every metric summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub count: usize,
    pub mean: Option<f64>,
    pub distribution: Vec<CategoryCount>,
    pub most_common: Option<String>,
    pub most_common_count: usize,
    /// Distinct calendar days with at least one entry
    pub days_tracked: u32,
    /// Calendar days spanned by the window
    pub period_days: u32,
}

impl Aggregate {
    /// Percentage for one category label, zero if absent
    pub fn percent_of(&self, label: &str) -> u32 {
        self.distribution
            .iter()
            .find(|c| c.label == label)
            .map_or(0, |c| c.percent)
    }

    pub fn count_of(&self, label: &str) -> usize {
        self.distribution
            .iter()
            .find(|c| c.label == label)
            .map_or(0, |c| c.count)
    }
}

/// Occurrence counter that remembers first-seen order
#[derive(Debug, Default)]
pub(crate) struct Tally {
    counts: Vec<(String, usize)>,
}

impl Tally {
    pub(crate) fn add(&mut self, label: &str) {
        self.add_n(label, 1);
    }

    pub(crate) fn add_n(&mut self, label: &str, n: usize) {
        match self.counts.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += n,
            None => self.counts.push((label.to_string(), n)),
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    pub(crate) fn get(&self, label: &str) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| l == label)
            .map_or(0, |(_, c)| *c)
    }

    /// Highest count; ties go to the label seen first
    pub(crate) fn most_common(&self) -> Option<(&str, usize)> {
        let mut best: Option<(&str, usize)> = None;
        for (label, count) in &self.counts {
            if *count == 0 {
                continue;
            }
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((label.as_str(), *count));
            }
        }
        best
    }

    /// Fixed categories first, then any others in first-seen order
    pub(crate) fn distribution(&self, categories: &[&str]) -> Vec<CategoryCount> {
        let total = self.total();
        let mut rows: Vec<CategoryCount> = categories
            .iter()
            .map(|label| {
                let count = self.get(label);
                CategoryCount {
                    label: label.to_string(),
                    count,
                    percent: percent(count, total),
                }
            })
            .collect();

        for (label, count) in &self.counts {
            if !categories.contains(&label.as_str()) {
                rows.push(CategoryCount {
                    label: label.clone(),
                    count: *count,
                    percent: percent(*count, total),
                });
            }
        }
        rows
    }
}

/// Round to `precision` decimal places
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Whole-number percentage; zero when `whole` is zero
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as u32
}

/// Arithmetic mean, `None` for an empty input
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Entries whose timestamp falls inside the inclusive window
pub fn within<'a, E: TimedEntry>(entries: &'a [E], window: &TimeWindow) -> Vec<&'a E> {
    entries
        .iter()
        .filter(|e| window.contains(e.timestamp()))
        .collect()
}

pub(crate) fn distinct_days<E: TimedEntry>(entries: &[&E]) -> u32 {
    entries
        .iter()
        .map(|e| e.date())
        .collect::<BTreeSet<NaiveDate>>()
        .len() as u32
}

/// Aggregate the entries inside `window`, or `None` if there are none
pub fn aggregate<E: TimedEntry>(
    entries: &[E],
    window: &TimeWindow,
    config: &MetricConfig<E>,
) -> Option<Aggregate> {
    let selected = within(entries, window);
    aggregate_selected(&selected, window, config)
}

pub(crate) fn aggregate_selected<E: TimedEntry>(
    selected: &[&E],
    window: &TimeWindow,
    config: &MetricConfig<E>,
) -> Option<Aggregate> {
    if selected.is_empty() {
        return None;
    }

    let mean_value = config.value.and_then(|value| {
        mean(selected.iter().filter_map(|e| value(e))).map(|m| round_to(m, config.precision))
    });

    let mut tally = Tally::default();
    if let Some(category) = config.category {
        for entry in selected {
            if let Some(label) = category(entry) {
                tally.add(&label);
            }
        }
    }

    let (most_common, most_common_count) = match tally.most_common() {
        Some((label, count)) => (Some(label.to_string()), count),
        None => (None, 0),
    };

    Some(Aggregate {
        count: selected.len(),
        mean: mean_value,
        distribution: tally.distribution(config.categories),
        most_common,
        most_common_count,
        days_tracked: distinct_days(selected),
        period_days: window.period_days(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::week_range;
    use chrono::{NaiveDate, NaiveDateTime};

    struct Sample {
        at: NaiveDateTime,
        value: f64,
        label: &'static str,
    }

    impl TimedEntry for Sample {
        fn timestamp(&self) -> NaiveDateTime {
            self.at
        }
    }

    fn make_sample(day: u32, hour: u32, value: f64, label: &'static str) -> Sample {
        Sample {
            at: NaiveDate::from_ymd_opt(2024, 7, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap(),
            value,
            label,
        }
    }

    fn sample_value(s: &Sample) -> Option<f64> {
        Some(s.value)
    }

    fn sample_label(s: &Sample) -> Option<String> {
        Some(s.label.to_string())
    }

    const SAMPLE_CONFIG: MetricConfig<Sample> = MetricConfig {
        name: "sample",
        value: Some(sample_value),
        precision: 1,
        category: Some(sample_label),
        categories: &["low", "mid", "high"],
    };

    fn window() -> TimeWindow {
        // Sunday 2024-07-07 through Saturday 2024-07-13
        week_range(NaiveDate::from_ymd_opt(2024, 7, 10).unwrap())
    }

    #[test]
    fn test_empty_window_is_none() {
        let entries = vec![make_sample(1, 8, 5.0, "low"), make_sample(20, 8, 5.0, "low")];
        assert!(aggregate(&entries, &window(), &SAMPLE_CONFIG).is_none());
        assert!(aggregate::<Sample>(&[], &window(), &SAMPLE_CONFIG).is_none());
    }

    #[test]
    fn test_mean_distribution_and_days() {
        let entries = vec![
            make_sample(6, 23, 100.0, "high"),
            make_sample(7, 8, 5.0, "mid"),
            make_sample(7, 20, 6.0, "high"),
            make_sample(9, 8, 6.5, "mid"),
            make_sample(14, 0, 100.0, "low"),
        ];
        let stats = aggregate(&entries, &window(), &SAMPLE_CONFIG).unwrap();

        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, Some(5.8));
        assert_eq!(stats.days_tracked, 2);
        assert_eq!(stats.period_days, 7);
        assert_eq!(stats.most_common.as_deref(), Some("mid"));
        assert_eq!(stats.most_common_count, 2);
        assert_eq!(stats.percent_of("low"), 0);
        assert_eq!(stats.percent_of("mid"), 67);
        assert_eq!(stats.percent_of("high"), 33);
        let labels: Vec<&str> = stats.distribution.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["low", "mid", "high"]);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let entries = vec![
            make_sample(8, 8, 1.0, "high"),
            make_sample(8, 9, 1.0, "low"),
            make_sample(9, 8, 1.0, "low"),
            make_sample(9, 9, 1.0, "high"),
        ];
        let first = aggregate(&entries, &window(), &SAMPLE_CONFIG).unwrap();
        assert_eq!(first.most_common.as_deref(), Some("high"));

        let again = aggregate(&entries, &window(), &SAMPLE_CONFIG).unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_unlisted_categories_follow_fixed_ones() {
        let entries = vec![make_sample(8, 8, 1.0, "odd"), make_sample(8, 9, 1.0, "low")];
        let stats = aggregate(&entries, &window(), &SAMPLE_CONFIG).unwrap();
        let labels: Vec<&str> = stats.distribution.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["low", "mid", "high", "odd"]);
        assert_eq!(stats.percent_of("odd"), 50);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = window();
        let entries = vec![
            Sample { at: w.start, value: 1.0, label: "low" },
            Sample { at: w.end, value: 3.0, label: "low" },
        ];
        let stats = aggregate(&entries, &w, &SAMPLE_CONFIG).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.mean, Some(2.0));
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_to(7.25, 1), 7.3);
        assert_eq!(round_to(7.0, 0), 7.0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(5, 0), 0);
        assert_eq!(mean(Vec::<f64>::new()), None);
    }
}
