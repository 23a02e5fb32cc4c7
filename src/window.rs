//! Time-window resolution
//!
//! Resolves a reference date into an inclusive week, month, or rolling
//! three-month window. Weeks start on Sunday. The three-month window is
//! clamped into the dataset's coverage so it never reaches past the data.

use chrono::{Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// Number of calendar months covered by the rolling window
pub const ROLLING_MONTHS: u32 = 3;

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 on `date`
fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::milliseconds(MILLIS_PER_DAY - 1)
}

/// Kind of a resolved window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WindowKind {
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "threeMonth")]
    ThreeMonth,
}

/// Navigable period selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
        }
    }
}

impl From<Period> for WindowKind {
    fn from(period: Period) -> Self {
        match period {
            Period::Week => WindowKind::Week,
            Period::Month => WindowKind::Month,
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" | "weekly" => Ok(Period::Week),
            "month" | "monthly" => Ok(Period::Month),
            other => Err(format!("unknown period '{other}'")),
        }
    }
}

/// Closed interval used to filter entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub kind: WindowKind,
}

impl TimeWindow {
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// True if any instant of `date` falls inside the window
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        start_of_day(date) <= self.end && end_of_day(date) >= self.start
    }

    /// Number of calendar days the window touches, used as the coverage denominator
    pub fn period_days(&self) -> u32 {
        let days = (self.end.date() - self.start.date()).num_days() + 1;
        days.max(0) as u32
    }
}

/// Calendar coverage of the loaded dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetBounds {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for DatasetBounds {
    /// Coverage of the synthetic patient export: July 2024 through July 2025
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 7, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl DatasetBounds {
    /// Bounds from two dates in either order
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    /// Earliest and latest of `dates`, or `None` for an empty set
    pub fn from_dates<I: IntoIterator<Item = NaiveDate>>(dates: I) -> Option<Self> {
        dates.into_iter().fold(None, |acc, date| match acc {
            None => Some(Self::new(date, date)),
            Some(b) => Some(Self::new(b.start.min(date), b.end.max(date))),
        })
    }

    pub fn start_instant(&self) -> NaiveDateTime {
        start_of_day(self.start)
    }

    pub fn end_instant(&self) -> NaiveDateTime {
        end_of_day(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Sunday-to-Saturday week containing `date`
pub fn week_range(date: NaiveDate) -> TimeWindow {
    let back = Days::new(u64::from(date.weekday().num_days_from_sunday()));
    let start = date.checked_sub_days(back).unwrap_or(date);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    TimeWindow {
        start: start_of_day(start),
        end: end_of_day(end),
        kind: WindowKind::Week,
    }
}

/// Calendar month containing `date`
pub fn month_range(date: NaiveDate) -> TimeWindow {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date);
    TimeWindow {
        start: start_of_day(first),
        end: end_of_day(last),
        kind: WindowKind::Month,
    }
}

/// Rolling window ending on `date` and reaching back three calendar months,
/// clamped into `bounds`. The result never inverts.
pub fn three_month_range(date: NaiveDate, bounds: &DatasetBounds) -> TimeWindow {
    let from = date
        .checked_sub_months(Months::new(ROLLING_MONTHS))
        .unwrap_or(date);

    let lower = bounds.start_instant();
    let upper = bounds.end_instant();

    let end = end_of_day(date).clamp(lower, upper);
    let start = start_of_day(from).clamp(lower, upper).min(end);

    TimeWindow {
        start,
        end,
        kind: WindowKind::ThreeMonth,
    }
}

/// Navigation state: a reference date and the selected period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowNavigator {
    reference_date: NaiveDate,
    period: Period,
    bounds: DatasetBounds,
}

impl WindowNavigator {
    pub fn new(reference_date: NaiveDate, period: Period, bounds: DatasetBounds) -> Self {
        Self {
            reference_date,
            period,
            bounds,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn bounds(&self) -> &DatasetBounds {
        &self.bounds
    }

    /// Switch between week and month; the reference date is kept
    pub fn set_period(&mut self, period: Period) {
        self.period = period;
    }

    /// Step back one week or one calendar month
    pub fn go_to_previous(&mut self) {
        let moved = match self.period {
            Period::Week => self.reference_date.checked_sub_days(Days::new(7)),
            Period::Month => self.reference_date.checked_sub_months(Months::new(1)),
        };
        if let Some(date) = moved {
            self.reference_date = date;
        }
    }

    /// Step forward one week or one calendar month
    pub fn go_to_next(&mut self) {
        let moved = match self.period {
            Period::Week => self.reference_date.checked_add_days(Days::new(7)),
            Period::Month => self.reference_date.checked_add_months(Months::new(1)),
        };
        if let Some(date) = moved {
            self.reference_date = date;
        }
    }

    /// Window for the selected period
    pub fn date_range(&self) -> TimeWindow {
        match self.period {
            Period::Week => week_range(self.reference_date),
            Period::Month => month_range(self.reference_date),
        }
    }

    /// Rolling three-month window, independent of the selected period
    pub fn three_month_range(&self) -> TimeWindow {
        three_month_range(self.reference_date, &self.bounds)
    }
}
