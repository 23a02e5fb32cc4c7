//! Per-metric window summaries
//!
//! Each summary starts from the shared [`Aggregate`] and adds the derived
//! values that only make sense for its metric. Every function returns `None`
//! when the window holds no qualifying entries.

use crate::aggregate::{
    aggregate_selected, mean, percent, round_to, within, Aggregate, CategoryCount, MetricConfig,
    Tally,
};
use crate::pipeline::PatientSeries;
use crate::types::{
    AddedSugar, BloodPressureReading, BpRisk, ExerciseBucket, ExerciseDay, ExerciseMinutes,
    FoodCategory, GlucoseRange, GlucoseReading, MealContext, MealDay, Mood, MoodEntry, PainEntry,
    SleepNight, SleepQuality,
};
use crate::window::TimeWindow;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Metric configurations
// ---------------------------------------------------------------------------

fn glucose_value(r: &GlucoseReading) -> Option<f64> {
    Some(r.value)
}

fn glucose_range(r: &GlucoseReading) -> Option<String> {
    Some(r.range.as_str().to_string())
}

pub const GLUCOSE: MetricConfig<GlucoseReading> = MetricConfig {
    name: "glucose",
    value: Some(glucose_value),
    precision: 1,
    category: Some(glucose_range),
    categories: &["below range", "in range", "above range"],
};

fn bp_systolic(r: &BloodPressureReading) -> Option<f64> {
    Some(r.systolic)
}

fn bp_risk(r: &BloodPressureReading) -> Option<String> {
    Some(r.risk.as_str().to_string())
}

pub const BLOOD_PRESSURE: MetricConfig<BloodPressureReading> = MetricConfig {
    name: "blood_pressure",
    value: Some(bp_systolic),
    precision: 0,
    category: Some(bp_risk),
    categories: &["normal", "elevated", "high", "hypertensive crisis"],
};

fn exercise_total(d: &ExerciseDay) -> Option<f64> {
    Some(d.total_minutes)
}

fn exercise_main_bucket(d: &ExerciseDay) -> Option<String> {
    top_bucket(&d.minutes).map(|b| b.as_str().to_string())
}

pub const EXERCISE: MetricConfig<ExerciseDay> = MetricConfig {
    name: "exercise",
    value: Some(exercise_total),
    precision: 0,
    category: Some(exercise_main_bucket),
    categories: &[
        "walking",
        "swimming",
        "running",
        "biking",
        "muscle-strengthening",
        "balance",
        "other",
    ],
};

fn mood_label(m: &MoodEntry) -> Option<String> {
    Some(m.mood.as_str().to_string())
}

pub const MOOD: MetricConfig<MoodEntry> = MetricConfig {
    name: "mood",
    value: None,
    precision: 0,
    category: Some(mood_label),
    categories: &["happy", "sad", "angry"],
};

fn pain_intensity(p: &PainEntry) -> Option<f64> {
    Some(f64::from(p.intensity))
}

fn pain_location(p: &PainEntry) -> Option<String> {
    Some(p.location.clone())
}

pub const PAIN: MetricConfig<PainEntry> = MetricConfig {
    name: "pain",
    value: Some(pain_intensity),
    precision: 1,
    category: Some(pain_location),
    categories: &[],
};

fn sleep_hours(s: &SleepNight) -> Option<f64> {
    Some(s.hours)
}

fn sleep_quality(s: &SleepNight) -> Option<String> {
    Some(s.quality.as_str().to_string())
}

pub const SLEEP: MetricConfig<SleepNight> = MetricConfig {
    name: "sleep",
    value: Some(sleep_hours),
    precision: 1,
    category: Some(sleep_quality),
    categories: &["Very good", "Fairly good", "Fairly bad", "Very bad"],
};

fn meals_logged(d: &MealDay) -> Option<f64> {
    Some(d.logged_meals().count() as f64)
}

pub const MEALS: MetricConfig<MealDay> = MetricConfig {
    name: "meals",
    value: Some(meals_logged),
    precision: 1,
    category: None,
    categories: &[],
};

/// Bucket with the most minutes; ties go to the higher-priority bucket
fn top_bucket(minutes: &ExerciseMinutes) -> Option<ExerciseBucket> {
    let mut best: Option<(ExerciseBucket, f64)> = None;
    for bucket in ExerciseBucket::ALL {
        let value = minutes.get(bucket);
        if value > 0.0 && best.map_or(true, |(_, m)| value > m) {
            best = Some((bucket, value));
        }
    }
    best.map(|(bucket, _)| bucket)
}

// ---------------------------------------------------------------------------
// Glucose
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseSummary {
    pub stats: Aggregate,
    pub mean_value: f64,
    pub in_range_percent: u32,
    pub below_range_percent: u32,
    pub above_range_percent: u32,
    pub pre_meal_mean: Option<f64>,
    pub post_meal_mean: Option<f64>,
}

pub fn summarize_glucose(
    readings: &[GlucoseReading],
    window: &TimeWindow,
) -> Option<GlucoseSummary> {
    let selected = within(readings, window);
    let stats = aggregate_selected(&selected, window, &GLUCOSE)?;

    let context_mean = |context: MealContext| {
        mean(
            selected
                .iter()
                .filter(|r| r.meal_context == context)
                .map(|r| r.value),
        )
        .map(|m| round_to(m, GLUCOSE.precision))
    };

    Some(GlucoseSummary {
        mean_value: stats.mean.unwrap_or_default(),
        in_range_percent: stats.percent_of(GlucoseRange::InRange.as_str()),
        below_range_percent: stats.percent_of(GlucoseRange::Below.as_str()),
        above_range_percent: stats.percent_of(GlucoseRange::Above.as_str()),
        pre_meal_mean: context_mean(MealContext::PreMeal),
        post_meal_mean: context_mean(MealContext::PostMeal),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Blood pressure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureSummary {
    pub stats: Aggregate,
    pub mean_systolic: f64,
    pub mean_diastolic: f64,
    /// Risk of the averaged reading
    pub risk: BpRisk,
    /// 0 normal, 1 elevated, 2 high
    pub risk_level: u8,
    pub risk_label: String,
}

const RISK_LEVEL_LABELS: [&str; 3] = ["normal", "elevated", "high"];

pub fn summarize_blood_pressure(
    readings: &[BloodPressureReading],
    window: &TimeWindow,
) -> Option<BloodPressureSummary> {
    let selected = within(readings, window);
    let stats = aggregate_selected(&selected, window, &BLOOD_PRESSURE)?;

    let mean_systolic = round_to(
        mean(selected.iter().map(|r| r.systolic)).unwrap_or_default(),
        BLOOD_PRESSURE.precision,
    );
    let mean_diastolic = round_to(
        mean(selected.iter().map(|r| r.diastolic)).unwrap_or_default(),
        BLOOD_PRESSURE.precision,
    );
    let risk = BpRisk::classify(mean_systolic, mean_diastolic);
    let risk_level = risk.level();

    Some(BloodPressureSummary {
        stats,
        mean_systolic,
        mean_diastolic,
        risk,
        risk_level,
        risk_label: RISK_LEVEL_LABELS[usize::from(risk_level)].to_string(),
    })
}

// ---------------------------------------------------------------------------
// Exercise
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub stats: Aggregate,
    pub total_minutes: f64,
    /// Mean minutes over days with any exercise
    pub mean_minutes_per_active_day: f64,
    pub active_days: u32,
    pub minutes_by_bucket: ExerciseMinutes,
    pub top_activity: Option<ExerciseBucket>,
}

pub fn summarize_exercise(days: &[ExerciseDay], window: &TimeWindow) -> Option<ExerciseSummary> {
    let selected = within(days, window);
    let stats = aggregate_selected(&selected, window, &EXERCISE)?;

    let mut by_bucket = ExerciseDay::new(window.start.date());
    for day in &selected {
        for bucket in ExerciseBucket::ALL {
            let minutes = day.minutes.get(bucket);
            if minutes > 0.0 {
                by_bucket.add(bucket, minutes);
            }
        }
    }

    Some(ExerciseSummary {
        total_minutes: round_to(by_bucket.total_minutes, 0),
        mean_minutes_per_active_day: stats.mean.unwrap_or_default(),
        active_days: stats.days_tracked,
        top_activity: top_bucket(&by_bucket.minutes),
        minutes_by_bucket: by_bucket.minutes,
        stats,
    })
}

// ---------------------------------------------------------------------------
// Mood
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSummary {
    pub stats: Aggregate,
    pub most_common: Option<Mood>,
}

pub fn summarize_mood(entries: &[MoodEntry], window: &TimeWindow) -> Option<MoodSummary> {
    let selected = within(entries, window);
    let stats = aggregate_selected(&selected, window, &MOOD)?;
    let most_common = stats.most_common.as_deref().and_then(Mood::parse);
    Some(MoodSummary { stats, most_common })
}

// ---------------------------------------------------------------------------
// Pain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainSummary {
    pub stats: Aggregate,
    pub mean_intensity: f64,
    pub max_intensity: u8,
    pub most_common_location: Option<String>,
}

pub fn summarize_pain(entries: &[PainEntry], window: &TimeWindow) -> Option<PainSummary> {
    let selected = within(entries, window);
    let stats = aggregate_selected(&selected, window, &PAIN)?;
    let max_intensity = selected.iter().map(|p| p.intensity).max().unwrap_or(0);

    Some(PainSummary {
        mean_intensity: stats.mean.unwrap_or_default(),
        max_intensity,
        most_common_location: stats.most_common.clone(),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Sleep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSummary {
    pub stats: Aggregate,
    pub mean_hours: f64,
    /// Mean quality code, 0 best to 3 worst
    pub quality_score: f64,
    pub quality_label: SleepQuality,
}

pub fn summarize_sleep(nights: &[SleepNight], window: &TimeWindow) -> Option<SleepSummary> {
    let selected = within(nights, window);
    let stats = aggregate_selected(&selected, window, &SLEEP)?;

    let score = mean(selected.iter().map(|n| f64::from(n.quality_code))).unwrap_or_default();

    Some(SleepSummary {
        mean_hours: stats.mean.unwrap_or_default(),
        quality_score: round_to(score, 2),
        quality_label: SleepQuality::from_score(score),
        stats,
    })
}

// ---------------------------------------------------------------------------
// Meals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSummary {
    pub stats: Aggregate,
    pub meals_logged: usize,
    /// Share of logged meals containing each food category
    pub category_percent: Vec<CategoryCount>,
    pub added_sugar: Vec<CategoryCount>,
    pub alcohol_days: u32,
}

pub fn summarize_meals(days: &[MealDay], window: &TimeWindow) -> Option<MealSummary> {
    let selected = within(days, window);
    let stats = aggregate_selected(&selected, window, &MEALS)?;

    let mut foods = Tally::default();
    let mut sugar = Tally::default();
    let mut meals_logged = 0;
    let mut alcohol_days = 0;

    for day in &selected {
        let mut alcohol = false;
        for meal in day.logged_meals() {
            meals_logged += 1;
            for category in FoodCategory::ALL {
                if meal.foods.get(category) {
                    foods.add(category.as_str());
                }
            }
            if let Some(level) = meal.added_sugar {
                sugar.add(level.as_str());
            }
            alcohol |= meal.foods.alcohol;
        }
        if alcohol {
            alcohol_days += 1;
        }
    }

    // Food shares are per meal, so several categories can each be high
    let category_percent = FoodCategory::ALL
        .iter()
        .map(|category| {
            let count = foods.get(category.as_str());
            CategoryCount {
                label: category.as_str().to_string(),
                count,
                percent: percent(count, meals_logged),
            }
        })
        .collect();
    let sugar_labels = AddedSugar::ALL.map(|level| level.as_str());

    Some(MealSummary {
        stats,
        meals_logged,
        category_percent,
        added_sugar: sugar.distribution(&sugar_labels),
        alcohol_days,
    })
}

// ---------------------------------------------------------------------------
// All metrics
// ---------------------------------------------------------------------------

/// Every metric summarized over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub window: TimeWindow,
    pub glucose: Option<GlucoseSummary>,
    pub blood_pressure: Option<BloodPressureSummary>,
    pub exercise: Option<ExerciseSummary>,
    pub mood: Option<MoodSummary>,
    pub pain: Option<PainSummary>,
    pub sleep: Option<SleepSummary>,
    pub meals: Option<MealSummary>,
}

impl PatientSummary {
    /// True when no metric has data in the window
    pub fn is_empty(&self) -> bool {
        self.glucose.is_none()
            && self.blood_pressure.is_none()
            && self.exercise.is_none()
            && self.mood.is_none()
            && self.pain.is_none()
            && self.sleep.is_none()
            && self.meals.is_none()
    }
}

pub fn summarize_all(series: &PatientSeries, window: &TimeWindow) -> PatientSummary {
    PatientSummary {
        window: *window,
        glucose: summarize_glucose(&series.glucose, window),
        blood_pressure: summarize_blood_pressure(&series.blood_pressure, window),
        exercise: summarize_exercise(&series.exercise, window),
        mood: summarize_mood(&series.mood, window),
        pain: summarize_pain(&series.pain, window),
        sleep: summarize_sleep(&series.sleep, window),
        meals: summarize_meals(&series.meals, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FoodFlags, Meal, MealSlot};
    use crate::window::{month_range, week_range};
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, m, 0).unwrap()
    }

    // Sunday 2024-07-07 through Saturday 2024-07-13
    fn week() -> TimeWindow {
        week_range(date(10))
    }

    fn make_glucose(d: u32, h: u32, value: f64, range: GlucoseRange, ctx: MealContext) -> GlucoseReading {
        GlucoseReading {
            timestamp: at(d, h, 0),
            value,
            range_label: range.as_str().to_string(),
            range,
            meal_context: ctx,
            time_known: true,
        }
    }

    fn make_bp(d: u32, systolic: f64, diastolic: f64) -> BloodPressureReading {
        BloodPressureReading {
            timestamp: at(d, 9, 0),
            systolic,
            diastolic,
            risk: BpRisk::classify(systolic, diastolic),
            risk_supplied: false,
            systolic_type: None,
            diastolic_type: None,
            time_known: true,
        }
    }

    fn make_sleep(d: u32, hours: f64, code: u8) -> SleepNight {
        let quality = SleepQuality::from_code(i64::from(code)).unwrap();
        SleepNight {
            date: date(d),
            hours,
            quality,
            quality_code: code,
        }
    }

    #[test]
    fn test_sleep_two_nights() {
        let nights = vec![make_sleep(8, 6.0, 1), make_sleep(9, 8.0, 0)];
        let summary = summarize_sleep(&nights, &week()).unwrap();

        assert_eq!(summary.mean_hours, 7.0);
        assert_eq!(summary.stats.days_tracked, 2);
        assert_eq!(summary.stats.period_days, 7);
        assert_eq!(summary.quality_score, 0.5);
        assert_eq!(summary.quality_label, SleepQuality::FairlyGood);
        assert_eq!(summary.quality_label.as_str(), "Fairly good");
    }

    #[test]
    fn test_every_summary_is_none_for_empty_window() {
        let series = PatientSeries::empty("p1");
        let summary = summarize_all(&series, &week());
        assert!(summary.is_empty());

        let outside = vec![make_sleep(1, 7.0, 0)];
        assert!(summarize_sleep(&outside, &week()).is_none());
    }

    #[test]
    fn test_glucose_percentages_and_meal_means() {
        let readings = vec![
            make_glucose(8, 7, 5.0, GlucoseRange::InRange, MealContext::PreMeal),
            make_glucose(8, 10, 11.0, GlucoseRange::Above, MealContext::PostMeal),
            make_glucose(9, 7, 3.5, GlucoseRange::Below, MealContext::PreMeal),
            make_glucose(9, 10, 8.0, GlucoseRange::InRange, MealContext::PostMeal),
        ];
        let summary = summarize_glucose(&readings, &week()).unwrap();

        assert_eq!(summary.stats.count, 4);
        assert_eq!(summary.mean_value, 6.9);
        assert_eq!(summary.in_range_percent, 50);
        assert_eq!(summary.below_range_percent, 25);
        assert_eq!(summary.above_range_percent, 25);
        assert_eq!(summary.pre_meal_mean, Some(4.3));
        assert_eq!(summary.post_meal_mean, Some(9.5));
        assert_eq!(summary.stats.most_common.as_deref(), Some("in range"));
    }

    #[test]
    fn test_blood_pressure_risk_of_average() {
        let readings = vec![make_bp(8, 118.0, 76.0), make_bp(9, 150.0, 92.0)];
        let summary = summarize_blood_pressure(&readings, &week()).unwrap();

        assert_eq!(summary.mean_systolic, 134.0);
        assert_eq!(summary.mean_diastolic, 84.0);
        assert_eq!(summary.risk, BpRisk::Elevated);
        assert_eq!(summary.risk_level, 1);
        assert_eq!(summary.risk_label, "elevated");
        assert_eq!(summary.stats.count_of("normal"), 1);
        assert_eq!(summary.stats.count_of("high"), 1);
        assert_eq!(summary.stats.most_common.as_deref(), Some("normal"));
    }

    #[test]
    fn test_exercise_totals_and_top_activity() {
        let mut monday = ExerciseDay::new(date(8));
        monday.add(ExerciseBucket::Walking, 30.0);
        monday.add(ExerciseBucket::Balance, 10.0);
        let mut tuesday = ExerciseDay::new(date(9));
        tuesday.add(ExerciseBucket::Swimming, 45.0);

        let summary = summarize_exercise(&[monday, tuesday], &week()).unwrap();
        assert_eq!(summary.total_minutes, 85.0);
        assert_eq!(summary.minutes_by_bucket.walking, 30.0);
        assert_eq!(summary.minutes_by_bucket.swimming, 45.0);
        assert_eq!(summary.minutes_by_bucket.sum(), summary.total_minutes);
        assert_eq!(summary.top_activity, Some(ExerciseBucket::Swimming));
        assert_eq!(summary.active_days, 2);
        assert_eq!(summary.mean_minutes_per_active_day, 43.0);
    }

    #[test]
    fn test_mood_most_common() {
        let entries = vec![
            MoodEntry { date: date(8), mood: Mood::Sad },
            MoodEntry { date: date(9), mood: Mood::Happy },
            MoodEntry { date: date(10), mood: Mood::Happy },
        ];
        let summary = summarize_mood(&entries, &week()).unwrap();
        assert_eq!(summary.most_common, Some(Mood::Happy));
        assert_eq!(summary.stats.percent_of("happy"), 67);
        assert_eq!(summary.stats.mean, None);
    }

    #[test]
    fn test_pain_summary() {
        let entries = vec![
            PainEntry { date: date(8), location: "knee".into(), intensity: 4 },
            PainEntry { date: date(9), location: "back".into(), intensity: 7 },
            PainEntry { date: date(10), location: "knee".into(), intensity: 2 },
        ];
        let summary = summarize_pain(&entries, &month_range(date(10))).unwrap();
        assert_eq!(summary.mean_intensity, 4.3);
        assert_eq!(summary.max_intensity, 7);
        assert_eq!(summary.most_common_location.as_deref(), Some("knee"));
        assert_eq!(summary.stats.period_days, 31);
    }

    #[test]
    fn test_meal_summary() {
        let breakfast = Meal {
            slot: MealSlot::Breakfast,
            time: NaiveTime::from_hms_opt(8, 0, 0),
            foods: FoodFlags {
                protein: true,
                carbohydrates: true,
                ..Default::default()
            },
            added_sugar: Some(AddedSugar::UpTo20g),
        };
        let dinner = Meal {
            slot: MealSlot::Dinner,
            time: NaiveTime::from_hms_opt(19, 0, 0),
            foods: FoodFlags {
                protein: true,
                alcohol: true,
                ..Default::default()
            },
            added_sugar: None,
        };
        let unlogged = Meal {
            slot: MealSlot::Lunch,
            time: None,
            foods: FoodFlags {
                fruit: true,
                ..Default::default()
            },
            added_sugar: None,
        };
        let days = vec![MealDay {
            date: date(8),
            meals: vec![breakfast, unlogged, dinner],
        }];

        let summary = summarize_meals(&days, &week()).unwrap();
        assert_eq!(summary.meals_logged, 2);
        assert_eq!(summary.alcohol_days, 1);
        assert_eq!(summary.stats.mean, Some(2.0));
        let protein = &summary.category_percent[0];
        assert_eq!((protein.label.as_str(), protein.percent), ("Protein", 100));
        let fruit = &summary.category_percent[3];
        assert_eq!((fruit.label.as_str(), fruit.count), ("Fruit", 0));
        assert_eq!(summary.added_sugar[0].count, 1);
        assert_eq!(summary.added_sugar[0].percent, 100);
    }

    #[test]
    fn test_summaries_are_idempotent() {
        let readings = vec![
            make_glucose(8, 7, 5.0, GlucoseRange::InRange, MealContext::PreMeal),
            make_glucose(9, 7, 12.0, GlucoseRange::Above, MealContext::PostMeal),
        ];
        assert_eq!(
            summarize_glucose(&readings, &week()),
            summarize_glucose(&readings, &week())
        );
    }
}
