//! Core types for the Vitalog pipeline
//!
//! Typed per-metric entries produced by the normalizers, together with the
//! categorical labels derived from them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Anything that can be placed on the timeline and filtered by a window
pub trait TimedEntry {
    fn timestamp(&self) -> NaiveDateTime;

    fn date(&self) -> NaiveDate {
        self.timestamp().date()
    }
}

fn start_of(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Lower-case and collapse separators so `"In_Range"` and `" in  range"` compare equal
fn normalize_label(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Glucose
// ---------------------------------------------------------------------------

/// Glucose range classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlucoseRange {
    #[serde(rename = "below range")]
    Below,
    #[serde(rename = "in range")]
    InRange,
    #[serde(rename = "above range")]
    Above,
}

impl GlucoseRange {
    pub const ALL: [GlucoseRange; 3] = [GlucoseRange::Below, GlucoseRange::InRange, GlucoseRange::Above];

    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseRange::Below => "below range",
            GlucoseRange::InRange => "in range",
            GlucoseRange::Above => "above range",
        }
    }

    /// Case-insensitive parse of a supplied range label
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "below range" | "below" | "low" => Some(GlucoseRange::Below),
            "in range" | "normal" | "target" => Some(GlucoseRange::InRange),
            "above range" | "above" | "high" => Some(GlucoseRange::Above),
            _ => None,
        }
    }

    /// Fixed mg/dL thresholds used for single-value records
    pub fn from_mg_dl(value: f64) -> Self {
        if value < 70.0 {
            GlucoseRange::Below
        } else if value > 180.0 {
            GlucoseRange::Above
        } else {
            GlucoseRange::InRange
        }
    }

    /// Meal-context mmol/L targets used for timed readings without a label.
    /// Pre meal 4.0-7.0, two hours post meal 5.0-10.0.
    pub fn from_mmol_l(value: f64, context: MealContext) -> Self {
        let (low, high) = match context {
            MealContext::PreMeal => (4.0, 7.0),
            MealContext::PostMeal | MealContext::Other => (5.0, 10.0),
        };
        if value < low {
            GlucoseRange::Below
        } else if value > high {
            GlucoseRange::Above
        } else {
            GlucoseRange::InRange
        }
    }
}

/// When a glucose reading was taken relative to a meal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealContext {
    #[serde(rename = "Pre meal")]
    PreMeal,
    #[serde(rename = "Post meal")]
    PostMeal,
    #[serde(rename = "Other")]
    Other,
}

impl MealContext {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        if lowered.contains("pre") {
            MealContext::PreMeal
        } else if lowered.contains("post") {
            MealContext::PostMeal
        } else {
            MealContext::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealContext::PreMeal => "Pre meal",
            MealContext::PostMeal => "Post meal",
            MealContext::Other => "Other",
        }
    }
}

/// One blood glucose reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
    /// Range label as supplied by the source (case preserved), or the derived label
    pub range_label: String,
    /// Parsed range class used for aggregation
    pub range: GlucoseRange,
    pub meal_context: MealContext,
    /// False when the source carried no time and one was assigned
    pub time_known: bool,
}

impl TimedEntry for GlucoseReading {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// Blood pressure
// ---------------------------------------------------------------------------

/// Blood pressure risk category, ordered from lowest to highest risk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BpRisk {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "elevated")]
    Elevated,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "hypertensive crisis")]
    Crisis,
}

impl BpRisk {
    pub const ALL: [BpRisk; 4] = [BpRisk::Normal, BpRisk::Elevated, BpRisk::High, BpRisk::Crisis];

    pub fn as_str(&self) -> &'static str {
        match self {
            BpRisk::Normal => "normal",
            BpRisk::Elevated => "elevated",
            BpRisk::High => "high",
            BpRisk::Crisis => "hypertensive crisis",
        }
    }

    /// Classify a reading. Either component crossing a threshold is enough.
    pub fn classify(systolic: f64, diastolic: f64) -> Self {
        if systolic >= 180.0 || diastolic >= 120.0 {
            BpRisk::Crisis
        } else if systolic >= 140.0 || diastolic >= 90.0 {
            BpRisk::High
        } else if systolic >= 130.0 || diastolic >= 80.0 {
            BpRisk::Elevated
        } else {
            BpRisk::Normal
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "normal" => Some(BpRisk::Normal),
            "elevated" => Some(BpRisk::Elevated),
            "high" => Some(BpRisk::High),
            "hypertensive crisis" | "crisis" => Some(BpRisk::Crisis),
            _ => None,
        }
    }

    /// Coarse 0/1/2 level: normal, elevated, high or worse
    pub fn level(&self) -> u8 {
        match self {
            BpRisk::Normal => 0,
            BpRisk::Elevated => 1,
            BpRisk::High | BpRisk::Crisis => 2,
        }
    }
}

/// One blood pressure reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureReading {
    pub timestamp: NaiveDateTime,
    pub systolic: f64,
    pub diastolic: f64,
    pub risk: BpRisk,
    /// True when the risk label came from the record rather than thresholds
    pub risk_supplied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systolic_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diastolic_type: Option<String>,
    pub time_known: bool,
}

impl TimedEntry for BloodPressureReading {
    fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

// ---------------------------------------------------------------------------
// Exercise
// ---------------------------------------------------------------------------

/// Fixed exercise buckets, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseBucket {
    Walking,
    Swimming,
    Running,
    Biking,
    MuscleStrengthening,
    Balance,
    Other,
}

impl ExerciseBucket {
    pub const ALL: [ExerciseBucket; 7] = [
        ExerciseBucket::Walking,
        ExerciseBucket::Swimming,
        ExerciseBucket::Running,
        ExerciseBucket::Biking,
        ExerciseBucket::MuscleStrengthening,
        ExerciseBucket::Balance,
        ExerciseBucket::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseBucket::Walking => "walking",
            ExerciseBucket::Swimming => "swimming",
            ExerciseBucket::Running => "running",
            ExerciseBucket::Biking => "biking",
            ExerciseBucket::MuscleStrengthening => "muscle-strengthening",
            ExerciseBucket::Balance => "balance",
            ExerciseBucket::Other => "other",
        }
    }

    /// Substring dispatch. The first matching bucket wins, so
    /// "walking then running" lands in walking.
    pub fn classify(activity: &str) -> Self {
        let lowered = activity.to_lowercase();
        if lowered.contains("walk") {
            ExerciseBucket::Walking
        } else if lowered.contains("swim") {
            ExerciseBucket::Swimming
        } else if lowered.contains("run") {
            ExerciseBucket::Running
        } else if lowered.contains("bik") || lowered.contains("cycl") {
            ExerciseBucket::Biking
        } else if lowered.contains("strength") {
            ExerciseBucket::MuscleStrengthening
        } else if lowered.contains("balance") {
            ExerciseBucket::Balance
        } else {
            ExerciseBucket::Other
        }
    }
}

/// Minutes per exercise bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMinutes {
    pub walking: f64,
    pub swimming: f64,
    pub running: f64,
    pub biking: f64,
    #[serde(rename = "muscle_strengthening")]
    pub muscle_strengthening: f64,
    pub balance: f64,
    pub other: f64,
}

impl ExerciseMinutes {
    pub fn get(&self, bucket: ExerciseBucket) -> f64 {
        match bucket {
            ExerciseBucket::Walking => self.walking,
            ExerciseBucket::Swimming => self.swimming,
            ExerciseBucket::Running => self.running,
            ExerciseBucket::Biking => self.biking,
            ExerciseBucket::MuscleStrengthening => self.muscle_strengthening,
            ExerciseBucket::Balance => self.balance,
            ExerciseBucket::Other => self.other,
        }
    }

    fn slot_mut(&mut self, bucket: ExerciseBucket) -> &mut f64 {
        match bucket {
            ExerciseBucket::Walking => &mut self.walking,
            ExerciseBucket::Swimming => &mut self.swimming,
            ExerciseBucket::Running => &mut self.running,
            ExerciseBucket::Biking => &mut self.biking,
            ExerciseBucket::MuscleStrengthening => &mut self.muscle_strengthening,
            ExerciseBucket::Balance => &mut self.balance,
            ExerciseBucket::Other => &mut self.other,
        }
    }

    pub fn sum(&self) -> f64 {
        ExerciseBucket::ALL.iter().map(|b| self.get(*b)).sum()
    }
}

/// Exercise accumulated over one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDay {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub minutes: ExerciseMinutes,
    pub total_minutes: f64,
}

impl ExerciseDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            minutes: ExerciseMinutes::default(),
            total_minutes: 0.0,
        }
    }

    /// Add minutes to a bucket; the total is recomputed from the buckets
    pub fn add(&mut self, bucket: ExerciseBucket, minutes: f64) {
        *self.minutes.slot_mut(bucket) += minutes;
        self.total_minutes = self.minutes.sum();
    }
}

impl TimedEntry for ExerciseDay {
    fn timestamp(&self) -> NaiveDateTime {
        start_of(self.date)
    }
}

// ---------------------------------------------------------------------------
// Mood, pain, sleep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
}

impl Mood {
    pub const ALL: [Mood; 3] = [Mood::Happy, Mood::Sad, Mood::Angry];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "happy" => Some(Mood::Happy),
            "sad" => Some(Mood::Sad),
            "angry" => Some(Mood::Angry),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub date: NaiveDate,
    pub mood: Mood,
}

impl TimedEntry for MoodEntry {
    fn timestamp(&self) -> NaiveDateTime {
        start_of(self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PainEntry {
    pub date: NaiveDate,
    /// Lower-cased body location
    pub location: String,
    /// 0 (none) to 10 (worst)
    pub intensity: u8,
}

impl TimedEntry for PainEntry {
    fn timestamp(&self) -> NaiveDateTime {
        start_of(self.date)
    }
}

/// Sleep quality, best first. The discriminant is the scoring code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SleepQuality {
    #[serde(rename = "Very good")]
    VeryGood = 0,
    #[serde(rename = "Fairly good")]
    FairlyGood = 1,
    #[serde(rename = "Fairly bad")]
    FairlyBad = 2,
    #[serde(rename = "Very bad")]
    VeryBad = 3,
}

impl SleepQuality {
    pub const ALL: [SleepQuality; 4] = [
        SleepQuality::VeryGood,
        SleepQuality::FairlyGood,
        SleepQuality::FairlyBad,
        SleepQuality::VeryBad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SleepQuality::VeryGood => "Very good",
            SleepQuality::FairlyGood => "Fairly good",
            SleepQuality::FairlyBad => "Fairly bad",
            SleepQuality::VeryBad => "Very bad",
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SleepQuality::VeryGood),
            1 => Some(SleepQuality::FairlyGood),
            2 => Some(SleepQuality::FairlyBad),
            3 => Some(SleepQuality::VeryBad),
            _ => None,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match normalize_label(raw).as_str() {
            "very good" => Some(SleepQuality::VeryGood),
            "fairly good" => Some(SleepQuality::FairlyGood),
            "fairly bad" => Some(SleepQuality::FairlyBad),
            "very bad" => Some(SleepQuality::VeryBad),
            _ => None,
        }
    }

    /// Nearest label for an averaged 0-3 score (halves round toward worse)
    pub fn from_score(score: f64) -> Self {
        let code = score.round().clamp(0.0, 3.0) as i64;
        Self::from_code(code).unwrap_or(SleepQuality::VeryBad)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepNight {
    pub date: NaiveDate,
    pub hours: f64,
    pub quality: SleepQuality,
    pub quality_code: u8,
}

impl TimedEntry for SleepNight {
    fn timestamp(&self) -> NaiveDateTime {
        start_of(self.date)
    }
}

// ---------------------------------------------------------------------------
// Meals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
    #[serde(rename = "Late Night Snack")]
    LateNightSnack,
}

impl MealSlot {
    pub const ALL: [MealSlot; 4] = [
        MealSlot::Breakfast,
        MealSlot::Lunch,
        MealSlot::Dinner,
        MealSlot::LateNightSnack,
    ];

    /// Column prefix in raw records
    pub fn prefix(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::LateNightSnack => "Late_Night_Snack",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
            MealSlot::LateNightSnack => "Late Night Snack",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FoodCategory {
    Protein,
    Carbohydrates,
    Vegetables,
    Fruit,
    Alcohol,
}

impl FoodCategory {
    pub const ALL: [FoodCategory; 5] = [
        FoodCategory::Protein,
        FoodCategory::Carbohydrates,
        FoodCategory::Vegetables,
        FoodCategory::Fruit,
        FoodCategory::Alcohol,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Protein => "Protein",
            FoodCategory::Carbohydrates => "Carbohydrates",
            FoodCategory::Vegetables => "Vegetables",
            FoodCategory::Fruit => "Fruit",
            FoodCategory::Alcohol => "Alcohol",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodFlags {
    pub protein: bool,
    pub carbohydrates: bool,
    pub vegetables: bool,
    pub fruit: bool,
    pub alcohol: bool,
}

impl FoodFlags {
    pub fn get(&self, category: FoodCategory) -> bool {
        match category {
            FoodCategory::Protein => self.protein,
            FoodCategory::Carbohydrates => self.carbohydrates,
            FoodCategory::Vegetables => self.vegetables,
            FoodCategory::Fruit => self.fruit,
            FoodCategory::Alcohol => self.alcohol,
        }
    }

    pub fn set(&mut self, category: FoodCategory, present: bool) {
        match category {
            FoodCategory::Protein => self.protein = present,
            FoodCategory::Carbohydrates => self.carbohydrates = present,
            FoodCategory::Vegetables => self.vegetables = present,
            FoodCategory::Fruit => self.fruit = present,
            FoodCategory::Alcohol => self.alcohol = present,
        }
    }

    pub fn any(&self) -> bool {
        FoodCategory::ALL.iter().any(|c| self.get(*c))
    }
}

/// Added sugar per meal, ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddedSugar {
    #[serde(rename = "0-20g")]
    UpTo20g,
    #[serde(rename = "20-40g")]
    From20To40g,
    #[serde(rename = "40-60g")]
    From40To60g,
    #[serde(rename = "60g+")]
    Over60g,
}

impl AddedSugar {
    pub const ALL: [AddedSugar; 4] = [
        AddedSugar::UpTo20g,
        AddedSugar::From20To40g,
        AddedSugar::From40To60g,
        AddedSugar::Over60g,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AddedSugar::UpTo20g => "0-20g",
            AddedSugar::From20To40g => "20-40g",
            AddedSugar::From40To60g => "40-60g",
            AddedSugar::Over60g => "60g+",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let compact: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "0-20g" | "1-20g" => Some(AddedSugar::UpTo20g),
            "20-40g" => Some(AddedSugar::From20To40g),
            "40-60g" => Some(AddedSugar::From40To60g),
            "60g+" | "60+g" | ">60g" => Some(AddedSugar::Over60g),
            _ => None,
        }
    }
}

/// One meal slot on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub slot: MealSlot,
    pub time: Option<NaiveTime>,
    pub foods: FoodFlags,
    pub added_sugar: Option<AddedSugar>,
}

impl Meal {
    pub fn has_content(&self) -> bool {
        self.foods.any() || self.added_sugar.is_some()
    }

    /// Logged means a time was recorded and something was eaten
    pub fn is_logged(&self) -> bool {
        self.time.is_some() && self.has_content()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealDay {
    pub date: NaiveDate,
    pub meals: Vec<Meal>,
}

impl MealDay {
    pub fn logged_meals(&self) -> impl Iterator<Item = &Meal> {
        self.meals.iter().filter(|m| m.is_logged())
    }
}

impl TimedEntry for MealDay {
    fn timestamp(&self) -> NaiveDateTime {
        start_of(self.date)
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: String,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub medications: Vec<Medication>,
    pub conditions: BTreeSet<String>,
}
