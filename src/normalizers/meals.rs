//! Meal normalizer
//!
//! Columns are `<Slot>_Time`, `<Slot>_<Category>` presence flags and
//! `<Slot>_Added_Sugar`, with slot prefixes `Breakfast`, `Lunch`, `Dinner`
//! and `Late_Night_Snack`.

use crate::config::EngineConfig;
use crate::schema::field::{parse_flag, parse_time};
use crate::schema::{Metric, RawRecord};
use crate::types::{AddedSugar, FoodCategory, FoodFlags, Meal, MealDay, MealSlot};

use super::{DatedRecord, MetricNormalizer};

pub struct MealNormalizer;

impl MetricNormalizer for MealNormalizer {
    type Entry = MealDay;

    fn metric(&self) -> Metric {
        Metric::Meals
    }

    fn normalize(&self, records: &[DatedRecord<'_>], _config: &EngineConfig) -> Vec<MealDay> {
        let mut days: Vec<MealDay> = records
            .iter()
            .filter_map(|dated| {
                let meals: Vec<Meal> = MealSlot::ALL
                    .iter()
                    .map(|slot| parse_meal(dated.record, *slot))
                    .filter(|meal| meal.time.is_some() || meal.has_content())
                    .collect();

                let day = MealDay {
                    date: dated.date,
                    meals,
                };
                // Kept only when some slot has both a time and something eaten
                if day.logged_meals().next().is_some() {
                    Some(day)
                } else {
                    None
                }
            })
            .collect();

        days.sort_by_key(|d| d.date);
        days
    }
}

fn parse_meal(record: &RawRecord, slot: MealSlot) -> Meal {
    let prefix = slot.prefix();

    let mut foods = FoodFlags::default();
    for category in FoodCategory::ALL {
        let present = record
            .text(&format!("{prefix}_{}", category.as_str()))
            .is_some_and(|v| parse_flag(&v));
        foods.set(category, present);
    }

    Meal {
        slot,
        time: record
            .text(&format!("{prefix}_Time"))
            .and_then(|t| parse_time(&t)),
        foods,
        added_sugar: record
            .text(&format!("{prefix}_Added_Sugar"))
            .and_then(|s| AddedSugar::parse(&s)),
    }
}
