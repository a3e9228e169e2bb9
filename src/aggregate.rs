//! Day- and range-level rollups over already-fetched logs.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Dated, Macros, MealLogEntry, MealType, WeightLogEntry, WorkoutLogEntry};

/// One day of the weekly workout chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWorkout {
    pub date: NaiveDate,
    /// Short weekday name, e.g. "Mon"
    pub day: String,
    pub minutes: f64,
    pub calories: f64,
}

/// One day of the calorie trend chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCalories {
    pub date: NaiveDate,
    /// e.g. "10/3"
    pub label: String,
    pub calories: f64,
    pub target: i64,
}

/// Totals over every log passed in. The client feeds the full history, so
/// these are all-time numbers on the profile and progress screens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub total_workouts: usize,
    pub total_workout_minutes: f64,
    pub total_calories_burned: f64,
    pub total_meals_logged: usize,
    pub total_calories_logged: f64,
}

pub fn daily_meal_totals(meals: &[MealLogEntry]) -> Macros {
    meals.iter().fold(Macros::default(), |acc, m| Macros {
        calories: acc.calories + m.calories,
        protein: acc.protein + m.protein,
        carbs: acc.carbs + m.carbs,
        fat: acc.fat + m.fat,
    })
}

pub fn daily_workout_calories(workouts: &[WorkoutLogEntry]) -> f64 {
    workouts.iter().map(|w| w.calories_burned).sum()
}

/// `consumed / target * 100`, or 0 when there is no positive target.
/// Not capped; values over 100 mean the target was exceeded.
pub fn calorie_progress_percent(consumed: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    consumed / target * 100.0
}

/// Like [`calorie_progress_percent`] but capped at 100, for macro bars.
pub fn macro_progress_percent(current: f64, target: f64) -> f64 {
    calorie_progress_percent(current, target).min(100.0)
}

/// Sum `field` over entries dated within the last `window_days` days
/// (inclusive of `today`) and divide by the window length, rounded.
///
/// Days without entries count as zero, so sparse logging lowers the average.
///
/// # Errors
///
/// Returns `InvalidInput` if `window_days` is zero or reaches back past the
/// earliest representable date.
pub fn average_over_days<T, F>(
    entries: &[T],
    today: NaiveDate,
    window_days: u32,
    field: F,
) -> Result<i64>
where
    T: Dated,
    F: Fn(&T) -> f64,
{
    if window_days == 0 {
        return Err(Error::invalid_input("window_days must be positive"));
    }
    let start = window_start(today, window_days)?;

    let total: f64 = entries
        .iter()
        .filter(|e| {
            let date = e.date();
            date >= start && date <= today
        })
        .map(&field)
        .sum();

    Ok((total / f64::from(window_days)).round() as i64)
}

/// Minutes and calories per day for the seven days ending at `reference`,
/// oldest first.
///
/// # Errors
///
/// Returns `InvalidInput` if the week starts before the earliest
/// representable date.
pub fn weekly_series(
    workouts: &[WorkoutLogEntry],
    reference: NaiveDate,
) -> Result<Vec<DailyWorkout>> {
    let start = window_start(reference, 7)?;
    Ok(start
        .iter_days()
        .take(7)
        .map(|date| {
            let (minutes, calories) = workouts
                .iter()
                .filter(|w| w.date == date)
                .fold((0.0, 0.0), |(m, c), w| {
                    (m + w.duration_minutes, c + w.calories_burned)
                });
            DailyWorkout {
                date,
                day: date.format("%a").to_string(),
                minutes,
                calories,
            }
        })
        .collect())
}

/// Calories eaten per day for the `days` days ending at `reference`,
/// oldest first, with the daily target carried on each point.
///
/// # Errors
///
/// Returns `InvalidInput` if the range starts before the earliest
/// representable date.
pub fn calorie_trend(
    meals: &[MealLogEntry],
    reference: NaiveDate,
    days: u32,
    target: i64,
) -> Result<Vec<DailyCalories>> {
    if days == 0 {
        return Ok(Vec::new());
    }
    let start = window_start(reference, days)?;
    Ok(start
        .iter_days()
        .take(days as usize)
        .map(|date| {
            let calories = meals
                .iter()
                .filter(|m| m.date == date)
                .map(|m| m.calories)
                .sum();
            DailyCalories {
                date,
                label: date.format("%-m/%-d").to_string(),
                calories,
                target,
            }
        })
        .collect())
}

/// First day of the `days`-day window ending at `end`. `days` must be
/// positive.
fn window_start(end: NaiveDate, days: u32) -> Result<NaiveDate> {
    end.checked_sub_signed(Duration::days(i64::from(days) - 1))
        .ok_or_else(|| {
            Error::invalid_input(format!("{} days ending {} is out of range", days, end))
        })
}

/// Group meals by type. Every meal type has an entry, possibly empty.
pub fn meals_by_type(meals: &[MealLogEntry]) -> BTreeMap<MealType, Vec<&MealLogEntry>> {
    let mut groups: BTreeMap<MealType, Vec<&MealLogEntry>> =
        MealType::ALL.iter().map(|t| (*t, Vec::new())).collect();
    for meal in meals {
        groups.entry(meal.meal_type).or_default().push(meal);
    }
    groups
}

pub fn lifetime_stats(meals: &[MealLogEntry], workouts: &[WorkoutLogEntry]) -> LifetimeStats {
    LifetimeStats {
        total_workouts: workouts.len(),
        total_workout_minutes: workouts.iter().map(|w| w.duration_minutes).sum(),
        total_calories_burned: daily_workout_calories(workouts),
        total_meals_logged: meals.len(),
        total_calories_logged: meals.iter().map(|m| m.calories).sum(),
    }
}

/// Weight logs no more than `range_days` before `reference`, sorted by date.
pub fn weight_series(
    logs: &[WeightLogEntry],
    reference: NaiveDate,
    range_days: u32,
) -> Vec<&WeightLogEntry> {
    let mut series: Vec<&WeightLogEntry> = logs
        .iter()
        .filter(|w| (reference - w.date).num_days() <= i64::from(range_days))
        .collect();
    series.sort_by_key(|w| w.date);
    series
}

/// Days in `[start, end]` that have at least one workout.
pub fn workout_dates_in(
    workouts: &[WorkoutLogEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeSet<NaiveDate> {
    workouts
        .iter()
        .map(|w| w.date)
        .filter(|d| *d >= start && *d <= end)
        .collect()
}
