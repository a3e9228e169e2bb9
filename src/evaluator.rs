//! Engagement streaks, weight trajectory and goal pacing.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Result};
use crate::models::{MealLogEntry, WeightLogEntry, WorkoutLogEntry};

/// Days scanned backward when computing a streak.
const STREAK_LOOKBACK_DAYS: i64 = 365;
/// Healthy weekly weight change in lb/week, inclusive on both ends.
const HEALTHY_RATE_MIN: f64 = 0.3;
const HEALTHY_RATE_MAX: f64 = 1.5;

/// Offered on the deadline step of onboarding: (weeks out, label).
const SUGGESTED_DEADLINE_WEEKS: [(u32, &str); 4] = [
    (8, "8 weeks"),
    (12, "12 weeks"),
    (16, "16 weeks"),
    (24, "6 months"),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// `current - start`; positive means weight was gained
    pub change_so_far: f64,
    pub remaining_to_goal: f64,
    /// 0..=100
    pub percent_complete: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceCheck {
    pub weight_diff: f64,
    /// Whole weeks from today to the deadline
    pub weeks_to_goal: i64,
    /// lb/week, one decimal
    pub weekly_rate: f64,
    pub healthy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedDeadline {
    pub weeks: u32,
    pub label: String,
    pub deadline: NaiveDate,
}

/// Count consecutive logged days walking backward from `today`.
///
/// A day counts when it has at least one meal or workout. A missing entry
/// for `today` itself does not end the scan; the first gap on any earlier
/// day does.
pub fn calculate_streak(
    meals: &[MealLogEntry],
    workouts: &[WorkoutLogEntry],
    today: NaiveDate,
) -> u32 {
    let logged: HashSet<NaiveDate> = meals
        .iter()
        .map(|m| m.date)
        .chain(workouts.iter().map(|w| w.date))
        .collect();

    let mut streak = 0;
    for i in 0..STREAK_LOOKBACK_DAYS {
        let Some(day) = today.checked_sub_signed(Duration::days(i)) else {
            break;
        };
        if logged.contains(&day) {
            streak += 1;
        } else if i > 0 {
            break;
        }
    }
    streak
}

/// Progress from `start_weight` toward `goal_weight`.
///
/// `percent_complete` measures distance moved, not direction, so moving
/// away from the goal also raises it.
///
/// # Errors
///
/// Returns `InvalidInput` if any weight is not positive.
pub fn trajectory(start_weight: f64, goal_weight: f64, current_weight: f64) -> Result<Trajectory> {
    ensure_positive("start_weight", start_weight)?;
    ensure_positive("goal_weight", goal_weight)?;
    ensure_positive("current_weight", current_weight)?;

    let change_so_far = current_weight - start_weight;
    let remaining_to_goal = (goal_weight - current_weight).abs();
    let total_journey = (goal_weight - start_weight).abs();

    let percent_complete = if total_journey > 0.0 {
        (change_so_far.abs() / total_journey * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    Ok(Trajectory {
        change_so_far,
        remaining_to_goal,
        percent_complete,
    })
}

pub fn is_healthy_rate(weekly_rate: f64) -> bool {
    (HEALTHY_RATE_MIN..=HEALTHY_RATE_MAX).contains(&weekly_rate)
}

/// lb/week needed to cover `weight_diff` in `weeks_to_goal`, rounded to one
/// decimal. Zero when there is no time left.
pub fn weekly_rate(weight_diff: f64, weeks_to_goal: i64) -> f64 {
    if weeks_to_goal <= 0 {
        return 0.0;
    }
    (weight_diff / weeks_to_goal as f64 * 10.0).round() / 10.0
}

/// Whether reaching `goal_weight` by `deadline` is a healthy pace.
/// Deadlines today or in the past are never healthy.
///
/// # Errors
///
/// Returns `InvalidInput` if either weight is not positive.
pub fn pace_check(
    current_weight: f64,
    goal_weight: f64,
    today: NaiveDate,
    deadline: NaiveDate,
) -> Result<PaceCheck> {
    ensure_positive("current_weight", current_weight)?;
    ensure_positive("goal_weight", goal_weight)?;

    let weight_diff = (goal_weight - current_weight).abs();
    // integer division truncates toward zero, so partial weeks are dropped
    let weeks_to_goal = (deadline - today).num_days() / 7;
    let rate = weekly_rate(weight_diff, weeks_to_goal);

    Ok(PaceCheck {
        weight_diff,
        weeks_to_goal,
        weekly_rate: rate,
        healthy: is_healthy_rate(rate),
    })
}

/// Most recent logged weight, or `fallback` when nothing is logged.
/// Among entries on the same date the later one wins.
pub fn latest_weight(logs: &[WeightLogEntry], fallback: f64) -> f64 {
    logs.iter()
        .fold(None::<&WeightLogEntry>, |best, w| match best {
            Some(b) if b.date > w.date => Some(b),
            _ => Some(w),
        })
        .map_or(fallback, |w| w.weight)
}

pub fn suggested_deadlines(today: NaiveDate) -> Vec<SuggestedDeadline> {
    SUGGESTED_DEADLINE_WEEKS
        .iter()
        .map(|(weeks, label)| SuggestedDeadline {
            weeks: *weeks,
            label: label.to_string(),
            deadline: today + Duration::weeks(i64::from(*weeks)),
        })
        .collect()
}
