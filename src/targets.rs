//! Daily calorie and protein targets.
//!
//! BMR uses Mifflin-St Jeor with the +5 constant applied to everyone and no
//! sex term. TDEE is BMR times the activity multiplier, and the calorie
//! target sits 400 kcal above or below TDEE depending on goal direction.
//! Protein is a flat 1 g per lb of goal body weight.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};
use crate::models::{ActivityLevel, GoalType, UserProfile, WeightLogEntry};

const KG_PER_LB: f64 = 0.453592;
const CM_PER_INCH: f64 = 2.54;
/// kcal added (gain) or removed (lose) relative to TDEE
const GOAL_ADJUSTMENT_KCAL: f64 = 400.0;

pub const STARTING_WEIGHT_NOTE: &str = "Starting weight";

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

/// Body metrics the targets are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetInputs {
    /// lb
    pub current_weight: f64,
    pub height_inches: f64,
    pub age: u32,
    pub activity_level: ActivityLevel,
    pub goal_type: GoalType,
    /// lb
    pub goal_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targets {
    /// kcal/day
    pub calorie_target: i64,
    /// g/day
    pub protein_target: i64,
}

/// Basal metabolic rate in kcal/day.
pub fn basal_metabolic_rate(weight_lb: f64, height_inches: f64, age: u32) -> f64 {
    let weight_kg = weight_lb * KG_PER_LB;
    let height_cm = height_inches * CM_PER_INCH;
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + 5.0
}

/// Compute daily calorie and protein targets.
///
/// # Errors
///
/// Returns `InvalidInput` if a weight, the height or the age is not positive.
pub fn calculate_targets(inputs: &TargetInputs) -> Result<Targets> {
    ensure_positive("current_weight", inputs.current_weight)?;
    ensure_positive("height_inches", inputs.height_inches)?;
    ensure_positive("goal_weight", inputs.goal_weight)?;
    if inputs.age == 0 {
        return Err(Error::invalid_input("age must be positive"));
    }

    let bmr = basal_metabolic_rate(inputs.current_weight, inputs.height_inches, inputs.age);
    let tdee = bmr * inputs.activity_level.multiplier();

    let calorie_target = match inputs.goal_type {
        GoalType::Gain => (tdee + GOAL_ADJUSTMENT_KCAL).round(),
        GoalType::Lose => (tdee - GOAL_ADJUSTMENT_KCAL).round(),
    };

    Ok(Targets {
        calorie_target: calorie_target as i64,
        protein_target: inputs.goal_weight.round() as i64,
    })
}

/// Everything collected by the onboarding flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileInputs {
    pub goal_type: GoalType,
    pub sport: String,
    pub current_weight: f64,
    pub goal_weight: f64,
    pub goal_deadline: NaiveDate,
    pub height_inches: f64,
    pub age: u32,
    pub activity_level: ActivityLevel,
}

/// Fields a user may change from the profile screen. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileEdit {
    pub goal_type: Option<GoalType>,
    pub sport: Option<String>,
    pub current_weight: Option<f64>,
    pub goal_weight: Option<f64>,
    pub goal_deadline: Option<NaiveDate>,
    pub height_inches: Option<f64>,
    pub age: Option<u32>,
    pub activity_level: Option<ActivityLevel>,
}

impl UserProfile {
    pub fn target_inputs(&self) -> TargetInputs {
        TargetInputs {
            current_weight: self.current_weight,
            height_inches: self.height_inches,
            age: self.age,
            activity_level: self.activity_level,
            goal_type: self.goal_type,
            goal_weight: self.goal_weight,
        }
    }

    /// Build the profile created at the end of onboarding, together with the
    /// seeded starting-weight log entry dated `today`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the deadline is not after `today` or the
    /// body metrics are not positive.
    pub fn onboard(
        user_id: impl Into<String>,
        inputs: ProfileInputs,
        today: NaiveDate,
    ) -> Result<(UserProfile, WeightLogEntry)> {
        if inputs.goal_deadline <= today {
            return Err(Error::invalid_input(format!(
                "goal deadline {} must be after {}",
                inputs.goal_deadline, today
            )));
        }
        let user_id = user_id.into();

        let mut profile = UserProfile {
            id: None,
            user_id: user_id.clone(),
            goal_type: inputs.goal_type,
            sport: inputs.sport,
            current_weight: inputs.current_weight,
            goal_weight: inputs.goal_weight,
            height_inches: inputs.height_inches,
            age: inputs.age,
            activity_level: inputs.activity_level,
            goal_deadline: inputs.goal_deadline,
            daily_calorie_target: 0,
            daily_protein_target: 0,
            onboarding_complete: true,
        };
        profile.recompute_targets()?;

        let seed = WeightLogEntry::new(
            user_id,
            profile.current_weight,
            today,
            Some(STARTING_WEIGHT_NOTE.to_string()),
        )?;

        Ok((profile, seed))
    }

    /// Apply an edit and overwrite both targets with a fresh computation.
    /// On error the profile is left untouched.
    pub fn apply_edit(&mut self, edit: ProfileEdit) -> Result<()> {
        let mut next = self.clone();
        if let Some(goal_type) = edit.goal_type {
            next.goal_type = goal_type;
        }
        if let Some(sport) = edit.sport {
            next.sport = sport;
        }
        if let Some(w) = edit.current_weight {
            next.current_weight = w;
        }
        if let Some(w) = edit.goal_weight {
            next.goal_weight = w;
        }
        if let Some(deadline) = edit.goal_deadline {
            next.goal_deadline = deadline;
        }
        if let Some(h) = edit.height_inches {
            next.height_inches = h;
        }
        if let Some(age) = edit.age {
            next.age = age;
        }
        if let Some(level) = edit.activity_level {
            next.activity_level = level;
        }

        next.recompute_targets()?;
        *self = next;
        Ok(())
    }

    fn recompute_targets(&mut self) -> Result<()> {
        let targets = calculate_targets(&self.target_inputs())?;
        self.daily_calorie_target = targets.calorie_target;
        self.daily_protein_target = targets.protein_target;
        Ok(())
    }
}
