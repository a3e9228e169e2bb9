use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, ensure_positive, Error, Result};

/// Direction of the user's body-weight goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    Gain,
    Lose,
}

/// Training volume bucket used to scale BMR into TDEE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkoutType {
    Strength,
    Cardio,
    SportPractice,
    Flexibility,
    Hiit,
}

macro_rules! tag_strings {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($s => Ok($ty::$variant),)+
                    other => Err(Error::invalid_input(format!(
                        "unknown {} '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

tag_strings!(GoalType { Gain => "gain", Lose => "lose" });
tag_strings!(ActivityLevel {
    Moderate => "moderate",
    Active => "active",
    VeryActive => "very_active",
});
tag_strings!(MealType {
    Breakfast => "breakfast",
    Lunch => "lunch",
    Dinner => "dinner",
    Snack => "snack",
});
tag_strings!(WorkoutType {
    Strength => "strength",
    Cardio => "cardio",
    SportPractice => "sport_practice",
    Flexibility => "flexibility",
    Hiit => "hiit",
});

/// Calories (kcal) plus the three macros in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

impl Macros {
    pub fn new(calories: f64, protein: f64, carbs: f64, fat: f64) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
        }
    }

    /// Multiply every field by `servings` and round each to the nearest integer.
    pub fn scaled(&self, servings: f64) -> Self {
        Self {
            calories: (self.calories * servings).round(),
            protein: (self.protein * servings).round(),
            carbs: (self.carbs * servings).round(),
            fat: (self.fat * servings).round(),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure_non_negative("calories", self.calories)?;
        ensure_non_negative("protein", self.protein)?;
        ensure_non_negative("carbs", self.carbs)?;
        ensure_non_negative("fat", self.fat)
    }
}

/// Anything logged against a calendar day.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// The onboarded athlete. Targets are derived; see [`crate::targets`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub goal_type: GoalType,
    pub sport: String,
    /// Weight at onboarding (lb); the trajectory's starting point
    pub current_weight: f64,
    /// Goal weight (lb)
    pub goal_weight: f64,
    pub height_inches: f64,
    pub age: u32,
    pub activity_level: ActivityLevel,
    pub goal_deadline: NaiveDate,
    /// kcal/day
    pub daily_calorie_target: i64,
    /// g/day
    pub daily_protein_target: i64,
    #[serde(default)]
    pub onboarding_complete: bool,
}

/// A body-weight measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    /// Weight in lb
    pub weight: f64,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WeightLogEntry {
    pub fn new(
        user_id: impl Into<String>,
        weight: f64,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<Self> {
        ensure_positive("weight", weight)?;
        Ok(Self {
            id: None,
            user_id: user_id.into(),
            weight,
            date,
            notes,
        })
    }
}

/// A consumed food. Macros are totals for what was eaten, servings already applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub meal_type: MealType,
    pub food_name: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    pub date: NaiveDate,
}

impl MealLogEntry {
    pub fn new(
        user_id: impl Into<String>,
        meal_type: MealType,
        food_name: impl Into<String>,
        macros: Macros,
        date: NaiveDate,
    ) -> Result<Self> {
        macros.validate()?;
        Ok(Self {
            id: None,
            user_id: user_id.into(),
            meal_type,
            food_name: food_name.into(),
            calories: macros.calories,
            protein: macros.protein,
            carbs: macros.carbs,
            fat: macros.fat,
            date,
        })
    }

    pub fn macros(&self) -> Macros {
        Macros::new(self.calories, self.protein, self.carbs, self.fat)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutLogEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub workout_type: WorkoutType,
    #[serde(default)]
    pub duration_minutes: f64,
    #[serde(default)]
    pub calories_burned: f64,
    #[serde(default)]
    pub notes: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: bool,
}

impl WorkoutLogEntry {
    /// A completed workout. Zero-length sessions are rejected.
    pub fn new(
        user_id: impl Into<String>,
        workout_type: WorkoutType,
        duration_minutes: f64,
        calories_burned: f64,
        notes: impl Into<String>,
        date: NaiveDate,
    ) -> Result<Self> {
        ensure_positive("duration_minutes", duration_minutes)?;
        ensure_non_negative("calories_burned", calories_burned)?;
        Ok(Self {
            id: None,
            user_id: user_id.into(),
            workout_type,
            duration_minutes,
            calories_burned,
            notes: notes.into(),
            date,
            completed: true,
        })
    }
}

impl Dated for WeightLogEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for MealLogEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Dated for WorkoutLogEntry {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
