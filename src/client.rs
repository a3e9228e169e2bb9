use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::aggregate::{self, DailyCalories, DailyWorkout, LifetimeStats};
use crate::auth::{IdentityProvider, TokenIdentity};
use crate::config::ClientConfig;
use crate::estimate::{FoodEstimate, FoodItem, FoodRecognizer, ScanOutcome};
use crate::evaluator::{self, Trajectory};
use crate::models::*;
use crate::store::{Collection, HttpRecordStore, Query, RecordStore};
use crate::targets::{ProfileEdit, ProfileInputs};

/// Most recent records fetched for history views. Reports read the full
/// history.
const MEAL_HISTORY_LIMIT: u32 = 500;
const WORKOUT_HISTORY_LIMIT: u32 = 500;
const WEIGHT_HISTORY_LIMIT: u32 = 100;
/// Days covered by the weekly averages and the calorie trend chart.
const AVERAGE_WINDOW_DAYS: u32 = 7;
const CALORIE_TREND_DAYS: u32 = 14;

/// Today's numbers for the home screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub date: NaiveDate,
    pub totals: Macros,
    pub workout_calories: f64,
    pub calorie_target: i64,
    pub protein_target: i64,
    /// Uncapped
    pub calorie_percent: f64,
    /// Capped at 100
    pub protein_percent: f64,
    pub latest_weight: f64,
    pub trajectory: Trajectory,
}

/// Everything the progress screen charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub date: NaiveDate,
    pub weights: Vec<WeightLogEntry>,
    pub trajectory: Trajectory,
    pub avg_calories: i64,
    pub avg_protein: i64,
    pub weekly_workouts: Vec<DailyWorkout>,
    pub calorie_trend: Vec<DailyCalories>,
    pub stats: LifetimeStats,
    pub streak_days: u32,
}

/// Logging and reporting on top of a record store, scoped to one user.
#[derive(Clone)]
pub struct AthleteClient<S> {
    pub store: S,
    identity: Arc<dyn IdentityProvider>,
}

impl AthleteClient<HttpRecordStore> {
    /// Connect to the hosted backend using the session token in `config`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .ok_or_else(|| anyhow!("A session token is required"))?;
        let identity: Arc<dyn IdentityProvider> = Arc::new(TokenIdentity::new(token));
        let store = HttpRecordStore::new(config, identity.clone());
        Ok(Self { store, identity })
    }
}

impl<S: RecordStore> AthleteClient<S> {
    pub fn new(store: S, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { store, identity }
    }

    pub async fn user_id(&self) -> Result<String> {
        self.identity.user_id().await
    }

    async fn list<T: DeserializeOwned>(
        &self,
        collection: Collection,
        query: Query,
    ) -> Result<Vec<T>> {
        let uid = self.user_id().await?;
        let query = query.eq("user_id", uid);
        debug!(%collection, filter = ?query.filter, "fetching records");
        let records = self.store.list(collection, &query).await?;
        from_records(records)
    }

    /// Fail unless record `id` in `collection` belongs to the signed-in user.
    async fn ensure_owned(&self, collection: Collection, id: &str) -> Result<()> {
        let owned: Vec<Value> = self.list(collection, Query::new().eq("id", id)).await?;
        if owned.is_empty() {
            return Err(anyhow!("No {} record {} for this user", collection, id));
        }
        Ok(())
    }

    async fn create<T: Serialize + DeserializeOwned>(
        &self,
        collection: Collection,
        record: &T,
    ) -> Result<T> {
        let created = self.store.create(collection, to_record(record)?).await?;
        info!(%collection, id = ?created.get("id"), "created record");
        Ok(serde_json::from_value(created)?)
    }

    /// The signed-in user's profile, or `None` before onboarding.
    pub async fn get_profile(&self) -> Result<Option<UserProfile>> {
        let profiles: Vec<UserProfile> = self.list(Collection::UserProfile, Query::new()).await?;
        Ok(profiles.into_iter().next())
    }

    async fn require_profile(&self) -> Result<UserProfile> {
        self.get_profile()
            .await?
            .ok_or_else(|| anyhow!("No profile found; complete onboarding first"))
    }

    /// Create the profile with computed targets and seed the starting weight.
    pub async fn complete_onboarding(
        &self,
        inputs: ProfileInputs,
        today: NaiveDate,
    ) -> Result<UserProfile> {
        let uid = self.user_id().await?;
        if self.get_profile().await?.is_some() {
            return Err(anyhow!("Profile already exists for {}", uid));
        }

        let (profile, starting_weight) = UserProfile::onboard(uid, inputs, today)?;
        let profile = self.create(Collection::UserProfile, &profile).await?;
        self.create(Collection::WeightLog, &starting_weight).await?;

        info!(
            calorie_target = profile.daily_calorie_target,
            protein_target = profile.daily_protein_target,
            "onboarding complete"
        );
        Ok(profile)
    }

    /// Apply an edit and persist the recomputed targets.
    pub async fn update_profile(&self, edit: ProfileEdit) -> Result<UserProfile> {
        let mut profile = self.require_profile().await?;
        let id = profile
            .id
            .clone()
            .ok_or_else(|| anyhow!("Stored profile has no id"))?;

        profile.apply_edit(edit)?;
        let updated = self
            .store
            .update(Collection::UserProfile, &id, to_record(&profile)?)
            .await?;

        info!(
            calorie_target = profile.daily_calorie_target,
            protein_target = profile.daily_protein_target,
            "profile targets recomputed"
        );
        Ok(serde_json::from_value(updated)?)
    }

    pub async fn log_meal(
        &self,
        meal_type: MealType,
        food_name: &str,
        macros: Macros,
        date: NaiveDate,
    ) -> Result<MealLogEntry> {
        let uid = self.user_id().await?;
        let meal = MealLogEntry::new(uid, meal_type, food_name, macros, date)?;
        self.create(Collection::MealLog, &meal).await
    }

    /// Log `servings` of a food database item.
    pub async fn log_food_item(
        &self,
        item: &FoodItem,
        servings: f64,
        meal_type: MealType,
        date: NaiveDate,
    ) -> Result<MealLogEntry> {
        let uid = self.user_id().await?;
        let meal = item.to_meal(&uid, servings, meal_type, date)?;
        self.create(Collection::MealLog, &meal).await
    }

    /// Ask the recognizer about a photo. Nothing is logged here.
    pub async fn scan_food(&self, recognizer: &dyn FoodRecognizer, image_url: &str) -> ScanOutcome {
        match recognizer.recognize(image_url).await {
            Ok(estimate) => {
                let outcome = ScanOutcome::from_estimate(estimate);
                if let ScanOutcome::NotFood(ref estimate) = outcome {
                    warn!(food_name = %estimate.food_name, "photo was not recognized as food");
                }
                outcome
            }
            Err(e) => {
                warn!(error = %e, "food analysis failed");
                ScanOutcome::Failed(e.to_string())
            }
        }
    }

    /// Log a recognized estimate scaled by `servings`.
    pub async fn log_estimate(
        &self,
        estimate: &FoodEstimate,
        servings: f64,
        meal_type: MealType,
        date: NaiveDate,
    ) -> Result<MealLogEntry> {
        let uid = self.user_id().await?;
        let meal = estimate.to_meal(&uid, servings, meal_type, date)?;
        self.create(Collection::MealLog, &meal).await
    }

    pub async fn log_workout(
        &self,
        workout_type: WorkoutType,
        duration_minutes: f64,
        calories_burned: f64,
        notes: &str,
        date: NaiveDate,
    ) -> Result<WorkoutLogEntry> {
        let uid = self.user_id().await?;
        let workout = WorkoutLogEntry::new(
            uid,
            workout_type,
            duration_minutes,
            calories_burned,
            notes,
            date,
        )?;
        self.create(Collection::WorkoutLog, &workout).await
    }

    pub async fn log_weight(
        &self,
        weight: f64,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<WeightLogEntry> {
        let uid = self.user_id().await?;
        let entry = WeightLogEntry::new(uid, weight, date, notes)?;
        self.create(Collection::WeightLog, &entry).await
    }

    /// Delete one of the signed-in user's meals.
    pub async fn delete_meal(&self, id: &str) -> Result<()> {
        self.ensure_owned(Collection::MealLog, id).await?;
        self.store.delete(Collection::MealLog, id).await?;
        info!(id, "deleted meal");
        Ok(())
    }

    pub async fn delete_workout(&self, id: &str) -> Result<()> {
        self.ensure_owned(Collection::WorkoutLog, id).await?;
        self.store.delete(Collection::WorkoutLog, id).await?;
        info!(id, "deleted workout");
        Ok(())
    }

    pub async fn meals_on(&self, date: NaiveDate) -> Result<Vec<MealLogEntry>> {
        self.list(Collection::MealLog, Query::new().eq("date", date.to_string()))
            .await
    }

    pub async fn workouts_on(&self, date: NaiveDate) -> Result<Vec<WorkoutLogEntry>> {
        self.list(Collection::WorkoutLog, Query::new().eq("date", date.to_string()))
            .await
    }

    /// The most recent weight logs, oldest first.
    pub async fn weight_history(&self) -> Result<Vec<WeightLogEntry>> {
        let mut logs: Vec<WeightLogEntry> = self
            .list(
                Collection::WeightLog,
                Query::new().sort("-date").limit(WEIGHT_HISTORY_LIMIT),
            )
            .await?;
        // stable, so same-day entries keep the store's order
        logs.sort_by_key(|w| w.date);
        Ok(logs)
    }

    /// Most recent meals, newest first.
    pub async fn meal_history(&self) -> Result<Vec<MealLogEntry>> {
        self.list(
            Collection::MealLog,
            Query::new().sort("-date").limit(MEAL_HISTORY_LIMIT),
        )
        .await
    }

    /// Most recent workouts, newest first.
    pub async fn workout_history(&self) -> Result<Vec<WorkoutLogEntry>> {
        self.list(
            Collection::WorkoutLog,
            Query::new().sort("-date").limit(WORKOUT_HISTORY_LIMIT),
        )
        .await
    }

    async fn all_meals(&self) -> Result<Vec<MealLogEntry>> {
        self.list(Collection::MealLog, Query::new()).await
    }

    async fn all_workouts(&self) -> Result<Vec<WorkoutLogEntry>> {
        self.list(Collection::WorkoutLog, Query::new()).await
    }

    pub async fn dashboard(&self, today: NaiveDate) -> Result<Dashboard> {
        let profile = self.require_profile().await?;
        let meals = self.meals_on(today).await?;
        let workouts = self.workouts_on(today).await?;
        let weights = self.weight_history().await?;

        let totals = aggregate::daily_meal_totals(&meals);
        let latest_weight = evaluator::latest_weight(&weights, profile.current_weight);
        let trajectory =
            evaluator::trajectory(profile.current_weight, profile.goal_weight, latest_weight)?;

        Ok(Dashboard {
            date: today,
            totals,
            workout_calories: aggregate::daily_workout_calories(&workouts),
            calorie_target: profile.daily_calorie_target,
            protein_target: profile.daily_protein_target,
            calorie_percent: aggregate::calorie_progress_percent(
                totals.calories,
                profile.daily_calorie_target as f64,
            ),
            protein_percent: aggregate::macro_progress_percent(
                totals.protein,
                profile.daily_protein_target as f64,
            ),
            latest_weight,
            trajectory,
        })
    }

    /// Charts and stats for the progress screen; `range_days` bounds the
    /// weight chart.
    pub async fn progress_report(
        &self,
        today: NaiveDate,
        range_days: u32,
    ) -> Result<ProgressReport> {
        let profile = self.require_profile().await?;
        let weights = self.weight_history().await?;
        let meals = self.all_meals().await?;
        let workouts = self.all_workouts().await?;

        let latest_weight = evaluator::latest_weight(&weights, profile.current_weight);

        Ok(ProgressReport {
            date: today,
            weights: aggregate::weight_series(&weights, today, range_days)
                .into_iter()
                .cloned()
                .collect(),
            trajectory: evaluator::trajectory(
                profile.current_weight,
                profile.goal_weight,
                latest_weight,
            )?,
            avg_calories: aggregate::average_over_days(&meals, today, AVERAGE_WINDOW_DAYS, |m| {
                m.calories
            })?,
            avg_protein: aggregate::average_over_days(&meals, today, AVERAGE_WINDOW_DAYS, |m| {
                m.protein
            })?,
            weekly_workouts: aggregate::weekly_series(&workouts, today)?,
            calorie_trend: aggregate::calorie_trend(
                &meals,
                today,
                CALORIE_TREND_DAYS,
                profile.daily_calorie_target,
            )?,
            stats: aggregate::lifetime_stats(&meals, &workouts),
            streak_days: evaluator::calculate_streak(&meals, &workouts, today),
        })
    }
}

fn to_record<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

fn from_records<T: DeserializeOwned>(records: Vec<Value>) -> Result<Vec<T>> {
    records
        .into_iter()
        .map(|r| Ok(serde_json::from_value(r)?))
        .collect()
}
