use std::sync::Arc;

use async_trait::async_trait;
use athletiq::auth::StaticIdentity;
use athletiq::client::AthleteClient;
use athletiq::config::ClientConfig;
use athletiq::estimate::{Confidence, FoodEstimate, FoodRecognizer, ScanOutcome};
use athletiq::models::{ActivityLevel, GoalType, Macros, MealType, WorkoutType};
use athletiq::store::{Collection, MemoryStore, Query, RecordStore};
use athletiq::targets::{ProfileEdit, ProfileInputs};
use chrono::{Duration, Local, NaiveDate};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn memory_client() -> AthleteClient<MemoryStore> {
    AthleteClient::new(
        MemoryStore::new(),
        Arc::new(StaticIdentity("athlete@example.com".to_string())),
    )
}

fn client_for(store: &MemoryStore, user: &str) -> AthleteClient<MemoryStore> {
    AthleteClient::new(store.clone(), Arc::new(StaticIdentity(user.to_string())))
}

fn gainer() -> ProfileInputs {
    ProfileInputs {
        goal_type: GoalType::Gain,
        sport: "football".to_string(),
        current_weight: 150.0,
        goal_weight: 165.0,
        goal_deadline: today() + Duration::weeks(16),
        height_inches: 70.0,
        age: 16,
        activity_level: ActivityLevel::Active,
    }
}

struct FixedRecognizer(Option<FoodEstimate>);

#[async_trait]
impl FoodRecognizer for FixedRecognizer {
    async fn recognize(&self, _image_url: &str) -> anyhow::Result<FoodEstimate> {
        self.0
            .clone()
            .ok_or_else(|| anyhow::anyhow!("upload failed: 503 Service Unavailable"))
    }
}

fn estimate(is_food: bool) -> FoodEstimate {
    FoodEstimate {
        is_food,
        food_name: if is_food { "Steak & vegetables" } else { "Keyboard" }.to_string(),
        items_identified: vec![],
        calories: 410.4,
        protein: 40.2,
        carbs: 15.5,
        fat: 20.1,
        fiber: Some(4.0),
        confidence: Confidence::High,
        portion_notes: None,
        suggestions: None,
    }
}

#[tokio::test]
async fn onboarding_creates_profile_and_starting_weight() {
    let client = memory_client();
    let profile = client.complete_onboarding(gainer(), today()).await.unwrap();

    assert!(profile.id.is_some());
    assert_eq!(profile.user_id, "athlete@example.com");
    assert_eq!(profile.daily_calorie_target, 3361);
    assert_eq!(profile.daily_protein_target, 165);

    let weights = client.weight_history().await.unwrap();
    assert_eq!(weights.len(), 1);
    assert_eq!(weights[0].weight, 150.0);
    assert_eq!(weights[0].notes.as_deref(), Some("Starting weight"));

    // second onboarding is refused
    assert!(client.complete_onboarding(gainer(), today()).await.is_err());
}

#[tokio::test]
async fn onboarding_rejects_deadline_today() {
    let client = memory_client();
    let inputs = ProfileInputs {
        goal_deadline: today(),
        ..gainer()
    };
    assert!(client.complete_onboarding(inputs, today()).await.is_err());
    assert!(client.get_profile().await.unwrap().is_none());
}

#[tokio::test]
async fn profile_edit_persists_recomputed_targets() {
    let client = memory_client();
    client.complete_onboarding(gainer(), today()).await.unwrap();

    let updated = client
        .update_profile(ProfileEdit {
            goal_type: Some(GoalType::Lose),
            goal_weight: Some(140.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.daily_calorie_target, 2561);
    assert_eq!(updated.daily_protein_target, 140);

    let stored = client.get_profile().await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn dashboard_rolls_up_today() {
    let client = memory_client();
    client.complete_onboarding(gainer(), today()).await.unwrap();

    client
        .log_meal(
            MealType::Breakfast,
            "Oatmeal",
            Macros::new(150.0, 5.0, 27.0, 3.0),
            today(),
        )
        .await
        .unwrap();
    client
        .log_meal(
            MealType::Lunch,
            "Chicken & Rice Bowl",
            Macros::new(450.0, 35.0, 50.0, 10.0),
            today(),
        )
        .await
        .unwrap();
    // yesterday's meal must not count
    client
        .log_meal(
            MealType::Dinner,
            "Pasta",
            Macros::new(480.0, 25.0, 55.0, 16.0),
            today() - Duration::days(1),
        )
        .await
        .unwrap();
    client
        .log_workout(WorkoutType::Strength, 60.0, 350.0, "push day", today())
        .await
        .unwrap();
    client.log_weight(157.5, today(), None).await.unwrap();

    let dash = client.dashboard(today()).await.unwrap();
    assert_eq!(dash.totals, Macros::new(600.0, 40.0, 77.0, 13.0));
    assert_eq!(dash.workout_calories, 350.0);
    assert_eq!(dash.latest_weight, 157.5);
    assert_eq!(dash.trajectory.percent_complete, 50.0);
    assert!(dash.protein_percent <= 100.0);
    assert!((dash.calorie_percent - 600.0 / 3361.0 * 100.0).abs() < 1e-9);
}

#[tokio::test]
async fn progress_report_tracks_streak_and_averages() {
    let client = memory_client();
    client.complete_onboarding(gainer(), today()).await.unwrap();

    for days_ago in [1, 2, 3] {
        client
            .log_meal(
                MealType::Dinner,
                "Steak",
                Macros::new(700.0, 49.0, 0.0, 40.0),
                today() - Duration::days(days_ago),
            )
            .await
            .unwrap();
    }
    client
        .log_workout(WorkoutType::Cardio, 30.0, 300.0, "", today() - Duration::days(5))
        .await
        .unwrap();

    let report = client.progress_report(today(), 30).await.unwrap();
    // nothing logged today yet, yesterday through three days ago count
    assert_eq!(report.streak_days, 3);
    assert_eq!(report.avg_calories, 300);
    assert_eq!(report.avg_protein, 21);
    assert_eq!(report.weekly_workouts.len(), 7);
    assert_eq!(report.weekly_workouts[1].minutes, 30.0);
    assert_eq!(report.calorie_trend.len(), 14);
    assert_eq!(report.stats.total_meals_logged, 3);
    assert_eq!(report.stats.total_workouts, 1);
    assert_eq!(report.weights.len(), 1);
    assert_eq!(report.trajectory.percent_complete, 0.0);
}

#[tokio::test]
async fn scanned_food_only_logged_when_recognized() {
    let client = memory_client();

    let outcome = client
        .scan_food(&FixedRecognizer(Some(estimate(false))), "https://img/1.jpg")
        .await;
    assert!(matches!(outcome, ScanOutcome::NotFood(_)));

    let outcome = client.scan_food(&FixedRecognizer(None), "https://img/2.jpg").await;
    assert!(matches!(outcome, ScanOutcome::Failed(_)));
    assert!(client.meals_on(today()).await.unwrap().is_empty());

    let outcome = client
        .scan_food(&FixedRecognizer(Some(estimate(true))), "https://img/3.jpg")
        .await;
    let recognized = outcome.recognized().expect("steak should be recognized");
    let meal = client
        .log_estimate(recognized, 2.0, MealType::Dinner, today())
        .await
        .unwrap();
    assert_eq!(meal.calories, 821.0);
    assert_eq!(meal.protein, 80.0);
    assert_eq!(meal.carbs, 31.0);
    assert_eq!(meal.fat, 40.0);

    assert!(client
        .log_estimate(&estimate(false), 1.0, MealType::Dinner, today())
        .await
        .is_err());
    assert_eq!(client.meals_on(today()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn records_are_scoped_to_the_user() {
    let store = MemoryStore::new();
    let alice = client_for(&store, "alice");
    let bob = client_for(&store, "bob");

    alice
        .log_workout(WorkoutType::Hiit, 20.0, 250.0, "", today())
        .await
        .unwrap();
    let workout = bob
        .log_workout(WorkoutType::Flexibility, 40.0, 120.0, "yoga", today())
        .await
        .unwrap();

    assert_eq!(alice.workouts_on(today()).await.unwrap().len(), 1);
    let all = store.list(Collection::WorkoutLog, &Query::new()).await.unwrap();
    assert_eq!(all.len(), 2);

    bob.delete_workout(workout.id.as_deref().unwrap()).await.unwrap();
    assert!(bob.workouts_on(today()).await.unwrap().is_empty());
    assert_eq!(alice.workouts_on(today()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_another_users_record_is_refused() {
    let store = MemoryStore::new();
    let alice = client_for(&store, "alice");
    let bob = client_for(&store, "bob");

    let workout = alice
        .log_workout(WorkoutType::Strength, 45.0, 300.0, "legs", today())
        .await
        .unwrap();
    let meal = alice
        .log_meal(MealType::Lunch, "Turkey wrap", Macros::new(420.0, 32.0, 38.0, 14.0), today())
        .await
        .unwrap();

    assert!(bob.delete_workout(workout.id.as_deref().unwrap()).await.is_err());
    assert!(bob.delete_meal(meal.id.as_deref().unwrap()).await.is_err());
    assert!(bob.delete_meal("no-such-id").await.is_err());

    assert_eq!(alice.workouts_on(today()).await.unwrap().len(), 1);
    assert_eq!(alice.meals_on(today()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn latest_weight_tracks_newest_log_past_history_limit() {
    let client = memory_client();
    client.complete_onboarding(gainer(), today()).await.unwrap();

    for day in 1..=120 {
        let weight = 150.0 + f64::from(day) * 0.1;
        client
            .log_weight(weight, today() + Duration::days(i64::from(day)), None)
            .await
            .unwrap();
    }

    let last_day = today() + Duration::days(120);
    let weights = client.weight_history().await.unwrap();
    assert_eq!(weights.len(), 100);
    assert!(weights.windows(2).all(|w| w[0].date <= w[1].date));
    assert_eq!(weights.last().unwrap().date, last_day);

    let dash = client.dashboard(last_day).await.unwrap();
    assert!((dash.latest_weight - 162.0).abs() < 1e-9);
}

#[tokio::test]
async fn progress_stats_cover_full_history() {
    let client = memory_client();
    client.complete_onboarding(gainer(), today()).await.unwrap();

    for i in 0..520 {
        client
            .log_meal(
                MealType::Snack,
                "Protein bar",
                Macros::new(200.0, 20.0, 22.0, 7.0),
                today() - Duration::days(i / 3),
            )
            .await
            .unwrap();
    }

    let report = client.progress_report(today(), 30).await.unwrap();
    assert_eq!(report.stats.total_meals_logged, 520);
    assert_eq!(report.stats.total_calories_logged, 104_000.0);
    // 520 meals at three a day reach back 174 days
    assert_eq!(report.streak_days, 174);
}

fn live_config() -> Option<ClientConfig> {
    dotenvy::dotenv().ok();
    let config = ClientConfig::from_env().ok()?;
    config.token.as_ref()?;
    Some(config)
}

#[tokio::test]
async fn live_backend_log_and_delete_workout() {
    let Some(config) = live_config() else {
        eprintln!("skipping live_backend_log_and_delete_workout: no credentials");
        return;
    };
    let client = AthleteClient::from_config(&config).unwrap();
    let today = Local::now().date_naive();

    let workout = client
        .log_workout(WorkoutType::Cardio, 1.0, 0.0, "integration test", today)
        .await
        .unwrap();
    let id = workout.id.clone().expect("backend should assign an id");

    let logged = client.workouts_on(today).await.unwrap();
    assert!(logged.iter().any(|w| w.id.as_deref() == Some(id.as_str())));

    client.delete_workout(&id).await.unwrap();
    let logged = client.workouts_on(today).await.unwrap();
    assert!(logged.iter().all(|w| w.id.as_deref() != Some(id.as_str())));
}
