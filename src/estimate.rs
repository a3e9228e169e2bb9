//! Turning food-photo estimates and catalog picks into meal log candidates.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, Error, Result};
use crate::models::{Macros, MealLogEntry, MealType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Structured answer from the photo recognition service.
///
/// Macros describe the whole plate in the photo (one serving).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodEstimate {
    pub is_food: bool,
    pub food_name: String,
    #[serde(default)]
    pub items_identified: Vec<String>,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portion_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<String>,
}

impl FoodEstimate {
    pub fn macros(&self) -> Macros {
        Macros::new(self.calories, self.protein, self.carbs, self.fat)
    }

    /// Scale by `servings`, round each macro, and build a meal entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the image was not recognized as food or
    /// `servings` is not positive.
    pub fn to_meal(
        &self,
        user_id: &str,
        servings: f64,
        meal_type: MealType,
        date: NaiveDate,
    ) -> Result<MealLogEntry> {
        if !self.is_food {
            return Err(Error::invalid_input(format!(
                "'{}' was not recognized as food",
                self.food_name
            )));
        }
        ensure_positive("servings", servings)?;
        MealLogEntry::new(
            user_id,
            meal_type,
            self.food_name.clone(),
            self.macros().scaled(servings),
            date,
        )
    }
}

/// Result of asking the recognizer about a photo.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Recognized(FoodEstimate),
    NotFood(FoodEstimate),
    /// Upload or analysis failed; the user should try again.
    Failed(String),
}

impl ScanOutcome {
    pub fn from_estimate(estimate: FoodEstimate) -> Self {
        if estimate.is_food {
            ScanOutcome::Recognized(estimate)
        } else {
            ScanOutcome::NotFood(estimate)
        }
    }

    /// The estimate, only when it can become a meal.
    pub fn recognized(&self) -> Option<&FoodEstimate> {
        match self {
            ScanOutcome::Recognized(estimate) => Some(estimate),
            _ => None,
        }
    }
}

/// External photo-to-nutrition service.
#[async_trait]
pub trait FoodRecognizer: Send + Sync {
    async fn recognize(&self, image_url: &str) -> anyhow::Result<FoodEstimate>;
}

/// A food database item. Macros are per listed serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub category: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    /// e.g. "4 oz", "1 cup cooked"
    pub serving: String,
}

impl FoodItem {
    /// Build a meal for `servings` of this item. The food name records the
    /// multiplier when more than one serving was eaten.
    pub fn to_meal(
        &self,
        user_id: &str,
        servings: f64,
        meal_type: MealType,
        date: NaiveDate,
    ) -> Result<MealLogEntry> {
        ensure_positive("servings", servings)?;
        let food_name = if servings > 1.0 {
            format!("{} (x{})", self.name, servings)
        } else {
            self.name.clone()
        };
        let macros = Macros::new(self.calories, self.protein, self.carbs, self.fat);
        MealLogEntry::new(user_id, meal_type, food_name, macros.scaled(servings), date)
    }
}

/// Case-insensitive name search, optionally restricted to one category.
pub fn search_foods<'a>(
    catalog: &'a [FoodItem],
    query: &str,
    category: Option<&str>,
) -> Vec<&'a FoodItem> {
    let query = query.to_lowercase();
    catalog
        .iter()
        .filter(|f| f.name.to_lowercase().contains(&query))
        .filter(|f| category.map_or(true, |c| f.category == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn burrito_bowl() -> FoodEstimate {
        serde_json::from_value(serde_json::json!({
            "is_food": true,
            "food_name": "Burrito bowl",
            "items_identified": ["rice", "chicken", "beans"],
            "calories": 612.4,
            "protein": 38.6,
            "carbs": 70.2,
            "fat": 18.5,
            "confidence": "medium"
        }))
        .unwrap()
    }

    fn chicken() -> FoodItem {
        FoodItem {
            name: "Grilled Chicken Breast".to_string(),
            category: "protein".to_string(),
            calories: 165.0,
            protein: 31.0,
            carbs: 0.0,
            fat: 3.6,
            serving: "4 oz".to_string(),
        }
    }

    #[test]
    fn estimate_scales_and_rounds() {
        let meal = burrito_bowl().to_meal("u", 1.5, MealType::Dinner, date()).unwrap();
        assert_eq!(meal.food_name, "Burrito bowl");
        assert_eq!(meal.calories, 919.0);
        assert_eq!(meal.protein, 58.0);
        assert_eq!(meal.carbs, 105.0);
        assert_eq!(meal.fat, 28.0);
    }

    #[test]
    fn not_food_never_becomes_a_meal() {
        let mut estimate = burrito_bowl();
        estimate.is_food = false;
        assert!(estimate.to_meal("u", 1.0, MealType::Lunch, date()).is_err());

        let outcome = ScanOutcome::from_estimate(estimate);
        assert!(matches!(outcome, ScanOutcome::NotFood(_)));
        assert!(outcome.recognized().is_none());
    }

    #[test]
    fn zero_servings_rejected() {
        assert!(burrito_bowl().to_meal("u", 0.0, MealType::Lunch, date()).is_err());
        assert!(chicken().to_meal("u", -1.0, MealType::Lunch, date()).is_err());
    }

    #[test]
    fn catalog_item_records_multiplier() {
        let single = chicken().to_meal("u", 1.0, MealType::Lunch, date()).unwrap();
        assert_eq!(single.food_name, "Grilled Chicken Breast");
        assert_eq!(single.fat, 4.0);

        let double = chicken().to_meal("u", 2.0, MealType::Lunch, date()).unwrap();
        assert_eq!(double.food_name, "Grilled Chicken Breast (x2)");
        assert_eq!(double.calories, 330.0);
        assert_eq!(double.protein, 62.0);
        assert_eq!(double.fat, 7.0);
    }

    #[test]
    fn search_matches_name_and_category() {
        let catalog = [
            chicken(),
            FoodItem {
                name: "Chicken & Rice Bowl".to_string(),
                category: "meals".to_string(),
                calories: 450.0,
                protein: 35.0,
                carbs: 50.0,
                fat: 10.0,
                serving: "1 bowl".to_string(),
            },
        ];
        assert_eq!(search_foods(&catalog, "CHICKEN", None).len(), 2);
        let meals = search_foods(&catalog, "chicken", Some("meals"));
        assert_eq!(meals.len(), 1);
        assert_eq!(meals[0].serving, "1 bowl");
    }
}
