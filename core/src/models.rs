use std::collections::BTreeMap;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub name: String,
    pub category: Option<String>,
    pub qty: f64,
    pub unit: Option<String>,
    pub exp_date: Option<String>,
    pub location: Option<String>,
    pub purchase_price: Option<f64>,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub name: String,
    pub category: Option<String>,
    pub qty: f64,
    pub unit: Option<String>,
    pub exp_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub purchase_price: Option<f64>,
}

/// Partial inventory update. `None` leaves a field untouched; the clear
/// flags reset a field back to NULL and win over any new value.
#[derive(Debug, Clone, Default)]
pub struct UpdateInventoryItem {
    pub qty: Option<f64>,
    pub unit: Option<String>,
    pub location: Option<String>,
    pub exp_date: Option<NaiveDate>,
    pub clear_unit: bool,
    pub clear_location: bool,
    pub clear_exp_date: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Meal {
    pub id: i64,
    #[serde(default)]
    pub uuid: String,
    pub date: String,
    pub meal_type: String,
    pub name: String,
    pub ingredients: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<serde_json::Value>,
    pub auto_generated: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMeal {
    pub date: NaiveDate,
    pub meal_type: String,
    pub name: String,
    pub ingredients: Vec<String>,
    pub recipe: Option<String>,
    pub nutrition: Option<serde_json::Value>,
    pub auto_generated: bool,
}

/// One generated meal, as exchanged with providers and stored in the plan cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedMeal {
    pub name: String,
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub recipe: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nutrition: Option<serde_json::Value>,
}

/// Meal type → planned meal. The wire contract with every provider is a single
/// JSON object of this shape.
pub type MealPlan = BTreeMap<String, PlannedMeal>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedMealPlan {
    pub inventory_hash: String,
    pub meal_types: String,
    pub dietary_restrictions: String,
    pub plan: MealPlan,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifiedPrice {
    pub item: String,
    pub location_zip: String,
    pub price: f64,
    pub source: String,
    pub confidence: f64,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewVerifiedPrice {
    pub item: String,
    pub location_zip: String,
    pub price: f64,
    pub source: String,
    pub confidence: f64,
}

/// Why an item landed on the shopping list. Ordering is display priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Needed,
    LowStock,
    BulkBuy,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Needed => "needed",
            Self::LowStock => "low-stock",
            Self::BulkBuy => "bulk-buy",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "needed" => Some(Self::Needed),
            "low-stock" => Some(Self::LowStock),
            "bulk-buy" => Some(Self::BulkBuy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub item: String,
    pub qty: Option<f64>,
    pub unit: Option<String>,
    pub priority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub checked: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingSuggestion {
    pub item: String,
    pub qty: Option<f64>,
    pub unit: Option<String>,
    pub priority: Priority,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Bill {
    pub id: i64,
    pub name: String,
    pub amount: f64,
    pub due_date: Option<String>,
    pub category: Option<String>,
    pub paid: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewBill {
    pub name: String,
    pub amount: f64,
    pub due_date: Option<NaiveDate>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub date: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub category: Option<String>,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSummary {
    pub category: String,
    pub total: f64,
    pub count: i64,
}

/// Monthly spending limit for an expense category.
#[derive(Debug, Clone, Serialize)]
pub struct Budget {
    pub id: i64,
    pub category: String,
    pub monthly_limit: f64,
    pub created_at: String,
}

/// A budget's limit against actual spending for one month.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetStatus {
    pub category: String,
    pub monthly_limit: f64,
    pub spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SavingsGoal {
    pub id: i64,
    pub name: String,
    pub target_amount: f64,
    pub saved_amount: f64,
    pub target_date: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewSavingsGoal {
    pub name: String,
    pub target_amount: f64,
    pub target_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FamilyMember {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub dietary_restrictions: Vec<String>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewFamilyMember {
    pub name: String,
    pub role: Option<String>,
    pub dietary_restrictions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub date: String,
    pub event_type: Option<String>,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewCalendarEvent {
    pub date: NaiveDate,
    pub event_type: Option<String>,
    pub description: String,
}

pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner", "snack"];

pub fn validate_meal_type(meal: &str) -> Result<String> {
    let lower = meal.to_lowercase();
    if MEAL_TYPES.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        bail!(
            "Invalid meal type '{meal}'. Must be one of: {}",
            MEAL_TYPES.join(", ")
        )
    }
}

/// Validate a list of requested meal types, normalizing to lowercase and
/// preserving request order with duplicates removed.
pub fn validate_meal_types(meals: &[String]) -> Result<Vec<String>> {
    if meals.is_empty() {
        bail!("At least one meal type is required");
    }
    let mut out: Vec<String> = Vec::with_capacity(meals.len());
    for m in meals {
        let v = validate_meal_type(m)?;
        if !out.contains(&v) {
            out.push(v);
        }
    }
    Ok(out)
}

pub fn validate_inventory_item(name: &str, qty: f64) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Item name must not be empty");
    }
    if qty < 0.0 {
        bail!("Quantity must not be negative");
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Amount must be greater than 0");
    }
    Ok(())
}

/// Lowercased, whitespace-trimmed item name used for matching and cache keys.
#[must_use]
pub fn normalize_item_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Canonical form of a string list for use as a cache key: normalized,
/// sorted, comma-joined. Permuted inputs map to the same key.
#[must_use]
pub fn canonical_list(items: &[String]) -> String {
    let mut normalized: Vec<String> = items.iter().map(|s| normalize_item_name(s)).collect();
    normalized.sort();
    normalized.dedup();
    normalized.join(",")
}

/// Fraction of `ingredients` present in the pantry, matching by substring in
/// either direction ("chicken breast" matches pantry "chicken" and vice
/// versa). Empty ingredient lists count as fully matched.
#[must_use]
pub fn ingredient_match_ratio(ingredients: &[String], inventory_names: &[String]) -> f64 {
    if ingredients.is_empty() {
        return 1.0;
    }
    let pantry: Vec<String> = inventory_names
        .iter()
        .map(|n| normalize_item_name(n))
        .collect();
    let matched = ingredients
        .iter()
        .filter(|ing| {
            let ing = normalize_item_name(ing);
            pantry
                .iter()
                .any(|have| have.contains(&ing) || ing.contains(have.as_str()))
        })
        .count();
    #[allow(clippy::cast_precision_loss)]
    {
        matched as f64 / ingredients.len() as f64
    }
}

/// True when the meal's ingredient coverage against the pantry meets the
/// configured threshold (1.0 = every ingredient must be on hand).
#[must_use]
pub fn meal_matches_inventory(
    meal: &PlannedMeal,
    inventory_names: &[String],
    threshold: f64,
) -> bool {
    ingredient_match_ratio(&meal.ingredients, inventory_names) >= threshold
}

/// True when a meal conflicts with any dietary restriction by naive keyword
/// match against its name or ingredients.
#[must_use]
pub fn meal_violates_restrictions(meal: &PlannedMeal, restrictions: &[String]) -> bool {
    restrictions.iter().any(|r| {
        let r = normalize_item_name(r);
        if r.is_empty() {
            return false;
        }
        normalize_item_name(&meal.name).contains(&r)
            || meal
                .ingredients
                .iter()
                .any(|i| normalize_item_name(i).contains(&r))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planned(name: &str, ingredients: &[&str]) -> PlannedMeal {
        PlannedMeal {
            name: name.to_string(),
            ingredients: ingredients.iter().map(|s| (*s).to_string()).collect(),
            recipe: String::new(),
            nutrition: None,
        }
    }

    #[test]
    fn test_valid_meal_types() {
        assert_eq!(validate_meal_type("breakfast").unwrap(), "breakfast");
        assert_eq!(validate_meal_type("Lunch").unwrap(), "lunch");
        assert_eq!(validate_meal_type("DINNER").unwrap(), "dinner");
        assert_eq!(validate_meal_type("snack").unwrap(), "snack");
    }

    #[test]
    fn test_invalid_meal_type() {
        assert!(validate_meal_type("brunch").is_err());
        assert!(validate_meal_type("").is_err());
    }

    #[test]
    fn test_validate_meal_types_dedup_preserves_order() {
        let input = vec![
            "Dinner".to_string(),
            "breakfast".to_string(),
            "dinner".to_string(),
        ];
        let out = validate_meal_types(&input).unwrap();
        assert_eq!(out, vec!["dinner".to_string(), "breakfast".to_string()]);
    }

    #[test]
    fn test_validate_meal_types_empty() {
        assert!(validate_meal_types(&[]).is_err());
    }

    #[test]
    fn test_validate_inventory_item() {
        assert!(validate_inventory_item("Rice", 5.0).is_ok());
        assert!(validate_inventory_item("Rice", 0.0).is_ok());
        assert!(validate_inventory_item("  ", 5.0).is_err());
        assert!(validate_inventory_item("Rice", -1.0).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(12.5).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-3.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_canonical_list_order_independent() {
        let a = vec!["Dinner".to_string(), "breakfast".to_string()];
        let b = vec!["BREAKFAST".to_string(), "dinner".to_string()];
        assert_eq!(canonical_list(&a), canonical_list(&b));
        assert_eq!(canonical_list(&a), "breakfast,dinner");
    }

    #[test]
    fn test_canonical_list_dedups() {
        let a = vec![
            "rice".to_string(),
            "Rice".to_string(),
            " rice ".to_string(),
        ];
        assert_eq!(canonical_list(&a), "rice");
    }

    #[test]
    fn test_ingredient_match_ratio_full() {
        let inventory = vec!["Rice".to_string(), "Chicken Breast".to_string()];
        let ingredients = vec!["rice".to_string(), "chicken".to_string()];
        assert!((ingredient_match_ratio(&ingredients, &inventory) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ingredient_match_ratio_partial() {
        let inventory = vec!["rice".to_string()];
        let ingredients = vec!["rice".to_string(), "chicken".to_string()];
        assert!((ingredient_match_ratio(&ingredients, &inventory) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ingredient_match_ratio_empty_ingredients() {
        assert!((ingredient_match_ratio(&[], &["rice".to_string()]) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_meal_matches_inventory_threshold() {
        let meal = planned("Chicken Rice", &["rice", "chicken"]);
        let pantry = vec!["rice".to_string()];
        // 50% coverage fails a 100% threshold but passes a 50% one
        assert!(!meal_matches_inventory(&meal, &pantry, 1.0));
        assert!(meal_matches_inventory(&meal, &pantry, 0.5));
    }

    #[test]
    fn test_rice_only_pantry_rejects_chicken_meal() {
        let meal = planned("Grilled Chicken", &["chicken", "olive oil"]);
        let pantry = vec!["rice".to_string()];
        assert!(!meal_matches_inventory(&meal, &pantry, 1.0));
    }

    #[test]
    fn test_meal_violates_restrictions() {
        let meal = planned("Chicken Stir-fry", &["chicken", "soy sauce"]);
        assert!(meal_violates_restrictions(&meal, &["chicken".to_string()]));
        assert!(meal_violates_restrictions(&meal, &["Soy".to_string()]));
        assert!(!meal_violates_restrictions(&meal, &["pork".to_string()]));
        assert!(!meal_violates_restrictions(&meal, &[]));
    }

    #[test]
    fn test_priority_roundtrip() {
        for p in [Priority::Needed, Priority::LowStock, Priority::BulkBuy] {
            assert_eq!(Priority::parse(p.as_str()), Some(p));
        }
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Needed < Priority::LowStock);
        assert!(Priority::LowStock < Priority::BulkBuy);
    }

    #[test]
    fn test_planned_meal_deserializes_without_recipe() {
        let meal: PlannedMeal =
            serde_json::from_str(r#"{"name":"Oatmeal","ingredients":["oats","milk"]}"#).unwrap();
        assert_eq!(meal.name, "Oatmeal");
        assert!(meal.recipe.is_empty());
        assert!(meal.nutrition.is_none());
    }
}
