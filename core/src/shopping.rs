//! Shopping suggestions from three signals: meal-plan ingredients the pantry
//! lacks, stocked items running low, and frequently used staples worth
//! restocking in bulk.

use std::collections::HashMap;

use anyhow::Result;

use crate::db::Database;
use crate::models::{InventoryItem, MealPlan, Priority, ShoppingSuggestion, normalize_item_name};

#[derive(Debug, Clone)]
pub struct ShoppingConfig {
    /// Inventory at or below this quantity counts as running low.
    pub low_stock_qty: f64,
    /// Ingredients used at least this many times in the lookback window
    /// are bulk-buy candidates.
    pub bulk_usage_min: i64,
    /// Lookback window for usage counting, in days.
    pub usage_days: i64,
}

impl Default for ShoppingConfig {
    fn default() -> Self {
        Self {
            low_stock_qty: 1.0,
            bulk_usage_min: 3,
            usage_days: 30,
        }
    }
}

pub struct ShoppingListBuilder<'a> {
    db: &'a Database,
    config: ShoppingConfig,
}

impl<'a> ShoppingListBuilder<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, config: ShoppingConfig) -> Self {
        Self { db, config }
    }

    /// Build suggestions from current inventory, recent meal history, and an
    /// optional plan. Highest-priority reason wins when an item qualifies
    /// more than once.
    pub fn build(&self, plan: Option<&MealPlan>) -> Result<Vec<ShoppingSuggestion>> {
        let inventory = self.db.list_inventory(None)?;
        // Depleted rows do not count as stock on hand
        let stocked: HashMap<String, f64> = inventory
            .iter()
            .filter(|i| i.qty > 0.0)
            .map(|i| (normalize_item_name(&i.name), i.qty))
            .collect();

        let mut suggestions: Vec<ShoppingSuggestion> = Vec::new();

        if let Some(plan) = plan {
            for (meal_type, meal) in plan {
                for ingredient in &meal.ingredients {
                    let name = normalize_item_name(ingredient);
                    if name.is_empty() || stocked.contains_key(&name) {
                        continue;
                    }
                    push_suggestion(
                        &mut suggestions,
                        ShoppingSuggestion {
                            item: name,
                            qty: None,
                            unit: None,
                            priority: Priority::Needed,
                            reason: format!("needed for {meal_type}: {}", meal.name),
                        },
                    );
                }
            }
        }

        for item in &inventory {
            if item.qty > 0.0 && item.qty <= self.config.low_stock_qty {
                push_suggestion(
                    &mut suggestions,
                    low_stock_suggestion(item),
                );
            }
        }

        let usage = self.db.ingredient_usage_counts(self.config.usage_days)?;
        for (name, count) in &usage {
            if *count < self.config.bulk_usage_min {
                continue;
            }
            let qty = stocked.get(name).copied();
            // Only suggest bulk buys for staples not already well stocked
            if qty.is_none_or(|q| q <= self.config.low_stock_qty) {
                push_suggestion(
                    &mut suggestions,
                    ShoppingSuggestion {
                        item: name.clone(),
                        qty: None,
                        unit: None,
                        priority: Priority::BulkBuy,
                        reason: format!("used in {count} meals over the last {} days", self.config.usage_days),
                    },
                );
            }
        }

        suggestions.sort_by(|a, b| a.priority.cmp(&b.priority).then(a.item.cmp(&b.item)));
        Ok(suggestions)
    }

    /// Build and persist suggestions, replacing earlier unchecked rows.
    pub fn refresh(&self, plan: Option<&MealPlan>) -> Result<Vec<ShoppingSuggestion>> {
        let suggestions = self.build(plan)?;
        self.db.replace_shopping_suggestions(&suggestions)?;
        Ok(suggestions)
    }
}

fn low_stock_suggestion(item: &InventoryItem) -> ShoppingSuggestion {
    ShoppingSuggestion {
        item: normalize_item_name(&item.name),
        qty: None,
        unit: item.unit.clone(),
        priority: Priority::LowStock,
        reason: format!("only {} left", item.qty),
    }
}

/// Case-insensitive dedup keeping the higher-priority entry.
fn push_suggestion(suggestions: &mut Vec<ShoppingSuggestion>, candidate: ShoppingSuggestion) {
    if let Some(existing) = suggestions.iter_mut().find(|s| s.item == candidate.item) {
        if candidate.priority < existing.priority {
            *existing = candidate;
        }
        return;
    }
    suggestions.push(candidate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewInventoryItem, NewMeal, PlannedMeal};
    use chrono::Local;

    fn stock(db: &Database, name: &str, qty: f64) {
        db.insert_inventory_item(&NewInventoryItem {
            name: name.to_string(),
            category: None,
            qty,
            unit: None,
            exp_date: None,
            location: None,
            purchase_price: None,
        })
        .unwrap();
    }

    fn plan_with(meal_type: &str, name: &str, ingredients: &[&str]) -> MealPlan {
        let mut plan = MealPlan::new();
        plan.insert(
            meal_type.to_string(),
            PlannedMeal {
                name: name.to_string(),
                ingredients: ingredients.iter().map(|s| (*s).to_string()).collect(),
                recipe: String::new(),
                nutrition: None,
            },
        );
        plan
    }

    #[test]
    fn test_missing_plan_ingredients_are_needed() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "rice", 5.0);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        let plan = plan_with("dinner", "Chicken and Rice", &["chicken", "rice", "onion"]);
        let suggestions = builder.build(Some(&plan)).unwrap();

        let items: Vec<&str> = suggestions.iter().map(|s| s.item.as_str()).collect();
        assert!(items.contains(&"chicken"));
        assert!(items.contains(&"onion"));
        assert!(!items.contains(&"rice"));
        for s in &suggestions {
            assert_eq!(s.priority, Priority::Needed);
            assert!(s.reason.contains("Chicken and Rice"));
        }
    }

    #[test]
    fn test_low_stock_detection() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "milk", 0.5);
        stock(&db, "rice", 5.0);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        let suggestions = builder.build(None).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].item, "milk");
        assert_eq!(suggestions[0].priority, Priority::LowStock);
    }

    #[test]
    fn test_depleted_plan_ingredient_is_needed() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "milk", 0.0);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        let plan = plan_with("breakfast", "Cereal", &["milk"]);
        let suggestions = builder.build(Some(&plan)).unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].item, "milk");
        assert_eq!(suggestions[0].priority, Priority::Needed);
    }

    #[test]
    fn test_out_of_stock_is_not_low_stock() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "milk", 0.0);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());
        assert!(builder.build(None).unwrap().is_empty());
    }

    #[test]
    fn test_bulk_buy_from_usage_history() {
        let db = Database::open_in_memory().unwrap();
        let today = Local::now().date_naive();
        for _ in 0..3 {
            db.insert_meal(&NewMeal {
                date: today,
                meal_type: "dinner".to_string(),
                name: "Fried Rice".to_string(),
                ingredients: vec!["rice".to_string(), "eggs".to_string()],
                recipe: None,
                nutrition: None,
                auto_generated: true,
            })
            .unwrap();
        }
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        let suggestions = builder.build(None).unwrap();
        let items: Vec<&str> = suggestions.iter().map(|s| s.item.as_str()).collect();
        assert!(items.contains(&"rice"));
        assert!(items.contains(&"eggs"));
        for s in &suggestions {
            assert_eq!(s.priority, Priority::BulkBuy);
        }
    }

    #[test]
    fn test_bulk_buy_skips_well_stocked() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "rice", 10.0);
        let today = Local::now().date_naive();
        for _ in 0..3 {
            db.insert_meal(&NewMeal {
                date: today,
                meal_type: "dinner".to_string(),
                name: "Fried Rice".to_string(),
                ingredients: vec!["rice".to_string()],
                recipe: None,
                nutrition: None,
                auto_generated: true,
            })
            .unwrap();
        }
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());
        assert!(builder.build(None).unwrap().is_empty());
    }

    #[test]
    fn test_higher_priority_wins_dedup() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "milk", 0.5);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        // Milk is low stock, and a plan using an unstocked casing of it
        let plan = plan_with("breakfast", "Oatmeal", &["oats"]);
        let mut plan2 = plan;
        plan2.insert(
            "lunch".to_string(),
            PlannedMeal {
                name: "Cereal".to_string(),
                ingredients: vec!["MILK".to_string()],
                recipe: String::new(),
                nutrition: None,
            },
        );
        let suggestions = builder.build(Some(&plan2)).unwrap();
        let milk: Vec<_> = suggestions.iter().filter(|s| s.item == "milk").collect();
        assert_eq!(milk.len(), 1);
        assert_eq!(milk[0].priority, Priority::LowStock);
    }

    #[test]
    fn test_ordering_needed_first() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "milk", 0.5);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        let plan = plan_with("dinner", "Stew", &["beef"]);
        let suggestions = builder.build(Some(&plan)).unwrap();
        assert_eq!(suggestions[0].priority, Priority::Needed);
        assert_eq!(suggestions[1].priority, Priority::LowStock);
    }

    #[test]
    fn test_refresh_persists() {
        let db = Database::open_in_memory().unwrap();
        stock(&db, "milk", 0.5);
        let builder = ShoppingListBuilder::new(&db, ShoppingConfig::default());

        builder.refresh(None).unwrap();
        let rows = db.list_shopping(false).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].item, "milk");
        assert_eq!(rows[0].priority, "low-stock");
    }
}
