//! Hand-written template meals used when every AI provider fails. Selection
//! applies the same inventory-match rule as AI-generated plans, so the
//! fallback never suggests a meal the pantry cannot cover.

use crate::models::{
    MealPlan, PlannedMeal, ingredient_match_ratio, meal_matches_inventory,
    meal_violates_restrictions,
};

struct Template {
    name: &'static str,
    ingredients: &'static [&'static str],
    recipe: &'static str,
}

const BREAKFAST: &[Template] = &[
    Template {
        name: "Oatmeal with Fruit",
        ingredients: &["oats", "milk", "banana"],
        recipe: "Simmer oats in milk until creamy, top with sliced banana.",
    },
    Template {
        name: "Scrambled Eggs on Toast",
        ingredients: &["eggs", "bread", "butter"],
        recipe: "Scramble eggs in butter, serve on toasted bread.",
    },
    Template {
        name: "Yogurt Parfait",
        ingredients: &["yogurt", "granola", "honey"],
        recipe: "Layer yogurt with granola and drizzle with honey.",
    },
    Template {
        name: "Rice Porridge",
        ingredients: &["rice"],
        recipe: "Simmer rice in plenty of water until soft, season to taste.",
    },
];

const LUNCH: &[Template] = &[
    Template {
        name: "Grilled Cheese Sandwich",
        ingredients: &["bread", "cheese", "butter"],
        recipe: "Butter the bread, add cheese, grill until golden.",
    },
    Template {
        name: "Tuna Salad",
        ingredients: &["tuna", "lettuce", "mayonnaise"],
        recipe: "Mix drained tuna with mayonnaise, serve over lettuce.",
    },
    Template {
        name: "Fried Rice",
        ingredients: &["rice", "eggs", "soy sauce"],
        recipe: "Fry cooked rice with beaten eggs and a splash of soy sauce.",
    },
    Template {
        name: "Pasta with Olive Oil",
        ingredients: &["pasta", "olive oil", "garlic"],
        recipe: "Boil pasta, toss with warmed olive oil and garlic.",
    },
];

const DINNER: &[Template] = &[
    Template {
        name: "Chicken and Rice",
        ingredients: &["chicken", "rice", "onion"],
        recipe: "Brown chicken with onion, add rice and water, simmer until done.",
    },
    Template {
        name: "Spaghetti with Tomato Sauce",
        ingredients: &["pasta", "tomato sauce", "garlic"],
        recipe: "Boil pasta, heat sauce with garlic, combine.",
    },
    Template {
        name: "Vegetable Stir-fry",
        ingredients: &["mixed vegetables", "soy sauce", "rice"],
        recipe: "Stir-fry vegetables, season with soy sauce, serve over rice.",
    },
    Template {
        name: "Baked Potato",
        ingredients: &["potato", "butter"],
        recipe: "Bake potatoes until tender, split and top with butter.",
    },
];

const SNACK: &[Template] = &[
    Template {
        name: "Apple with Peanut Butter",
        ingredients: &["apple", "peanut butter"],
        recipe: "Slice the apple, spread with peanut butter.",
    },
    Template {
        name: "Cheese and Crackers",
        ingredients: &["cheese", "crackers"],
        recipe: "Slice cheese, serve on crackers.",
    },
    Template {
        name: "Buttered Toast",
        ingredients: &["bread", "butter"],
        recipe: "Toast the bread, spread with butter.",
    },
];

fn templates_for(meal_type: &str) -> &'static [Template] {
    match meal_type {
        "breakfast" => BREAKFAST,
        "lunch" => LUNCH,
        "dinner" => DINNER,
        _ => SNACK,
    }
}

fn to_planned(t: &Template) -> PlannedMeal {
    PlannedMeal {
        name: t.name.to_string(),
        ingredients: t.ingredients.iter().map(|s| (*s).to_string()).collect(),
        recipe: t.recipe.to_string(),
        nutrition: None,
    }
}

/// Last-resort meal when no template clears the inventory threshold. Its
/// empty ingredient list always passes the match rule.
fn staples_meal(meal_type: &str) -> PlannedMeal {
    PlannedMeal {
        name: format!("Simple {meal_type} from pantry staples"),
        ingredients: Vec::new(),
        recipe: "Combine whatever staples are on hand into a simple plate.".to_string(),
        nutrition: None,
    }
}

/// Pick the template for `meal_type` with the best inventory coverage that
/// clears `threshold` and avoids `restrictions`.
#[must_use]
pub fn choose_fallback_meal(
    meal_type: &str,
    inventory_names: &[String],
    restrictions: &[String],
    threshold: f64,
) -> PlannedMeal {
    let mut best: Option<(f64, PlannedMeal)> = None;
    for template in templates_for(meal_type) {
        let meal = to_planned(template);
        if meal_violates_restrictions(&meal, restrictions) {
            continue;
        }
        if !meal_matches_inventory(&meal, inventory_names, threshold) {
            continue;
        }
        let ratio = ingredient_match_ratio(&meal.ingredients, inventory_names);
        if best.as_ref().is_none_or(|(r, _)| ratio > *r) {
            best = Some((ratio, meal));
        }
    }
    best.map_or_else(|| staples_meal(meal_type), |(_, meal)| meal)
}

/// Build a complete fallback plan covering every requested meal type.
#[must_use]
pub fn fallback_plan(
    meal_types: &[String],
    inventory_names: &[String],
    restrictions: &[String],
    threshold: f64,
) -> MealPlan {
    meal_types
        .iter()
        .map(|mt| {
            (
                mt.clone(),
                choose_fallback_meal(mt, inventory_names, restrictions, threshold),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_never_empty() {
        let meal_types = vec![
            "breakfast".to_string(),
            "lunch".to_string(),
            "dinner".to_string(),
            "snack".to_string(),
        ];
        // Empty pantry, 100% threshold: only staples meals qualify
        let plan = fallback_plan(&meal_types, &[], &[], 1.0);
        assert_eq!(plan.len(), 4);
        for mt in &meal_types {
            assert!(!plan[mt].name.is_empty());
        }
    }

    #[test]
    fn test_fallback_prefers_stocked_template() {
        let pantry = vec![
            "rice".to_string(),
            "eggs".to_string(),
            "soy sauce".to_string(),
        ];
        let meal = choose_fallback_meal("lunch", &pantry, &[], 1.0);
        assert_eq!(meal.name, "Fried Rice");
    }

    #[test]
    fn test_fallback_rice_only_pantry_no_chicken() {
        let pantry = vec!["rice".to_string()];
        let meal = choose_fallback_meal("dinner", &pantry, &[], 1.0);
        assert!(!meal.name.to_lowercase().contains("chicken"));
        for ing in &meal.ingredients {
            assert!(!ing.contains("chicken"));
        }
    }

    #[test]
    fn test_fallback_respects_restrictions() {
        let pantry = vec![
            "chicken".to_string(),
            "rice".to_string(),
            "onion".to_string(),
        ];
        let meal = choose_fallback_meal("dinner", &pantry, &["chicken".to_string()], 0.0);
        assert!(!meal.name.to_lowercase().contains("chicken"));
    }

    #[test]
    fn test_fallback_relaxed_threshold_partial_pantry() {
        let pantry = vec!["bread".to_string()];
        // A third of the grilled-cheese ingredients are on hand
        let meal = choose_fallback_meal("lunch", &pantry, &[], 0.3);
        assert!(!meal.ingredients.is_empty());
    }
}
