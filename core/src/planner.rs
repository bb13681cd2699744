use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::db::Database;
use crate::extract::extract_json_object;
use crate::fallback;
use crate::models::{
    InventoryItem, MealPlan, NewMeal, PlannedMeal, canonical_list, meal_matches_inventory,
    meal_violates_restrictions, normalize_item_name, validate_meal_type,
};
use crate::multi::MultiProviderPlanner;

#[derive(Debug, Clone)]
pub struct MealPlanRequest {
    pub date: NaiveDate,
    pub meal_types: Vec<String>,
    pub dietary_restrictions: Vec<String>,
}

/// Provider seam for meal-plan generation.
///
/// The CLI implements this with reqwest clients per AI vendor; tests use
/// in-memory mocks. Implementations are synchronous from the core's point
/// of view.
pub trait MealPlanProvider {
    fn name(&self) -> &str;
    fn generate_plan(
        &self,
        request: &MealPlanRequest,
        inventory: &[InventoryItem],
    ) -> Result<MealPlan>;
}

/// SHA-256 over the sorted, normalized pantry contents. Permuting the item
/// list yields the same hash; changing any name, quantity, or unit does not.
#[must_use]
pub fn inventory_fingerprint(items: &[InventoryItem]) -> String {
    let mut entries: Vec<(String, String, String)> = items
        .iter()
        .map(|i| {
            (
                normalize_item_name(&i.name),
                // Fixed-precision quantity so 5 and 5.0 hash identically
                format!("{:.3}", i.qty),
                i.unit.as_deref().map(normalize_item_name).unwrap_or_default(),
            )
        })
        .collect();
    entries.sort();
    let json = serde_json::to_string(&entries).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Parse a provider's text response into a plan, keeping only entries keyed
/// by a valid meal type.
pub fn parse_plan_response(text: &str) -> Result<MealPlan> {
    let value = extract_json_object(text)?;
    let obj = value
        .as_object()
        .context("Plan response is not a JSON object")?;

    let mut plan = MealPlan::new();
    for (key, meal) in obj {
        let Ok(meal_type) = validate_meal_type(key) else {
            continue;
        };
        let meal: PlannedMeal = serde_json::from_value(meal.clone())
            .with_context(|| format!("Malformed meal entry for '{meal_type}'"))?;
        if meal.name.trim().is_empty() {
            bail!("Meal for '{meal_type}' has an empty name");
        }
        plan.insert(meal_type, meal);
    }
    if plan.is_empty() {
        bail!("Plan response contained no recognizable meals");
    }
    Ok(plan)
}

/// Where the returned plan came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanSource {
    Cache,
    Provider,
    Fallback,
    /// Provider output that needed template patching for some meal types.
    Mixed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub plan: MealPlan,
    pub source: PlanSource,
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Cached plans older than this many days are ignored.
    pub cache_expiry_days: i64,
    /// Minimum fraction of a meal's ingredients that must be in the pantry.
    pub match_threshold: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            cache_expiry_days: 7,
            match_threshold: 1.0,
        }
    }
}

/// Produces a meal plan for a date: cache first, then providers, then
/// templates, persisting the result as `auto_generated` meals.
pub struct MealPlanService<'a> {
    db: &'a Database,
    config: PlannerConfig,
}

impl<'a> MealPlanService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, config: PlannerConfig) -> Self {
        Self { db, config }
    }

    pub fn plan_meals(
        &self,
        planner: &mut MultiProviderPlanner,
        request: &MealPlanRequest,
    ) -> Result<PlanOutcome> {
        let inventory = self.db.list_inventory(None)?;
        let pantry = self.db.inventory_names()?;
        let hash = inventory_fingerprint(&inventory);
        let meal_types_key = canonical_list(&request.meal_types);
        let restrictions_key = canonical_list(&request.dietary_restrictions);

        if let Some(cached) = self.db.get_cached_meal_plan(
            &hash,
            &meal_types_key,
            &restrictions_key,
            self.config.cache_expiry_days,
        )? {
            self.persist_plan(request, &cached.plan)?;
            return Ok(PlanOutcome {
                plan: cached.plan,
                source: PlanSource::Cache,
            });
        }

        let generated = planner.generate(request, &inventory);
        let (plan, source) = self.assemble_plan(request, &pantry, generated);

        self.db
            .store_meal_plan(&hash, &meal_types_key, &restrictions_key, &plan)?;
        self.persist_plan(request, &plan)?;

        Ok(PlanOutcome { plan, source })
    }

    /// Take whatever the providers produced, keep the meals that pass the
    /// inventory and restriction checks, and patch the rest from templates.
    fn assemble_plan(
        &self,
        request: &MealPlanRequest,
        pantry: &[String],
        generated: Option<MealPlan>,
    ) -> (MealPlan, PlanSource) {
        let Some(generated) = generated else {
            let plan = fallback::fallback_plan(
                &request.meal_types,
                pantry,
                &request.dietary_restrictions,
                self.config.match_threshold,
            );
            return (plan, PlanSource::Fallback);
        };

        let mut plan = MealPlan::new();
        let mut patched = 0usize;
        for meal_type in &request.meal_types {
            let candidate = generated.get(meal_type).filter(|meal| {
                meal_matches_inventory(meal, pantry, self.config.match_threshold)
                    && !meal_violates_restrictions(meal, &request.dietary_restrictions)
            });
            match candidate {
                Some(meal) => {
                    plan.insert(meal_type.clone(), meal.clone());
                }
                None => {
                    patched += 1;
                    plan.insert(
                        meal_type.clone(),
                        fallback::choose_fallback_meal(
                            meal_type,
                            pantry,
                            &request.dietary_restrictions,
                            self.config.match_threshold,
                        ),
                    );
                }
            }
        }

        let source = if patched == 0 {
            PlanSource::Provider
        } else if patched == request.meal_types.len() {
            PlanSource::Fallback
        } else {
            PlanSource::Mixed
        };
        (plan, source)
    }

    /// Replace the date's auto-generated meals with the new plan.
    fn persist_plan(&self, request: &MealPlanRequest, plan: &MealPlan) -> Result<()> {
        self.db.delete_auto_meals(request.date)?;
        for (meal_type, meal) in plan {
            self.db.insert_meal(&NewMeal {
                date: request.date,
                meal_type: meal_type.clone(),
                name: meal.name.clone(),
                ingredients: meal.ingredients.clone(),
                recipe: (!meal.recipe.is_empty()).then(|| meal.recipe.clone()),
                nutrition: meal.nutrition.clone(),
                auto_generated: true,
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewInventoryItem;
    use crate::multi::MultiProviderConfig;

    fn add_item(db: &Database, name: &str, qty: f64) {
        db.insert_inventory_item(&NewInventoryItem {
            name: name.to_string(),
            category: None,
            qty,
            unit: Some("kg".to_string()),
            exp_date: None,
            location: None,
            purchase_price: None,
        })
        .unwrap();
    }

    fn item(name: &str, qty: f64, unit: &str) -> InventoryItem {
        InventoryItem {
            id: 0,
            uuid: String::new(),
            name: name.to_string(),
            category: None,
            qty,
            unit: Some(unit.to_string()),
            exp_date: None,
            location: None,
            purchase_price: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn request(meal_types: &[&str]) -> MealPlanRequest {
        MealPlanRequest {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            meal_types: meal_types.iter().map(|s| (*s).to_string()).collect(),
            dietary_restrictions: vec![],
        }
    }

    struct CannedProvider {
        plan_json: &'static str,
    }

    impl MealPlanProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        fn generate_plan(
            &self,
            _request: &MealPlanRequest,
            _inventory: &[InventoryItem],
        ) -> Result<MealPlan> {
            parse_plan_response(self.plan_json)
        }
    }

    struct FailingProvider;

    impl MealPlanProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate_plan(
            &self,
            _request: &MealPlanRequest,
            _inventory: &[InventoryItem],
        ) -> Result<MealPlan> {
            anyhow::bail!("offline")
        }
    }

    #[test]
    fn test_fingerprint_order_independent() {
        let a = vec![item("Rice", 5.0, "kg"), item("Milk", 1.0, "l")];
        let b = vec![item("Milk", 1.0, "l"), item("Rice", 5.0, "kg")];
        assert_eq!(inventory_fingerprint(&a), inventory_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_normalizes_names() {
        let a = vec![item("Rice", 5.0, "kg")];
        let b = vec![item("  rice ", 5.0, "KG")];
        assert_eq!(inventory_fingerprint(&a), inventory_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_changes_with_qty() {
        let a = vec![item("Rice", 5.0, "kg")];
        let b = vec![item("Rice", 4.0, "kg")];
        assert_ne!(inventory_fingerprint(&a), inventory_fingerprint(&b));
    }

    #[test]
    fn test_parse_plan_response_full() {
        let text = r#"```json
        {"breakfast": {"name": "Oatmeal", "ingredients": ["oats", "milk"], "recipe": "Simmer."},
         "dinner": {"name": "Fried Rice", "ingredients": ["rice", "egg"]}}
        ```"#;
        let plan = parse_plan_response(text).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan["breakfast"].name, "Oatmeal");
        assert_eq!(plan["dinner"].ingredients, vec!["rice", "egg"]);
    }

    #[test]
    fn test_parse_plan_response_ignores_unknown_keys() {
        let text = r#"{"breakfast": {"name": "Oatmeal", "ingredients": []},
                       "midnight_feast": {"name": "Nope", "ingredients": []}}"#;
        let plan = parse_plan_response(text).unwrap();
        assert_eq!(plan.len(), 1);
        assert!(plan.contains_key("breakfast"));
    }

    #[test]
    fn test_parse_plan_response_rejects_garbage() {
        assert!(parse_plan_response("the dog ate my meal plan").is_err());
        assert!(parse_plan_response(r#"{"unrelated": 42}"#).is_err());
        assert!(parse_plan_response(r#"{"breakfast": {"name": "", "ingredients": []}}"#).is_err());
    }

    #[test]
    fn test_plan_meals_uses_provider_and_caches() {
        let db = Database::open_in_memory().unwrap();
        add_item(&db, "rice", 5.0);
        add_item(&db, "egg", 12.0);
        let svc = MealPlanService::new(&db, PlannerConfig::default());
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(CannedProvider {
                plan_json: r#"{"dinner": {"name": "Fried Rice", "ingredients": ["rice", "egg"]}}"#,
            })],
            &MultiProviderConfig::default(),
        );

        let outcome = svc.plan_meals(&mut planner, &request(&["dinner"])).unwrap();
        assert_eq!(outcome.source, PlanSource::Provider);
        assert_eq!(outcome.plan["dinner"].name, "Fried Rice");

        // Second call must hit the cache, even with no usable provider
        let mut broken = MultiProviderPlanner::new(
            vec![Box::new(FailingProvider)],
            &MultiProviderConfig::default(),
        );
        let cached = svc.plan_meals(&mut broken, &request(&["dinner"])).unwrap();
        assert_eq!(cached.source, PlanSource::Cache);
        assert_eq!(cached.plan["dinner"].name, "Fried Rice");
    }

    #[test]
    fn test_plan_meals_falls_back_when_all_providers_fail() {
        let db = Database::open_in_memory().unwrap();
        add_item(&db, "rice", 5.0);
        let svc = MealPlanService::new(&db, PlannerConfig::default());
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(FailingProvider)],
            &MultiProviderConfig::default(),
        );

        let outcome = svc
            .plan_meals(&mut planner, &request(&["breakfast"]))
            .unwrap();
        assert_eq!(outcome.source, PlanSource::Fallback);
        assert!(outcome.plan.contains_key("breakfast"));
    }

    #[test]
    fn test_plan_meals_rejects_unstocked_ai_meal() {
        // Rice-only pantry at a 100% threshold: the provider's chicken meal
        // must be replaced by a template that the pantry can cover.
        let db = Database::open_in_memory().unwrap();
        add_item(&db, "rice", 5.0);
        let svc = MealPlanService::new(&db, PlannerConfig::default());
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(CannedProvider {
                plan_json:
                    r#"{"breakfast": {"name": "Chicken Omelette", "ingredients": ["chicken", "eggs"]}}"#,
            })],
            &MultiProviderConfig::default(),
        );

        let outcome = svc
            .plan_meals(&mut planner, &request(&["breakfast"]))
            .unwrap();
        assert_eq!(outcome.source, PlanSource::Fallback);
        let meal = &outcome.plan["breakfast"];
        assert!(!meal.name.to_lowercase().contains("chicken"));
        for ing in &meal.ingredients {
            assert!(!ing.contains("chicken"));
        }
    }

    #[test]
    fn test_plan_meals_mixed_source() {
        let db = Database::open_in_memory().unwrap();
        add_item(&db, "rice", 5.0);
        add_item(&db, "egg", 12.0);
        let svc = MealPlanService::new(&db, PlannerConfig::default());
        // Dinner is stocked, breakfast requires milk the pantry lacks
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(CannedProvider {
                plan_json: r#"{"dinner": {"name": "Fried Rice", "ingredients": ["rice", "egg"]},
                               "breakfast": {"name": "Cereal", "ingredients": ["milk", "cereal"]}}"#,
            })],
            &MultiProviderConfig::default(),
        );

        let outcome = svc
            .plan_meals(&mut planner, &request(&["breakfast", "dinner"]))
            .unwrap();
        assert_eq!(outcome.source, PlanSource::Mixed);
        assert_eq!(outcome.plan["dinner"].name, "Fried Rice");
        assert_ne!(outcome.plan["breakfast"].name, "Cereal");
    }

    #[test]
    fn test_plan_meals_respects_restrictions() {
        let db = Database::open_in_memory().unwrap();
        add_item(&db, "chicken", 2.0);
        add_item(&db, "rice", 5.0);
        let svc = MealPlanService::new(&db, PlannerConfig::default());
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(CannedProvider {
                plan_json: r#"{"dinner": {"name": "Chicken Rice", "ingredients": ["chicken", "rice"]}}"#,
            })],
            &MultiProviderConfig::default(),
        );

        let mut req = request(&["dinner"]);
        req.dietary_restrictions = vec!["chicken".to_string()];
        let outcome = svc.plan_meals(&mut planner, &req).unwrap();
        assert!(!outcome.plan["dinner"].name.to_lowercase().contains("chicken"));
    }

    #[test]
    fn test_plan_meals_persists_auto_meals() {
        let db = Database::open_in_memory().unwrap();
        add_item(&db, "rice", 5.0);
        add_item(&db, "egg", 12.0);
        let svc = MealPlanService::new(&db, PlannerConfig::default());
        let mut planner = MultiProviderPlanner::new(
            vec![Box::new(CannedProvider {
                plan_json: r#"{"dinner": {"name": "Fried Rice", "ingredients": ["rice", "egg"]}}"#,
            })],
            &MultiProviderConfig::default(),
        );

        let req = request(&["dinner"]);
        svc.plan_meals(&mut planner, &req).unwrap();
        let meals = db.meals_for_date(req.date).unwrap();
        assert_eq!(meals.len(), 1);
        assert!(meals[0].auto_generated);
        assert_eq!(meals[0].name, "Fried Rice");

        // Replanning replaces, not duplicates
        svc.plan_meals(&mut planner, &req).unwrap();
        assert_eq!(db.meals_for_date(req.date).unwrap().len(), 1);
    }
}
