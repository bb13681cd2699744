use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use pantry_core::db::Database;
use pantry_core::models::validate_meal_types;
use pantry_core::multi::{MultiProviderConfig, MultiProviderPlanner};
use pantry_core::planner::{MealPlanRequest, MealPlanService, PlanSource, PlannerConfig};

use crate::config::Settings;
use crate::providers::configured_planners;

use super::helpers::{parse_date, truncate};

pub(crate) fn cmd_plan_generate(
    db: &Database,
    settings: &Settings,
    date: Option<String>,
    meals: &[String],
    restrictions: Vec<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let meal_types = validate_meal_types(meals)?;

    // Family members' dietary restrictions always apply
    let mut restrictions = restrictions;
    for r in db.member_dietary_restrictions()? {
        if !restrictions.contains(&r) {
            restrictions.push(r);
        }
    }

    let providers = configured_planners(settings);
    if providers.is_empty() {
        eprintln!("No AI providers configured, using built-in templates only.");
        eprintln!("Set an API key in config.json or PANTRY_*_API_KEY to enable AI planning.");
    }
    let mut planner = MultiProviderPlanner::new(providers, &MultiProviderConfig::default());
    let service = MealPlanService::new(
        db,
        PlannerConfig {
            cache_expiry_days: settings.cache_expiry_days,
            match_threshold: settings.match_threshold,
        },
    );

    let request = MealPlanRequest {
        date,
        meal_types,
        dietary_restrictions: restrictions,
    };
    let outcome = service.plan_meals(&mut planner, &request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Meal plan for {}:", date.format("%Y-%m-%d"));
        print_plan_table(&outcome.plan);
        println!("Source: {}", source_label(outcome.source));
    }
    Ok(())
}

pub(crate) fn cmd_plan_show(db: &Database, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let meals = db.meals_for_date(date)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&meals)?);
    } else if meals.is_empty() {
        eprintln!(
            "No meals for {}. Use `pantry plan generate` to create a plan.",
            date.format("%Y-%m-%d")
        );
    } else {
        #[derive(Tabled)]
        struct MealRow {
            #[tabled(rename = "Meal")]
            meal_type: String,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Ingredients")]
            ingredients: String,
            #[tabled(rename = "Auto")]
            auto: String,
        }

        let rows: Vec<MealRow> = meals
            .iter()
            .map(|m| MealRow {
                meal_type: m.meal_type.clone(),
                name: truncate(&m.name, 35),
                ingredients: truncate(&m.ingredients.join(", "), 50),
                auto: if m.auto_generated { "yes" } else { "" }.to_string(),
            })
            .collect();
        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }
    Ok(())
}

pub(crate) fn cmd_cache_clear(db: &Database, json: bool) -> Result<()> {
    let plans = db.clear_meal_plan_cache()?;
    let prices = db.prune_expired_prices()?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "plans_cleared": plans, "prices_pruned": prices })
        );
    } else {
        println!("Cleared {plans} cached plan(s), pruned {prices} expired price(s)");
    }
    Ok(())
}

const fn source_label(source: PlanSource) -> &'static str {
    match source {
        PlanSource::Cache => "cache",
        PlanSource::Provider => "AI provider",
        PlanSource::Fallback => "built-in templates",
        PlanSource::Mixed => "AI provider + templates",
    }
}

fn print_plan_table(plan: &pantry_core::models::MealPlan) {
    #[derive(Tabled)]
    struct PlanRow {
        #[tabled(rename = "Meal")]
        meal_type: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ingredients")]
        ingredients: String,
    }

    let rows: Vec<PlanRow> = plan
        .iter()
        .map(|(mt, meal)| PlanRow {
            meal_type: mt.clone(),
            name: truncate(&meal.name, 35),
            ingredients: truncate(&meal.ingredients.join(", "), 50),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}
