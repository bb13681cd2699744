use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use pantry_core::db::Database;
use pantry_core::models::{MealPlan, PlannedMeal, Priority, ShoppingItem};
use pantry_core::shopping::{ShoppingConfig, ShoppingListBuilder};

use super::helpers::{format_qty, parse_date, truncate};

/// Regenerate suggestions from inventory, usage history, and the stored plan
/// for a date (default today). Checked-off rows are left alone.
pub(crate) fn cmd_shopping_generate(
    db: &Database,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let meals = db.meals_for_date(date)?;
    let plan: MealPlan = meals
        .iter()
        .map(|m| {
            (
                m.meal_type.clone(),
                PlannedMeal {
                    name: m.name.clone(),
                    ingredients: m.ingredients.clone(),
                    recipe: m.recipe.clone().unwrap_or_default(),
                    nutrition: m.nutrition.clone(),
                },
            )
        })
        .collect();

    let builder = ShoppingListBuilder::new(db, ShoppingConfig::default());
    let suggestions = builder.refresh((!plan.is_empty()).then_some(&plan))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
    } else if suggestions.is_empty() {
        println!("Nothing to buy, the pantry looks well stocked.");
    } else {
        println!("Suggested {} item(s):", suggestions.len());
        let items = db.list_shopping(false)?;
        print_shopping_table(&items);
    }
    Ok(())
}

pub(crate) fn cmd_shopping_list(db: &Database, all: bool, json: bool) -> Result<()> {
    let items = db.list_shopping(all)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        eprintln!("Shopping list is empty. Use `pantry shopping generate` to fill it.");
    } else {
        print_shopping_table(&items);
    }
    Ok(())
}

pub(crate) fn cmd_shopping_add(
    db: &Database,
    item: &str,
    qty: Option<f64>,
    unit: Option<&str>,
    priority: &str,
    json: bool,
) -> Result<()> {
    let Some(priority) = Priority::parse(priority) else {
        bail!("Invalid priority '{priority}'. Use needed, low-stock, or bulk-buy");
    };
    let row = db.insert_shopping_item(item, qty, unit, priority.as_str(), None)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&row)?);
    } else {
        println!("Added '{}' to the shopping list (id {})", row.item, row.id);
    }
    Ok(())
}

pub(crate) fn cmd_shopping_check(db: &Database, id: i64, undo: bool, json: bool) -> Result<()> {
    let found = db.set_shopping_checked(id, !undo)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "id": id, "checked": !undo, "found": found })
        );
    } else if !found {
        eprintln!("No shopping item with id {id}");
    } else if undo {
        println!("Unchecked item {id}");
    } else {
        println!("Checked off item {id}");
    }
    Ok(())
}

pub(crate) fn cmd_shopping_clear(db: &Database, checked_only: bool, json: bool) -> Result<()> {
    let n = db.clear_shopping(checked_only)?;

    if json {
        println!("{}", serde_json::json!({ "cleared": n }));
    } else {
        println!("Cleared {n} item(s)");
    }
    Ok(())
}

fn print_shopping_table(items: &[ShoppingItem]) {
    #[derive(Tabled)]
    struct ShoppingRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = " ")]
        checked: String,
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Qty")]
        qty: String,
        #[tabled(rename = "Priority")]
        priority: String,
        #[tabled(rename = "Reason")]
        reason: String,
    }

    let rows: Vec<ShoppingRow> = items
        .iter()
        .map(|i| ShoppingRow {
            id: i.id,
            checked: if i.checked { "x" } else { "" }.to_string(),
            item: truncate(&i.item, 30),
            qty: match (i.qty, &i.unit) {
                (Some(q), Some(u)) => format!("{} {u}", format_qty(q)),
                (Some(q), None) => format_qty(q),
                _ => String::new(),
            },
            priority: i.priority.clone(),
            reason: i.reason.clone().map(|r| truncate(&r, 40)).unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}
