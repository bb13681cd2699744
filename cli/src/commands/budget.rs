use anyhow::Result;
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use pantry_core::db::Database;

use super::helpers::parse_month;

pub(crate) fn cmd_budget_set(
    db: &Database,
    category: &str,
    limit: f64,
    json: bool,
) -> Result<()> {
    let budget = db.set_budget(category, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&budget)?);
    } else {
        println!(
            "Budget for {}: ${:.2}/month",
            budget.category, budget.monthly_limit
        );
    }
    Ok(())
}

pub(crate) fn cmd_budget_list(db: &Database, json: bool) -> Result<()> {
    let budgets = db.list_budgets()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&budgets)?);
    } else if budgets.is_empty() {
        eprintln!("No budgets set. Use `pantry budget set` to add one.");
    } else {
        #[derive(Tabled)]
        struct BudgetRow {
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Monthly limit")]
            limit: String,
        }

        let rows: Vec<BudgetRow> = budgets
            .iter()
            .map(|b| BudgetRow {
                category: b.category.clone(),
                limit: format!("${:.2}", b.monthly_limit),
            })
            .collect();
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    Ok(())
}

/// Compare each budget against the month's recorded expenses.
pub(crate) fn cmd_budget_status(db: &Database, month: Option<String>, json: bool) -> Result<()> {
    let month = match month {
        Some(m) => parse_month(&m)?,
        None => Local::now().format("%Y-%m").to_string(),
    };
    let statuses = db.budget_status(&month)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
    } else if statuses.is_empty() {
        eprintln!("No budgets set. Use `pantry budget set` to add one.");
    } else {
        #[derive(Tabled)]
        struct StatusRow {
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Limit")]
            limit: String,
            #[tabled(rename = "Spent")]
            spent: String,
            #[tabled(rename = "Remaining")]
            remaining: String,
        }

        let rows: Vec<StatusRow> = statuses
            .iter()
            .map(|s| StatusRow {
                category: s.category.clone(),
                limit: format!("${:.2}", s.monthly_limit),
                spent: format!("${:.2}", s.spent),
                remaining: format!("${:.2}", s.remaining),
            })
            .collect();
        println!("Budgets for {month}:");
        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..4)).with(Alignment::right()))
            .to_string();
        println!("{table}");
        for s in &statuses {
            if s.remaining < 0.0 {
                eprintln!("Over budget on {}: ${:.2}", s.category, -s.remaining);
            }
        }
    }
    Ok(())
}

pub(crate) fn cmd_budget_remove(db: &Database, category: &str, json: bool) -> Result<()> {
    let removed = db.delete_budget(category)?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "removed": removed, "category": category })
        );
    } else if removed {
        println!("Removed budget for {category}");
    } else {
        eprintln!("No budget for {category}");
    }
    Ok(())
}
