use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use pantry_core::db::Database;
use pantry_core::models::{NewSavingsGoal, SavingsGoal};

use super::helpers::{parse_date, truncate};

pub(crate) fn cmd_goal_add(
    db: &Database,
    name: &str,
    target: f64,
    by: Option<String>,
    json: bool,
) -> Result<()> {
    let target_date = by.map(|d| parse_date(Some(d))).transpose()?;
    let goal = db.insert_savings_goal(&NewSavingsGoal {
        name: name.to_string(),
        target_amount: target,
        target_date,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
    } else {
        println!(
            "Added goal '{}': ${:.2} (id {})",
            goal.name, goal.target_amount, goal.id
        );
    }
    Ok(())
}

pub(crate) fn cmd_goal_list(db: &Database, json: bool) -> Result<()> {
    let goals = db.list_savings_goals()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else if goals.is_empty() {
        eprintln!("No savings goals. Use `pantry goal add` to create one.");
    } else {
        print_goal_table(&goals);
    }
    Ok(())
}

pub(crate) fn cmd_goal_contribute(db: &Database, id: i64, amount: f64, json: bool) -> Result<()> {
    let goal = db.contribute_to_goal(id, amount)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&goal)?);
    } else {
        println!(
            "Added ${amount:.2} to '{}': ${:.2} of ${:.2}",
            goal.name, goal.saved_amount, goal.target_amount
        );
        if goal.saved_amount >= goal.target_amount {
            println!("Goal reached!");
        }
    }
    Ok(())
}

pub(crate) fn cmd_goal_remove(db: &Database, id: i64, json: bool) -> Result<()> {
    let removed = db.delete_savings_goal(id)?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed, "id": id }));
    } else if removed {
        println!("Removed goal {id}");
    } else {
        eprintln!("No goal with id {id}");
    }
    Ok(())
}

fn print_goal_table(goals: &[SavingsGoal]) {
    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Goal")]
        name: String,
        #[tabled(rename = "Saved")]
        saved: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Progress")]
        progress: String,
        #[tabled(rename = "By")]
        by: String,
    }

    let rows: Vec<GoalRow> = goals
        .iter()
        .map(|g| GoalRow {
            id: g.id,
            name: truncate(&g.name, 30),
            saved: format!("${:.2}", g.saved_amount),
            target: format!("${:.2}", g.target_amount),
            progress: format!("{:.0}%", g.saved_amount / g.target_amount * 100.0),
            by: g.target_date.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
