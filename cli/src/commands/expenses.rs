use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use pantry_core::db::Database;
use pantry_core::models::NewExpense;

use super::helpers::{parse_date, parse_month, truncate};

pub(crate) fn cmd_expense_add(
    db: &Database,
    description: &str,
    amount: f64,
    category: Option<String>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let expense = db.insert_expense(&NewExpense {
        description: description.to_string(),
        amount,
        category,
        date,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expense)?);
    } else {
        println!(
            "Recorded '{}' (${:.2}) on {}",
            expense.description, expense.amount, expense.date
        );
    }
    Ok(())
}

pub(crate) fn cmd_expense_list(db: &Database, month: Option<String>, json: bool) -> Result<()> {
    let month = month.map(|m| parse_month(&m)).transpose()?;
    let expenses = db.list_expenses(month.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&expenses)?);
    } else if expenses.is_empty() {
        eprintln!("No expenses found.");
    } else {
        #[derive(Tabled)]
        struct ExpenseRow {
            #[tabled(rename = "ID")]
            id: i64,
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Description")]
            description: String,
            #[tabled(rename = "Amount")]
            amount: String,
            #[tabled(rename = "Category")]
            category: String,
        }

        let rows: Vec<ExpenseRow> = expenses
            .iter()
            .map(|e| ExpenseRow {
                id: e.id,
                date: e.date.clone(),
                description: truncate(&e.description, 35),
                amount: format!("${:.2}", e.amount),
                category: e.category.clone().unwrap_or_default(),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..4)).with(Alignment::right()))
            .to_string();
        println!("{table}");

        let total: f64 = expenses.iter().map(|e| e.amount).sum();
        println!("Total: ${total:.2}");
    }
    Ok(())
}

pub(crate) fn cmd_expense_summary(db: &Database, month: Option<String>, json: bool) -> Result<()> {
    let month = month.map(|m| parse_month(&m)).transpose()?;
    let summary = db.expense_summary(month.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if summary.is_empty() {
        eprintln!("No expenses found.");
    } else {
        #[derive(Tabled)]
        struct SummaryRow {
            #[tabled(rename = "Category")]
            category: String,
            #[tabled(rename = "Total")]
            total: String,
            #[tabled(rename = "Count")]
            count: i64,
        }

        let rows: Vec<SummaryRow> = summary
            .iter()
            .map(|s| SummaryRow {
                category: s.category.clone(),
                total: format!("${:.2}", s.total),
                count: s.count,
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }
    Ok(())
}
