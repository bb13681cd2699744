use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use chrono::Local;

use pantry_core::db::Database;
use pantry_core::models::{Bill, NewBill, NewExpense};

use super::helpers::{parse_date, truncate};

pub(crate) fn cmd_bill_add(
    db: &Database,
    name: &str,
    amount: f64,
    due: Option<String>,
    category: Option<String>,
    json: bool,
) -> Result<()> {
    let due_date = due.map(|d| parse_date(Some(d))).transpose()?;
    let bill = db.insert_bill(&NewBill {
        name: name.to_string(),
        amount,
        due_date,
        category,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bill)?);
    } else {
        print!("Added bill '{}' (${:.2})", bill.name, bill.amount);
        if let Some(ref d) = bill.due_date {
            print!(", due {d}");
        }
        println!(" (id {})", bill.id);
    }
    Ok(())
}

pub(crate) fn cmd_bill_list(
    db: &Database,
    all: bool,
    due_within: Option<i64>,
    json: bool,
) -> Result<()> {
    let bills = match due_within {
        Some(days) => db.bills_due_within(days)?,
        None => db.list_bills(!all)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&bills)?);
    } else if bills.is_empty() {
        eprintln!("No bills found.");
    } else {
        print_bill_table(&bills);
        let unpaid: f64 = bills.iter().filter(|b| !b.paid).map(|b| b.amount).sum();
        println!("Unpaid total: ${unpaid:.2}");
    }
    Ok(())
}

pub(crate) fn cmd_bill_pay(db: &Database, id: i64, record_expense: bool, json: bool) -> Result<()> {
    let bill = db.mark_bill_paid(id)?;
    if record_expense {
        db.insert_expense(&NewExpense {
            description: bill.name.clone(),
            amount: bill.amount,
            category: bill.category.clone(),
            date: Local::now().date_naive(),
        })?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&bill)?);
    } else {
        println!("Marked '{}' as paid (${:.2})", bill.name, bill.amount);
        if record_expense {
            println!("Recorded a matching expense");
        }
    }
    Ok(())
}

fn print_bill_table(bills: &[Bill]) {
    #[derive(Tabled)]
    struct BillRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Due")]
        due: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Paid")]
        paid: String,
    }

    let rows: Vec<BillRow> = bills
        .iter()
        .map(|b| BillRow {
            id: b.id,
            name: truncate(&b.name, 30),
            amount: format!("${:.2}", b.amount),
            due: b.due_date.clone().unwrap_or_default(),
            category: b.category.clone().unwrap_or_default(),
            paid: if b.paid { "yes" } else { "" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
