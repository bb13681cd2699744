use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use pantry_core::db::Database;
use pantry_core::models::{InventoryItem, NewInventoryItem, UpdateInventoryItem};

use super::helpers::{format_qty, parse_date, truncate};

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_inventory_add(
    db: &Database,
    name: &str,
    qty: f64,
    unit: Option<String>,
    category: Option<String>,
    location: Option<String>,
    expires: Option<String>,
    price: Option<f64>,
    json: bool,
) -> Result<()> {
    let exp_date = expires.map(|d| parse_date(Some(d))).transpose()?;
    let item = db.insert_inventory_item(&NewInventoryItem {
        name: name.to_string(),
        category,
        qty,
        unit,
        exp_date,
        location,
        purchase_price: price,
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        print!("Added {} x{}", item.name, format_qty(item.qty));
        if let Some(ref u) = item.unit {
            print!(" {u}");
        }
        println!(" (id {})", item.id);
    }
    Ok(())
}

pub(crate) fn cmd_inventory_list(
    db: &Database,
    search: Option<&str>,
    expiring: Option<i64>,
    json: bool,
) -> Result<()> {
    let items = match expiring {
        Some(days) => db.expiring_soon(days)?,
        None => db.list_inventory(search)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if items.is_empty() {
        eprintln!("No inventory items found. Use `pantry inventory add` to stock up.");
    } else {
        print_inventory_table(&items);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
pub(crate) fn cmd_inventory_update(
    db: &Database,
    id: i64,
    qty: Option<f64>,
    unit: Option<String>,
    location: Option<String>,
    expires: Option<String>,
    clear_unit: bool,
    clear_location: bool,
    clear_expires: bool,
    json: bool,
) -> Result<()> {
    let exp_date = expires.map(|d| parse_date(Some(d))).transpose()?;
    let item = db.update_inventory_item(
        id,
        &UpdateInventoryItem {
            qty,
            unit,
            location,
            exp_date,
            clear_unit,
            clear_location,
            clear_exp_date: clear_expires,
        },
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        println!("Updated {} (qty {})", item.name, format_qty(item.qty));
    }
    Ok(())
}

pub(crate) fn cmd_inventory_remove(db: &Database, id: i64, json: bool) -> Result<()> {
    let removed = db.delete_inventory_item(id)?;
    if json {
        println!("{}", serde_json::json!({ "removed": removed, "id": id }));
    } else if removed {
        println!("Removed inventory item {id}");
    } else {
        eprintln!("No inventory item with id {id}");
    }
    Ok(())
}

fn print_inventory_table(items: &[InventoryItem]) {
    #[derive(Tabled)]
    struct InventoryRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Qty")]
        qty: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Location")]
        location: String,
        #[tabled(rename = "Expires")]
        expires: String,
    }

    let rows: Vec<InventoryRow> = items
        .iter()
        .map(|i| InventoryRow {
            id: i.id,
            name: truncate(&i.name, 30),
            qty: format_qty(i.qty),
            unit: i.unit.clone().unwrap_or_default(),
            category: i.category.clone().unwrap_or_default(),
            location: i.location.clone().unwrap_or_default(),
            expires: i.exp_date.clone().unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
