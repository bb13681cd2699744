use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use pantry_core::db::Database;
use pantry_core::prices::{PriceConfig, PriceLookupService, PriceQuote};

use crate::config::Settings;
use crate::providers::AimlApiClient;

use super::helpers::truncate;

/// Look up prices for the given items, or for the unchecked shopping list
/// when no items are given.
pub(crate) fn cmd_price_lookup(
    db: &Database,
    settings: &Settings,
    items: Vec<String>,
    zip: Option<String>,
    json: bool,
) -> Result<()> {
    let Some(zip) = zip.or_else(|| settings.location_zip.clone()) else {
        bail!("No ZIP code given. Pass --zip or set location_zip in config.json");
    };
    let Some(key) = &settings.aimlapi_api_key else {
        bail!("No AIMLAPI key configured. Set aimlapi_api_key or PANTRY_AIMLAPI_API_KEY");
    };

    let items = if items.is_empty() {
        db.list_shopping(false)?
            .into_iter()
            .map(|i| i.item)
            .collect()
    } else {
        items
    };
    if items.is_empty() {
        bail!("Nothing to price: no items given and the shopping list is empty");
    }

    let provider = AimlApiClient::new(key.clone());
    let service = PriceLookupService::new(db, PriceConfig::default());
    let quotes = service.lookup(&provider, &items, &zip)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&quotes)?);
    } else if quotes.is_empty() {
        eprintln!("No usable prices returned.");
    } else {
        print_price_table(&quotes);
        let total: f64 = quotes.iter().map(|q| q.price).sum();
        println!("Estimated total: ${total:.2}");
    }
    Ok(())
}

fn print_price_table(quotes: &[PriceQuote]) {
    #[derive(Tabled)]
    struct PriceRow {
        #[tabled(rename = "Item")]
        item: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Source")]
        source: String,
        #[tabled(rename = "Cached")]
        cached: String,
    }

    let rows: Vec<PriceRow> = quotes
        .iter()
        .map(|q| PriceRow {
            item: truncate(&q.item, 30),
            price: format!("${:.2}", q.price),
            source: q.source.clone(),
            cached: if q.cached { "yes" } else { "" }.to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
