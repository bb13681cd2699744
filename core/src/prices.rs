use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::db::Database;
use crate::extract::extract_json_object;
use crate::models::{NewVerifiedPrice, normalize_item_name};

/// Provider seam for grocery price estimation: one batched call for all
/// uncached items at a ZIP code, answered as `{item: price}`.
pub trait PriceQuoteProvider {
    fn name(&self) -> &str;
    fn quote_prices(&self, items: &[String], location_zip: &str) -> Result<HashMap<String, f64>>;
}

/// Sanity bounds on a single estimated grocery price. AI responses outside
/// the open interval (0, 100) are discarded.
#[must_use]
pub fn is_plausible_price(price: f64) -> bool {
    price.is_finite() && price > 0.0 && price < 100.0
}

/// Parse a provider's text response into item → price, dropping entries that
/// are not plausible numeric prices.
pub fn parse_price_response(text: &str) -> Result<HashMap<String, f64>> {
    let value = extract_json_object(text)?;
    let obj = value
        .as_object()
        .context("Price response is not a JSON object")?;

    let mut prices = HashMap::new();
    for (item, v) in obj {
        let price = match v {
            serde_json::Value::Number(n) => n.as_f64(),
            // Tolerate "3.49" and "$3.49"
            serde_json::Value::String(s) => s.trim().trim_start_matches('$').parse::<f64>().ok(),
            _ => None,
        };
        if let Some(price) = price {
            if is_plausible_price(price) {
                prices.insert(normalize_item_name(item), price);
            }
        }
    }
    Ok(prices)
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub item: String,
    pub price: f64,
    pub source: String,
    pub confidence: f64,
    /// True when served from `verified_prices` instead of a live call.
    pub cached: bool,
}

#[derive(Debug, Clone)]
pub struct PriceConfig {
    /// Cached rows below this confidence are ignored.
    pub min_confidence: f64,
    /// TTL for freshly verified prices.
    pub ttl_days: i64,
    /// Confidence recorded for prices accepted from a provider.
    pub provider_confidence: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            ttl_days: 7,
            provider_confidence: 0.8,
        }
    }
}

/// Serves prices from the cache where possible and batches the rest into a
/// single provider call, writing accepted answers back with a TTL.
pub struct PriceLookupService<'a> {
    db: &'a Database,
    config: PriceConfig,
}

impl<'a> PriceLookupService<'a> {
    #[must_use]
    pub const fn new(db: &'a Database, config: PriceConfig) -> Self {
        Self { db, config }
    }

    pub fn lookup(
        &self,
        provider: &dyn PriceQuoteProvider,
        items: &[String],
        location_zip: &str,
    ) -> Result<Vec<PriceQuote>> {
        let mut quotes: Vec<PriceQuote> = Vec::new();
        let mut uncached: Vec<String> = Vec::new();

        for item in items {
            let name = normalize_item_name(item);
            if name.is_empty() {
                continue;
            }
            match self
                .db
                .get_verified_price(&name, location_zip, self.config.min_confidence)?
            {
                Some(hit) => quotes.push(PriceQuote {
                    item: hit.item,
                    price: hit.price,
                    source: hit.source,
                    confidence: hit.confidence,
                    cached: true,
                }),
                None => uncached.push(name),
            }
        }

        if uncached.is_empty() {
            return Ok(quotes);
        }

        let fresh = provider.quote_prices(&uncached, location_zip)?;
        for item in &uncached {
            let Some(&price) = fresh.get(item) else {
                eprintln!("{}: no price returned for '{item}'", provider.name());
                continue;
            };
            if !is_plausible_price(price) {
                eprintln!(
                    "{}: discarding implausible price {price} for '{item}'",
                    provider.name()
                );
                continue;
            }
            self.db.store_verified_price(
                &NewVerifiedPrice {
                    item: item.clone(),
                    location_zip: location_zip.to_string(),
                    price,
                    source: provider.name().to_string(),
                    confidence: self.config.provider_confidence,
                },
                self.config.ttl_days,
            )?;
            quotes.push(PriceQuote {
                item: item.clone(),
                price,
                source: provider.name().to_string(),
                confidence: self.config.provider_confidence,
                cached: false,
            });
        }

        Ok(quotes)
    }
}
