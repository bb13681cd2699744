//! HTTP clients for the AI services that back meal planning and price
//! estimation. Every client asks for bare JSON and funnels the reply through
//! the same tolerant parsing in `pantry_core`.

mod aimlapi;
mod chat;
mod gemini;
mod huggingface;
mod opencode;

use std::fmt::Write;

use pantry_core::models::InventoryItem;
use pantry_core::planner::{MealPlanProvider, MealPlanRequest};

use crate::config::Settings;

pub(crate) use aimlapi::AimlApiClient;
pub(crate) use gemini::GeminiClient;
pub(crate) use huggingface::HuggingFaceClient;
pub(crate) use opencode::OpenCodeClient;

/// Build the meal-plan providers that have keys configured, in priority order.
pub(crate) fn configured_planners(settings: &Settings) -> Vec<Box<dyn MealPlanProvider>> {
    let mut providers: Vec<Box<dyn MealPlanProvider>> = Vec::new();
    for name in &settings.provider_priority {
        match name.as_str() {
            "gemini" => {
                if let Some(key) = &settings.gemini_api_key {
                    providers.push(Box::new(GeminiClient::new(key.clone())));
                }
            }
            "huggingface" => {
                if let Some(key) = &settings.huggingface_api_key {
                    providers.push(Box::new(HuggingFaceClient::new(key.clone())));
                }
            }
            "opencode" => {
                if let Some(key) = &settings.opencode_api_key {
                    providers.push(Box::new(OpenCodeClient::new(key.clone())));
                }
            }
            other => eprintln!("Ignoring unknown provider '{other}' in provider_priority"),
        }
    }
    providers
}

pub(crate) fn default_http_client(name: &str) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(format!(
            "pantry-cli/{} ({name})",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(std::time::Duration::from_secs(30))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap_or_default()
}

/// Prompt shared by every meal-plan provider. The inventory listing keeps
/// quantities so the model can judge what a meal would use up.
pub(crate) fn build_plan_prompt(request: &MealPlanRequest, inventory: &[InventoryItem]) -> String {
    let mut prompt = String::from(
        "You are a meal planner. Using ONLY ingredients from the pantry below, \
         suggest one meal per requested meal type.\n\nPantry:\n",
    );
    if inventory.is_empty() {
        prompt.push_str("(empty)\n");
    }
    for item in inventory {
        let _ = write!(prompt, "- {} ({}", item.name, item.qty);
        if let Some(unit) = &item.unit {
            let _ = write!(prompt, " {unit}");
        }
        prompt.push_str(")\n");
    }
    prompt.push('\n');
    let _ = writeln!(prompt, "Meal types: {}", request.meal_types.join(", "));
    if !request.dietary_restrictions.is_empty() {
        let _ = writeln!(
            prompt,
            "Dietary restrictions (must avoid): {}",
            request.dietary_restrictions.join(", ")
        );
    }
    prompt.push_str(
        "\nRespond with ONLY a JSON object, no prose, shaped like:\n\
         {\"breakfast\": {\"name\": \"...\", \"ingredients\": [\"...\"], \"recipe\": \"...\"}}\n\
         Use exactly the requested meal types as keys.",
    );
    prompt
}

/// Prompt for batched grocery price estimation at a ZIP code.
pub(crate) fn build_price_prompt(items: &[String], location_zip: &str) -> String {
    let mut prompt = format!(
        "Estimate typical grocery store prices in USD for these items near ZIP code {location_zip}:\n"
    );
    for item in items {
        let _ = writeln!(prompt, "- {item}");
    }
    prompt.push_str(
        "\nRespond with ONLY a JSON object mapping each item name to a number, \
         e.g. {\"milk\": 3.49}. No prose, no currency symbols.",
    );
    prompt
}
