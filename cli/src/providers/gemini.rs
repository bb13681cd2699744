use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use pantry_core::models::{InventoryItem, MealPlan};
use pantry_core::planner::{MealPlanProvider, MealPlanRequest, parse_plan_response};

use super::{build_plan_prompt, default_http_client};

const API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

pub(crate) struct GeminiClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GeminiClient {
    pub(crate) fn new(api_key: String) -> Self {
        Self {
            client: default_http_client("gemini"),
            rt: tokio::runtime::Handle::current(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    async fn generate_async(&self, prompt: &str) -> Result<String> {
        let url = format!("{API_URL}/{}:generateContent", self.model);
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Gemini API")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Gemini API returned {status}");
        }

        let data: GenerateResponse = resp
            .json()
            .await
            .context("Failed to parse Gemini response")?;

        data.candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .context("No text in Gemini response")
    }
}

impl MealPlanProvider for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_plan(
        &self,
        request: &MealPlanRequest,
        inventory: &[InventoryItem],
    ) -> Result<MealPlan> {
        let prompt = build_plan_prompt(request, inventory);
        let text = self.rt.block_on(self.generate_async(&prompt))?;
        parse_plan_response(&text)
    }
}
