use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use pantry_core::models::{InventoryItem, MealPlan};
use pantry_core::planner::{MealPlanProvider, MealPlanRequest, parse_plan_response};

use super::{build_plan_prompt, default_http_client};

const API_URL: &str = "https://api-inference.huggingface.co/models";
const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.2";

pub(crate) struct HuggingFaceClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl HuggingFaceClient {
    pub(crate) fn new(api_key: String) -> Self {
        Self {
            client: default_http_client("huggingface"),
            rt: tokio::runtime::Handle::current(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    async fn generate_async(&self, prompt: &str) -> Result<String> {
        let url = format!("{API_URL}/{}", self.model);
        let body = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_new_tokens: 1024,
                return_full_text: false,
            },
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to reach Hugging Face API")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("Hugging Face API returned {status}");
        }

        let data: Vec<GeneratedText> = resp
            .json()
            .await
            .context("Failed to parse Hugging Face response")?;

        data.into_iter()
            .next()
            .map(|g| g.generated_text)
            .context("Empty Hugging Face response")
    }
}

impl MealPlanProvider for HuggingFaceClient {
    fn name(&self) -> &str {
        "huggingface"
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
