use anyhow::Result;

use pantry_core::models::{InventoryItem, MealPlan};
use pantry_core::planner::{MealPlanProvider, MealPlanRequest, parse_plan_response};

use super::{build_plan_prompt, chat, default_http_client};

const API_URL: &str = "https://opencode.ai/zen/v1";
const DEFAULT_MODEL: &str = "grok-code";

pub(crate) struct OpenCodeClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    api_key: String,
    model: String,
}

impl OpenCodeClient {
    pub(crate) fn new(api_key: String) -> Self {
        Self {
            client: default_http_client("opencode"),
            rt: tokio::runtime::Handle::current(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    async fn generate_async(&self, prompt: &str) -> Result<String> {
        chat::complete(
            &self.client,
            API_URL,
            &self.api_key,
            &self.model,
            prompt,
            "OpenCode Zen",
        )
        .await
    }
}

impl MealPlanProvider for OpenCodeClient {
    fn name(&self) -> &str {
        "opencode"
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "hits OpenCode Zen API"]
    async fn test_generate_live() {
        let key = std::env::var("PANTRY_OPENCODE_API_KEY").expect("set PANTRY_OPENCODE_API_KEY");
        let client = OpenCodeClient::new(key);
        let text = client
            .generate_async("Respond with exactly: {\"ok\": true}")
            .await
            .unwrap();
        assert!(!text.is_empty());
    }
}
