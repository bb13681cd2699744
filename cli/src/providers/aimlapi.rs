use std::collections::HashMap;

use anyhow::Result;

use pantry_core::prices::{PriceQuoteProvider, parse_price_response};

use super::{build_price_prompt, chat, default_http_client};

const API_URL: &str = "https://api.aimlapi.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// AIMLAPI-backed price estimation. One call covers a whole batch of items.
pub(crate) struct AimlApiClient {
    client: reqwest::Client,
    rt: tokio::runtime::Handle,
    api_key: String,
    model: String,
}

impl AimlApiClient {
    pub(crate) fn new(api_key: String) -> Self {
        Self {
            client: default_http_client("aimlapi"),
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
            "AIMLAPI",
        )
        .await
    }
}

impl PriceQuoteProvider for AimlApiClient {
    fn name(&self) -> &str {
        "aimlapi"
    }

    fn quote_prices(&self, items: &[String], location_zip: &str) -> Result<HashMap<String, f64>> {
        let prompt = build_price_prompt(items, location_zip);
        let text = self.rt.block_on(self.generate_async(&prompt))?;
        parse_price_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "hits AIMLAPI"]
    async fn test_quote_live() {
        let key = std::env::var("PANTRY_AIMLAPI_API_KEY").expect("set PANTRY_AIMLAPI_API_KEY");
        let client = AimlApiClient::new(key);
        let text = client
            .generate_async("Respond with exactly: {\"milk\": 3.49}")
            .await
            .unwrap();
        let prices = parse_price_response(&text).unwrap();
        assert!(prices.contains_key("milk"));
    }
}
