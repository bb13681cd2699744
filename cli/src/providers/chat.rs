//! Wire types for OpenAI-compatible `chat/completions` endpoints.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(super) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
pub(super) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Deserialize)]
pub(super) struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(super) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub(super) struct ResponseMessage {
    pub content: Option<String>,
}

/// Send a single-user-message completion and return the assistant text.
pub(super) async fn complete(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    service: &str,
) -> Result<String> {
    let body = ChatRequest {
        model,
        messages: vec![ChatMessage {
            role: "user",
            content: prompt,
        }],
    };
    let resp = client
        .post(format!("{base_url}/chat/completions"))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach {service} API"))?;

    let status = resp.status();
    if !status.is_success() {
        bail!("{service} API returned {status}");
    }

    let data: ChatResponse = resp
        .json()
        .await
        .with_context(|| format!("Failed to parse {service} response"))?;

    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .with_context(|| format!("No message content in {service} response"))
}
