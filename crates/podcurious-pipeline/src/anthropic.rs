use podcurious_core::{ChatMessage, CompletionRequest, Error, LanguageModel, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnthropicClient {
    /// A missing key is sent as an empty header; the provider's error message then reaches
    /// the caller like any other upstream failure.
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: String,
        model: String,
    ) -> Self {
        Self {
            client,
            api_key: api_key.unwrap_or_default(),
            base_url,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint_messages(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Option<Vec<ContentBlock>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
}

/// Text of every content block, in order; blocks without text contribute nothing.
fn reply_text(body: &str) -> Result<String> {
    let parsed: MessagesResponse = serde_json::from_str(body).map_err(|_| {
        tracing::error!(raw = %crate::truncate_chars(body, 300), "model response was not JSON");
        Error::Llm("Failed to parse Claude response".to_string())
    })?;
    if let Some(err) = parsed.error {
        let message = err
            .message
            .unwrap_or_else(|| "unknown provider error".to_string());
        tracing::error!(%message, "model provider returned an error");
        return Err(Error::Llm(message));
    }
    Ok(parsed
        .content
        .unwrap_or_default()
        .into_iter()
        .filter_map(|b| b.text)
        .collect())
}

#[async_trait::async_trait]
impl LanguageModel for AnthropicClient {
    async fn complete(&self, req: &CompletionRequest) -> Result<String> {
        let t0 = Instant::now();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: req.max_tokens,
            messages: &req.messages,
            system: req.system.as_deref(),
        };
        let resp = self
            .client
            .post(self.endpoint_messages())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;
        // Error payloads arrive with non-2xx statuses; the body says more than the status.
        let text = resp.text().await.map_err(|e| Error::Llm(e.to_string()))?;
        let out = reply_text(&text)?;
        tracing::debug!(
            chars = out.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "model reply"
        );
        Ok(out)
    }
}
