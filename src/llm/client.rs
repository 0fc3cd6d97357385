//! HTTP client for `/chat/completions`

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::ChatCompleter;
use crate::config::AppConfig;
use crate::errors::HybridChatError;
use crate::errors::Result;
use crate::models::ChatMessage;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Extract the first choice's text from a completion response body
pub(crate) fn parse_chat_response(body: &str) -> Result<String> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| HybridChatError::LlmError(format!("Failed to parse response: {e}")))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| HybridChatError::LlmError("No choices in response".to_string()))?;

    if let Some(reason) = choice.finish_reason.as_deref() {
        debug!("Completion finished with reason: {}", reason);
    }

    match choice.message.content {
        Some(content) => Ok(content),
        None => Err(HybridChatError::LlmError(match choice.message.refusal {
            Some(refusal) => format!("Model refused: {refusal}"),
            None => "Empty completion content".to_string(),
        })),
    }
}

/// LLM completion service
pub struct LlmService {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl LlmService {
    /// Create a new LLM service
    ///
    /// # Errors
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.llm_endpoint().trim_end_matches('/').to_string(),
            api_key: config.llm_key().to_string(),
            model: config.llm_model().to_string(),
            temperature: config.llm.temperature,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion request
    ///
    /// # Errors
    /// - Network errors (timeouts, connection failures)
    /// - API errors (auth failures, rate limits)
    /// - Responses without content (refusals, empty choices)
    pub async fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!(
            "Calling chat completions: model={}, turns={}, max_tokens={}",
            self.model,
            messages.len(),
            max_tokens
        );

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
            temperature: self.temperature,
        };

        let mut builder = self.client.post(&url).json(&request);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| HybridChatError::HttpError(e.to_string()))?;
        if !status.is_success() {
            return Err(HybridChatError::LlmError(format!(
                "Chat completion failed ({status}): {body}"
            )));
        }

        parse_chat_response(&body)
    }
}

#[async_trait]
impl ChatCompleter for LlmService {
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32) -> Result<String> {
        self.chat(messages, max_tokens).await
    }
}
