use crate::traits::{Completion, CompletionClient, CompletionOptions};
use async_trait::async_trait;
use factstream_common::{FactError, Result};
use factstream_http::{HttpClient, HttpError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for any endpoint speaking the OpenAI chat-completions format
/// (`POST <base>/chat/completions`).
pub struct ChatCompletionsClient {
    client: HttpClient,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatUsage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl ChatCompletionsClient {
    /// Create a client for `base_url`. A missing key is tolerated here and
    /// surfaces as an upstream rejection on the first call.
    pub fn new(api_key: Option<String>, base_url: &str, model: String) -> Result<Self> {
        let client = HttpClient::new(base_url)
            .map_err(|e| FactError::Config(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }

    pub fn with_retries(mut self, retries: usize) -> Self {
        self.client = self.client.with_retries(retries);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionsClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<Completion> {
        tracing::debug!(
            model = %self.model,
            temperature = options.temperature,
            max_tokens = options.max_tokens,
            "llm.chat.complete"
        );

        let req = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let resp: ChatResponse = self
            .client
            .post_json("chat/completions", self.api_key.as_deref(), &req)
            .await
            .map_err(http_to_fact)?;

        let text = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(FactError::EmptyCompletion)?;

        Ok(Completion {
            text,
            model: resp.model,
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_fact(e: HttpError) -> FactError {
    FactError::Completion(format!("{e}"))
}
