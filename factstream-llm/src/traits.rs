use async_trait::async_trait;
use factstream_common::Result;
use serde::{Deserialize, Serialize};

/// Sampling knobs for a single completion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionOptions {
    /// Short fact batches.
    pub const fn standard() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    /// Long-form reports: more deterministic, much larger output budget.
    pub const fn deep_research() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 8000,
        }
    }

    /// The one-shot retry after a batch came back entirely duplicated.
    pub const fn retry() -> Self {
        Self {
            temperature: 0.8,
            max_tokens: 1000,
        }
    }
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self::standard()
    }
}

/// Text returned by a completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one chat completion with a system preamble and a user instruction.
    ///
    /// Implementations must return an error instead of an empty `text`.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<Completion>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// Check if the completion service answers at all.
    async fn health_check(&self) -> Result<bool> {
        let probe = CompletionOptions {
            temperature: 0.1,
            max_tokens: 5,
        };
        match self
            .complete("Reply briefly.", "Respond with just 'OK'", probe)
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(model = self.model_name(), error = %e, "llm.health_check.failed");
                Ok(false)
            }
        }
    }
}
