//! Completion-provider integration for factstream.
//!
//! This crate exposes the [`traits::CompletionClient`] interface used by the
//! fact pipeline and a concrete [`chat::ChatCompletionsClient`] for hosted
//! OpenAI-compatible endpoints. [`build_client`] turns a
//! [`factstream_common::LlmConfig`] into a shareable client.
//!
//! # Examples
//! ```no_run
//! use factstream_common::{LlmConfig, Result};
//! use factstream_llm::build_client;
//!
//! # fn main() -> Result<()> {
//! let client = build_client(&LlmConfig::default(), None, 0)?;
//! assert_eq!(client.model_name(), "sonar-pro");
//! # Ok(())
//! # }
//! ```
pub mod chat;
pub mod traits;

use chat::ChatCompletionsClient;
use factstream_common::{FactError, LlmConfig};
use std::sync::Arc;
use std::time::Duration;
use traits::CompletionClient;

/// Build a completion client from configuration.
///
/// `timeout` of `None` leaves requests unbounded; `retries` applies to
/// transport failures and 429/5xx answers only.
pub fn build_client(
    config: &LlmConfig,
    timeout: Option<Duration>,
    retries: usize,
) -> factstream_common::Result<Arc<dyn CompletionClient>> {
    match config {
        LlmConfig::ChatCompletions {
            api_key,
            base_url,
            model,
        } => {
            tracing::info!(
                base_url = %base_url,
                model = %model,
                api_key = if api_key.is_some() { "Available" } else { "Missing" },
                "llm.client.configured"
            );
            let mut client = ChatCompletionsClient::new(api_key.clone(), base_url, model.clone())?
                .with_retries(retries);
            if let Some(t) = timeout {
                client = client.with_timeout(t);
            }
            Ok(Arc::new(client))
        }
        LlmConfig::None => Err(FactError::Config("No completion provider configured".to_string())),
    }
}
