//! Common types and utilities shared across factstream crates.
//!
//! This crate defines the provider configuration, observability helpers,
//! and the shared error type used throughout the factstream workspace. It is
//! kept dependency-minimal so that every crate can depend on it without
//! pulling in the HTTP or runtime stack.
//!
//! # Overview
//!
//! - [`LlmConfig`]: Provider-agnostic completion endpoint configuration
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`FactError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use factstream_common::{LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
//!
//! let cfg = LlmConfig::default();
//! match cfg {
//!     LlmConfig::ChatCompletions { base_url, model, api_key } => {
//!         assert_eq!(base_url, DEFAULT_BASE_URL);
//!         assert_eq!(model, DEFAULT_MODEL);
//!         assert!(api_key.is_none());
//!     }
//!     LlmConfig::None => unreachable!(),
//! }
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Hosted chat-completion provider used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
/// Model identifier sent with every completion request by default.
pub const DEFAULT_MODEL: &str = "sonar-pro";
/// Process variable consulted for the provider key when config omits it.
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Configuration for the completion provider.
///
/// See the `factstream-llm` crate for the concrete client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LlmConfig {
    /// Any endpoint speaking the OpenAI chat-completions wire format.
    ChatCompletions {
        /// Bearer token. A missing key is not validated here; the upstream
        /// call fails at request time instead.
        #[serde(skip_serializing)]
        api_key: Option<String>,
        base_url: String,
        model: String,
    },
    None,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::ChatCompletions {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

/// Error types used across the factstream system.
#[derive(thiserror::Error, Debug)]
pub enum FactError {
    /// The completion endpoint could not be reached or rejected the call.
    #[error("Completion error: {0}")]
    Completion(String),

    /// The completion endpoint answered without any message content.
    #[error("No content in completion response")]
    EmptyCompletion,

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The caller asked for something that cannot be served.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenient alias for results that use [`FactError`].
pub type Result<T> = std::result::Result<T, FactError>;
