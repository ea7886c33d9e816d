#![allow(dead_code)]
use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};

use async_trait::async_trait;
use factstream_common::observability::{LogConfig, LogFormat};
use factstream_common::{FactError, Result};
use factstream_llm::traits::{Completion, CompletionClient, CompletionOptions};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "factstream-core-tests",
            emit_stderr: true,
            format: std::env::var("FACTSTREAM_LOG_FORMAT")
                .ok()
                .and_then(|raw| LogFormat::parse(&raw))
                .unwrap_or_default(),
            default_filter: "debug".to_string(),
            ..LogConfig::default()
        };

        factstream_common::observability::init_logging(config).unwrap_or_default()
    });
}

/// What the scripted client does on its next call.
pub enum Step {
    Reply(String),
    Fail,
    Panic,
}

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct Call {
    pub system: String,
    pub user: String,
    pub options: CompletionOptions,
}

/// Plays back a fixed script of answers and records every call.
pub struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Step::Reply(t.to_string())))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: CompletionOptions,
    ) -> Result<Completion> {
        self.calls.lock().unwrap().push(Call {
            system: system_prompt.to_string(),
            user: user_prompt.to_string(),
            options,
        });
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(text)) => Ok(Completion {
                text,
                model: Some("scripted".to_string()),
                tokens_used: None,
            }),
            Some(Step::Fail) => Err(FactError::Completion("scripted failure".to_string())),
            Some(Step::Panic) => panic!("scripted panic"),
            None => Err(FactError::EmptyCompletion),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
