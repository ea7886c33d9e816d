//! The single public entry point of the fact pipeline.

use crate::assembler::CardAssembler;
use crate::card::{CardContext, CardRequest, FactCard};
use crate::dedup::{DedupStore, InMemoryDedupStore};
use crate::prompt::{build_prompt, RequestMode};
use async_trait::async_trait;
use factstream_common::{FactError, Result};
use factstream_llm::traits::CompletionClient;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Anything that can answer a card request. Implementations never fail:
/// an empty list is the only failure signal.
#[async_trait]
pub trait CardSource: Send + Sync {
    async fn get_cards(&self, request: &CardRequest) -> Vec<FactCard>;
}

/// Prompt → completion → assembly, with every failure degraded to `[]`.
pub struct FactService {
    client: Arc<dyn CompletionClient>,
    assembler: CardAssembler,
}

impl FactService {
    pub fn new(client: Arc<dyn CompletionClient>, dedup: Arc<dyn DedupStore>) -> Self {
        let assembler = CardAssembler::new(Arc::clone(&client), dedup);
        Self { client, assembler }
    }

    /// A service with its own, empty in-memory dedup pool.
    pub fn with_fresh_dedup(client: Arc<dyn CompletionClient>) -> Self {
        Self::new(client, Arc::new(InMemoryDedupStore::new()))
    }

    pub fn dedup_store(&self) -> &Arc<dyn DedupStore> {
        self.assembler.dedup_store()
    }

    /// Fetch the next cards for `request`.
    ///
    /// Never returns an error and never panics outward. Any failure is
    /// logged and yields `[]`.
    /// An empty list does not by itself mean something went wrong.
    pub async fn get_cards(&self, request: &CardRequest) -> Vec<FactCard> {
        let outcome = AssertUnwindSafe(self.try_get_cards(request))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(cards)) => cards,
            Ok(Err(e)) => {
                tracing::warn!(topic = %request.topic, page = request.page, error = %e, "facts.get_cards.failed");
                Vec::new()
            }
            Err(payload) => {
                let message = panic_payload_to_string(payload.as_ref());
                tracing::error!(topic = %request.topic, panic = %message, "facts.get_cards.panicked");
                Vec::new()
            }
        }
    }

    async fn try_get_cards(&self, request: &CardRequest) -> Result<Vec<FactCard>> {
        if request.topic.trim().is_empty() {
            return Err(FactError::InvalidRequest("topic must not be blank".to_string()));
        }

        let mode = RequestMode::select(request);
        let prompt = build_prompt(request, &mode);
        let ctx = CardContext::from(request);

        tracing::info!(
            topic = %ctx.topic,
            page = request.page,
            mode = mode.label(),
            model = self.client.model_name(),
            "facts.completion.start"
        );

        let completion = self
            .client
            .complete(&prompt.system, &prompt.user, prompt.options)
            .await?;

        tracing::debug!(
            chars = completion.text.len(),
            tokens_used = ?completion.tokens_used,
            "facts.completion.done"
        );

        let cards = self.assembler.assemble(&ctx, &completion.text, &mode).await?;
        tracing::info!(topic = %ctx.topic, cards = cards.len(), "facts.get_cards.done");
        Ok(cards)
    }
}

fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl CardSource for FactService {
    async fn get_cards(&self, request: &CardRequest) -> Vec<FactCard> {
        FactService::get_cards(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factstream_llm::traits::{Completion, CompletionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionClient for CountingClient {
        async fn complete(&self, _: &str, _: &str, _: CompletionOptions) -> Result<Completion> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FactError::EmptyCompletion)
        }

        fn model_name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn blank_topic_is_an_invalid_request() {
        let client = Arc::new(CountingClient::default());
        let service = FactService::with_fresh_dedup(client.clone());

        let err = service
            .try_get_cards(&CardRequest::new(" \t "))
            .await
            .unwrap_err();

        assert!(matches!(err, FactError::InvalidRequest(_)), "got {err:?}");
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert!(service.get_cards(&CardRequest::new("")).await.is_empty());
    }
}
