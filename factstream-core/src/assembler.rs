//! Turns raw model text into cards, applying the novelty filter and the
//! one-shot retry when a batch is entirely made of already-seen facts.

use crate::card::{CardContext, CardIdGenerator, FactCard};
use crate::dedup::DedupStore;
use crate::normalize::fact_signature;
use crate::parser::{self, FactRecord};
use crate::prompt::{retry_prompt, RequestMode};
use factstream_common::Result;
use factstream_llm::traits::CompletionClient;
use std::sync::Arc;

/// Where a batch is in the retry policy. `RetriedOnce` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Primary,
    RetriedOnce,
}

pub struct CardAssembler {
    client: Arc<dyn CompletionClient>,
    dedup: Arc<dyn DedupStore>,
    ids: CardIdGenerator,
}

impl CardAssembler {
    pub fn new(client: Arc<dyn CompletionClient>, dedup: Arc<dyn DedupStore>) -> Self {
        Self {
            client,
            dedup,
            ids: CardIdGenerator::new(),
        }
    }

    pub fn dedup_store(&self) -> &Arc<dyn DedupStore> {
        &self.dedup
    }

    /// Build the cards for one completion.
    ///
    /// Deep research wraps the whole text in one card and never touches the
    /// dedup store. Every other mode keeps only novel records; if none
    /// survive, exactly one retry completion is issued and its parsed output
    /// is returned without duplicate filtering.
    pub async fn assemble(
        &self,
        ctx: &CardContext,
        raw: &str,
        mode: &RequestMode,
    ) -> Result<Vec<FactCard>> {
        if mode.is_deep_research() {
            let stamp = self.ids.next_batch();
            return Ok(vec![FactCard::deep_research(stamp.id(0), ctx, raw.to_string())]);
        }

        let mut attempt = Attempt::Primary;
        let mut text = raw.to_string();
        loop {
            match attempt {
                Attempt::Primary => {
                    let candidates = parser::parse(&text).unwrap_or_default();
                    let total = candidates.len();
                    let novel = self.keep_novel(candidates);
                    tracing::debug!(
                        topic = %ctx.topic,
                        mode = mode.label(),
                        candidates = total,
                        novel = novel.len(),
                        "facts.assemble.filtered"
                    );
                    if !novel.is_empty() {
                        return Ok(self.cards_from(ctx, novel));
                    }

                    tracing::info!(topic = %ctx.topic, candidates = total, "facts.assemble.retry");
                    let prompt = retry_prompt(&ctx.topic);
                    text = self
                        .client
                        .complete(&prompt.system, &prompt.user, prompt.options)
                        .await?
                        .text;
                    attempt = Attempt::RetriedOnce;
                }
                Attempt::RetriedOnce => {
                    let records = match parser::parse_structured(&text) {
                        Some(parsed) => parsed.into_records(),
                        None => {
                            tracing::warn!(topic = %ctx.topic, "facts.assemble.retry_unparseable");
                            tracing::debug!(raw = %text, "facts.assemble.retry_raw");
                            Vec::new()
                        }
                    };
                    return Ok(self.cards_from(ctx, records));
                }
            }
        }
    }

    /// Drop records already seen and record the ones kept, in order, so a
    /// repeat inside the same batch is dropped too.
    fn keep_novel(&self, records: Vec<FactRecord>) -> Vec<FactRecord> {
        records
            .into_iter()
            .filter(|record| {
                let signature = fact_signature(&record.headline, record.detail.as_deref());
                if self.dedup.is_duplicate(&signature) {
                    return false;
                }
                self.dedup.record(&signature);
                true
            })
            .collect()
    }

    fn cards_from(&self, ctx: &CardContext, records: Vec<FactRecord>) -> Vec<FactCard> {
        if records.is_empty() {
            return Vec::new();
        }
        let stamp = self.ids.next_batch();
        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| FactCard::fact(stamp.id(index), ctx, record.headline, record.detail))
            .collect()
    }
}
