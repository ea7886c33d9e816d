//! Client-side state of an infinite fact feed.
//!
//! A [`FeedSession`] keeps what a presentation layer needs between calls:
//! the current topic and page, the main card stream, and the separate list
//! of deep-research reports.

use crate::card::{CardRequest, FactCard};
use crate::service::CardSource;
use std::sync::Arc;

/// What the user asked to do with a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    /// Tell me more about this card.
    More,
    /// Not interested, move on to the next page.
    Skip,
    /// Ask a question about this card.
    Custom(String),
    /// Produce a long-form report.
    Deep,
}

pub struct FeedSession {
    source: Arc<dyn CardSource>,
    topic: Option<String>,
    page: u32,
    cards: Vec<FactCard>,
    research: Vec<FactCard>,
}

impl FeedSession {
    pub fn new(source: Arc<dyn CardSource>) -> Self {
        Self {
            source,
            topic: None,
            page: 1,
            cards: Vec::new(),
            research: Vec::new(),
        }
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// The main stream, in arrival order.
    pub fn cards(&self) -> &[FactCard] {
        &self.cards
    }

    /// Deep-research reports, kept apart from the main stream.
    pub fn research(&self) -> &[FactCard] {
        &self.research
    }

    pub fn find(&self, card_id: &str) -> Option<&FactCard> {
        self.cards
            .iter()
            .chain(self.research.iter())
            .find(|c| c.id == card_id)
    }

    /// Start over on a new topic: page 1 replaces the whole stream.
    /// Earlier reports are kept.
    pub async fn search(&mut self, topic: &str) -> &[FactCard] {
        let topic = topic.trim().to_string();
        self.page = 1;
        self.cards = self.source.get_cards(&CardRequest::new(topic.clone())).await;
        self.topic = Some(topic);
        &self.cards
    }

    /// Apply a card action and return the cards it produced.
    ///
    /// Does nothing before the first [`search`](Self::search) and for a
    /// custom action with a blank question.
    pub async fn apply(&mut self, card_id: &str, action: FeedAction) -> Vec<FactCard> {
        let Some(topic) = self.topic.clone() else {
            tracing::debug!(card_id, ?action, "feed.apply.no_topic");
            return Vec::new();
        };

        match action {
            FeedAction::Deep => {
                let request = CardRequest::new(topic)
                    .page(self.page)
                    .parent(card_id)
                    .deep(true);
                let reports = self.source.get_cards(&request).await;
                self.research.extend(reports.iter().cloned());
                reports
            }
            FeedAction::Custom(question) if question.trim().is_empty() => Vec::new(),
            FeedAction::Custom(question) => {
                let request = CardRequest::new(topic)
                    .page(self.page)
                    .parent(card_id)
                    .follow_up(question.trim());
                self.append(&request).await
            }
            FeedAction::More => {
                let request = CardRequest::new(topic).page(self.page).parent(card_id);
                self.append(&request).await
            }
            FeedAction::Skip => self.load_next_page().await,
        }
    }

    /// Advance one page and append what it brings (infinite scroll).
    pub async fn load_next_page(&mut self) -> Vec<FactCard> {
        let Some(topic) = self.topic.clone() else {
            return Vec::new();
        };
        self.page += 1;
        let request = CardRequest::new(topic).page(self.page);
        self.append(&request).await
    }

    async fn append(&mut self, request: &CardRequest) -> Vec<FactCard> {
        let fresh = self.source.get_cards(request).await;
        self.cards.extend(fresh.iter().cloned());
        fresh
    }
}
