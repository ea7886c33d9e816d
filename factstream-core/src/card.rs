use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Headline given to every long-form report card.
pub const DEEP_RESEARCH_HEADLINE_PREFIX: &str = "Technical Research Analysis";

/// One unit of displayed information: a short fact or a full report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCard {
    pub id: String,
    pub topic: String,
    pub headline: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Card that spawned this one. A relation only; cards never own each other.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_card_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_question: Option<String>,
    #[serde(default)]
    pub is_deep_research: bool,
    /// Reaction that produced this card (`more`, `skip` or `custom`). Set by the offline feed only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_feedback: Option<String>,
}

impl FactCard {
    /// A short fact card in the given request context.
    pub fn fact(id: String, ctx: &CardContext, headline: String, detail: Option<String>) -> Self {
        Self {
            id,
            topic: ctx.topic.clone(),
            headline,
            detail,
            parent_card_id: ctx.parent_card_id.clone(),
            follow_up_question: ctx.follow_up_question.clone(),
            is_deep_research: false,
            user_feedback: None,
        }
    }

    /// The single card wrapping an entire long-form report.
    pub fn deep_research(id: String, ctx: &CardContext, report: String) -> Self {
        Self {
            id,
            topic: ctx.topic.clone(),
            headline: format!("{DEEP_RESEARCH_HEADLINE_PREFIX}: {}", ctx.topic),
            detail: Some(report),
            parent_card_id: ctx.parent_card_id.clone(),
            follow_up_question: None,
            is_deep_research: true,
            user_feedback: None,
        }
    }
}

/// Parameters of one `get_cards` call.
///
/// ```
/// use factstream_core::CardRequest;
///
/// let req = CardRequest::new("volcanoes")
///     .page(2)
///     .parent("1700000000000-0")
///     .follow_up("How hot is lava?");
/// assert_eq!(req.page, 2);
/// assert!(!req.is_deep_research);
/// assert_eq!(req.follow_up_question.as_deref(), Some("How hot is lava?"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRequest {
    pub topic: String,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default)]
    pub parent_card_id: Option<String>,
    #[serde(default)]
    pub follow_up_question: Option<String>,
    #[serde(default)]
    pub is_deep_research: bool,
}

fn first_page() -> u32 {
    1
}

impl CardRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            page: 1,
            parent_card_id: None,
            follow_up_question: None,
            is_deep_research: false,
        }
    }

    /// Pages are 1-based; 0 is treated as the first page.
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn parent(mut self, card_id: impl Into<String>) -> Self {
        self.parent_card_id = Some(card_id.into());
        self
    }

    pub fn follow_up(mut self, question: impl Into<String>) -> Self {
        self.follow_up_question = Some(question.into());
        self
    }

    pub fn deep(mut self, deep: bool) -> Self {
        self.is_deep_research = deep;
        self
    }
}

/// Request fields copied onto every card a call produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardContext {
    pub topic: String,
    pub parent_card_id: Option<String>,
    /// Only set alongside `parent_card_id`: a follow-up answers a specific card.
    pub follow_up_question: Option<String>,
}

impl From<&CardRequest> for CardContext {
    fn from(req: &CardRequest) -> Self {
        let parent_card_id = non_blank(req.parent_card_id.as_deref());
        let follow_up_question = parent_card_id
            .as_ref()
            .and(non_blank(req.follow_up_question.as_deref()));
        Self {
            topic: req.topic.trim().to_string(),
            parent_card_id,
            follow_up_question,
        }
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Issues `<millis>-<index>` card ids.
///
/// Every batch gets a millisecond stamp strictly greater than the previous
/// batch's, so two batches issued within the same millisecond never share ids.
#[derive(Debug, Default)]
pub struct CardIdGenerator {
    last_millis: AtomicI64,
}

/// The stamp shared by all cards of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStamp(i64);

impl BatchStamp {
    pub fn id(&self, index: usize) -> String {
        format!("{}-{}", self.0, index)
    }

    pub fn millis(&self) -> i64 {
        self.0
    }
}

impl CardIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_batch(&self) -> BatchStamp {
        let now = Utc::now().timestamp_millis();
        let step = |prev: i64| now.max(prev.saturating_add(1));
        let prev = match self
            .last_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(step(prev)))
        {
            Ok(prev) | Err(prev) => prev,
        };
        BatchStamp(step(prev))
    }
}
