//! Instruction templates for each request mode.

use crate::card::{non_blank, CardRequest};
use factstream_llm::traits::CompletionOptions;

/// Which of the four instruction templates a request uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestMode {
    /// Answer a user question about a specific card.
    FollowUp { question: String },
    /// One long-form, multi-section report.
    DeepResearch,
    /// Topical overview for the first page.
    FirstPage,
    /// Additional, previously unmentioned facts for later pages.
    SubsequentPage { page: u32 },
}

impl RequestMode {
    /// Priority order: follow-up > deep research > first page > later page.
    pub fn select(req: &CardRequest) -> Self {
        let parent = non_blank(req.parent_card_id.as_deref());
        let question = non_blank(req.follow_up_question.as_deref());
        match (parent, question) {
            (Some(_), Some(question)) => RequestMode::FollowUp { question },
            _ if req.is_deep_research => RequestMode::DeepResearch,
            _ if req.page <= 1 => RequestMode::FirstPage,
            _ => RequestMode::SubsequentPage { page: req.page },
        }
    }

    pub fn is_deep_research(&self) -> bool {
        matches!(self, RequestMode::DeepResearch)
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestMode::FollowUp { .. } => "follow_up",
            RequestMode::DeepResearch => "deep_research",
            RequestMode::FirstPage => "first_page",
            RequestMode::SubsequentPage { .. } => "subsequent_page",
        }
    }
}

/// Everything one completion call needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub options: CompletionOptions,
}

const ASSISTANT_PREAMBLE: &str =
    "You are a helpful assistant that provides factual, well-researched information.";

const FACT_ARRAY_RULES: &str = r#"Format your response as a JSON array of objects with "headline" and "detail" fields, for example:
[{"headline": "Short factual claim", "detail": "One or two sentences of supporting context."}]
Each object must represent a distinct fact or piece of information.
Make sure each fact is unique and not a variation of previously mentioned facts.
Focus on providing new, interesting information that hasn't been covered before.
IMPORTANT: Only return valid JSON, no additional text or explanations."#;

const REPORT_RULES: &str = "Write ONE cohesive, structured document in Markdown with a heading for every section. \
Do not return JSON, do not return an array, and do not split the analysis into separate facts or cards. \
Prefer precise figures, named sources, and technical vocabulary over generalities.";

const RESEARCH_SECTIONS: [&str; 10] = [
    "Technical overview: core concepts, definitions and mechanisms",
    "Methodology: how the subject is studied, measured or built",
    "Detailed analysis of the current state of knowledge",
    "Expert findings and key research results, with sources where possible",
    "Controversies, open problems and competing interpretations",
    "Future developments and active research directions",
    "Quantitative metrics, statistics and benchmarks",
    "Case studies and concrete real-world examples",
    "Cross-disciplinary connections to other fields",
    "Broader implications for practice, policy and society",
];

/// Build the system preamble, user instruction and sampling options.
pub fn build_prompt(req: &CardRequest, mode: &RequestMode) -> Prompt {
    let topic = req.topic.trim();
    let user = match mode {
        RequestMode::FollowUp { question } => format!(
            "Based on the topic \"{topic}\", answer this follow-up question: \"{question}\". \
             Provide a detailed, factual response."
        ),
        RequestMode::DeepResearch => {
            let sections = RESEARCH_SECTIONS
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{}. {}", i + 1, s))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Perform an extensive, technical deep research analysis of \"{topic}\".\n\
                 Cover all of the following sections:\n{sections}\n\n\
                 Deliver the result as one cohesive document, not as multiple separate facts."
            )
        }
        RequestMode::FirstPage => format!(
            "Provide a comprehensive overview of \"{topic}\". \
             Include key facts, historical context, and important details."
        ),
        RequestMode::SubsequentPage { .. } => format!(
            "Provide additional interesting facts about \"{topic}\" that haven't been mentioned before. \
             Focus on lesser-known aspects and recent developments."
        ),
    };

    let (rules, options) = if mode.is_deep_research() {
        (REPORT_RULES, CompletionOptions::deep_research())
    } else {
        (FACT_ARRAY_RULES, CompletionOptions::standard())
    };

    Prompt {
        system: format!("{ASSISTANT_PREAMBLE}\n{rules}"),
        user,
        options,
    }
}

/// The one-shot retry after every candidate fact turned out to be a duplicate.
pub fn retry_prompt(topic: &str) -> Prompt {
    Prompt {
        system: "Provide completely different facts about the topic, focusing on new aspects \
                 that haven't been covered. Return only valid JSON: an array of objects with \
                 \"headline\" and \"detail\" fields."
            .to_string(),
        user: format!(
            "Give me different facts about \"{}\" that haven't been mentioned before.",
            topic.trim()
        ),
        options: CompletionOptions::retry(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_priority_order() {
        let follow = CardRequest::new("t").parent("p").follow_up("why?").deep(true).page(3);
        assert_eq!(
            RequestMode::select(&follow),
            RequestMode::FollowUp {
                question: "why?".into()
            }
        );

        let deep = CardRequest::new("t").follow_up("orphan question").deep(true);
        assert_eq!(RequestMode::select(&deep), RequestMode::DeepResearch);

        let more = CardRequest::new("t").parent("p");
        assert_eq!(RequestMode::select(&more), RequestMode::FirstPage);

        let later = CardRequest::new("t").page(4);
        assert_eq!(
            RequestMode::select(&later),
            RequestMode::SubsequentPage { page: 4 }
        );
    }

    #[test]
    fn blank_question_is_not_a_follow_up() {
        let req = CardRequest::new("t").parent("p").follow_up("   ");
        assert_eq!(RequestMode::select(&req), RequestMode::FirstPage);
    }

    #[test]
    fn deep_prompt_asks_for_one_document_with_all_sections() {
        let req = CardRequest::new("fusion power").deep(true);
        let prompt = build_prompt(&req, &RequestMode::DeepResearch);
        assert_eq!(prompt.options, CompletionOptions::deep_research());
        assert!(prompt.user.contains("\"fusion power\""));
        assert!(prompt.user.contains("10. Broader implications"));
        assert!(prompt.system.contains("Do not return JSON"));
        assert!(!prompt.system.contains("JSON array"));
    }

    #[test]
    fn standard_prompts_demand_a_json_array() {
        for (req, mode) in [
            (CardRequest::new("bees"), RequestMode::FirstPage),
            (
                CardRequest::new("bees").page(2),
                RequestMode::SubsequentPage { page: 2 },
            ),
            (
                CardRequest::new("bees").parent("p").follow_up("Do bees sleep?"),
                RequestMode::FollowUp {
                    question: "Do bees sleep?".into(),
                },
            ),
        ] {
            let prompt = build_prompt(&req, &mode);
            assert_eq!(prompt.options, CompletionOptions::standard());
            assert!(prompt.system.contains("JSON array"));
            assert!(prompt.system.contains("Only return valid JSON"));
            assert!(prompt.user.contains("\"bees\""));
        }
    }

    #[test]
    fn retry_uses_hotter_sampling() {
        let prompt = retry_prompt(" comets ");
        assert_eq!(prompt.options.temperature, 0.8);
        assert_eq!(prompt.options.max_tokens, 1000);
        assert!(prompt.user.contains("\"comets\""));
    }
}
