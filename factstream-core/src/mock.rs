//! Offline card source for demos and tests without an API key.

use crate::card::{non_blank, CardContext, CardRequest, FactCard};
use crate::service::CardSource;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use uuid::Uuid;

/// A canned `(headline, detail)` pair.
type Canned = (&'static str, &'static str);

const CHINA: &[Canned] = &[
    (
        "China is home to the world's largest high-speed rail network",
        "With over 37,000 kilometers of high-speed rail lines, China's network is larger than all other countries' high-speed rail networks combined. The fastest trains can reach speeds of 350 km/h (217 mph).",
    ),
    (
        "The Great Wall of China is not visible from space with the naked eye",
        "Contrary to popular belief, the Great Wall is not visible from space without aid. This myth has been debunked by multiple astronauts, including Chinese astronaut Yang Liwei.",
    ),
    (
        "China produces more than 1.4 billion tons of rice annually",
        "Rice is a staple food for over 65% of the Chinese population. China accounts for nearly 30% of the world's total rice production, making it the largest rice producer globally.",
    ),
    (
        "China has 56 recognized ethnic groups",
        "While the Han Chinese make up about 92% of the population, China officially recognizes 55 other ethnic minorities, each with their own distinct cultures, languages, and traditions.",
    ),
    (
        "The world's first paper money was created in China during the Tang Dynasty",
        "Around the 7th century, merchants began using paper notes instead of heavy coins. By the Song Dynasty (960-1279), the government had taken over the system and was issuing official paper currency.",
    ),
];

const SPACE: &[Canned] = &[
    (
        "Space is completely silent",
        "There is no atmosphere in space, which means that sound has no medium or way to travel to be heard. Astronauts use radios to communicate in space because radio waves can travel through the vacuum.",
    ),
    (
        "The hottest planet in our solar system is Venus",
        "Despite being farther from the Sun than Mercury, Venus has an average surface temperature of 462°C (864°F). This is due to its thick atmosphere of carbon dioxide that traps heat in a runaway greenhouse effect.",
    ),
    (
        "One day on Venus is longer than one year on Earth",
        "Venus rotates very slowly on its axis, taking 243 Earth days to complete one rotation. However, it only takes 225 Earth days to orbit the Sun, making a day longer than a year on Venus.",
    ),
    (
        "The largest volcano in our solar system is on Mars",
        "Olympus Mons on Mars is the largest volcano in our solar system, standing at 22 km (13.6 miles) high and 600 km (372 miles) in diameter. It's roughly the size of Arizona.",
    ),
];

const HISTORY: &[Canned] = &[
    (
        "Cleopatra lived closer in time to the first Pizza Hut than to the building of the Great Pyramid",
        "Cleopatra lived around 30 BCE, while the Great Pyramid of Giza was completed around 2560 BCE. The first Pizza Hut opened in 1958, about 1,988 years after Cleopatra's death.",
    ),
    (
        "Oxford University is older than the Aztec Empire",
        "Oxford University was founded around 1096, while the Aztec civilization began with the founding of Tenochtitlán in 1325, more than 200 years later.",
    ),
    (
        "The fax machine was invented before the American Civil War",
        "The first fax machine, or 'electric printing telegraph,' was patented by Alexander Bain in 1843, nearly two decades before the American Civil War began in 1861.",
    ),
];

const GENERAL: &[Canned] = &[
    (
        "The Earth is the third planet from the Sun",
        "It is the only astronomical object known to harbor life, with liquid water covering 71% of its surface. Earth orbits the Sun at an average distance of about 93 million miles.",
    ),
    (
        "There are approximately 7,100 languages spoken worldwide",
        "However, about 40% of these languages are at risk of extinction with fewer than 1,000 speakers remaining. The most widely spoken languages are Mandarin Chinese, Spanish, and English.",
    ),
];

const TECHNOLOGY: &[Canned] = &[
    (
        "The first computer programmer was a woman",
        "Ada Lovelace, an English mathematician and writer, is considered the first computer programmer. In the 1840s, she wrote an algorithm for Charles Babbage's Analytical Engine, a proposed mechanical general-purpose computer.",
    ),
    (
        "The first computer bug was an actual insect",
        "In 1947, Grace Hopper found a moth trapped in a relay of the Harvard Mark II computer. When she removed it, she remarked they were 'debugging' the system, popularizing the term we still use today.",
    ),
];

const NATURE: &[Canned] = &[
    (
        "Octopuses have three hearts",
        "Two hearts pump blood through the gills, while the third pumps it through the rest of the body. Their blood is also blue because it contains a copper-based protein called hemocyanin.",
    ),
    (
        "Bananas are berries, but strawberries aren't",
        "Botanically speaking, bananas are berries because they develop from a single flower with one ovary. Strawberries are actually 'aggregate accessory fruits' because they develop from multiple ovaries of a single flower.",
    ),
];

const SCIENCE: &[Canned] = &[
    (
        "Humans share 50% of their DNA with bananas",
        "This surprising fact demonstrates our common evolutionary ancestry with all living things. The shared DNA primarily consists of genes needed for basic cellular functions.",
    ),
    (
        "A teaspoonful of neutron star would weigh about 6 billion tons",
        "Neutron stars are so dense that a single teaspoon of their material would weigh as much as a mountain on Earth. They're formed when massive stars collapse under their own gravity.",
    ),
];

/// Longest slice of a follow-up question quoted in a headline.
const QUESTION_PREVIEW_CHARS: usize = 40;

/// How the user reacted to the card that led to this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFeedback {
    Initial,
    More,
    Skip,
    Custom(String),
}

impl MockFeedback {
    /// Infer the reaction from the shape of a request.
    pub fn from_request(req: &CardRequest) -> Self {
        let parent = non_blank(req.parent_card_id.as_deref());
        let question = non_blank(req.follow_up_question.as_deref());
        match (parent, question) {
            (Some(_), Some(q)) => MockFeedback::Custom(q),
            (Some(_), None) => MockFeedback::More,
            _ if req.page > 1 => MockFeedback::Skip,
            _ => MockFeedback::Initial,
        }
    }

    /// Wire label carried on generated cards; `None` for a first page.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            MockFeedback::Initial => None,
            MockFeedback::More => Some("more"),
            MockFeedback::Skip => Some("skip"),
            MockFeedback::Custom(_) => Some("custom"),
        }
    }
}

/// Full canned set for a topic, if one exists. Matching ignores case.
pub fn canned_cards(topic: &str) -> Option<Vec<FactCard>> {
    let set = match topic.trim().to_lowercase().as_str() {
        "china" => CHINA,
        "space" => SPACE,
        "history" => HISTORY,
        "default" | "general" => GENERAL,
        _ => return None,
    };
    let ctx = CardContext {
        topic: topic.trim().to_string(),
        parent_card_id: None,
        follow_up_question: None,
    };
    Some(
        set.iter()
            .map(|(h, d)| FactCard::fact(mock_id(), &ctx, h.to_string(), Some(d.to_string())))
            .collect(),
    )
}

/// One synthetic card for any topic, shaped by the feedback kind.
pub fn generate_mock_cards(ctx: &CardContext, feedback: &MockFeedback) -> Vec<FactCard> {
    let topic = ctx.topic.as_str();
    let pool = match topic.to_lowercase().as_str() {
        "technology" => Some(TECHNOLOGY),
        "nature" => Some(NATURE),
        "science" => Some(SCIENCE),
        _ => None,
    };

    let mut rng = rand::thread_rng();
    let (headline, detail) = match pool.and_then(|p| p.choose(&mut rng)) {
        Some((h, d)) => (h.to_string(), d.to_string()),
        None => {
            let generic = [
                (
                    format!("Interesting fact about {topic}"),
                    format!("{topic} has many fascinating aspects worth exploring. This is just one of many interesting facts you could learn about this subject."),
                ),
                (
                    format!("Did you know about {topic}?"),
                    format!("There are many surprising things to discover about {topic}. This is a generated placeholder since we're using mock data."),
                ),
            ];
            generic.choose(&mut rng).cloned().unwrap_or_default()
        }
    };

    let (headline, detail) = match feedback {
        MockFeedback::More => (
            format!("More about {headline}"),
            format!("Building on what we've learned, {detail}"),
        ),
        MockFeedback::Custom(question) => (
            format!("About {topic}: {}", question_preview(question)),
            format!("In response to your question, {detail}"),
        ),
        MockFeedback::Initial | MockFeedback::Skip => (headline, detail),
    };

    let mut card = FactCard::fact(mock_id(), ctx, headline, Some(detail));
    card.user_feedback = feedback.label().map(str::to_string);
    vec![card]
}

fn question_preview(question: &str) -> String {
    let mut preview: String = question.chars().take(QUESTION_PREVIEW_CHARS).collect();
    if question.chars().count() > QUESTION_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

fn mock_id() -> String {
    Uuid::new_v4().to_string()
}

/// Serves canned or generated cards without any network access.
#[derive(Debug, Default, Clone)]
pub struct MockCardSource;

impl MockCardSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CardSource for MockCardSource {
    async fn get_cards(&self, request: &CardRequest) -> Vec<FactCard> {
        if request.topic.trim().is_empty() {
            return Vec::new();
        }
        let ctx = CardContext::from(request);

        if request.is_deep_research && ctx.follow_up_question.is_none() {
            let report = format!(
                "# {topic}\n\nThis is a placeholder research report generated offline for \"{topic}\".",
                topic = ctx.topic
            );
            return vec![FactCard::deep_research(mock_id(), &ctx, report)];
        }

        let feedback = MockFeedback::from_request(request);
        if feedback == MockFeedback::Initial {
            if let Some(cards) = canned_cards(&ctx.topic) {
                return cards;
            }
        }
        tracing::debug!(topic = %ctx.topic, ?feedback, "facts.mock.generate");
        generate_mock_cards(&ctx, &feedback)
    }
}
