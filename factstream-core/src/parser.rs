//! Tolerant extraction of `{headline, detail}` records from model output.
//!
//! The model is told to answer with a JSON array but is not guaranteed to.
//! Interpretations are tried in order:
//!
//! 1. strip a surrounding code fence and parse the whole text as JSON;
//! 2. take the first balanced `{ ... }` block and parse that;
//! 3. split the raw text into lines, one record per non-blank line.
//!
//! The brace scan in step 2 counts raw `{`/`}` characters and does not know
//! about string literals, so a brace inside a quoted value can end the block
//! early. Step 1 covers the common case, so the scanner stays naive.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Headline used when a line or record carries no usable headline.
pub const FALLBACK_HEADLINE: &str = "Interesting fact";

/// One candidate fact before it becomes a card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactRecord {
    pub headline: String,
    pub detail: Option<String>,
}

impl FactRecord {
    pub fn new(headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            detail: Some(detail.into()),
        }
    }
}

/// Shape of a successfully parsed JSON answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedFacts {
    /// `[{"headline": .., "detail": ..}, ..]`
    FactArray(Vec<FactRecord>),
    /// A lone `{"headline": .., "detail": ..}` object.
    SingleFact(FactRecord),
    /// An object keyed by section name, e.g. `{"Overview": "..", "History": {..}}`.
    SectionedObject(Vec<FactRecord>),
}

impl ParsedFacts {
    /// Resolve the dynamic JSON shape once, right after parsing.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(ParsedFacts::FactArray(
                items
                    .into_iter()
                    .filter_map(|item| record_from_value(item, None))
                    .collect(),
            )),
            Value::Object(map) if is_fact_object(&map) => {
                record_from_object(map, None).map(ParsedFacts::SingleFact)
            }
            Value::Object(map) => Some(ParsedFacts::SectionedObject(
                map.into_iter()
                    .flat_map(|(key, section)| records_from_section(key, section))
                    .collect(),
            )),
            _ => None,
        }
    }

    pub fn into_records(self) -> Vec<FactRecord> {
        match self {
            ParsedFacts::FactArray(records) | ParsedFacts::SectionedObject(records) => records,
            ParsedFacts::SingleFact(record) => vec![record],
        }
    }
}

/// Steps 1 and 2: JSON interpretations only. `None` when neither applies.
pub fn parse_structured(raw: &str) -> Option<ParsedFacts> {
    let cleaned = strip_code_fence(raw);
    if let Ok(value) = serde_json::from_str::<Value>(cleaned) {
        if let Some(parsed) = ParsedFacts::from_value(value) {
            return Some(parsed);
        }
    }

    let block = first_balanced_object(cleaned)?;
    let value = serde_json::from_str::<Value>(block).ok()?;
    ParsedFacts::from_value(value)
}

/// Step 3: one record per non-blank line.
///
/// The line is cut at colons: the text before the first colon is the
/// headline and the text between the first and second colon is the detail.
/// Anything after a second colon is dropped. A line without a usable detail
/// keeps the whole line as its detail.
pub fn split_lines(raw: &str) -> Vec<FactRecord> {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut parts = line.split(':');
            let headline = parts
                .next()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .unwrap_or(FALLBACK_HEADLINE);
            let detail = parts
                .next()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| line.trim());
            FactRecord::new(headline, detail)
        })
        .collect()
}

/// All three steps. `None` only when nothing at all can be read.
pub fn parse(raw: &str) -> Option<Vec<FactRecord>> {
    if let Some(parsed) = parse_structured(raw) {
        return Some(parsed.into_records());
    }
    tracing::debug!(raw = %raw, "facts.parse.line_fallback");
    let lines = split_lines(raw);
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?```$").ok())
        .as_ref()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = fence_pattern()
        .and_then(|re| re.captures(trimmed))
        .and_then(|c| c.get(1));
    match inner {
        Some(inner) => inner.as_str().trim(),
        None => trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .map(str::trim)
            .unwrap_or(trimmed),
    }
}

/// Slice from the first `{` to its matching `}` by plain depth counting.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_fact_object(map: &Map<String, Value>) -> bool {
    map.contains_key("headline") || map.contains_key("detail")
}

fn text_of(value: Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s,
        other => other.to_string(),
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn record_from_object(mut map: Map<String, Value>, fallback: Option<&str>) -> Option<FactRecord> {
    let headline = map.remove("headline").and_then(text_of);
    let detail = map.remove("detail").and_then(text_of);
    if headline.is_none() && detail.is_none() {
        return None;
    }
    Some(FactRecord {
        headline: headline
            .or_else(|| fallback.map(str::to_string))
            .unwrap_or_else(|| FALLBACK_HEADLINE.to_string()),
        detail,
    })
}

fn record_from_value(value: Value, fallback: Option<&str>) -> Option<FactRecord> {
    match value {
        Value::Object(map) => record_from_object(map, fallback),
        other => {
            let text = text_of(other)?;
            Some(match fallback {
                Some(key) => FactRecord::new(key, text),
                None => FactRecord {
                    headline: text,
                    detail: None,
                },
            })
        }
    }
}

fn records_from_section(key: String, section: Value) -> Vec<FactRecord> {
    match section {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| record_from_value(item, Some(&key)))
            .collect(),
        Value::Object(map) if !is_fact_object(&map) => map
            .into_iter()
            .filter_map(|(sub, value)| {
                text_of(value).map(|text| FactRecord::new(format!("{key}: {sub}"), text))
            })
            .collect(),
        other => record_from_value(other, Some(&key)).into_iter().collect(),
    }
}
