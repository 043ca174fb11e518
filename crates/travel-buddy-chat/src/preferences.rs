//! Rule-based extraction of traveler preferences from user text.
//!
//! Every rule is tried; each contributes at most one value per text.
//! Values are lowercased and trimmed.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

struct PreferenceRule {
    key: &'static str,
    patterns: Vec<Regex>,
}

/// A key/value pair found in one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPreference {
    pub key: String,
    pub value: String,
}

static RULES: LazyLock<Vec<PreferenceRule>> = LazyLock::new(|| {
    let mk = |key: &'static str, pats: &[&str]| PreferenceRule {
        key,
        patterns: pats
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .expect("Invalid preference regex")
            })
            .collect(),
    };

    vec![
        mk(
            "cuisine",
            &[r"\bI\s+(?:really\s+)?(?:love|like|enjoy|prefer)\s+([a-z]+(?:\s+[a-z]+)?)\s+(?:food|cuisine|dishes)\b"],
        ),
        mk(
            "diet",
            &[r"\bI(?:['’]m|\s+am)\s+(?:a\s+)?(vegetarian|vegan|pescatarian|gluten[\s-]free|halal|kosher|lactose[\s-]intolerant)\b"],
        ),
        mk(
            "budget",
            &[
                r"\bmy\s+budget\s+is\s+(?:about\s+|around\s+|roughly\s+|under\s+)?([$€£]?\s?\d[\d,.]*\s*(?:k\b|usd\b|eur\b|euros\b|dollars\b|pounds\b)?)",
                r"\bon\s+a\s+(tight|low|small|limited|shoestring|modest|big|generous|flexible)\s+budget\b",
            ],
        ),
        mk(
            "travel_style",
            &[
                r"\b(luxury|budget|backpacking|adventure|family[\s-]friendly|romantic|solo|slow)\s+(?:travel|trips?|traveler|traveller|vacations?|holidays?|style)\b",
                r"\bI\s+(?:prefer|like|love)\s+(luxury|backpacking)\b",
            ],
        ),
        mk(
            "companions",
            &[r"\b(?:travel(?:l?ing)?|going|coming|visiting)\s+with\s+(?:my\s+)?((?:wife|husband|partner|spouse|kids|children|family|friends|girlfriend|boyfriend|parents|dog|son|daughter|baby)(?:\s+and\s+(?:my\s+)?(?:kids|children|dog|baby))?)\b"],
        ),
        mk(
            "climate",
            &[r"\bI\s+(?:prefer|like|love|want)\s+(warm|hot|cold|cool|mild|sunny|dry|tropical)\s+(?:weather|climates?|places|destinations)\b"],
        ),
        mk(
            "interest",
            &[r"\bI\s+(?:really\s+)?(?:enjoy|love|like)\s+(hiking|museums|history|art|beaches|surfing|skiing|diving|snorkeling|wine|nightlife|shopping|architecture|photography|nature|wildlife|music)\b"],
        ),
        mk(
            "dislike",
            &[r"\bI\s+(?:hate|dislike|can['’]?t\s+stand|cannot\s+stand|don['’]?t\s+like|do\s+not\s+like)\s+([a-z]+(?:\s+[a-z]+){0,2})"],
        ),
    ]
});

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Extract preferences from one message, in rule order.
pub fn extract_preferences(text: &str) -> Vec<ExtractedPreference> {
    RULES
        .iter()
        .filter_map(|rule| {
            rule.patterns.iter().find_map(|re| {
                re.captures(text)
                    .and_then(|caps| caps.get(1))
                    .map(|m| normalize(m.as_str()))
                    .filter(|v| !v.is_empty())
                    .map(|value| ExtractedPreference {
                        key: rule.key.to_string(),
                        value,
                    })
            })
        })
        .collect()
}
