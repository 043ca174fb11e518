//! Rule-based task classifier.
//!
//! Maps a free-text travel query to one [`TaskType`] using ordered keyword
//! rules. The first rule with a matching pattern wins; no match falls back
//! to [`TaskType::General`].

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::debug;

use travel_buddy_core::types::TaskType;

use crate::error::ChatError;

// =============================================================================
// Rules
// =============================================================================

/// A task type and the patterns that select it.
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub task_type: TaskType,
    patterns: Vec<Regex>,
}

impl ClassificationRule {
    /// Compile a rule. Patterns are matched case-insensitively.
    pub fn new(task_type: TaskType, patterns: &[&str]) -> Result<Self, ChatError> {
        let patterns = patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            task_type,
            patterns,
        })
    }

    /// The text of the first pattern match, if any.
    pub fn find(&self, query: &str) -> Option<String> {
        self.patterns
            .iter()
            .find_map(|re| re.find(query))
            .map(|m| m.as_str().to_string())
    }
}

// Destination is checked first. Its triggers avoid words like "trip" and
// "beach" that commonly appear in packing and attraction questions.
static DEFAULT_RULES: LazyLock<Vec<ClassificationRule>> = LazyLock::new(|| {
    let mk = |task_type: TaskType, pats: &[&str]| {
        ClassificationRule::new(task_type, pats).expect("Invalid classifier regex")
    };

    vec![
        mk(
            TaskType::Destination,
            &[
                r"\bdestinations?\b",
                r"\bwhere\s+(?:should|can|could|do|would)\s+(?:i|we)\s+(?:go|travel|visit|head|stay)\b",
                r"\bwhere\s+to\s+(?:go|travel|stay|visit)\b",
                r"\bbest\s+(?:time|season|month)\s+to\s+(?:go|visit|travel)\b",
                r"\b(?:which|what)\s+(?:city|cities|country|countries|island|islands|region|place)\b",
                r"\b(?:recommend|suggest)\s+(?:a|an|some)?\s*(?:place|places|city|cities|country|countries)\b",
                r"\bvacation\s+spots?\b",
                r"\bgetaways?\b",
                r"\bis\s+it\s+safe\s+to\s+(?:go|travel|visit)\b",
                r"\bhow\s+(?:do|can)\s+i\s+get\s+to\b",
                r"\bflights?\s+to\b",
            ],
        ),
        mk(
            TaskType::Attractions,
            &[
                r"\battractions?\b",
                r"\bthings\s+to\s+(?:do|see)\b",
                r"\bwhat\s+(?:to|can\s+i|should\s+i)\s+(?:do|see)\b",
                r"\bsightseeing\b",
                r"\bsights\b",
                r"\bactivit(?:y|ies)\b",
                r"\btours?\b",
                r"\bmuseums?\b",
                r"\blandmarks?\b",
                r"\bmust[\s-]see\b",
                r"\bitinerar(?:y|ies)\b",
                r"\bhik(?:e|es|ing)\b",
                r"\bwhere\s+to\s+eat\b",
                r"\brestaurants?\b",
                r"\bnightlife\b",
                r"\bday\s+trips?\b",
            ],
        ),
        mk(
            TaskType::Packing,
            &[
                r"\bpack(?:ing|ed)?\b",
                r"\bbring\b",
                r"\bluggage\b",
                r"\bsuitcases?\b",
                r"\bcarry[\s-]on\b",
                r"\bwhat\s+(?:to|should\s+i)\s+wear\b",
                r"\bcloth(?:es|ing)\b",
                r"\bessentials\b",
                r"\bchecklist\b",
                r"\btoiletries\b",
                r"\b(?:power|plug|travel)\s+adapters?\b",
                r"\bpassport\b",
                r"\btravel\s+documents?\b",
            ],
        ),
    ]
});

// =============================================================================
// Classifier
// =============================================================================

/// Result of classifying a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub task_type: TaskType,
    /// The text that triggered the chosen rule; `None` for the fallback.
    pub trigger: Option<String>,
}

/// Ordered keyword classifier.
#[derive(Debug, Clone)]
pub struct TaskClassifier {
    rules: Vec<ClassificationRule>,
}

impl Default for TaskClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskClassifier {
    /// Classifier with the built-in destination, attractions and packing rules.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_RULES.clone(),
        }
    }

    /// Classifier with a caller-supplied rule table, checked in order.
    pub fn with_rules(rules: Vec<ClassificationRule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, query: &str) -> TaskType {
        self.classify_detailed(query).task_type
    }

    pub fn classify_detailed(&self, query: &str) -> Classification {
        let hit = self
            .rules
            .iter()
            .find_map(|rule| rule.find(query).map(|trigger| (rule.task_type, trigger)));

        let classification = match hit {
            Some((task_type, trigger)) => Classification {
                task_type,
                trigger: Some(trigger),
            },
            None => Classification {
                task_type: TaskType::General,
                trigger: None,
            },
        };
        debug!(
            task_type = %classification.task_type,
            trigger = classification.trigger.as_deref().unwrap_or("-"),
            "Query classified"
        );
        classification
    }
}
