use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Speaker label used when rendering a transcript into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category a query is routed to.
///
/// Closed set: every query maps to exactly one variant, with `General`
/// as the catch-all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Where to go: destination choice, seasons, logistics.
    Destination,
    /// What to do there: sights, activities, itineraries.
    Attractions,
    /// What to bring: packing lists, clothing, documents.
    Packing,
    /// Anything else.
    General,
}

impl TaskType {
    /// All task types in routing order.
    pub const ALL: [TaskType; 4] = [
        TaskType::Destination,
        TaskType::Attractions,
        TaskType::Packing,
        TaskType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::Destination => "destination",
            TaskType::Attractions => "attractions",
            TaskType::Packing => "packing",
            TaskType::General => "general",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "destination" => Ok(TaskType::Destination),
            "attractions" => Ok(TaskType::Attractions),
            "packing" => Ok(TaskType::Packing),
            // "other" is the label older session files used for the fallback.
            "general" | "other" => Ok(TaskType::General),
            other => Err(format!("unknown task type: {}", other)),
        }
    }
}

// =============================================================================
// Conversation data
// =============================================================================

/// One message within a session. Never modified after it is appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

/// A durable fact about the traveler, extracted from one of their turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    pub key: String,
    pub value: String,
    /// The user turn this preference was extracted from, if known.
    pub source_turn_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Preference {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        source_turn_id: Option<Uuid>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source_turn_id,
            created_at: Utc::now(),
        }
    }
}

/// A named, persistent conversation thread.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub turns: Vec<Turn>,
    #[serde(default)]
    pub preferences: Vec<Preference>,
    /// Model-generated recap of the conversation so far.
    #[serde(default)]
    pub summary: Option<String>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            updated_at: now,
            turns: Vec::new(),
            preferences: Vec::new(),
            summary: None,
        }
    }

    pub fn append_turn(&mut self, turn: Turn) {
        self.updated_at = turn.timestamp.max(self.updated_at);
        self.turns.push(turn);
    }

    pub fn add_preference(&mut self, preference: Preference) {
        self.updated_at = preference.created_at.max(self.updated_at);
        self.preferences.push(preference);
    }

    /// The most recent `n` turns, oldest first.
    pub fn recent_turns(&self, n: usize) -> &[Turn] {
        let start = self.turns.len().saturating_sub(n);
        &self.turns[start..]
    }

    /// The latest user turn, if any.
    pub fn last_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.turns.iter().filter(|t| t.role == role).count()
    }

    /// Preferences with duplicate keys collapsed, last write wins.
    ///
    /// Each key appears once, at the position of its winning (latest) entry,
    /// so the result stays in insertion order.
    pub fn latest_preferences(&self) -> Vec<&Preference> {
        let mut latest: Vec<&Preference> = Vec::new();
        for pref in &self.preferences {
            latest.retain(|p| p.key != pref.key);
            latest.push(pref);
        }
        latest
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.preferences.is_empty() && self.summary.is_none()
    }
}
