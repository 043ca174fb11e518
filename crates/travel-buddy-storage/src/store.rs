//! The session store abstraction shared by the file and in-memory backends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use travel_buddy_core::error::Result;
use travel_buddy_core::types::{Role, Session};

/// Whole-session persistence for conversations.
///
/// Every operation reads or writes complete sessions; there is no
/// incremental append. Implementations assume a single writer.
pub trait SessionStore: Send + Sync {
    /// Load a session, or a fresh empty one if the id is unknown.
    ///
    /// A fresh session is not persisted until it is saved.
    fn load(&self, session_id: &str) -> Result<Session>;

    /// Replace the stored session under `session_id`.
    fn save(&self, session_id: &str, session: &Session) -> Result<()>;

    /// All stored session ids, sorted.
    fn list_sessions(&self) -> Result<Vec<String>>;

    /// Remove one session, or every session when `session_id` is `None`.
    ///
    /// Returns the number of sessions removed.
    fn clear(&self, session_id: Option<&str>) -> Result<usize>;

    fn contains(&self, session_id: &str) -> Result<bool>;

    fn stats(&self) -> Result<StoreStats>;
}

/// Aggregate counts over every session in a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_sessions: usize,
    pub total_turns: usize,
    pub user_turns: usize,
    pub assistant_turns: usize,
    pub total_preferences: usize,
    /// Number of stored preferences per key, including superseded ones.
    pub preference_keys: BTreeMap<String, usize>,
}

impl StoreStats {
    pub fn from_sessions<'a>(sessions: impl IntoIterator<Item = &'a Session>) -> Self {
        let mut stats = StoreStats::default();
        for session in sessions {
            stats.total_sessions += 1;
            stats.total_turns += session.turns.len();
            stats.user_turns += session.count_role(Role::User);
            stats.assistant_turns += session.count_role(Role::Assistant);
            stats.total_preferences += session.preferences.len();
            for pref in &session.preferences {
                *stats.preference_keys.entry(pref.key.clone()).or_default() += 1;
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_buddy_core::types::{Preference, Turn};

    #[test]
    fn test_stats_empty() {
        let stats = StoreStats::from_sessions(std::iter::empty());
        assert_eq!(stats, StoreStats::default());
    }

    #[test]
    fn test_stats_counts_roles_and_keys() {
        let mut a = Session::new("a");
        a.append_turn(Turn::user("I love Thai food"));
        a.append_turn(Turn::assistant("Try Bangkok"));
        a.add_preference(Preference::new("cuisine", "thai", None));

        let mut b = Session::new("b");
        b.append_turn(Turn::user("hi"));
        b.add_preference(Preference::new("cuisine", "italian", None));
        b.add_preference(Preference::new("budget", "tight", None));

        let stats = StoreStats::from_sessions([&a, &b]);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_turns, 3);
        assert_eq!(stats.user_turns, 2);
        assert_eq!(stats.assistant_turns, 1);
        assert_eq!(stats.total_preferences, 3);
        assert_eq!(stats.preference_keys.get("cuisine"), Some(&2));
        assert_eq!(stats.preference_keys.get("budget"), Some(&1));
    }
}
