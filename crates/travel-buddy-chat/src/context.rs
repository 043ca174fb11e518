//! Conversation context management.
//!
//! Reads and writes sessions through an injected [`SessionStore`], builds
//! bounded context windows for prompts, and records turns and extracted
//! preferences.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use travel_buddy_core::config::MemoryConfig;
use travel_buddy_core::types::{Preference, Role, Session, Turn};
use travel_buddy_storage::{SessionStore, StoreStats};

use crate::error::ChatError;
use crate::preferences::extract_preferences;

// =============================================================================
// Types
// =============================================================================

/// What a handler sees of a session when building a prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationContext {
    pub session_id: String,
    /// Most recent turns, oldest first.
    pub turns: Vec<Turn>,
    /// Latest value per key, in insertion order.
    pub preferences: Vec<Preference>,
    pub summary: Option<String>,
}

impl ConversationContext {
    pub fn empty(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
            preferences: Vec::new(),
            summary: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty() && self.preferences.is_empty() && self.summary.is_none()
    }
}

/// Overview of one stored session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub turn_count: usize,
    pub user_turns: usize,
    pub assistant_turns: usize,
    pub preferences: Vec<Preference>,
    pub summary: Option<String>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
            turn_count: session.turns.len(),
            user_turns: session.count_role(Role::User),
            assistant_turns: session.count_role(Role::Assistant),
            preferences: session.latest_preferences().into_iter().cloned().collect(),
            summary: session.summary.clone(),
        }
    }
}

// =============================================================================
// ConversationManager
// =============================================================================

pub struct ConversationManager {
    store: Arc<dyn SessionStore>,
    /// Turns included by [`ConversationManager::context`].
    pub max_turns: usize,
    /// Preferences included by [`ConversationManager::context`].
    pub max_preferences: usize,
}

impl ConversationManager {
    pub fn new(store: Arc<dyn SessionStore>, max_turns: usize, max_preferences: usize) -> Self {
        Self {
            store,
            max_turns,
            max_preferences,
        }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, config: &MemoryConfig) -> Self {
        Self::new(
            store,
            config.max_context_turns,
            config.max_relevant_memories,
        )
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Build a bounded context window for `session_id`.
    ///
    /// Keeps the last `max_turns` turns in chronological order and the
    /// `max_preferences` most recently written preference keys.
    pub fn get_context(
        &self,
        session_id: &str,
        max_turns: usize,
        max_preferences: usize,
    ) -> Result<ConversationContext, ChatError> {
        let session = self.store.load(session_id)?;
        let latest = session.latest_preferences();
        let skip = latest.len().saturating_sub(max_preferences);
        let context = ConversationContext {
            session_id: session_id.to_string(),
            turns: session.recent_turns(max_turns).to_vec(),
            preferences: latest[skip..].iter().map(|p| (*p).clone()).collect(),
            summary: session.summary.clone(),
        };
        debug!(
            session_id,
            turns = context.turns.len(),
            preferences = context.preferences.len(),
            "Context loaded"
        );
        Ok(context)
    }

    /// [`get_context`](Self::get_context) with the configured limits.
    pub fn context(&self, session_id: &str) -> Result<ConversationContext, ChatError> {
        self.get_context(session_id, self.max_turns, self.max_preferences)
    }

    /// Append a turn and persist the session.
    pub fn record_turn(
        &self,
        session_id: &str,
        role: Role,
        text: &str,
    ) -> Result<Turn, ChatError> {
        let mut session = self.store.load(session_id)?;
        let turn = Turn::new(role, text);
        session.append_turn(turn.clone());
        self.store.save(session_id, &session)?;
        debug!(session_id, role = %role, turn_id = %turn.id, "Turn recorded");
        Ok(turn)
    }

    /// Extract preferences from `text` and persist any matches.
    ///
    /// Each preference points at the session's latest user turn.
    pub fn extract_and_store_preferences(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<Vec<Preference>, ChatError> {
        let extracted = extract_preferences(text);
        if extracted.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self.store.load(session_id)?;
        let source = session.last_user_turn().map(|t| t.id);
        let stored: Vec<Preference> = extracted
            .into_iter()
            .map(|p| Preference::new(p.key, p.value, source))
            .collect();
        for pref in &stored {
            session.add_preference(pref.clone());
        }
        self.store.save(session_id, &session)?;
        info!(session_id, count = stored.len(), "Preferences stored");
        Ok(stored)
    }

    /// Record a full exchange with a single save: the user turn, the
    /// preferences extracted from it, then the assistant turn.
    ///
    /// Either everything lands in the store or nothing does. Returns the
    /// stored preferences.
    pub fn record_exchange(
        &self,
        session_id: &str,
        query: &str,
        response: &str,
    ) -> Result<Vec<Preference>, ChatError> {
        let mut session = self.store.load(session_id)?;

        let user_turn = Turn::new(Role::User, query);
        let source = Some(user_turn.id);
        session.append_turn(user_turn);

        let stored: Vec<Preference> = extract_preferences(query)
            .into_iter()
            .map(|p| Preference::new(p.key, p.value, source))
            .collect();
        for pref in &stored {
            session.add_preference(pref.clone());
        }

        session.append_turn(Turn::new(Role::Assistant, response));
        self.store.save(session_id, &session)?;
        debug!(
            session_id,
            preferences = stored.len(),
            turns = session.turns.len(),
            "Exchange recorded"
        );
        Ok(stored)
    }

    pub fn history(&self, session_id: &str) -> Result<Vec<Turn>, ChatError> {
        Ok(self.store.load(session_id)?.turns)
    }

    pub fn list_sessions(&self) -> Result<Vec<String>, ChatError> {
        Ok(self.store.list_sessions()?)
    }

    /// Overview of a stored session; `None` if it does not exist.
    pub fn session_summary(&self, session_id: &str) -> Result<Option<SessionSummary>, ChatError> {
        if !self.store.contains(session_id)? {
            return Ok(None);
        }
        let session = self.store.load(session_id)?;
        Ok(Some(SessionSummary::from(&session)))
    }

    pub fn stats(&self) -> Result<StoreStats, ChatError> {
        Ok(self.store.stats()?)
    }

    pub fn update_summary(&self, session_id: &str, summary: &str) -> Result<(), ChatError> {
        let mut session = self.store.load(session_id)?;
        session.summary = Some(summary.trim().to_string());
        session.updated_at = Utc::now();
        self.store.save(session_id, &session)?;
        Ok(())
    }

    /// Remove one session; returns whether it existed.
    pub fn clear_session(&self, session_id: &str) -> Result<bool, ChatError> {
        Ok(self.store.clear(Some(session_id))? > 0)
    }

    /// Remove every session; returns how many were removed.
    pub fn clear_all(&self) -> Result<usize, ChatError> {
        Ok(self.store.clear(None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_buddy_core::error::{BuddyError, Result as BuddyResult};
    use travel_buddy_storage::InMemoryStore;

    fn manager() -> ConversationManager {
        ConversationManager::new(Arc::new(InMemoryStore::new()), 10, 5)
    }

    /// Store whose writes always fail.
    struct ReadOnlyStore;

    impl SessionStore for ReadOnlyStore {
        fn load(&self, session_id: &str) -> BuddyResult<Session> {
            Ok(Session::new(session_id))
        }
        fn save(&self, _: &str, _: &Session) -> BuddyResult<()> {
            Err(BuddyError::Storage("read-only filesystem".into()))
        }
        fn list_sessions(&self) -> BuddyResult<Vec<String>> {
            Ok(Vec::new())
        }
        fn clear(&self, _: Option<&str>) -> BuddyResult<usize> {
            Ok(0)
        }
        fn contains(&self, _: &str) -> BuddyResult<bool> {
            Ok(false)
        }
        fn stats(&self) -> BuddyResult<StoreStats> {
            Ok(StoreStats::default())
        }
    }

    #[test]
    fn test_record_turn_then_context_includes_it() {
        let mgr = manager();
        let turn = mgr.record_turn("s", Role::User, "Where in Peru?").unwrap();
        let ctx = mgr.context("s").unwrap();
        assert_eq!(ctx.turns.len(), 1);
        assert_eq!(ctx.turns[0].id, turn.id);
        assert_eq!(ctx.turns[0].text, "Where in Peru?");
    }

    #[test]
    fn test_context_keeps_most_recent_turns_in_order() {
        let mgr = manager();
        for i in 0..6 {
            mgr.record_turn("s", Role::User, &format!("q{}", i)).unwrap();
        }
        let ctx = mgr.get_context("s", 3, 5).unwrap();
        let texts: Vec<&str> = ctx.turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["q3", "q4", "q5"]);
    }

    #[test]
    fn test_context_of_unknown_session_is_empty() {
        let ctx = manager().context("nobody").unwrap();
        assert!(ctx.is_empty());
        assert_eq!(ctx.session_id, "nobody");
    }

    #[test]
    fn test_preferences_source_latest_user_turn() {
        let mgr = manager();
        let turn = mgr
            .record_turn("s", Role::User, "I love Italian food")
            .unwrap();
        let prefs = mgr
            .extract_and_store_preferences("s", "I love Italian food")
            .unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].key, "cuisine");
        assert_eq!(prefs[0].value, "italian");
        assert_eq!(prefs[0].source_turn_id, Some(turn.id));
    }

    #[test]
    fn test_no_preferences_does_not_write() {
        let mgr = manager();
        let prefs = mgr
            .extract_and_store_preferences("s", "Where should I go?")
            .unwrap();
        assert!(prefs.is_empty());
        assert!(mgr.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_context_preferences_last_write_wins_and_limit() {
        let mgr = manager();
        mgr.extract_and_store_preferences("s", "I love Italian food").unwrap();
        mgr.extract_and_store_preferences("s", "I'm vegan").unwrap();
        mgr.extract_and_store_preferences("s", "I enjoy hiking").unwrap();
        mgr.extract_and_store_preferences("s", "I love Thai food").unwrap();

        let ctx = mgr.get_context("s", 10, 10).unwrap();
        let pairs: Vec<(&str, &str)> = ctx
            .preferences
            .iter()
            .map(|p| (p.key.as_str(), p.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("diet", "vegan"), ("interest", "hiking"), ("cuisine", "thai")]
        );

        let ctx = mgr.get_context("s", 10, 2).unwrap();
        let keys: Vec<&str> = ctx.preferences.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["interest", "cuisine"]);
    }

    #[test]
    fn test_session_summary() {
        let mgr = manager();
        assert!(mgr.session_summary("s").unwrap().is_none());

        mgr.record_turn("s", Role::User, "I'm vegetarian").unwrap();
        mgr.extract_and_store_preferences("s", "I'm vegetarian").unwrap();
        mgr.record_turn("s", Role::Assistant, "Noted.").unwrap();
        mgr.update_summary("s", " Vegetarian traveler. ").unwrap();

        let summary = mgr.session_summary("s").unwrap().unwrap();
        assert_eq!(summary.turn_count, 2);
        assert_eq!(summary.user_turns, 1);
        assert_eq!(summary.assistant_turns, 1);
        assert_eq!(summary.preferences.len(), 1);
        assert_eq!(summary.summary.as_deref(), Some("Vegetarian traveler."));
    }

    #[test]
    fn test_clear_session_and_all() {
        let mgr = manager();
        mgr.record_turn("a", Role::User, "hi").unwrap();
        mgr.record_turn("b", Role::User, "hi").unwrap();

        assert!(mgr.clear_session("a").unwrap());
        assert!(!mgr.clear_session("a").unwrap());
        assert_eq!(mgr.list_sessions().unwrap(), vec!["b".to_string()]);
        assert_eq!(mgr.clear_all().unwrap(), 1);
        assert_eq!(mgr.stats().unwrap().total_sessions, 0);
    }

    #[test]
    fn test_record_exchange_writes_once() {
        let store = Arc::new(InMemoryStore::new());
        let mgr = ConversationManager::new(store.clone(), 10, 5);
        let prefs = mgr
            .record_exchange("s", "I love Thai food, where should I go?", "Try Bangkok.")
            .unwrap();

        let history = mgr.history("s").unwrap();
        let roles: Vec<Role> = history.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(history[1].text, "Try Bangkok.");
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].value, "thai");
        assert_eq!(prefs[0].source_turn_id, Some(history[0].id));
    }

    #[test]
    fn test_record_exchange_failure_leaves_session_untouched() {
        let mgr = ConversationManager::new(Arc::new(ReadOnlyStore), 10, 5);
        let err = mgr
            .record_exchange("s", "I love Thai food", "Noted.")
            .unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_store_failure_surfaces() {
        let mgr = ConversationManager::new(Arc::new(ReadOnlyStore), 10, 5);
        let err = mgr.record_turn("s", Role::User, "hello").unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("read-only filesystem"));
    }
}
