//! Process-local session store with the same semantics as the file store,
//! used by tests and when memory is disabled.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use travel_buddy_core::error::{BuddyError, Result};
use travel_buddy_core::types::Session;

use crate::store::{SessionStore, StoreStats};

/// Session store that lives only in process memory.
///
/// Same semantics as [`crate::JsonFileStore`] without touching disk.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: Mutex<BTreeMap<String, Session>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Session>>> {
        self.sessions
            .lock()
            .map_err(|e| BuddyError::Storage(format!("Store lock poisoned: {}", e)))
    }
}

impl SessionStore for InMemoryStore {
    fn load(&self, session_id: &str) -> Result<Session> {
        Ok(self
            .lock()?
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| Session::new(session_id)))
    }

    fn save(&self, session_id: &str, session: &Session) -> Result<()> {
        self.lock()?
            .insert(session_id.to_string(), session.clone());
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn clear(&self, session_id: Option<&str>) -> Result<usize> {
        let mut map = self.lock()?;
        Ok(match session_id {
            Some(id) => usize::from(map.remove(id).is_some()),
            None => {
                let n = map.len();
                map.clear();
                n
            }
        })
    }

    fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(session_id))
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats::from_sessions(self.lock()?.values()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use travel_buddy_core::types::Turn;

    #[test]
    fn test_save_and_load() {
        let store = InMemoryStore::new();
        let mut session = Session::new("s1");
        session.append_turn(Turn::user("Where should I go in May?"));
        store.save("s1", &session).unwrap();

        assert_eq!(store.load("s1").unwrap(), session);
        assert!(store.contains("s1").unwrap());
    }

    #[test]
    fn test_clear_semantics() {
        let store = InMemoryStore::new();
        store.save("a", &Session::new("a")).unwrap();
        store.save("b", &Session::new("b")).unwrap();

        assert_eq!(store.clear(Some("a")).unwrap(), 1);
        assert_eq!(store.list_sessions().unwrap(), vec!["b".to_string()]);
        assert_eq!(store.clear(None).unwrap(), 1);
        assert_eq!(store.stats().unwrap().total_sessions, 0);
    }
}
