//! JSON file backed session store.
//!
//! The whole file is read once at open and rewritten in full on every
//! mutation. Writes go to a sibling `.tmp` file which is fsynced and then
//! renamed over the original, so a crash never leaves a half-written store.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use travel_buddy_core::error::{BuddyError, Result};
use travel_buddy_core::types::Session;

use crate::store::{SessionStore, StoreStats};

type SessionMap = BTreeMap<String, Session>;

/// Session store persisted as one JSON document.
pub struct JsonFileStore {
    path: PathBuf,
    sessions: Mutex<SessionMap>,
}

impl JsonFileStore {
    /// Open the store at `path`.
    ///
    /// A missing or empty file yields an empty store. A file that is not a
    /// valid session mapping is rejected as a whole.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sessions = read_sessions(&path)?;
        info!(
            path = %path.display(),
            sessions = sessions.len(),
            "Memory store opened"
        );
        Ok(Self {
            path,
            sessions: Mutex::new(sessions),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionMap>> {
        self.sessions
            .lock()
            .map_err(|e| BuddyError::Storage(format!("Store lock poisoned: {}", e)))
    }

    /// Apply `mutate` to a copy of the mapping, persist it, then commit.
    ///
    /// The in-memory state only changes when the write succeeded.
    fn update<T>(&self, mutate: impl FnOnce(&mut SessionMap) -> T) -> Result<T> {
        let mut guard = self.lock()?;
        let mut next = guard.clone();
        let out = mutate(&mut next);
        write_atomic(&self.path, &next)?;
        *guard = next;
        Ok(out)
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self, session_id: &str) -> Result<Session> {
        let guard = self.lock()?;
        Ok(guard
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| Session::new(session_id)))
    }

    fn save(&self, session_id: &str, session: &Session) -> Result<()> {
        self.update(|map| {
            map.insert(session_id.to_string(), session.clone());
        })?;
        debug!(
            session_id,
            turns = session.turns.len(),
            preferences = session.preferences.len(),
            "Session saved"
        );
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn clear(&self, session_id: Option<&str>) -> Result<usize> {
        let removed = self.update(|map| match session_id {
            Some(id) => usize::from(map.remove(id).is_some()),
            None => {
                let n = map.len();
                map.clear();
                n
            }
        })?;
        info!(session_id = session_id.unwrap_or("*"), removed, "Sessions cleared");
        Ok(removed)
    }

    fn contains(&self, session_id: &str) -> Result<bool> {
        Ok(self.lock()?.contains_key(session_id))
    }

    fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats::from_sessions(self.lock()?.values()))
    }
}

fn read_sessions(path: &Path) -> Result<SessionMap> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SessionMap::new()),
        Err(e) => return Err(e.into()),
    };
    if content.trim().is_empty() {
        return Ok(SessionMap::new());
    }
    serde_json::from_str(&content).map_err(|e| BuddyError::CorruptStore {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, sessions: &SessionMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(sessions)?;
    let tmp = tmp_path(path);
    if let Err(e) = replace_with(&tmp, path, content.as_bytes()) {
        if let Err(cleanup) = fs::remove_file(&tmp) {
            debug!(path = %tmp.display(), error = %cleanup, "Temp file not removed");
        }
        return Err(e);
    }
    Ok(())
}

fn replace_with(tmp: &Path, path: &Path, content: &[u8]) -> Result<()> {
    let mut file = File::create(tmp)?;
    file.write_all(content)?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, path)?;
    Ok(())
}
