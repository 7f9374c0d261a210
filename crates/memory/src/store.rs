//! Session history storage.
//!
//! Every mutation is a read-modify-write of the whole session document.
//! Both stores serialize mutations of one session within a store instance.
//! Two `JsonFileHistoryStore` instances (or processes) sharing a directory
//! do not coordinate: the later rewrite wins and the other update is lost.

use crate::types::{
    AgentContext, HistoryConfig, HistoryWindow, QueryRecord, SessionHistory, SessionSummary,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use switchboard_common::{validate_session_id, AgentId, Result, SwitchboardError};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Distinguishes temporary files written by concurrent saves in one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Persistence for per-session query history.
///
/// Implementors provide `load` and `save`; every other operation is a
/// load, an in-memory change, and a wholesale save.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load a session, or an empty history if the session has never been saved.
    async fn load(&self, session_id: &str) -> Result<SessionHistory>;

    /// Replace the stored document for `history.session_id`.
    async fn save(&self, history: &SessionHistory) -> Result<()>;

    /// Append one query record.
    async fn append(&self, session_id: &str, record: QueryRecord) -> Result<()> {
        let mut history = self.load(session_id).await?;
        history.queries.push(record);
        self.save(&history).await
    }

    /// Remove every query of the session. Notes and profile are kept.
    async fn clear(&self, session_id: &str) -> Result<()> {
        let mut history = self.load(session_id).await?;
        history.queries.clear();
        self.save(&history).await
    }

    async fn recent(&self, session_id: &str, n: usize) -> Result<HistoryWindow> {
        Ok(self.load(session_id).await?.recent(n))
    }

    async fn context_for_agent(
        &self,
        session_id: &str,
        agent: AgentId,
        max_items: usize,
    ) -> Result<AgentContext> {
        Ok(self
            .load(session_id)
            .await?
            .context_for_agent(agent, max_items))
    }

    async fn add_note(&self, session_id: &str, note: String) -> Result<()> {
        let mut history = self.load(session_id).await?;
        history.notes.push(note);
        self.save(&history).await
    }

    async fn update_user_profile(&self, session_id: &str, key: String, value: Value) -> Result<()> {
        let mut history = self.load(session_id).await?;
        history.user_profile.insert(key, value);
        self.save(&history).await
    }

    async fn summary(&self, session_id: &str) -> Result<SessionSummary> {
        Ok(self.load(session_id).await?.summary())
    }
}

/// One pretty-printed JSON document per session, `<dir>/<session_id>.json`.
///
/// Saves write a uniquely named temporary sibling and rename it over the
/// target, so a reader never sees a half-written document. Mutations of one
/// session hold that session's lock across load and save.
pub struct JsonFileHistoryStore {
    directory: PathBuf,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonFileHistoryStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &HistoryConfig) -> Self {
        Self::new(config.directory.clone())
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.directory.join(format!("{session_id}.json")))
    }

    fn tmp_path(&self, session_id: &str) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.directory
            .join(format!(".{session_id}.json.{}.{n}.tmp", std::process::id()))
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .lock()
            .await
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    async fn mutate(
        &self,
        session_id: &str,
        change: impl FnOnce(&mut SessionHistory) + Send,
    ) -> Result<()> {
        validate_session_id(session_id)?;
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let mut history = self.load(session_id).await?;
        change(&mut history);
        self.save(&history).await
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistoryStore {
    async fn load(&self, session_id: &str) -> Result<SessionHistory> {
        let path = self.session_path(session_id)?;

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(session_id = %session_id, "No stored history, starting fresh");
                return Ok(SessionHistory::new(session_id));
            }
            Err(e) => return Err(e.into()),
        };

        let history: SessionHistory = serde_json::from_str(&content)?;
        if history.session_id != session_id {
            return Err(SwitchboardError::History(format!(
                "History file '{}' belongs to session '{}'",
                path.display(),
                history.session_id
            )));
        }

        debug!(
            session_id = %session_id,
            queries = history.queries.len(),
            "Loaded session history"
        );
        Ok(history)
    }

    async fn save(&self, history: &SessionHistory) -> Result<()> {
        let path = self.session_path(&history.session_id)?;
        tokio::fs::create_dir_all(&self.directory).await?;

        let content = serde_json::to_string_pretty(history)?;
        let tmp_path = self.tmp_path(&history.session_id);
        tokio::fs::write(&tmp_path, content).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        info!(
            session_id = %history.session_id,
            queries = history.queries.len(),
            notes = history.notes.len(),
            "Persisted session history"
        );
        Ok(())
    }

    async fn append(&self, session_id: &str, record: QueryRecord) -> Result<()> {
        self.mutate(session_id, |h| h.queries.push(record)).await
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        self.mutate(session_id, |h| h.queries.clear()).await
    }

    async fn add_note(&self, session_id: &str, note: String) -> Result<()> {
        self.mutate(session_id, |h| h.notes.push(note)).await
    }

    async fn update_user_profile(&self, session_id: &str, key: String, value: Value) -> Result<()> {
        self.mutate(session_id, |h| {
            h.user_profile.insert(key, value);
        })
        .await
    }
}

/// Process-local store. Mutations hold the write lock for the whole
/// read-modify-write, so concurrent appends to one session do not race.
#[derive(Clone, Default)]
pub struct InMemoryHistoryStore {
    sessions: Arc<RwLock<HashMap<String, SessionHistory>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate(
        &self,
        session_id: &str,
        change: impl FnOnce(&mut SessionHistory) + Send,
    ) -> Result<()> {
        validate_session_id(session_id)?;
        let mut sessions = self.sessions.write().await;
        let history = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionHistory::new(session_id));
        change(history);
        debug!(
            session_id = %session_id,
            queries = history.queries.len(),
            "Updated in-memory history"
        );
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn load(&self, session_id: &str) -> Result<SessionHistory> {
        validate_session_id(session_id)?;
        Ok(self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_else(|| SessionHistory::new(session_id)))
    }

    async fn save(&self, history: &SessionHistory) -> Result<()> {
        validate_session_id(&history.session_id)?;
        self.sessions
            .write()
            .await
            .insert(history.session_id.clone(), history.clone());
        Ok(())
    }

    async fn append(&self, session_id: &str, record: QueryRecord) -> Result<()> {
        self.mutate(session_id, |h| h.queries.push(record)).await
    }

    async fn clear(&self, session_id: &str) -> Result<()> {
        self.mutate(session_id, |h| h.queries.clear()).await
    }

    async fn add_note(&self, session_id: &str, note: String) -> Result<()> {
        self.mutate(session_id, |h| h.notes.push(note)).await
    }

    async fn update_user_profile(&self, session_id: &str, key: String, value: Value) -> Result<()> {
        self.mutate(session_id, |h| {
            h.user_profile.insert(key, value);
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_append_then_recent() {
        let store = InMemoryHistoryStore::new();
        store.append("s1", QueryRecord::new("Q1", None)).await.unwrap();
        store
            .append("s1", QueryRecord::new("Q2", Some(AgentId::Planner)))
            .await
            .unwrap();

        let window = store.recent("s1", 1).await.unwrap();
        assert_eq!(window.records().len(), 1);
        assert_eq!(window.records()[0].query_text, "Q2");
    }

    #[tokio::test]
    async fn in_memory_sessions_are_isolated() {
        let store = InMemoryHistoryStore::new();
        store.append("a", QueryRecord::new("only a", None)).await.unwrap();

        assert!(store.recent("b", 5).await.unwrap().is_empty());
        assert_eq!(store.load("a").await.unwrap().queries.len(), 1);
    }

    #[tokio::test]
    async fn in_memory_clear_keeps_notes() {
        let store = InMemoryHistoryStore::new();
        store.append("s1", QueryRecord::new("Q1", None)).await.unwrap();
        store.add_note("s1", "prefers short answers".into()).await.unwrap();
        store.clear("s1").await.unwrap();

        let history = store.load("s1").await.unwrap();
        assert!(history.queries.is_empty());
        assert_eq!(history.notes, vec!["prefers short answers".to_string()]);
        assert_eq!(
            store.recent("s1", 1).await.unwrap(),
            HistoryWindow::Empty
        );
    }

    #[tokio::test]
    async fn in_memory_concurrent_appends_are_not_lost() {
        let store = InMemoryHistoryStore::new();
        let mut handles = vec![];
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append("shared", QueryRecord::new(format!("q{i}"), None))
                    .await
                    .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.load("shared").await.unwrap().queries.len(), 16);
    }

    #[tokio::test]
    async fn invalid_session_id_is_rejected() {
        let store = InMemoryHistoryStore::new();
        let err = store
            .append("../escape", QueryRecord::new("q", None))
            .await
            .unwrap_err();
        assert!(matches!(err, SwitchboardError::Config(_)));
    }

    #[test]
    fn json_store_paths_live_under_directory() {
        let store = JsonFileHistoryStore::new("/tmp/sessions");
        let path = store.session_path("demo").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/sessions/demo.json"));
        assert!(store.session_path("a/b").is_err());
    }
}
