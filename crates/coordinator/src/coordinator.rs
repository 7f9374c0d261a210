//! Entry point for running a query end to end.

use crate::config::CoordinatorConfig;
use crate::graph::OrchestrationGraph;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use switchboard_common::{validate_session_id, QueryOutcome, Result, SharedState};
use switchboard_llm::build_llm_client;
use switchboard_memory::{HistoryStore, JsonFileHistoryStore, QueryRecord, SessionSummary};
use tracing::info;
use uuid::Uuid;

/// Runs queries through the orchestration graph and keeps session history.
///
/// Holds no per-run state: concurrent `run_query` calls are independent
/// apart from the history store they share.
pub struct Coordinator {
    graph: Arc<OrchestrationGraph>,
    history: Arc<dyn HistoryStore>,
}

impl Coordinator {
    pub fn new(graph: Arc<OrchestrationGraph>, history: Arc<dyn HistoryStore>) -> Self {
        Self { graph, history }
    }

    /// Build the backend client, JSON history store and standard graph.
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        info!(
            model = %config.llm.model,
            history_dir = %config.history.directory.display(),
            "Initializing Switchboard coordinator"
        );

        let llm = build_llm_client(&config.llm)?;
        let history: Arc<dyn HistoryStore> =
            Arc::new(JsonFileHistoryStore::from_config(&config.history));
        let graph = OrchestrationGraph::standard(llm, history.clone(), &config.history)?;

        Ok(Self::new(Arc::new(graph), history))
    }

    pub fn graph(&self) -> &Arc<OrchestrationGraph> {
        &self.graph
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Classify `text`, run the assigned specialists and the synthesizer, and
    /// append the query to the session's history.
    ///
    /// The history is only written after a successful run.
    pub async fn run_query(&self, text: &str, session_id: &str) -> Result<QueryOutcome> {
        validate_session_id(session_id)?;

        let run_id = Uuid::new_v4();
        let started = Utc::now();
        info!(run_id = %run_id, session_id = %session_id, "Starting query run");

        let history = self.history.load(session_id).await?;

        let mut state = SharedState::new(text, session_id);
        state.insert_metadata("run_id", Value::String(run_id.to_string()));
        state.insert_metadata("start_time", Value::String(started.to_rfc3339()));
        state.insert_metadata("history_entries", Value::from(history.queries.len()));

        let mut state = self.graph.run(state).await?;

        let finished = Utc::now();
        state.insert_metadata("end_time", Value::String(finished.to_rfc3339()));

        let handled_by = state.assigned_agents().first().copied();
        self.history
            .append(session_id, QueryRecord::new(text, handled_by))
            .await?;

        info!(
            run_id = %run_id,
            session_id = %session_id,
            classification = ?state.classification(),
            contributions = state.contributions().len(),
            elapsed_ms = (finished - started).num_milliseconds(),
            "Query run complete"
        );

        Ok(state.into_outcome())
    }

    pub async fn session_summary(&self, session_id: &str) -> Result<SessionSummary> {
        self.history.summary(session_id).await
    }

    /// Forget the session's queries. Notes and profile survive.
    pub async fn clear_history(&self, session_id: &str) -> Result<()> {
        self.history.clear(session_id).await?;
        info!(session_id = %session_id, "Cleared session history");
        Ok(())
    }
}
