//! Session history types and configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use switchboard_common::AgentId;

/// One past query of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// The query text as the user typed it
    pub query_text: String,

    /// When the query was recorded (RFC 3339 / ISO 8601)
    pub timestamp: String,

    /// Agent that handled the query, if known
    #[serde(default)]
    pub handled_by: Option<AgentId>,
}

impl QueryRecord {
    pub fn new(query_text: impl Into<String>, handled_by: Option<AgentId>) -> Self {
        Self {
            query_text: query_text.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            handled_by,
        }
    }

    fn route_label(&self) -> &str {
        self.handled_by.map(|a| a.as_str()).unwrap_or("unknown")
    }
}

/// The persisted document for one session.
///
/// Queries are append-only; the only way to remove one is to clear them all.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHistory {
    pub session_id: String,

    #[serde(default)]
    pub queries: Vec<QueryRecord>,

    #[serde(default)]
    pub user_profile: Map<String, Value>,

    #[serde(default)]
    pub notes: Vec<String>,
}

impl SessionHistory {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    /// The last `n` queries, oldest first.
    pub fn recent(&self, n: usize) -> HistoryWindow {
        let start = self.queries.len().saturating_sub(n);
        let recent = &self.queries[start..];
        if recent.is_empty() {
            HistoryWindow::Empty
        } else {
            HistoryWindow::Recent(recent.to_vec())
        }
    }

    /// The last `max_items` queries handled by `agent`, oldest first.
    pub fn context_for_agent(&self, agent: AgentId, max_items: usize) -> AgentContext {
        let handled: Vec<&QueryRecord> = self
            .queries
            .iter()
            .filter(|q| q.handled_by == Some(agent))
            .collect();
        let start = handled.len().saturating_sub(max_items);

        AgentContext {
            agent,
            queries: handled[start..].iter().map(|q| QueryRecord::clone(q)).collect(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        let mut queries_by_agent = BTreeMap::new();
        for q in &self.queries {
            *queries_by_agent
                .entry(q.route_label().to_string())
                .or_insert(0) += 1;
        }

        SessionSummary {
            session_id: self.session_id.clone(),
            total_queries: self.queries.len(),
            total_notes: self.notes.len(),
            queries_by_agent,
            has_user_profile: !self.user_profile.is_empty(),
        }
    }
}

/// A window onto the most recent queries of a session.
///
/// `Empty` is an explicit answer, not an error: a fresh or cleared session
/// simply has nothing to show.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryWindow {
    Empty,
    Recent(Vec<QueryRecord>),
}

impl HistoryWindow {
    pub fn is_empty(&self) -> bool {
        matches!(self, HistoryWindow::Empty)
    }

    pub fn records(&self) -> &[QueryRecord] {
        match self {
            HistoryWindow::Empty => &[],
            HistoryWindow::Recent(records) => records,
        }
    }
}

impl fmt::Display for HistoryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryWindow::Empty => f.write_str("Query history is empty"),
            HistoryWindow::Recent(records) => {
                let lines: Vec<String> = records
                    .iter()
                    .map(|q| format!("- [{}] ({}): {}", q.timestamp, q.route_label(), q.query_text))
                    .collect();
                f.write_str(&lines.join("\n"))
            }
        }
    }
}

/// Earlier queries a specific agent handled in this session.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentContext {
    pub agent: AgentId,
    pub queries: Vec<QueryRecord>,
}

impl AgentContext {
    pub fn is_first_interaction(&self) -> bool {
        self.queries.is_empty()
    }
}

impl fmt::Display for AgentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.queries.is_empty() {
            return write!(f, "First interaction with agent {}", self.agent);
        }
        write!(f, "Previous queries to {}:", self.agent)?;
        for q in &self.queries {
            write!(f, "\n  - {}", q.query_text)?;
        }
        Ok(())
    }
}

/// Aggregate view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub total_queries: usize,
    pub total_notes: usize,
    /// Query count per handling agent; `unknown` for unattributed queries
    pub queries_by_agent: BTreeMap<String, usize>,
    pub has_user_profile: bool,
}

/// Configuration for the history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Directory holding one `<session_id>.json` document per session
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// How many recent session queries the planner reads
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,

    /// How many of the planner's own earlier queries it reads
    #[serde(default = "default_agent_window")]
    pub agent_window: usize,
}

fn default_directory() -> PathBuf {
    PathBuf::from("./data/sessions")
}

fn default_recent_window() -> usize {
    3
}

fn default_agent_window() -> usize {
    2
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            recent_window: default_recent_window(),
            agent_window: default_agent_window(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_with(records: &[(&str, Option<AgentId>)]) -> SessionHistory {
        let mut history = SessionHistory::new("s1");
        for (text, agent) in records {
            history.queries.push(QueryRecord::new(*text, *agent));
        }
        history
    }

    #[test]
    fn recent_returns_tail_in_order() {
        let history = history_with(&[("q1", None), ("q2", None), ("q3", None)]);
        let window = history.recent(2);
        let texts: Vec<_> = window.records().iter().map(|q| q.query_text.as_str()).collect();
        assert_eq!(texts, vec!["q2", "q3"]);

        assert_eq!(history.recent(10).records().len(), 3);
    }

    #[test]
    fn recent_on_empty_history_is_explicit_empty() {
        let history = SessionHistory::new("s1");
        let window = history.recent(3);
        assert_eq!(window, HistoryWindow::Empty);
        assert_eq!(window.to_string(), "Query history is empty");
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn window_display_lists_route() {
        let history = history_with(&[("plan my week", Some(AgentId::Planner)), ("hi", None)]);
        let text = history.recent(2).to_string();
        assert!(text.contains("(planner): plan my week"));
        assert!(text.contains("(unknown): hi"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn context_filters_by_agent() {
        let history = history_with(&[
            ("p1", Some(AgentId::Planner)),
            ("r1", Some(AgentId::ResearchSpecialist)),
            ("p2", Some(AgentId::Planner)),
            ("p3", Some(AgentId::Planner)),
        ]);
        let ctx = history.context_for_agent(AgentId::Planner, 2);
        let texts: Vec<_> = ctx.queries.iter().map(|q| q.query_text.as_str()).collect();
        assert_eq!(texts, vec!["p2", "p3"]);
        assert_eq!(ctx.to_string(), "Previous queries to planner:\n  - p2\n  - p3");

        let none = history.context_for_agent(AgentId::CodingHelper, 2);
        assert!(none.is_first_interaction());
        assert_eq!(none.to_string(), "First interaction with agent coding_helper");
    }

    #[test]
    fn summary_counts_by_agent() {
        let mut history = history_with(&[
            ("p1", Some(AgentId::Planner)),
            ("p2", Some(AgentId::Planner)),
            ("x", None),
        ]);
        history.notes.push("likes rust".into());

        let summary = history.summary();
        assert_eq!(summary.total_queries, 3);
        assert_eq!(summary.total_notes, 1);
        assert_eq!(summary.queries_by_agent.get("planner"), Some(&2));
        assert_eq!(summary.queries_by_agent.get("unknown"), Some(&1));
        assert!(!summary.has_user_profile);
    }

    #[test]
    fn record_timestamp_is_rfc3339() {
        let record = QueryRecord::new("q", None);
        assert!(chrono::DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }

    #[test]
    fn history_document_roundtrips_through_json() {
        let mut history = history_with(&[("q", Some(AgentId::CodingHelper))]);
        history.user_profile.insert("level".into(), Value::from("expert"));

        let json = serde_json::to_string_pretty(&history).unwrap();
        assert!(json.contains("\"handled_by\": \"coding_helper\""));
        let back: SessionHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
