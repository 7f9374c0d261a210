//! Shared state threaded through one orchestration run.
//!
//! Nodes never receive `&mut SharedState`. They read the state and return
//! values; the graph driver applies those values through the guarded setters
//! below, each of which refuses a second write.

use crate::agent::{AgentId, Classification};
use crate::error::{Result, SwitchboardError};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One collaborator call made by an agent during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Agent that made the call
    pub agent: AgentId,

    /// Collaborator operation, e.g. `knowledge_base.query`
    pub operation: String,

    /// What was looked up and whether it succeeded
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl CallRecord {
    pub fn new(agent: AgentId, operation: impl Into<String>, metadata: Value) -> Self {
        Self {
            agent,
            operation: operation.into(),
            metadata,
        }
    }
}

/// Agent outputs in the order they were produced.
///
/// Serializes as a JSON object whose keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contributions(Vec<(AgentId, String)>);

impl Contributions {
    pub fn get(&self, agent: AgentId) -> Option<&str> {
        self.0
            .iter()
            .find(|(id, _)| *id == agent)
            .map(|(_, text)| text.as_str())
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.0.iter().any(|(id, _)| *id == agent)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.0.iter().map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &str)> + '_ {
        self.0.iter().map(|(id, text)| (*id, text.as_str()))
    }

    fn insert(&mut self, agent: AgentId, text: String) -> Result<()> {
        if self.contains(agent) {
            return Err(SwitchboardError::State(format!(
                "contribution for {agent} already recorded"
            )));
        }
        self.0.push((agent, text));
        Ok(())
    }
}

impl Serialize for Contributions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (agent, text) in &self.0 {
            map.serialize_entry(agent.as_str(), text)?;
        }
        map.end()
    }
}

/// The single record threaded through every node of one run.
#[derive(Debug, Clone)]
pub struct SharedState {
    input: String,
    session_id: String,
    classification: Option<Classification>,
    assigned_agents: Option<Vec<AgentId>>,
    contributions: Contributions,
    final_answer: Option<String>,
    call_log: Vec<CallRecord>,
    run_metadata: Map<String, Value>,
}

impl SharedState {
    pub fn new(input: impl Into<String>, session_id: impl Into<String>) -> Self {
        let session_id = session_id.into();
        let mut run_metadata = Map::new();
        run_metadata.insert("session_id".into(), Value::String(session_id.clone()));

        Self {
            input: input.into(),
            session_id,
            classification: None,
            assigned_agents: None,
            contributions: Contributions::default(),
            final_answer: None,
            call_log: Vec::new(),
            run_metadata,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn classification(&self) -> Option<Classification> {
        self.classification
    }

    pub fn is_classified(&self) -> bool {
        self.assigned_agents.is_some()
    }

    /// Agents chosen by the classifier; empty before classification.
    pub fn assigned_agents(&self) -> &[AgentId] {
        self.assigned_agents.as_deref().unwrap_or(&[])
    }

    pub fn contributions(&self) -> &Contributions {
        &self.contributions
    }

    /// Final answer; empty until the synthesizer has run.
    pub fn final_answer(&self) -> &str {
        self.final_answer.as_deref().unwrap_or("")
    }

    pub fn has_final_answer(&self) -> bool {
        self.final_answer.is_some()
    }

    pub fn call_log(&self) -> &[CallRecord] {
        &self.call_log
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.run_metadata
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.run_metadata.insert(key.into(), value);
    }

    /// Set the classification and agent assignment. Allowed exactly once.
    pub fn apply_classification(
        &mut self,
        classification: Classification,
        agents: Vec<AgentId>,
    ) -> Result<()> {
        if self.is_classified() {
            return Err(SwitchboardError::State(
                "classification already applied".into(),
            ));
        }
        self.classification = Some(classification);
        self.assigned_agents = Some(agents);
        Ok(())
    }

    /// Record an agent's output. Each agent contributes at most once, and
    /// only assigned agents or the supervisor may contribute.
    pub fn record_contribution(&mut self, agent: AgentId, text: impl Into<String>) -> Result<()> {
        if agent != AgentId::Supervisor && !self.assigned_agents().contains(&agent) {
            return Err(SwitchboardError::State(format!(
                "{agent} is not assigned to this query"
            )));
        }
        self.contributions.insert(agent, text.into())
    }

    pub fn log_calls(&mut self, calls: impl IntoIterator<Item = CallRecord>) {
        self.call_log.extend(calls);
    }

    /// Store the synthesized answer under `supervisor` and as the final answer.
    pub fn set_final_answer(&mut self, answer: impl Into<String>) -> Result<()> {
        if self.final_answer.is_some() {
            return Err(SwitchboardError::State("final answer already set".into()));
        }
        let answer = answer.into();
        self.contributions.insert(AgentId::Supervisor, answer.clone())?;
        self.final_answer = Some(answer);
        Ok(())
    }

    /// Consume the state into the caller-facing result.
    pub fn into_outcome(self) -> QueryOutcome {
        QueryOutcome {
            question: self.input,
            session_id: self.session_id,
            classification: self.classification.unwrap_or_default(),
            assigned_agents: self.assigned_agents.unwrap_or_default(),
            contributions: self.contributions,
            final_answer: self.final_answer.unwrap_or_default(),
            call_log: self.call_log,
            metadata: self.run_metadata,
        }
    }
}

/// What a completed run hands back to its caller.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub question: String,
    pub session_id: String,
    pub classification: Classification,
    pub assigned_agents: Vec<AgentId>,
    pub contributions: Contributions,
    pub final_answer: String,
    pub call_log: Vec<CallRecord>,
    pub metadata: Map<String, Value>,
}
