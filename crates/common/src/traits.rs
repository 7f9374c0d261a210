//! Node traits and capabilities.
//!
//! These traits are defined in `switchboard-common` so that both the
//! coordinator and agent crates can reference them without circular
//! dependencies.

use crate::agent::AgentId;
use crate::state::{CallRecord, SharedState};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Capabilities that an agent can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentCapability {
    /// Looks answers up in the static knowledge base
    KnowledgeLookup,
    /// Inspects code fragments for syntax, style and complexity
    CodeAnalysis,
    /// Breaks tasks down into plans
    TaskPlanning,
    /// Reads the session history
    HistoryAccess,
    /// Merges other agents' output into one answer
    Synthesis,
}

/// What a specialist hands back to the graph driver.
#[derive(Debug, Clone, Default)]
pub struct Contribution {
    /// Text stored under the specialist's id in `contributions`
    pub text: String,

    /// Collaborator calls made while producing `text`, in order
    pub calls: Vec<CallRecord>,
}

impl Contribution {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: Vec::new(),
        }
    }

    pub fn with_calls(mut self, calls: Vec<CallRecord>) -> Self {
        self.calls = calls;
        self
    }
}

/// A specialist node of the orchestration graph.
///
/// Specialists read the shared state and return their contribution; they
/// never mutate the state themselves.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// The agent identifier this node answers to.
    fn id(&self) -> AgentId;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// The agent's capabilities.
    fn capabilities(&self) -> &[AgentCapability];

    /// Check if the agent has a specific capability.
    fn has_capability(&self, cap: AgentCapability) -> bool {
        self.capabilities().contains(&cap)
    }

    /// The role prompt, before any collaborator context is filled in.
    fn system_prompt(&self) -> &str;

    /// Produce this agent's contribution for the current run.
    async fn contribute(&self, state: &SharedState) -> Result<Contribution>;
}

/// Generation settings for an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Human-readable name
    pub name: String,

    /// Temperature for LLM responses; the client default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Max tokens for responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl AgentConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}
