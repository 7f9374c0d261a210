//! Planning agent - task breakdown informed by the session's history.

use crate::generation::generate;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use switchboard_common::{
    AgentCapability, AgentConfig, AgentId, CallRecord, Contribution, Result, SharedState,
    Specialist,
};
use switchboard_llm::LlmClient;
use switchboard_memory::{HistoryConfig, HistoryStore};
use tracing::info;

const PLANNING_SYSTEM_PROMPT: &str = r#"You are the Planning Agent of a multi-agent assistant. You plan work and break tasks down.

Your areas:

1. Task decomposition: splitting complex work into simple steps, finding dependencies, estimating effort
2. Project planning: roadmaps, milestones, prioritization
3. Strategy: risks, alternative approaches, success criteria

Structure every plan like this:

### Goal
[What needs to be achieved, briefly]

### Steps
1. **Step 1**: [Description]
   - Done when: [How to tell the step is complete]
   - Estimate: [Rough time]
2. **Step 2**: ...

### Risks and recommendations
[What could go wrong and how to avoid it]

### Completion criteria
[How to tell the whole task is done]
"#;

const FIRST_QUERY_CONTEXT: &str = "This is the first query in the session. No history.";

/// Builds step-by-step plans; reads recent session history for continuity.
pub struct Planner {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    history: Arc<dyn HistoryStore>,
    recent_window: usize,
    agent_window: usize,
}

impl Planner {
    pub fn new(
        config: AgentConfig,
        llm: Arc<dyn LlmClient>,
        history: Arc<dyn HistoryStore>,
        history_config: &HistoryConfig,
    ) -> Self {
        Self {
            config,
            llm,
            history,
            recent_window: history_config.recent_window,
            agent_window: history_config.agent_window,
        }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>, history: Arc<dyn HistoryStore>) -> Self {
        Self::new(
            AgentConfig::named(AgentId::Planner.display_name()),
            llm,
            history,
            &HistoryConfig::default(),
        )
    }
}

#[async_trait]
impl Specialist for Planner {
    fn id(&self) -> AgentId {
        AgentId::Planner
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &[AgentCapability] {
        &[AgentCapability::TaskPlanning, AgentCapability::HistoryAccess]
    }

    fn system_prompt(&self) -> &str {
        PLANNING_SYSTEM_PROMPT
    }

    async fn contribute(&self, state: &SharedState) -> Result<Contribution> {
        let session_id = state.session_id();
        let recent = self.history.recent(session_id, self.recent_window).await?;
        let own = self
            .history
            .context_for_agent(session_id, self.id(), self.agent_window)
            .await?;

        info!(
            agent = %self.id(),
            session_id = %session_id,
            recent = recent.records().len(),
            prior_invocations = own.queries.len(),
            "Read session history"
        );

        let calls = vec![
            CallRecord::new(
                self.id(),
                "history.recent",
                json!({
                    "requested": self.recent_window,
                    "history_available": !recent.is_empty(),
                }),
            ),
            CallRecord::new(
                self.id(),
                "history.context_for_agent",
                json!({
                    "agent_name": self.id(),
                    "prior_invocations": own.queries.len(),
                }),
            ),
        ];

        let history_context = if recent.is_empty() {
            FIRST_QUERY_CONTEXT.to_string()
        } else {
            format!("Recent queries:\n{recent}\n\nPlanning context:\n{own}")
        };

        let system = format!(
            "{PLANNING_SYSTEM_PROMPT}\n## Previous queries\n\n{history_context}\n"
        );
        let text = generate(
            &self.llm,
            self.id(),
            &self.config,
            system,
            format!("Create a plan for: {}", state.input()),
        )
        .await?;

        Ok(Contribution::new(text).with_calls(calls))
    }
}
