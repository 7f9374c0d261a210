//! The orchestration graph and its driver.
//!
//! ```text
//! classifier ──▶ research ─┐
//!      │    ──▶ coding ────┼──▶ (next unassigned specialist) ... ──▶ synthesizer ──▶ terminal
//!      │    ──▶ planner ───┘
//!      └───────────────────────────────────────────────────────────▶ synthesizer
//! ```
//!
//! Nodes only read the state. The driver applies what they return, asks
//! [`route`] for the next node and refuses to revisit a node.

use crate::classifier::{Classify, QueryClassifier};
use crate::routing::{route, NodeId};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_agents::{CodingHelper, Planner, ResearchSpecialist, Synthesizer};
use switchboard_common::{AgentConfig, AgentId, Result, SharedState, Specialist, SwitchboardError};
use switchboard_llm::LlmClient;
use switchboard_memory::{HistoryConfig, HistoryStore};
use tracing::{debug, info, warn};

/// Upper bound on node executions in one run.
const MAX_STEPS: usize = NodeId::ALL.len();

/// An immutable graph definition. Cheap to share behind an `Arc`; every run
/// works on its own [`SharedState`].
pub struct OrchestrationGraph {
    classifier: Arc<dyn Classify>,
    specialists: HashMap<AgentId, Arc<dyn Specialist>>,
    synthesizer: Arc<dyn Specialist>,
}

impl std::fmt::Debug for OrchestrationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut specialists: Vec<_> = self.specialists.keys().map(AgentId::as_str).collect();
        specialists.sort_unstable();
        f.debug_struct("OrchestrationGraph")
            .field("specialists", &specialists)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct OrchestrationGraphBuilder {
    classifier: Option<Arc<dyn Classify>>,
    specialists: HashMap<AgentId, Arc<dyn Specialist>>,
    synthesizer: Option<Arc<dyn Specialist>>,
}

impl OrchestrationGraphBuilder {
    pub fn classifier(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Register a specialist under its own id. A later registration for the
    /// same id replaces the earlier one.
    pub fn specialist(mut self, specialist: Arc<dyn Specialist>) -> Self {
        self.specialists.insert(specialist.id(), specialist);
        self
    }

    pub fn synthesizer(mut self, synthesizer: Arc<dyn Specialist>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Every specialist agent must be present, and the synthesizer must
    /// answer to `supervisor`.
    pub fn build(self) -> Result<OrchestrationGraph> {
        let classifier = self
            .classifier
            .ok_or_else(|| SwitchboardError::Config("graph has no classifier".into()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| SwitchboardError::Config("graph has no synthesizer".into()))?;

        if synthesizer.id() != AgentId::Supervisor {
            return Err(SwitchboardError::Config(format!(
                "synthesizer must answer to supervisor, not {}",
                synthesizer.id()
            )));
        }
        if self.specialists.contains_key(&AgentId::Supervisor) {
            return Err(SwitchboardError::Config(
                "supervisor is the synthesizer, not a specialist".into(),
            ));
        }
        for agent in AgentId::ALL {
            if agent != AgentId::Supervisor && !self.specialists.contains_key(&agent) {
                return Err(SwitchboardError::Config(format!(
                    "graph has no node for {agent}"
                )));
            }
        }

        Ok(OrchestrationGraph {
            classifier,
            specialists: self.specialists,
            synthesizer,
        })
    }
}

impl OrchestrationGraph {
    pub fn builder() -> OrchestrationGraphBuilder {
        OrchestrationGraphBuilder::default()
    }

    /// The standard graph: backend classifier, the three specialists and the
    /// synthesizer, all sharing one backend.
    pub fn standard(
        llm: Arc<dyn LlmClient>,
        history: Arc<dyn HistoryStore>,
        history_config: &HistoryConfig,
    ) -> Result<Self> {
        Self::builder()
            .classifier(Arc::new(QueryClassifier::with_default_config(llm.clone())))
            .specialist(Arc::new(ResearchSpecialist::with_default_config(llm.clone())))
            .specialist(Arc::new(CodingHelper::with_default_config(llm.clone())))
            .specialist(Arc::new(Planner::new(
                AgentConfig::named(AgentId::Planner.display_name()),
                llm.clone(),
                history,
                history_config,
            )))
            .synthesizer(Arc::new(Synthesizer::with_default_config(llm)))
            .build()
    }

    /// Drive one run from the classifier to the terminal node.
    ///
    /// Any node error aborts the run and is returned as is; there is no
    /// retry and no partial result.
    pub async fn run(&self, mut state: SharedState) -> Result<SharedState> {
        let mut current = NodeId::Classifier;
        let mut path: Vec<NodeId> = Vec::with_capacity(MAX_STEPS);

        while current != NodeId::Terminal {
            if path.len() >= MAX_STEPS {
                return Err(SwitchboardError::Routing(format!(
                    "run exceeded {MAX_STEPS} steps"
                )));
            }
            path.push(current);

            self.execute(current, &mut state).await?;

            let next = route(current, &state);
            if next == current || path.contains(&next) {
                return Err(SwitchboardError::Routing(format!(
                    "{current} routed back to already executed node {next}"
                )));
            }
            debug!(
                session_id = %state.session_id(),
                from = %current,
                to = %next,
                "Node transition"
            );
            current = next;
        }

        let path: Vec<Value> = path.iter().map(|n| json!(n.as_str())).collect();
        state.insert_metadata("node_path", Value::Array(path));
        Ok(state)
    }

    async fn execute(&self, node: NodeId, state: &mut SharedState) -> Result<()> {
        match node {
            NodeId::Classifier => {
                let outcome = self.classifier.classify(state.input()).await?;
                state.insert_metadata("routing_info", outcome.routing_info());
                state.apply_classification(outcome.classification, outcome.agents)
            }
            NodeId::Research | NodeId::Coding | NodeId::Planner => {
                let agent = node.specialist().ok_or_else(|| {
                    SwitchboardError::Routing(format!("{node} has no specialist"))
                })?;
                let specialist = self.specialists.get(&agent).ok_or_else(|| {
                    SwitchboardError::Routing(format!("no specialist registered for {agent}"))
                })?;

                let contribution = specialist.contribute(state).await?;
                info!(
                    agent = %agent,
                    calls = contribution.calls.len(),
                    chars = contribution.text.len(),
                    "Specialist contributed"
                );
                state.record_contribution(agent, contribution.text)?;
                state.log_calls(contribution.calls);
                Ok(())
            }
            NodeId::Synthesizer => {
                let contribution = self.synthesizer.contribute(state).await?;
                if contribution.text.trim().is_empty() {
                    warn!(
                        session_id = %state.session_id(),
                        "Synthesizer produced an empty final answer"
                    );
                    state.insert_metadata("empty_final_answer", Value::Bool(true));
                }
                state.log_calls(contribution.calls);
                state.set_final_answer(contribution.text)
            }
            NodeId::Terminal => Ok(()),
        }
    }
}
