//! Graph nodes and the routing function between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use switchboard_common::{AgentId, SharedState};

/// A node of the orchestration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Classifier,
    Research,
    Coding,
    Planner,
    Synthesizer,
    Terminal,
}

impl NodeId {
    pub const ALL: [NodeId; 6] = [
        NodeId::Classifier,
        NodeId::Research,
        NodeId::Coding,
        NodeId::Planner,
        NodeId::Synthesizer,
        NodeId::Terminal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeId::Classifier => "classifier",
            NodeId::Research => "research",
            NodeId::Coding => "coding",
            NodeId::Planner => "planner",
            NodeId::Synthesizer => "synthesizer",
            NodeId::Terminal => "terminal",
        }
    }

    /// The specialist agent behind this node, if it is a specialist node.
    pub fn specialist(&self) -> Option<AgentId> {
        match self {
            NodeId::Research => Some(AgentId::ResearchSpecialist),
            NodeId::Coding => Some(AgentId::CodingHelper),
            NodeId::Planner => Some(AgentId::Planner),
            _ => None,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The node that runs an agent. The supervisor is the synthesizer.
pub fn node_for(agent: AgentId) -> NodeId {
    match agent {
        AgentId::ResearchSpecialist => NodeId::Research,
        AgentId::CodingHelper => NodeId::Coding,
        AgentId::Planner => NodeId::Planner,
        AgentId::Supervisor => NodeId::Synthesizer,
    }
}

/// Where to go after `current` has run.
///
/// Specialists run in assignment order; an agent that already contributed is
/// skipped, so duplicate assignments are harmless. A `supervisor` entry maps
/// to the synthesizer, which ends the specialist phase.
pub fn route(current: NodeId, state: &SharedState) -> NodeId {
    match current {
        NodeId::Classifier => state
            .assigned_agents()
            .first()
            .map(|agent| node_for(*agent))
            .unwrap_or(NodeId::Synthesizer),
        NodeId::Research | NodeId::Coding | NodeId::Planner => state
            .assigned_agents()
            .iter()
            .find(|agent| !state.contributions().contains(**agent))
            .map(|agent| node_for(*agent))
            .unwrap_or(NodeId::Synthesizer),
        NodeId::Synthesizer | NodeId::Terminal => NodeId::Terminal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_common::Classification;

    fn classified(agents: Vec<AgentId>) -> SharedState {
        let mut state = SharedState::new("q", "s");
        state
            .apply_classification(Classification::General, agents)
            .unwrap();
        state
    }

    #[test]
    fn classifier_goes_to_first_assigned() {
        let state = classified(vec![AgentId::Planner, AgentId::ResearchSpecialist]);
        assert_eq!(route(NodeId::Classifier, &state), NodeId::Planner);
    }

    #[test]
    fn empty_assignment_goes_to_synthesizer() {
        let state = classified(vec![]);
        assert_eq!(route(NodeId::Classifier, &state), NodeId::Synthesizer);
    }

    #[test]
    fn specialists_run_in_order_then_synthesizer() {
        let mut state = classified(vec![AgentId::ResearchSpecialist, AgentId::Planner]);
        state
            .record_contribution(AgentId::ResearchSpecialist, "r")
            .unwrap();
        assert_eq!(route(NodeId::Research, &state), NodeId::Planner);

        state.record_contribution(AgentId::Planner, "p").unwrap();
        assert_eq!(route(NodeId::Planner, &state), NodeId::Synthesizer);
    }

    #[test]
    fn duplicates_do_not_reenter() {
        let mut state = classified(vec![
            AgentId::CodingHelper,
            AgentId::CodingHelper,
            AgentId::Planner,
        ]);
        assert_eq!(route(NodeId::Classifier, &state), NodeId::Coding);
        state.record_contribution(AgentId::CodingHelper, "c").unwrap();
        assert_eq!(route(NodeId::Coding, &state), NodeId::Planner);
    }

    #[test]
    fn supervisor_entry_leads_to_synthesizer() {
        let mut state = classified(vec![
            AgentId::ResearchSpecialist,
            AgentId::Supervisor,
            AgentId::Planner,
        ]);
        state
            .record_contribution(AgentId::ResearchSpecialist, "r")
            .unwrap();
        assert_eq!(route(NodeId::Research, &state), NodeId::Synthesizer);
    }

    #[test]
    fn synthesizer_and_terminal_end() {
        let state = classified(vec![AgentId::Supervisor]);
        assert_eq!(route(NodeId::Classifier, &state), NodeId::Synthesizer);
        assert_eq!(route(NodeId::Synthesizer, &state), NodeId::Terminal);
        assert_eq!(route(NodeId::Terminal, &state), NodeId::Terminal);
    }

    #[test]
    fn every_agent_has_a_node() {
        for agent in AgentId::ALL {
            let node = node_for(agent);
            if agent == AgentId::Supervisor {
                assert_eq!(node, NodeId::Synthesizer);
            } else {
                assert_eq!(node.specialist(), Some(agent));
            }
        }
    }
}
