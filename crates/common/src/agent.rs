//! Agent identifiers and query categories.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an agent that can be assigned to a query.
///
/// The set is closed: the classifier drops any identifier the backend
/// produces that is not one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    /// Answers theoretical questions with help from the knowledge base
    ResearchSpecialist,
    /// Answers code questions with help from the code inspector
    CodingHelper,
    /// Builds step-by-step plans with help from the session history
    Planner,
    /// Synthesizes the final answer
    Supervisor,
}

impl AgentId {
    pub const ALL: [AgentId; 4] = [
        AgentId::ResearchSpecialist,
        AgentId::CodingHelper,
        AgentId::Planner,
        AgentId::Supervisor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::ResearchSpecialist => "research_specialist",
            AgentId::CodingHelper => "coding_helper",
            AgentId::Planner => "planner",
            AgentId::Supervisor => "supervisor",
        }
    }

    /// Parse a wire identifier. Returns `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }

    /// Header used when the synthesizer lists this agent's contribution.
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentId::ResearchSpecialist => "Research Specialist",
            AgentId::CodingHelper => "Coding Helper",
            AgentId::Planner => "Planning Agent",
            AgentId::Supervisor => "Supervisor",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category label assigned to a query by the classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Research,
    Coding,
    Planning,
    #[default]
    General,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Research,
        Classification::Coding,
        Classification::Planning,
        Classification::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Research => "research",
            Classification::Coding => "coding",
            Classification::Planning => "planning",
            Classification::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_id_parse_matches_wire_names() {
        for id in AgentId::ALL {
            assert_eq!(AgentId::parse(id.as_str()), Some(id));
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
        assert_eq!(AgentId::parse("writer"), None);
        assert_eq!(AgentId::parse("Planner"), None);
    }

    #[test]
    fn classification_parse_is_closed() {
        assert_eq!(Classification::parse("coding"), Some(Classification::Coding));
        assert_eq!(Classification::parse("poetry"), None);
        assert_eq!(Classification::default(), Classification::General);
    }

    #[test]
    fn display_names() {
        assert_eq!(AgentId::Planner.display_name(), "Planning Agent");
        assert_eq!(AgentId::CodingHelper.to_string(), "coding_helper");
    }
}
