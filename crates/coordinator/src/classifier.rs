//! Query classification.
//!
//! The classifier asks the backend for a two-field JSON answer and decodes it
//! defensively: malformed output never fails a run, it degrades to
//! `general` handled by the supervisor.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use switchboard_common::{AgentConfig, AgentId, Classification, Result};
use switchboard_llm::{LlmClient, LlmRequest};
use tracing::{debug, info, warn};

/// Characters of the raw backend answer kept in `routing_info`.
pub const RAW_RESPONSE_PREVIEW: usize = 200;

const CLASSIFIER_PROMPT: &str = r#"You are the Router of a multi-agent assistant. Your only job is to classify the user's query and pick the agents that should handle it.

## Categories

1. research - theoretical questions about:
   - multi-agent systems
   - LLMs, machine learning, neural networks
   - system architecture and design
   - programming concepts

2. coding - practical code questions:
   - syntax of Python and other languages
   - debugging and fixing errors
   - code examples and templates
   - code review and improvements

3. planning - planning questions:
   - step-by-step instructions
   - project planning
   - task decomposition
   - roadmaps and strategy

4. general - anything else:
   - general questions
   - unclear queries
   - mixed topics

## Answer format

Answer ONLY with valid JSON and no other text:
{"classification": "category", "agents": ["agent_name"]}

agent_name is one of: research_specialist, coding_helper, planner, supervisor

## Examples

Query: "What are MAS patterns?"
Answer: {"classification": "research", "agents": ["research_specialist"]}

Query: "Write a sorting function"
Answer: {"classification": "coding", "agents": ["coding_helper"]}

Query: "How should I plan API development?"
Answer: {"classification": "planning", "agents": ["planner"]}
"#;

/// The decoded routing decision for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierOutcome {
    pub classification: Classification,

    /// Agents to run, in order. Never empty.
    pub agents: Vec<AgentId>,

    /// Start of the backend's raw answer, for debugging
    pub raw_response: String,

    /// Whether the answer could not be decoded and the default was used
    pub fallback: bool,
}

impl ClassifierOutcome {
    /// The `general` / `[supervisor]` default.
    pub fn fallback(raw: &str) -> Self {
        Self {
            classification: Classification::General,
            agents: vec![AgentId::Supervisor],
            raw_response: preview(raw),
            fallback: true,
        }
    }

    /// The `routing_info` entry recorded in run metadata.
    pub fn routing_info(&self) -> Value {
        json!({
            "classification": self.classification,
            "agents": self.agents,
            "raw_response": self.raw_response,
            "fallback": self.fallback,
        })
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(RAW_RESPONSE_PREVIEW).collect()
}

/// Decode a backend answer into a classification.
///
/// The first balanced `{...}` fragment is decoded if there is one, otherwise
/// the whole text. Undecodable output or a missing field yields the fallback.
/// An unknown category becomes `general`; unknown agent names are dropped and
/// an empty list becomes `[supervisor]`.
pub fn decode_classification(raw: &str) -> ClassifierOutcome {
    let candidate = extract_json_object(raw).unwrap_or(raw);

    let parsed: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Classifier answer is not JSON");
            return ClassifierOutcome::fallback(raw);
        }
    };

    let (Some(classification), Some(agents)) = (
        parsed.get("classification"),
        parsed.get("agents").and_then(Value::as_array),
    ) else {
        debug!("Classifier answer lacks classification or agents");
        return ClassifierOutcome::fallback(raw);
    };

    let classification = classification
        .as_str()
        .and_then(Classification::parse)
        .unwrap_or_default();

    let mut agents: Vec<AgentId> = agents
        .iter()
        .filter_map(Value::as_str)
        .filter_map(AgentId::parse)
        .collect();
    if agents.is_empty() {
        agents.push(AgentId::Supervisor);
    }

    ClassifierOutcome {
        classification,
        agents,
        raw_response: preview(raw),
        fallback: false,
    }
}

/// Extract the first balanced JSON object from text that may contain other text.
///
/// Braces inside JSON string literals do not count towards the balance.
pub fn extract_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decides which category a query falls in and who handles it.
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, input: &str) -> Result<ClassifierOutcome>;
}

/// Backend-driven classifier.
pub struct QueryClassifier {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
}

impl QueryClassifier {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(AgentConfig::named("Router"), llm)
    }
}

#[async_trait]
impl Classify for QueryClassifier {
    async fn classify(&self, input: &str) -> Result<ClassifierOutcome> {
        let request = LlmRequest::prompt(CLASSIFIER_PROMPT, format!("Classify this query: {input}"))
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);

        let response = self.llm.complete(request).await?;
        let outcome = decode_classification(&response.content);

        if outcome.fallback {
            warn!(
                raw_response = %outcome.raw_response,
                "Could not decode classifier answer, routing to supervisor"
            );
        } else {
            info!(
                classification = %outcome.classification,
                agents = ?outcome.agents,
                "Query classified"
            );
        }
        Ok(outcome)
    }
}
