//! Synthesizer - turns the specialists' contributions into the final answer.

use crate::generation::generate;
use async_trait::async_trait;
use std::sync::Arc;
use switchboard_common::{
    AgentCapability, AgentConfig, AgentId, Contribution, Contributions, Result, SharedState,
    Specialist,
};
use switchboard_llm::LlmClient;
use tracing::info;

const SYNTHESIS_PROMPT: &str = r#"You are the Supervisor of a multi-agent assistant. You write the final answer.

Your job:

1. Synthesis: combine the specialists' contributions into one coherent answer, without repetition
2. Quality: check the answer is complete and relevant, fill in missing details
3. Presentation: structure the answer and highlight the key points

Rules:

- With a single contribution, improve its structure and completeness
- With several contributions, merge them and remove overlap
- When contributions contradict each other, prefer the more specialized agent
- End long answers with a brief summary
"#;

const DIRECT_PROMPT: &str = r#"You are the Supervisor of a multi-agent assistant.

You were asked a general question directly. Answer it briefly and to the point.

If the question needs specialist knowledge (research, coding, planning), say which specialist it should go to.
"#;

const FINAL_ANSWER_REQUEST: &str = "Write the final answer for the user.";

/// Everyone's contributions, each under its agent's display name.
pub fn render_contributions(contributions: &Contributions) -> String {
    contributions
        .iter()
        .filter(|(agent, _)| *agent != AgentId::Supervisor)
        .map(|(agent, text)| format!("### {}:\n{text}", agent.display_name()))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Always the last node of a run.
pub struct Synthesizer {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
}

impl Synthesizer {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(AgentConfig::named(AgentId::Supervisor.display_name()), llm)
    }

    fn build_prompt(state: &SharedState) -> String {
        let contributions = state.contributions();
        if contributions.is_empty() {
            format!("{DIRECT_PROMPT}\nQuery: {}\n", state.input())
        } else {
            format!(
                "{SYNTHESIS_PROMPT}\n## Original query\n\n{}\n\n## Agent contributions\n\n{}\n",
                state.input(),
                render_contributions(contributions)
            )
        }
    }
}

#[async_trait]
impl Specialist for Synthesizer {
    fn id(&self) -> AgentId {
        AgentId::Supervisor
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &[AgentCapability] {
        &[AgentCapability::Synthesis]
    }

    fn system_prompt(&self) -> &str {
        SYNTHESIS_PROMPT
    }

    async fn contribute(&self, state: &SharedState) -> Result<Contribution> {
        info!(
            agent = %self.id(),
            contributions = state.contributions().len(),
            direct = state.contributions().is_empty(),
            "Synthesizing final answer"
        );

        let text = generate(
            &self.llm,
            self.id(),
            &self.config,
            Self::build_prompt(state),
            FINAL_ANSWER_REQUEST.to_string(),
        )
        .await?;

        Ok(Contribution::new(text))
    }
}
