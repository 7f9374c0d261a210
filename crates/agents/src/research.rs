//! Research specialist - theoretical questions, backed by the knowledge base.

use crate::generation::generate;
use crate::tools::KnowledgeBase;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use switchboard_common::{
    AgentCapability, AgentConfig, AgentId, CallRecord, Contribution, Result, SharedState,
    Specialist,
};
use switchboard_llm::LlmClient;
use tracing::info;

/// Characters of a knowledge-base hit kept in the call log.
const PREVIEW_CHARS: usize = 100;

const RESEARCH_SYSTEM_PROMPT: &str = r#"You are the Research Specialist of a multi-agent assistant. You answer theoretical questions.

Your areas:

1. Machine learning and AI: neural network architectures, training and optimization, LLMs and their applications
2. Multi-agent systems: design patterns, coordination and communication between agents, orchestration frameworks
3. Software architecture: design patterns, microservices and distributed systems, good practice and anti-patterns

How to answer:

- Structure the answer with headers
- Illustrate concepts with examples
- Mention sources when they matter
- Be precise but easy to follow
"#;

/// Answers conceptual questions, grounding itself in the knowledge base first.
pub struct ResearchSpecialist {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
    knowledge: KnowledgeBase,
}

impl ResearchSpecialist {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self {
            config,
            llm,
            knowledge: KnowledgeBase::new(),
        }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(AgentConfig::named(AgentId::ResearchSpecialist.display_name()), llm)
    }
}

#[async_trait]
impl Specialist for ResearchSpecialist {
    fn id(&self) -> AgentId {
        AgentId::ResearchSpecialist
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &[AgentCapability] {
        &[AgentCapability::KnowledgeLookup]
    }

    fn system_prompt(&self) -> &str {
        RESEARCH_SYSTEM_PROMPT
    }

    async fn contribute(&self, state: &SharedState) -> Result<Contribution> {
        let input = state.input();
        let result = self.knowledge.lookup(input);

        info!(
            agent = %self.id(),
            hits = result.hits().len(),
            "Queried knowledge base"
        );

        let rendered = result.to_string();
        let mut metadata = json!({
            "input": input,
            "result_found": result.is_found(),
        });
        let kb_context = if result.is_found() {
            metadata["preview"] = json!(rendered.chars().take(PREVIEW_CHARS).collect::<String>());
            format!("Found in knowledge base:\n{rendered}")
        } else {
            "No direct matches in the knowledge base. Use your own knowledge.".to_string()
        };
        let call = CallRecord::new(self.id(), "knowledge_base.query", metadata);

        let system =
            format!("{RESEARCH_SYSTEM_PROMPT}\n## Knowledge base context\n\n{kb_context}\n");
        let text = generate(
            &self.llm,
            self.id(),
            &self.config,
            system,
            format!("Answer the question: {input}"),
        )
        .await?;

        Ok(Contribution::new(text).with_calls(vec![call]))
    }
}
