use std::sync::Arc;

use switchboard_common::{AgentConfig, AgentId, Result};
use switchboard_llm::{LlmClient, LlmRequest};
use tracing::{debug, warn};

/// One backend round-trip with the agent's generation settings applied.
///
/// Backend errors propagate unchanged; an empty answer is logged and returned.
pub(crate) async fn generate(
    llm: &Arc<dyn LlmClient>,
    agent: AgentId,
    config: &AgentConfig,
    system_prompt: String,
    user_prompt: String,
) -> Result<String> {
    let request = LlmRequest::prompt(system_prompt, user_prompt)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);

    let response = llm.complete(request).await?;
    debug!(
        agent = %agent,
        model = %response.model,
        chars = response.content.len(),
        "Backend answered"
    );
    if response.content.trim().is_empty() {
        warn!(agent = %agent, "Backend returned an empty answer");
    }
    Ok(response.content)
}
