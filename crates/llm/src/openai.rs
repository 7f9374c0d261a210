//! Chat-completions client for OpenAI-compatible servers (LiteLLM, vLLM,
//! Ollama's `/v1` surface).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_common::{Result, SwitchboardError};
use tracing::debug;

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

/// LiteLLM proxy default; the base already carries the `/v1` prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/v1";

/// Characters of an error body kept in the returned error.
const ERROR_BODY_PREVIEW: usize = 500;

/// Wire body. Borrows from the caller's request instead of cloning prompts.
#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionReply {
    #[serde(default)]
    choices: Vec<ReplyChoice>,
    #[serde(default)]
    model: Option<String>,
    usage: Option<ReplyUsage>,
}

#[derive(Deserialize)]
struct ReplyChoice {
    message: ReplyMessage,
    finish_reason: Option<String>,
}

/// Servers send `"content": null` for tool-only or filtered answers.
#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ReplyUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    default_temperature: Option<f32>,
    default_max_tokens: Option<u32>,
    http_client: reqwest::Client,
}

impl OpenAiClient {
    /// `base_url` is the API root including its version prefix, e.g.
    /// `http://localhost:4000/v1`. A trailing slash is ignored.
    pub fn new(base_url: Option<String>, model: String, api_key: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
            default_temperature: None,
            default_max_tokens: None,
            http_client: reqwest::Client::new(),
        }
    }

    /// Temperature used when a request does not set one.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.default_temperature = temperature;
        self
    }

    /// Token limit used when a request does not set one.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    fn body<'a>(&'a self, request: &'a LlmRequest) -> CompletionBody<'a> {
        let system = request.system_prompt.as_deref().map(|content| WireMessage {
            role: "system",
            content,
        });
        let turns = request.messages.iter().map(|m| WireMessage {
            role: wire_role(m.role),
            content: &m.content,
        });

        CompletionBody {
            model: &self.model,
            messages: system.into_iter().chain(turns).collect(),
            temperature: request.temperature.or(self.default_temperature),
            max_tokens: request.max_tokens.or(self.default_max_tokens),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// First choice of a reply; a missing model name falls back to ours.
    fn decode(&self, reply: CompletionReply) -> Result<LlmResponse> {
        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SwitchboardError::Llm("Completion reply has no choices".into()))?;

        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            model: reply.model.unwrap_or_else(|| self.model.clone()),
            usage: reply.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let url = self.endpoint();
        let body = self.body(&request);
        debug!(
            url = %url,
            model = %self.model,
            messages = body.messages.len(),
            "Sending completion request"
        );

        let mut http_req = self.http_client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            http_req = http_req.bearer_auth(key);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| SwitchboardError::Llm(format!("Backend unreachable at {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let preview: String = text.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(SwitchboardError::Llm(format!(
                "Backend returned {status}: {preview}"
            )));
        }

        let reply: CompletionReply = response
            .json()
            .await
            .map_err(|e| SwitchboardError::Llm(format!("Unreadable completion reply: {e}")))?;

        let decoded = self.decode(reply)?;
        if let Some(usage) = &decoded.usage {
            debug!(
                model = %decoded.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion received"
            );
        }
        Ok(decoded)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
