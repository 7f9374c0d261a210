use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use switchboard_common::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmRequest {
    pub system_prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// A single-turn request: one system prompt, one user message.
    pub fn prompt(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(system_prompt.into()),
            messages: vec![ChatMessage::user(user_prompt)],
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Text of the last user message, if any.
    pub fn user_prompt(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<TokenUsage>,
    pub finish_reason: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse>;
    fn model_name(&self) -> &str;

    /// One system prompt in, generated text out.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let response = self
            .complete(LlmRequest::prompt(system_prompt, user_prompt))
            .await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_builds_single_turn_request() {
        let request = LlmRequest::prompt("You are Router Agent.", "Classify this query: hi")
            .with_temperature(Some(0.3))
            .with_max_tokens(Some(256));

        assert_eq!(request.system_prompt.as_deref(), Some("You are Router Agent."));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.user_prompt(), Some("Classify this query: hi"));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.max_tokens, Some(256));
    }

    #[test]
    fn user_prompt_absent_without_user_messages() {
        assert_eq!(LlmRequest::default().user_prompt(), None);
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[tokio::test]
    async fn generate_returns_response_content() {
        struct EchoClient;

        #[async_trait]
        impl LlmClient for EchoClient {
            async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
                Ok(LlmResponse {
                    content: format!(
                        "{} | {}",
                        request.system_prompt.clone().unwrap_or_default(),
                        request.user_prompt().unwrap_or_default()
                    ),
                    model: "echo".to_string(),
                    usage: None,
                    finish_reason: None,
                })
            }
            fn model_name(&self) -> &str {
                "echo"
            }
        }

        let text = EchoClient.generate("system", "user").await.unwrap();
        assert_eq!(text, "system | user");
    }
}
