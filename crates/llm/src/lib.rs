//! Text-generation backend for Switchboard.
//!
//! Every node of the orchestration graph talks to the backend through
//! [`LlmClient`]. The only concrete client is [`OpenAiClient`], which speaks
//! the OpenAI chat-completions protocol and therefore also works against
//! LiteLLM, vLLM and Ollama endpoints.

pub mod client;
pub mod config;
pub mod openai;

pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};
pub use config::{build_llm_client, LlmConfig};
pub use openai::OpenAiClient;
