//! Error types for Switchboard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SwitchboardError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("History error: {0}")]
    History(String),

    #[error("Routing error: {0}")]
    Routing(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SwitchboardError>;
