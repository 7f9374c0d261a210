//! Common types and traits shared across Switchboard crates.
//!
//! This crate holds the shared state record that is threaded through one
//! orchestration run, the identifiers of the agents that can take part in a
//! run, and the traits the graph uses to invoke its nodes.

pub mod agent;
pub mod error;
pub mod security;
pub mod state;
pub mod traits;

pub use agent::{AgentId, Classification};
pub use error::{Result, SwitchboardError};
pub use security::validate_session_id;
pub use state::{CallRecord, Contributions, QueryOutcome, SharedState};
pub use traits::{AgentCapability, AgentConfig, Contribution, Specialist};
