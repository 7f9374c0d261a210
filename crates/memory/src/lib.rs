//! Per-session query history for Switchboard.
//!
//! A session is one JSON document holding the queries asked so far, the
//! agent that handled each, free-form notes and a small user profile. The
//! planner reads it; the coordinator appends to it once per run.
//!
//! ```text
//! run_query ──append──▶ HistoryStore ──load/save──▶ <dir>/<session_id>.json
//!                           ▲
//! planner ──recent/context──┘
//! ```

pub mod store;
pub mod types;

pub use store::{HistoryStore, InMemoryHistoryStore, JsonFileHistoryStore};
pub use types::{
    AgentContext, HistoryConfig, HistoryWindow, QueryRecord, SessionHistory, SessionSummary,
};
