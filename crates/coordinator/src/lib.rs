//! Query classification and orchestration for Switchboard.
//!
//! The coordinator runs one query at a time through a fixed graph:
//! 1. The classifier picks a category and the agents to involve
//! 2. Each assigned specialist contributes once, in order
//! 3. The synthesizer merges the contributions into the final answer
//! 4. The query is appended to the session's history
//!
//! # Architecture
//!
//! ```text
//! run_query(text, session_id)
//!      │
//!      ▼
//! ┌─────────────────┐
//! │   Classifier    │  ◄── backend, JSON answer
//! └────────┬────────┘
//!          │ assigned agents
//!    ┌─────┴─────┬──────────┐
//!    ▼           ▼          ▼
//! [Research]  [Coding]  [Planner] ──▶ HistoryStore
//!    └─────┬─────┴──────────┘
//!          ▼
//! ┌─────────────────┐
//! │   Synthesizer   │ ──▶ final answer
//! └─────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod graph;
pub mod routing;

pub use classifier::{decode_classification, ClassifierOutcome, Classify, QueryClassifier};
pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use graph::{OrchestrationGraph, OrchestrationGraphBuilder};
pub use routing::{node_for, route, NodeId};
