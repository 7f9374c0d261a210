//! Specialist nodes of the Switchboard orchestration graph.
//!
//! - **Research specialist**: conceptual questions, grounded in a static knowledge base
//! - **Coding helper**: inspects Python fragments in the query before answering
//! - **Planner**: step-by-step plans, informed by the session's history
//! - **Synthesizer**: merges everyone's output into the final answer
//!
//! ```text
//!  ResearchSpecialist ──▶ KnowledgeBase
//!  CodingHelper ────────▶ inspector (tree-sitter)
//!  Planner ─────────────▶ HistoryStore
//!        │
//!        ▼ contributions
//!  Synthesizer ──▶ final answer
//! ```
//!
//! Each node makes exactly one backend call per run and reports the
//! collaborator calls it made alongside its text.

mod generation;

pub mod coding;
pub mod planning;
pub mod research;
pub mod supervisor;
pub mod tools;

pub use coding::{extract_code_fragments, CodeFragment, CodingHelper, FragmentAnalysis};
pub use planning::Planner;
pub use research::ResearchSpecialist;
pub use supervisor::Synthesizer;
pub use tools::KnowledgeBase;
