//! Collaborators the specialists call while building their prompts.
//!
//! Both are pure and total: they never fail and never touch the network.

pub mod inspector;
pub mod knowledge;

pub use inspector::{ClassInfo, Complexity, ComplexityMetrics, Suggestion, SyntaxCheck};
pub use knowledge::{KnowledgeBase, KnowledgeHit, KnowledgeResult, NOT_FOUND};
