//! Static knowledge base for the research specialist.

use std::fmt;

/// Text returned when a lookup has no hits.
pub const NOT_FOUND: &str = "Information not found in KB";

/// Text returned by [`KnowledgeBase::code_example`] for unknown topics.
pub const EXAMPLE_NOT_FOUND: &str = "Example not found";

const SNIPPETS_CATEGORY: &str = "python_snippets";

type Category = (&'static str, &'static [(&'static str, &'static str)]);

const ENTRIES: &[Category] = &[
    (
        "MAS_patterns",
        &[
            ("router", "A router agent classifies each incoming query and hands it to the matching specialists. It decides whether the query is research, coding or planning and picks who handles it."),
            ("supervisor", "A supervisor coordinates the other agents, merges their answers and is responsible for the quality of the final result. It may reassign work when needed."),
            ("sequential", "Sequential workflow: agents run one after another, each adding to the shared result, so the answer improves step by step."),
            ("hierarchical", "Hierarchical pattern: agents are arranged in levels, each level owning a clear slice of responsibility and control."),
            ("parallel", "Parallel execution: several agents work on different aspects of a task at the same time and their results are combined."),
        ],
    ),
    (
        "langgraph_tips",
        &[
            ("StateDict", "Graph state is declared as a typed dictionary. Every node works against the same shared state, which keeps the data consistent."),
            ("nodes", "Nodes are functions that update the state. Each node receives the current state and returns the updated state or a partial update."),
            ("edges", "Edges connect nodes. Plain edges always fire; conditional edges pick the next node from the current state."),
            ("entry_point", "The entry point is the first node of the graph, set with workflow.set_entry_point()."),
            ("END", "END is the special constant marking the end of graph execution."),
        ],
    ),
    (
        SNIPPETS_CATEGORY,
        &[
            ("async_function", "async def my_func():\n    result = await some_async_operation()\n    return result"),
            ("type_hints", "from typing import TypedDict, List, Optional\n\nclass MyState(TypedDict):\n    data: List[str]\n    count: Optional[int]"),
            ("pydantic_model", "from pydantic import BaseModel\n\nclass User(BaseModel):\n    name: str\n    age: int = 0"),
            ("context_manager", "from contextlib import contextmanager\n\n@contextmanager\ndef managed_resource():\n    resource = acquire()\n    try:\n        yield resource\n    finally:\n        release(resource)"),
        ],
    ),
    (
        "llm_concepts",
        &[
            ("prompt_engineering", "Prompt engineering is the craft of writing effective LLM prompts: system instructions, few-shot examples and structured output."),
            ("tool_calling", "Tool calling lets an LLM invoke external functions such as search, calculations or API calls."),
            ("chain_of_thought", "Chain of Thought (CoT) asks the LLM to reason step by step, which improves answers to complex questions."),
            ("rag", "RAG (Retrieval Augmented Generation) supplements an LLM with an external knowledge base through retrieval."),
        ],
    ),
    (
        "architecture_patterns",
        &[
            ("microservices", "Microservices split a system into independent services, each owning one responsibility."),
            ("event_driven", "Event-driven architecture uses events to communicate between system components."),
            ("layered", "Layered architecture organizes code into layers (presentation, business logic, data access) with clear boundaries."),
        ],
    ),
];

/// One matching knowledge-base entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeHit {
    pub category: &'static str,
    pub key: &'static str,
    pub value: &'static str,
}

impl fmt::Display for KnowledgeHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}]: {}", self.category, self.key, self.value)
    }
}

/// Outcome of a lookup. Not finding anything is a normal answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeResult {
    Found(Vec<KnowledgeHit>),
    NotFound,
}

impl KnowledgeResult {
    pub fn is_found(&self) -> bool {
        matches!(self, KnowledgeResult::Found(_))
    }

    pub fn hits(&self) -> &[KnowledgeHit] {
        match self {
            KnowledgeResult::Found(hits) => hits,
            KnowledgeResult::NotFound => &[],
        }
    }
}

impl fmt::Display for KnowledgeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnowledgeResult::NotFound => f.write_str(NOT_FOUND),
            KnowledgeResult::Found(hits) => {
                for (i, hit) in hits.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n\n")?;
                    }
                    write!(f, "{hit}")?;
                }
                Ok(())
            }
        }
    }
}

/// Read-only table of short articles, grouped by category.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeBase {
    entries: &'static [Category],
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self { entries: ENTRIES }
    }
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-insensitive substring match of the whole query against every key
    /// and value. Hits come back in table order.
    pub fn lookup(&self, query: &str) -> KnowledgeResult {
        let needle = query.to_lowercase();
        let hits: Vec<KnowledgeHit> = self
            .iter()
            .filter(|hit| {
                hit.key.to_lowercase().contains(&needle)
                    || hit.value.to_lowercase().contains(&needle)
            })
            .collect();

        if hits.is_empty() {
            KnowledgeResult::NotFound
        } else {
            KnowledgeResult::Found(hits)
        }
    }

    /// The Python snippet stored under `topic`, or [`EXAMPLE_NOT_FOUND`].
    pub fn code_example(&self, topic: &str) -> &'static str {
        self.entries
            .iter()
            .find(|(category, _)| *category == SNIPPETS_CATEGORY)
            .and_then(|(_, items)| items.iter().find(|(key, _)| *key == topic))
            .map(|(_, value)| *value)
            .unwrap_or(EXAMPLE_NOT_FOUND)
    }

    /// Every entry as `category/key`.
    pub fn topics(&self) -> Vec<String> {
        self.iter()
            .map(|hit| format!("{}/{}", hit.category, hit.key))
            .collect()
    }

    fn iter(&self) -> impl Iterator<Item = KnowledgeHit> + '_ {
        self.entries.iter().flat_map(|&(category, items)| {
            items.iter().map(move |&(key, value)| KnowledgeHit {
                category,
                key,
                value,
            })
        })
    }
}
