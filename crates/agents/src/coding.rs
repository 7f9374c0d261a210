//! Coding helper - inspects Python fragments found in the query before
//! asking the backend for an answer.

use crate::generation::generate;
use crate::tools::inspector::{self, ClassInfo, Complexity, Suggestion, SyntaxCheck};
use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use std::sync::{Arc, LazyLock};
use switchboard_common::{
    AgentCapability, AgentConfig, AgentId, CallRecord, Contribution, Result, SharedState,
    Specialist,
};
use switchboard_llm::LlmClient;
use tracing::{debug, info};

static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:python)?\s*(.*?)```").unwrap());

static CODE_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"def\s+\w+.*?:|class\s+\w+.*?:|import\s+\w+|from\s+\w+\s+import").unwrap()
});

const CODING_SYSTEM_PROMPT: &str = r#"You are the Coding Helper of a multi-agent assistant, an expert programmer.

Your areas:

1. Python development: syntax and idioms, the standard library, common web frameworks
2. Code analysis: review, finding and fixing bugs, optimization and refactoring
3. Examples and templates: design patterns, ready-made solutions with explanations

How to answer:

- Always put code in ```python blocks
- Explain the logic behind the solution
- Point out potential problems
- Suggest improvements where they help
"#;

/// A piece of code pulled out of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFragment {
    /// 1-based position among all extracted blocks, blank ones included
    pub block: usize,
    pub code: String,
}

/// Fenced blocks first; failing that, the whole query if anything in it
/// looks like Python. Blank blocks are dropped but still use up a number.
pub fn extract_code_fragments(input: &str) -> Vec<CodeFragment> {
    let mut blocks: Vec<&str> = FENCED_BLOCK
        .captures_iter(input)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if blocks.is_empty() && CODE_LIKE.is_match(input) {
        blocks.push(input);
    }

    blocks
        .into_iter()
        .enumerate()
        .filter_map(|(i, code)| {
            let code = code.trim();
            (!code.is_empty()).then(|| CodeFragment {
                block: i + 1,
                code: code.to_string(),
            })
        })
        .collect()
}

/// Everything the inspector reports about one fragment.
#[derive(Debug, Clone)]
pub struct FragmentAnalysis {
    pub block: usize,
    pub syntax: SyntaxCheck,
    pub suggestions: Vec<Suggestion>,
    pub complexity: Complexity,
    pub signature: Option<String>,
    pub class_info: Option<ClassInfo>,
}

impl FragmentAnalysis {
    /// Runs every analysis, whether or not the fragment parses.
    pub fn run(fragment: &CodeFragment) -> Self {
        let code = fragment.code.as_str();
        Self {
            block: fragment.block,
            syntax: inspector::check_syntax(code),
            suggestions: inspector::suggest(code),
            complexity: inspector::complexity(code),
            signature: inspector::function_signature(code),
            class_info: inspector::class_info(code),
        }
    }

    fn calls(&self, agent: AgentId) -> Vec<CallRecord> {
        let complexity = match self.complexity.score() {
            Some(score) => json!({ "code_block": self.block, "score": score }),
            None => json!({ "code_block": self.block, "error": "cannot parse code" }),
        };
        vec![
            CallRecord::new(
                agent,
                "inspector.check_syntax",
                json!({
                    "code_block": self.block,
                    "valid": self.syntax.is_valid(),
                    "line": self.syntax.line(),
                }),
            ),
            CallRecord::new(
                agent,
                "inspector.suggest",
                json!({
                    "code_block": self.block,
                    "suggestions_count": self.suggestions.len(),
                }),
            ),
            CallRecord::new(agent, "inspector.complexity", complexity),
        ]
    }

    fn render(&self, out: &mut Vec<String>) {
        out.push(format!("\nCode block #{}:", self.block));
        match &self.syntax {
            SyntaxCheck::Valid => out.push("  Syntax is correct".to_string()),
            SyntaxCheck::Invalid { message, line } => {
                out.push(format!("  Syntax error: {message}"));
                if let Some(line) = line {
                    out.push(format!("     Line: {line}"));
                }
            }
        }
        if let Some(signature) = &self.signature {
            out.push(format!("  Signature: {signature}"));
        }
        if let Some(class) = &self.class_info {
            out.push(format!("  Class: {class}"));
        }
        if !self.suggestions.is_empty() {
            out.push("  Suggestions:".to_string());
            for s in &self.suggestions {
                out.push(format!("     - {s}"));
            }
        }
        if let Some(score) = self.complexity.score() {
            out.push(format!("  Complexity: {score}"));
        }
    }
}

/// Prompt section describing the analyses; says so when nothing was found.
pub fn render_analysis(analyses: &[FragmentAnalysis]) -> String {
    if analyses.is_empty() {
        return "No code found for analysis in the query.".to_string();
    }
    let mut lines = vec!["Automatic code analysis results:".to_string()];
    for analysis in analyses {
        analysis.render(&mut lines);
    }
    lines.join("\n")
}

/// Helps with code: review, debugging, examples.
pub struct CodingHelper {
    config: AgentConfig,
    llm: Arc<dyn LlmClient>,
}

impl CodingHelper {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self { config, llm }
    }

    pub fn with_default_config(llm: Arc<dyn LlmClient>) -> Self {
        Self::new(AgentConfig::named(AgentId::CodingHelper.display_name()), llm)
    }
}

#[async_trait]
impl Specialist for CodingHelper {
    fn id(&self) -> AgentId {
        AgentId::CodingHelper
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &[AgentCapability] {
        &[AgentCapability::CodeAnalysis]
    }

    fn system_prompt(&self) -> &str {
        CODING_SYSTEM_PROMPT
    }

    async fn contribute(&self, state: &SharedState) -> Result<Contribution> {
        let input = state.input();
        let fragments = extract_code_fragments(input);
        let analyses: Vec<FragmentAnalysis> = fragments.iter().map(FragmentAnalysis::run).collect();

        for analysis in &analyses {
            debug!(
                agent = %self.id(),
                code_block = analysis.block,
                valid = analysis.syntax.is_valid(),
                suggestions = analysis.suggestions.len(),
                "Inspected code fragment"
            );
        }
        info!(agent = %self.id(), fragments = analyses.len(), "Code analysis complete");

        let calls = analyses.iter().flat_map(|a| a.calls(self.id())).collect();
        let system = format!(
            "{CODING_SYSTEM_PROMPT}\n## Code analysis results\n\n{}\n",
            render_analysis(&analyses)
        );
        let text = generate(
            &self.llm,
            self.id(),
            &self.config,
            system,
            format!("Answer the question: {input}"),
        )
        .await?;

        Ok(Contribution::new(text).with_calls(calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_blocks_are_extracted_in_order() {
        let input = "Why does this fail?\n```python\ndef f(:\n```\nand this\n```\nx = 1\n```";
        let fragments = extract_code_fragments(input);
        assert_eq!(
            fragments,
            vec![
                CodeFragment { block: 1, code: "def f(:".into() },
                CodeFragment { block: 2, code: "x = 1".into() },
            ]
        );
    }

    #[test]
    fn blank_blocks_keep_their_number() {
        let input = "```python\n   \n```\ntext\n```python\nprint(1)\n```";
        let fragments = extract_code_fragments(input);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].block, 2);
        assert_eq!(fragments[0].code, "print(1)");
    }

    #[test]
    fn code_like_query_becomes_one_fragment() {
        let input = "  fix def add(a, b): return a - b  ";
        let fragments = extract_code_fragments(input);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].block, 1);
        assert_eq!(fragments[0].code, "fix def add(a, b): return a - b");
    }

    #[test]
    fn prose_mentioning_import_is_treated_as_code() {
        let fragments = extract_code_fragments("Should I import pandas for this?");
        assert_eq!(fragments.len(), 1);
    }

    #[test]
    fn plain_question_has_no_fragments() {
        assert!(extract_code_fragments("What is a closure?").is_empty());
        assert_eq!(
            render_analysis(&[]),
            "No code found for analysis in the query."
        );
    }

    #[test]
    fn invalid_fragment_still_gets_every_analysis() {
        let fragment = CodeFragment {
            block: 1,
            code: "def f(:\n    print(x == None)".into(),
        };
        let analysis = FragmentAnalysis::run(&fragment);
        assert!(!analysis.syntax.is_valid());
        assert_eq!(analysis.complexity, Complexity::Unparseable);
        assert!(analysis.signature.is_none());
        assert!(analysis.suggestions.contains(&Suggestion::PrintCall));

        let calls = analysis.calls(AgentId::CodingHelper);
        let ops: Vec<_> = calls.iter().map(|c| c.operation.as_str()).collect();
        assert_eq!(
            ops,
            vec!["inspector.check_syntax", "inspector.suggest", "inspector.complexity"]
        );
        assert_eq!(calls[0].metadata["valid"], false);
        assert_eq!(calls[2].metadata["error"], "cannot parse code");
        assert!(calls[2].metadata.get("score").is_none());
    }

    #[test]
    fn python2_print_is_reported_as_syntax_error() {
        let fragment = CodeFragment {
            block: 1,
            code: "def greet():\n    print \"hi\"\n".into(),
        };
        let analysis = FragmentAnalysis::run(&fragment);
        assert_eq!(analysis.syntax.line(), Some(2));
        assert_eq!(analysis.complexity, Complexity::Unparseable);

        let text = render_analysis(&[analysis]);
        assert!(text.contains("Syntax error: Missing parentheses in call to 'print'"));
        assert!(!text.contains("Syntax is correct"));
    }

    #[test]
    fn analysis_renders_signature_and_score() {
        let fragment = CodeFragment {
            block: 3,
            code: "def double(x):\n    return x * 2\n".into(),
        };
        let text = render_analysis(&[FragmentAnalysis::run(&fragment)]);
        assert!(text.starts_with("Automatic code analysis results:"));
        assert!(text.contains("Code block #3:"));
        assert!(text.contains("Syntax is correct"));
        assert!(text.contains("Signature: def double(x):"));
        assert!(text.contains("Add docstring for function documentation"));
        assert!(text.contains("Complexity: 1"));
    }
}
