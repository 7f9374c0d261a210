//! Static analysis of Python fragments.
//!
//! Structural checks run on a tree-sitter parse; style suggestions are
//! lexical and work on any text, parseable or not. Every function here is
//! total.
//!
//! The grammar is error tolerant and still knows Python 2 statements, so a
//! clean tree is not enough for [`check_syntax`]: indentation is checked
//! against the source, and `print`/`exec` statements and unparenthesized
//! `:=` at statement level are rejected.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::ops::ControlFlow;
use std::sync::LazyLock;
use tree_sitter::{Node, Parser, Tree};

/// Lines longer than this are reported by [`suggest`].
pub const MAX_LINE_LENGTH: usize = 100;

/// How many offending lines or numbers a suggestion lists.
const LISTED_ITEMS: usize = 3;

const TAB_WIDTH: usize = 8;

static BARE_EXCEPT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"except\s*:").unwrap());

static FUNCTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"def\s+\w+\s*\([^)]*\)\s*:").unwrap());

static MULTI_DIGIT_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{2,}\b").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyntaxCheck {
    Valid,
    Invalid {
        message: String,
        /// 1-based line of the first error, when the parser located one
        line: Option<usize>,
    },
}

impl SyntaxCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SyntaxCheck::Valid)
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            SyntaxCheck::Valid => None,
            SyntaxCheck::Invalid { line, .. } => *line,
        }
    }
}

/// A style or robustness hint for a fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestion {
    PrintCall,
    GlobalVariable,
    BareExcept,
    NoneComparison,
    /// 1-based line numbers, at most three
    LongLines(Vec<usize>),
    MissingDocstring,
    /// Literal numbers of two or more digits, at most three
    MagicNumbers(Vec<String>),
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Suggestion::PrintCall => {
                f.write_str("Consider using logging instead of print() for production code")
            }
            Suggestion::GlobalVariable => {
                f.write_str("Avoid global variables, use function parameters or classes")
            }
            Suggestion::BareExcept => {
                f.write_str("Specify concrete exception types instead of bare except")
            }
            Suggestion::NoneComparison => {
                f.write_str("Use 'is None' or 'is not None' instead of == / !=")
            }
            Suggestion::LongLines(lines) => write!(
                f,
                "Lines {lines:?} exceed {MAX_LINE_LENGTH} characters, consider splitting"
            ),
            Suggestion::MissingDocstring => f.write_str("Add docstring for function documentation"),
            Suggestion::MagicNumbers(numbers) => write!(
                f,
                "Consider extracting magic numbers ({}) into constants",
                numbers.join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComplexityMetrics {
    pub lines_of_code: usize,
    pub functions: usize,
    pub classes: usize,
    pub loops: usize,
    pub conditionals: usize,
}

impl ComplexityMetrics {
    /// Loops plus conditionals plus functions.
    pub fn score(&self) -> usize {
        self.loops + self.conditionals + self.functions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Complexity {
    Metrics(ComplexityMetrics),
    Unparseable,
}

impl Complexity {
    pub fn score(&self) -> Option<usize> {
        match self {
            Complexity::Metrics(m) => Some(m.score()),
            Complexity::Unparseable => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    pub name: String,
    pub methods: Vec<String>,
    pub bases: Vec<String>,
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.bases.is_empty() {
            write!(f, "({})", self.bases.join(", "))?;
        }
        if !self.methods.is_empty() {
            write!(f, " with methods: {}", self.methods.join(", "))?;
        }
        Ok(())
    }
}

fn parse(code: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    parser.parse(code, None)
}

/// Parse `code`, keeping the tree only if it passes [`check_syntax`].
fn parse_valid(code: &str) -> Option<Tree> {
    parse_checked(code).ok()
}

fn invalid(message: impl Into<String>, line: usize) -> SyntaxCheck {
    SyntaxCheck::Invalid {
        message: message.into(),
        line: Some(line),
    }
}

fn parse_checked(code: &str) -> Result<Tree, SyntaxCheck> {
    let tree = parse(code).ok_or_else(|| SyntaxCheck::Invalid {
        message: "parser produced no tree".to_string(),
        line: None,
    })?;
    let root = tree.root_node();

    if root.has_error() {
        let node = find_first(root, |n| n.is_error() || n.is_missing()).unwrap_or(root);
        let line = node.start_position().row + 1;
        return Err(if node.is_missing() {
            invalid(format!("missing '{}'", node.kind()), line)
        } else {
            invalid("invalid syntax", line)
        });
    }
    if let Some(err) = check_indentation(code) {
        return Err(err);
    }
    if let Some(err) = legacy_statement(root) {
        return Err(err);
    }
    Ok(tree)
}

/// Pre-order walk over `root` and its descendants, stopping early on `Break`.
fn walk<'t>(root: Node<'t>, mut f: impl FnMut(Node<'t>) -> ControlFlow<()>) {
    let mut cursor = root.walk();
    loop {
        if f(cursor.node()).is_break() {
            return;
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return;
            }
        }
    }
}

fn find_first<'t>(root: Node<'t>, pred: impl Fn(&Node<'t>) -> bool) -> Option<Node<'t>> {
    let mut found = None;
    walk(root, |node| {
        if pred(&node) {
            found = Some(node);
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });
    found
}

/// Statements the grammar accepts that Python 3 does not.
fn legacy_statement(root: Node<'_>) -> Option<SyntaxCheck> {
    let node = find_first(root, |n| match n.kind() {
        "print_statement" | "exec_statement" => true,
        "named_expression" => n
            .parent()
            .is_some_and(|p| p.kind() == "expression_statement"),
        _ => false,
    })?;
    let line = node.start_position().row + 1;
    Some(match node.kind() {
        "print_statement" => invalid("Missing parentheses in call to 'print'", line),
        "exec_statement" => invalid("Missing parentheses in call to 'exec'", line),
        _ => invalid("invalid syntax", line),
    })
}

#[derive(Clone, Copy)]
struct OpenString {
    quote: char,
    triple: bool,
}

/// Block structure of the source, tracked per logical line the way the
/// Python tokenizer does: brackets, open strings and backslashes continue a
/// line; blank and comment-only lines are ignored.
fn check_indentation(code: &str) -> Option<SyntaxCheck> {
    let mut levels = vec![0usize];
    let mut expect_block = false;
    let mut depth = 0usize;
    let mut string: Option<OpenString> = None;
    let mut continued = false;
    let mut last_line = 1;

    for (index, raw) in code.split('\n').enumerate() {
        let line_no = index + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        let starts_logical = depth == 0 && string.is_none() && !continued;

        if starts_logical {
            let body = line.trim_start_matches([' ', '\t', '\x0c']);
            if body.is_empty() || body.starts_with('#') {
                continue;
            }
            last_line = line_no;
            let indent = indent_width(&line[..line.len() - body.len()]);
            let current = levels.last().copied().unwrap_or(0);

            if expect_block {
                if indent <= current {
                    return Some(invalid("expected an indented block", line_no));
                }
                levels.push(indent);
                expect_block = false;
            } else if indent > current {
                return Some(invalid("unexpected indent", line_no));
            } else if indent < current {
                while levels.last().is_some_and(|&l| l > indent) {
                    levels.pop();
                }
                if levels.last() != Some(&indent) {
                    return Some(invalid(
                        "unindent does not match any outer indentation level",
                        line_no,
                    ));
                }
            }
        } else {
            last_line = line_no;
        }

        continued = false;
        let mut last_significant = None;
        let mut chars = line.chars().peekable();
        while let Some(c) = chars.next() {
            if let Some(open) = string {
                match c {
                    '\\' => {
                        chars.next();
                    }
                    q if q == open.quote => {
                        if !open.triple {
                            string = None;
                        } else if chars.next_if_eq(&q).is_some() && chars.next_if_eq(&q).is_some() {
                            string = None;
                        }
                    }
                    _ => {}
                }
                if string.is_none() {
                    last_significant = Some(c);
                }
                continue;
            }
            match c {
                '#' => break,
                '"' | '\'' => {
                    let triple = chars.peek() == Some(&c) && {
                        let mut ahead = chars.clone();
                        ahead.next();
                        ahead.peek() == Some(&c)
                    };
                    if triple {
                        chars.next();
                        chars.next();
                    }
                    string = Some(OpenString { quote: c, triple });
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                '\\' if chars.peek().is_none() => continued = true,
                _ => {}
            }
            if !c.is_whitespace() {
                last_significant = Some(c);
            }
        }

        if string.is_some_and(|open| !open.triple) {
            string = None;
        }
        if depth == 0 && string.is_none() && !continued && last_significant == Some(':') {
            expect_block = true;
        }
    }

    if expect_block {
        return Some(invalid("expected an indented block", last_line));
    }
    None
}

fn indent_width(indent: &str) -> usize {
    indent.chars().fold(0, |width, c| match c {
        '\t' => (width / TAB_WIDTH + 1) * TAB_WIDTH,
        _ => width + 1,
    })
}

fn text<'a>(node: &Node<'_>, code: &'a str) -> Option<&'a str> {
    node.utf8_text(code.as_bytes()).ok()
}

pub fn check_syntax(code: &str) -> SyntaxCheck {
    match parse_checked(code) {
        Ok(_) => SyntaxCheck::Valid,
        Err(check) => check,
    }
}

/// Lexical rules; runs on unparseable code too.
pub fn suggest(code: &str) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if code.contains("print(") {
        suggestions.push(Suggestion::PrintCall);
    }
    if code.contains("global ") {
        suggestions.push(Suggestion::GlobalVariable);
    }
    if BARE_EXCEPT.is_match(code) {
        suggestions.push(Suggestion::BareExcept);
    }
    if code.contains("== None") || code.contains("!= None") {
        suggestions.push(Suggestion::NoneComparison);
    }

    let long_lines: Vec<usize> = code
        .split('\n')
        .enumerate()
        .filter(|(_, line)| line.chars().count() > MAX_LINE_LENGTH)
        .map(|(i, _)| i + 1)
        .take(LISTED_ITEMS)
        .collect();
    if !long_lines.is_empty() {
        suggestions.push(Suggestion::LongLines(long_lines));
    }

    if FUNCTION_HEADER.is_match(code) && !code.contains("\"\"\"") && !code.contains("'''") {
        suggestions.push(Suggestion::MissingDocstring);
    }

    let magic: Vec<String> = MULTI_DIGIT_NUMBER
        .find_iter(code)
        .filter(|m| {
            let before = code[..m.start()].chars().next_back();
            let after = code[m.end()..].chars().next();
            !is_quote(before) && !is_quote(after)
        })
        .map(|m| m.as_str().to_string())
        .take(LISTED_ITEMS)
        .collect();
    if !magic.is_empty() {
        suggestions.push(Suggestion::MagicNumbers(magic));
    }

    suggestions
}

fn is_quote(c: Option<char>) -> bool {
    matches!(c, Some('"') | Some('\''))
}

pub fn complexity(code: &str) -> Complexity {
    let Some(tree) = parse_valid(code) else {
        return Complexity::Unparseable;
    };

    let mut metrics = ComplexityMetrics {
        lines_of_code: code
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .count(),
        functions: 0,
        classes: 0,
        loops: 0,
        conditionals: 0,
    };

    walk(tree.root_node(), |node| {
        match node.kind() {
            "function_definition" => metrics.functions += 1,
            "class_definition" => metrics.classes += 1,
            "for_statement" | "while_statement" => metrics.loops += 1,
            "if_statement" | "elif_clause" => metrics.conditionals += 1,
            _ => {}
        }
        ControlFlow::Continue(())
    });

    Complexity::Metrics(metrics)
}

/// Header of the first function, e.g. `def greet(name: str) -> str:`.
pub fn function_signature(code: &str) -> Option<String> {
    let tree = parse_valid(code)?;
    let func = find_first(tree.root_node(), |n| n.kind() == "function_definition")?;

    let name = text(&func.child_by_field_name("name")?, code)?;
    let params = text(&func.child_by_field_name("parameters")?, code)?;
    let mut signature = format!("def {name}{params}");
    if let Some(ret) = func.child_by_field_name("return_type") {
        signature.push_str(" -> ");
        signature.push_str(text(&ret, code)?);
    }
    signature.push(':');
    Some(signature)
}

/// Name, direct methods and base classes of the first class.
pub fn class_info(code: &str) -> Option<ClassInfo> {
    let tree = parse_valid(code)?;
    let class = find_first(tree.root_node(), |n| n.kind() == "class_definition")?;

    let name = text(&class.child_by_field_name("name")?, code)?.to_string();

    let mut bases = Vec::new();
    if let Some(superclasses) = class.child_by_field_name("superclasses") {
        let mut cursor = superclasses.walk();
        for base in superclasses.named_children(&mut cursor) {
            if let Some(t) = text(&base, code) {
                bases.push(t.to_string());
            }
        }
    }

    let mut methods = Vec::new();
    if let Some(body) = class.child_by_field_name("body") {
        let mut cursor = body.walk();
        for stmt in body.named_children(&mut cursor) {
            let func = match stmt.kind() {
                "function_definition" => Some(stmt),
                "decorated_definition" => stmt
                    .child_by_field_name("definition")
                    .filter(|d| d.kind() == "function_definition"),
                _ => None,
            };
            if let Some(name) = func
                .and_then(|f| f.child_by_field_name("name"))
                .and_then(|n| text(&n, code))
            {
                methods.push(name.to_string());
            }
        }
    }

    Some(ClassInfo {
        name,
        methods,
        bases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "def total(xs):
    acc = 0
    for x in xs:
        if x > 0:
            acc += x
        elif x < -10:
            acc -= 1
    while acc > 100:
        acc -= 1
    return acc

# helper type
class Box:
    pass
";

    #[test]
    fn valid_code_passes_syntax_check() {
        assert_eq!(check_syntax("def add(a, b):\n    return a + b\n"), SyntaxCheck::Valid);
        assert!(check_syntax(SAMPLE).is_valid());
    }

    #[test]
    fn broken_header_is_invalid_with_line() {
        let check = check_syntax("def f(:");
        assert!(!check.is_valid());
        assert_eq!(check.line(), Some(1));
    }

    #[test]
    fn unbalanced_paren_is_invalid() {
        let check = check_syntax("x = 1\ny = (\n");
        assert!(!check.is_valid());
        assert!(check.line().is_some_and(|line| line >= 1));
    }

    #[test]
    fn missing_block_indent_is_invalid() {
        let check = check_syntax("def f(x):\nreturn x");
        assert_eq!(
            check,
            SyntaxCheck::Invalid {
                message: "expected an indented block".to_string(),
                line: Some(2),
            }
        );
    }

    #[test]
    fn stray_indent_and_bad_dedent_are_invalid() {
        let check = check_syntax("a = 1\n  b = 2");
        assert!(!check.is_valid());
        assert_eq!(check.line(), Some(2));

        assert!(!check_syntax("if a:\n        b = 1\n    c = 2\n").is_valid());
    }

    #[test]
    fn python2_statements_are_invalid() {
        let check = check_syntax("print \"hello\"");
        assert!(!check.is_valid());
        assert_eq!(check.line(), Some(1));

        assert!(!check_syntax("exec \"x = 1\"").is_valid());
        assert_eq!(complexity("print \"hello\""), Complexity::Unparseable);
        assert_eq!(function_signature("def f():\n    print \"x\"\n"), None);
    }

    #[test]
    fn bare_walrus_statement_is_invalid() {
        assert!(!check_syntax("x := 1").is_valid());
        assert!(check_syntax("if (n := 10) > 5:\n    pass\n").is_valid());
    }

    #[test]
    fn continuation_lines_do_not_count_as_indentation() {
        let code = "items = [
        1,
    2,
]
total = 1 + \\
        2
def f():  # trailing comment
    \"\"\"Doc
  with an odd indent.
\"\"\"

    # comment at another depth
    return {
        'a': 1,
    }
";
        assert_eq!(check_syntax(code), SyntaxCheck::Valid);
        assert_eq!(check_syntax("x = '#:'\nif x: pass\n"), SyntaxCheck::Valid);
    }

    #[test]
    fn deeply_nested_fragment_is_analyzed() {
        let depth = 20_000;
        let code = format!("x = {}1{}", "(".repeat(depth), ")".repeat(depth));

        assert!(check_syntax(&code).is_valid());
        let Complexity::Metrics(m) = complexity(&code) else {
            panic!("nested expression should parse");
        };
        assert_eq!(m.functions, 0);
        assert_eq!(m.lines_of_code, 1);
        assert_eq!(function_signature(&code), None);
        assert_eq!(class_info(&code), None);
    }

    #[test]
    fn suggest_still_runs_on_broken_code() {
        let suggestions = suggest("def f(:");
        assert!(suggestions.is_empty());

        let suggestions = suggest("def f(:\n    print(x == None)");
        assert!(suggestions.contains(&Suggestion::PrintCall));
        assert!(suggestions.contains(&Suggestion::NoneComparison));
    }

    #[test]
    fn suggest_flags_each_rule() {
        let long = "x".repeat(MAX_LINE_LENGTH + 1);
        let code = format!(
            "global counter\ndef run(a):\n    try:\n        go()\n    except:\n        pass\n{long}\n"
        );
        let suggestions = suggest(&code);
        assert!(suggestions.contains(&Suggestion::GlobalVariable));
        assert!(suggestions.contains(&Suggestion::BareExcept));
        assert!(suggestions.contains(&Suggestion::MissingDocstring));
        assert!(suggestions.contains(&Suggestion::LongLines(vec![7])));
    }

    #[test]
    fn docstring_silences_missing_docstring() {
        let code = "def run(a):\n    \"\"\"Run it.\"\"\"\n    return a\n";
        assert!(!suggest(code).contains(&Suggestion::MissingDocstring));
    }

    #[test]
    fn magic_numbers_skip_quoted_and_single_digits() {
        let code = "timeout = 30\nretries = 5\nname = \"404\"\nlimit = 1000\nport = 8080\nbig = 65535\n";
        let suggestions = suggest(code);
        assert!(suggestions.contains(&Suggestion::MagicNumbers(vec![
            "30".to_string(),
            "1000".to_string(),
            "8080".to_string(),
        ])));
        assert_eq!(
            Suggestion::MagicNumbers(vec!["30".into(), "1000".into()]).to_string(),
            "Consider extracting magic numbers (30, 1000) into constants"
        );
    }

    #[test]
    fn complexity_counts_constructs() {
        let Complexity::Metrics(m) = complexity(SAMPLE) else {
            panic!("sample should parse");
        };
        assert_eq!(m.functions, 1);
        assert_eq!(m.classes, 1);
        assert_eq!(m.loops, 2);
        assert_eq!(m.conditionals, 2);
        assert_eq!(m.lines_of_code, 12);
        assert_eq!(m.score(), 5);
    }

    #[test]
    fn complexity_degrades_on_parse_failure() {
        assert_eq!(complexity("def f(:"), Complexity::Unparseable);
        assert_eq!(complexity("def f(:").score(), None);
    }

    #[test]
    fn signature_includes_return_type() {
        let code = "def greet(name: str, times: int = 1) -> str:\n    return name * times\n";
        assert_eq!(
            function_signature(code).as_deref(),
            Some("def greet(name: str, times: int = 1) -> str:")
        );
        assert_eq!(function_signature("x = 1\n"), None);
        assert_eq!(function_signature("def f(:"), None);
    }

    #[test]
    fn class_info_lists_methods_and_bases() {
        let code = "class Dog(Animal, Base):
    def bark(self):
        pass

    @staticmethod
    def create():
        return Dog()
";
        let info = class_info(code).unwrap();
        assert_eq!(info.name, "Dog");
        assert_eq!(info.bases, vec!["Animal", "Base"]);
        assert_eq!(info.methods, vec!["bark", "create"]);
        assert_eq!(info.to_string(), "Dog(Animal, Base) with methods: bark, create");
        assert_eq!(class_info("def f():\n    pass\n"), None);
    }
}
