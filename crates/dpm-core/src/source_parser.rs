//! Source-parser capability (§6).
//!
//! Grounded on this codebase's own per-language symbol extractors (regex-based
//! scanners implementing a shared trait, one file per language), generalised
//! with the two things those extractors never needed for their original
//! purpose: exact begin/end line ranges, and an AST-node-count-based
//! cyclomatic-complexity walk (§4.8). Only Java ships a concrete parser, per
//! the Non-goals in §1 ("support for source languages other than Java").

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::DpmResult;
use crate::types::StaticMetrics;

/// One parsed callable: its canonical signature and its line range in the
/// text that was parsed (§6: `AST.findCallables()`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Callable {
    /// Canonical signature string, e.g. `"process(String, int)"`.
    pub signature: String,
    /// 1-based, inclusive begin line.
    pub begin_line: u32,
    /// 1-based, inclusive end line.
    pub end_line: u32,
    /// The exact source text of the callable, beginning at `begin_line`.
    pub source: String,
}

/// The source-parser capability (§6).
pub trait SourceParser {
    /// Extract every callable declaration in `text`, with line ranges.
    fn find_callables(&self, text: &str) -> DpmResult<Vec<Callable>>;

    /// Compute the static metrics for one callable (§4.8).
    fn static_metrics(&self, callable: &Callable) -> StaticMetrics;
}

/// A regex/brace-matching Java parser.
///
/// This is a heuristic scanner, not a full grammar — the same tradeoff this
/// codebase's other per-language extractors make. It finds method
/// signatures with a method-declaration regex, then locates the matching
/// closing brace by counting braces from the first `{` after the signature.
#[derive(Debug, Clone, Default)]
pub struct JavaSourceParser;

impl JavaSourceParser {
    /// Construct a parser.
    pub fn new() -> Self {
        Self
    }

    fn method_regex() -> Regex {
        Regex::new(
            r"(?m)^[ \t]*(?:public|private|protected)\s+(?:static\s+)?(?:final\s+)?(?:synchronized\s+)?(?:abstract\s+)?(?:\w+(?:<[^>]+>)?(?:\[\])?)\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\(([^)]*)\)",
        )
        .expect("static regex is valid")
    }

    /// Find the line (1-based) containing byte offset `at` in `text`.
    fn line_of(text: &str, at: usize) -> u32 {
        (text[..at].matches('\n').count() + 1) as u32
    }

    /// Starting from `open_brace_byte` (the index of the `{` that opens the
    /// body), find the byte offset of the matching `}` using a naive depth
    /// counter. Returns `None` if unbalanced.
    fn matching_close_brace(text: &str, open_brace_byte: usize) -> Option<usize> {
        let bytes = text.as_bytes();
        let mut depth = 0i32;
        for (i, &b) in bytes.iter().enumerate().skip(open_brace_byte) {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn parameter_count(params: &str) -> u32 {
        let trimmed = params.trim();
        if trimmed.is_empty() {
            0
        } else {
            trimmed.split(',').count() as u32
        }
    }

    fn complexity_keyword_regex() -> Regex {
        // if / for / while / do / switch-case-entry / catch-clause / ternary.
        Regex::new(r"\b(if|for|while|do|catch)\b|(^|[^a-zA-Z0-9_])case\s").expect("valid regex")
    }

    fn ternary_regex() -> Regex {
        // A `?` used as a ternary conditional, not inside a generic or annotation.
        Regex::new(r"\?[^:]*:").expect("valid regex")
    }
}

impl SourceParser for JavaSourceParser {
    fn find_callables(&self, text: &str) -> DpmResult<Vec<Callable>> {
        let method_re = Self::method_regex();
        let mut callables = Vec::new();

        for cap in method_re.captures_iter(text) {
            let whole = cap.get(0).expect("capture 0 always present");
            let name = cap.get(1).expect("name group required").as_str();
            let params = cap.get(2).map(|m| m.as_str()).unwrap_or("");

            // Find the body's opening brace after the signature match.
            let search_from = whole.end();
            let Some(rel_open) = text[search_from..].find('{') else {
                continue;
            };
            // A `;` before the `{` means this is an abstract/interface
            // declaration with no body — not a callable we can track churn for.
            if let Some(rel_semicolon) = text[search_from..].find(';') {
                if rel_semicolon < rel_open {
                    continue;
                }
            }
            let open_brace = search_from + rel_open;
            let Some(close_brace) = Self::matching_close_brace(text, open_brace) else {
                continue;
            };

            let begin_line = Self::line_of(text, whole.start());
            let end_line = Self::line_of(text, close_brace);
            let signature = format!("{name}({params})", params = normalize_params(params));
            let source = text[whole.start()..=close_brace].to_string();

            callables.push(Callable {
                signature,
                begin_line,
                end_line,
                source,
            });
        }

        Ok(callables)
    }

    fn static_metrics(&self, callable: &Callable) -> StaticMetrics {
        let parameter_count = callable
            .signature
            .find('(')
            .zip(callable.signature.find(')'))
            .map(|(open, close)| Self::parameter_count(&callable.signature[open + 1..close]))
            .unwrap_or(0);

        let keyword_hits = Self::complexity_keyword_regex()
            .find_iter(&callable.source)
            .count() as u32;
        let ternary_hits = Self::ternary_regex().find_iter(&callable.source).count() as u32;
        // CyclomaticComplexity = 1 + count of branching nodes (§4.8).
        let cyclomatic_complexity = 1 + keyword_hits + ternary_hits;

        let line_count = callable.end_line.saturating_sub(callable.begin_line) + 1;
        let mut code_smells = 0u32;
        if line_count > 20 {
            code_smells += 1;
        }
        if parameter_count > 4 {
            code_smells += 1;
        }
        if cyclomatic_complexity > 10 {
            code_smells += 1;
        }

        StaticMetrics {
            parameter_count,
            cyclomatic_complexity,
            code_smells,
            duplication: 0,
        }
    }
}

fn normalize_params(params: &str) -> String {
    params
        .split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(|p| p.split_whitespace().next().unwrap_or(p).to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
public class Calculator {
    public int add(int a, int b) {
        return a + b;
    }

    private void classify(int value) {
        if (value > 10) {
            for (int i = 0; i < value; i++) {
                if (i % 2 == 0) {
                    System.out.println(i);
                }
            }
        } else {
            switch (value) {
                case 1:
                    break;
                case 2:
                    break;
                default:
                    break;
            }
        }
    }

    public abstract void unimplemented(int x);
}
"#;

    #[test]
    fn finds_callables_with_line_ranges() {
        let parser = JavaSourceParser::new();
        let callables = parser.find_callables(SAMPLE).unwrap();
        let names: Vec<&str> = callables.iter().map(|c| c.signature.as_str()).collect();
        assert!(names.contains(&"add(int, int)"));
        assert!(names.contains(&"classify(int)"));
        // abstract method has no body and is skipped.
        assert!(!names.iter().any(|n| n.starts_with("unimplemented")));

        let add = callables.iter().find(|c| c.signature.starts_with("add")).unwrap();
        assert_eq!(add.begin_line, 3);
        assert_eq!(add.end_line, 5);
    }

    #[test]
    fn complexity_counts_branch_nodes() {
        let parser = JavaSourceParser::new();
        let callables = parser.find_callables(SAMPLE).unwrap();
        let classify = callables
            .iter()
            .find(|c| c.signature.starts_with("classify"))
            .unwrap();
        let metrics = parser.static_metrics(classify);
        // 1 (base) + if + for + if + 2 case entries = 6. The keyword regex
        // matches neither `default` nor `else`, so the `switch`'s default
        // arm and the outer `else` don't add to the count.
        assert_eq!(metrics.cyclomatic_complexity, 6);
        assert_eq!(metrics.parameter_count, 1);
    }

    #[test]
    fn cyclomatic_complexity_is_never_below_one() {
        let parser = JavaSourceParser::new();
        let callables = parser.find_callables(SAMPLE).unwrap();
        let add = callables.iter().find(|c| c.signature.starts_with("add")).unwrap();
        let metrics = parser.static_metrics(add);
        assert!(metrics.cyclomatic_complexity >= 1);
    }

    #[test]
    fn code_smells_flags_long_method() {
        let mut long_body = String::from("public void big() {\n");
        for _ in 0..25 {
            long_body.push_str("int x = 0;\n");
        }
        long_body.push('}');
        let parser = JavaSourceParser::new();
        let callables = parser.find_callables(&long_body).unwrap();
        let big = &callables[0];
        let metrics = parser.static_metrics(big);
        assert_eq!(metrics.code_smells, 1);
    }
}
