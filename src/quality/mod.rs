//! Heuristic code-quality scoring.
//!
//! Three independent passes score a piece of code from 0 to 100:
//! complexity (higher is simpler), documentation (higher is better
//! documented) and standards (higher means fewer style violations). The
//! overall score is their mean. Nothing here parses the code; every pass is
//! line- and regex-based so it works on any language.

use crate::models::CodeQualityReport;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const COMPLEXITY_ISSUE: &str = "High code complexity detected - consider refactoring";
pub const DOCUMENTATION_ISSUE: &str = "Insufficient documentation - add docstrings and comments";
pub const STANDARDS_ISSUE: &str =
    "Coding standards violations detected - check line length and naming conventions";

const COMPLEXITY_ISSUE_BELOW: f64 = 50.0;
const DOCUMENTATION_ISSUE_BELOW: f64 = 40.0;
const STANDARDS_ISSUE_BELOW: f64 = 60.0;

/// Spaces per nesting level when estimating depth from indentation.
const INDENT_PER_LEVEL: usize = 4;

static CONTROL_FLOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:if|else|elif|for|while|try|except|catch|switch|case)\b")
        .expect("valid control-flow regex")
});

static DEFINITIONS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?m)^\s*def\s+\w+").expect("valid def regex"),
        Regex::new(r"(?m)^\s*function\s+\w+").expect("valid function regex"),
        Regex::new(r"(?m)^\s*class\s+\w+").expect("valid class regex"),
    ]
});

static PY_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdef\s+\w+").expect("valid def regex"));

static PY_BAD_DEF_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdef\s+[A-Z]\w+").expect("valid def-name regex"));

static PY_FUNCTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"def\s+\w+").expect("valid function-start regex"));

static PY_TOP_LEVEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:def|class)\s").expect("valid boundary regex"));

/// Scores code along complexity, documentation and standards.
#[derive(Debug, Clone)]
pub struct CodeQualityScorer {
    /// Lines longer than this many characters are violations.
    max_line_length: usize,
    /// Python functions with more non-empty lines than this are flagged.
    max_function_lines: usize,
}

impl Default for CodeQualityScorer {
    fn default() -> Self {
        Self {
            max_line_length: 100,
            max_function_lines: 50,
        }
    }
}

impl CodeQualityScorer {
    pub fn new(max_line_length: usize, max_function_lines: usize) -> Self {
        Self {
            max_line_length,
            max_function_lines,
        }
    }

    /// Analyze code quality for a commit.
    pub fn analyze(&self, commit_hash: &str, code: &str, language: &str) -> CodeQualityReport {
        if code.trim().is_empty() {
            return CodeQualityReport::new(commit_hash, 100.0, 100.0, 100.0, Vec::new());
        }

        let python = is_python(language);
        let lines: Vec<&str> = code.split('\n').collect();
        let non_empty: Vec<&str> = lines.iter().copied().filter(|l| !l.trim().is_empty()).collect();

        let complexity = complexity_score(code, &non_empty);
        let documentation = documentation_score(code, &lines, non_empty.len(), python);
        let standards = self.standards_score(code, &lines, python);

        let mut issues = Vec::new();
        if complexity < COMPLEXITY_ISSUE_BELOW {
            issues.push(COMPLEXITY_ISSUE.to_string());
        }
        if documentation < DOCUMENTATION_ISSUE_BELOW {
            issues.push(DOCUMENTATION_ISSUE.to_string());
        }
        if standards < STANDARDS_ISSUE_BELOW {
            issues.push(STANDARDS_ISSUE.to_string());
        }
        if python {
            for length in python_function_lengths(code) {
                if length > self.max_function_lines {
                    issues.push(format!(
                        "Function exceeds {} lines ({} lines) - consider breaking it down",
                        self.max_function_lines, length
                    ));
                }
            }
        }

        debug!(
            "Quality for {}: complexity={:.1} documentation={:.1} standards={:.1} issues={}",
            commit_hash,
            complexity,
            documentation,
            standards,
            issues.len()
        );

        CodeQualityReport::new(commit_hash, complexity, documentation, standards, issues)
    }

    /// Line length, indentation and (for python) naming checks.
    fn standards_score(&self, code: &str, lines: &[&str], python: bool) -> f64 {
        let mut violations = 0usize;
        let mut total_checks = 0usize;

        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            total_checks += 1;
            if line.chars().count() > self.max_line_length {
                violations += 1;
            }
        }

        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            let indent = leading_whitespace(line);
            if indent > 0 {
                total_checks += 1;
                if indent % 2 != 0 {
                    violations += 1;
                }
            }
        }

        if python {
            violations += PY_BAD_DEF_NAME.find_iter(code).count();
            total_checks += PY_DEF.find_iter(code).count();
        }

        if total_checks == 0 {
            return 100.0;
        }

        let violation_ratio = violations as f64 / total_checks as f64;
        (100.0 - violation_ratio * 100.0).clamp(0.0, 100.0)
    }
}

fn is_python(language: &str) -> bool {
    language.trim().eq_ignore_ascii_case("python")
}

/// Width of the leading whitespace, in characters.
fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

/// Control-flow density plus an indentation-depth penalty.
fn complexity_score(code: &str, non_empty: &[&str]) -> f64 {
    if non_empty.is_empty() {
        return 100.0;
    }

    let mut indicators = CONTROL_FLOW.find_iter(code).count();

    let max_indent = non_empty.iter().map(|l| leading_whitespace(l)).max().unwrap_or(0);
    indicators += (max_indent / INDENT_PER_LEVEL) * 2;

    let ratio = indicators as f64 / non_empty.len() as f64;
    (100.0 - ratio * 200.0).clamp(0.0, 100.0)
}

/// Comment/docstring lines relative to what the definitions call for.
fn documentation_score(code: &str, lines: &[&str], non_empty_count: usize, python: bool) -> f64 {
    if non_empty_count == 0 {
        return 100.0;
    }

    let mut doc_lines = 0usize;

    if python {
        let mut in_docstring = false;
        for line in lines {
            let stripped = line.trim();
            if stripped.contains("\"\"\"") || stripped.contains("'''") {
                in_docstring = !in_docstring;
                doc_lines += 1;
            } else if in_docstring || stripped.starts_with('#') {
                doc_lines += 1;
            }
        }
    } else {
        for line in lines {
            let stripped = line.trim();
            if stripped.starts_with("//")
                || stripped.starts_with('#')
                || stripped.starts_with("/*")
                || stripped.starts_with('*')
            {
                doc_lines += 1;
            }
        }
    }

    let definitions: usize = DEFINITIONS.iter().map(|re| re.find_iter(code).count()).sum();

    let ratio = if definitions > 0 {
        let expected = (definitions * 2) as f64;
        (doc_lines as f64 / expected).min(1.0)
    } else {
        (doc_lines as f64 / (non_empty_count as f64 * 0.1)).min(1.0)
    };

    ratio * 100.0
}

/// Non-empty line counts of each python function, where a function runs
/// from its `def` up to the next top-level `def`/`class` or end of text.
fn python_function_lengths(code: &str) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut pos = 0;

    while let Some(start) = PY_FUNCTION_START.find_at(code, pos) {
        let end = PY_TOP_LEVEL_BOUNDARY
            .find_at(code, start.end())
            .map(|m| m.start())
            .unwrap_or(code.len());

        let body = &code[start.start()..end];
        lengths.push(body.split('\n').filter(|l| !l.trim().is_empty()).count());

        pos = end;
    }

    lengths
}
