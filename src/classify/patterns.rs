//! Failure text pattern table.
//!
//! Each entry maps a regex over the tool's error output to an error kind and
//! the remediation suggestions shown to the user. The tool's messages are
//! not a stable contract, so every pattern is a heuristic and unmatched text
//! still reaches the user verbatim.

use regex::Regex;
use std::sync::LazyLock;

use super::ErrorKind;

/// Controls when a pattern fires.
#[derive(Debug, Clone, Copy)]
pub enum PatternContext {
    /// Fires for any command.
    Always,
    /// Only fires for these tool subcommands.
    CommandIn(&'static [&'static str]),
}

impl PatternContext {
    fn matches(&self, command: &str) -> bool {
        match self {
            PatternContext::Always => true,
            PatternContext::CommandIn(commands) => commands.contains(&command),
        }
    }
}

/// A registered error pattern.
#[derive(Debug)]
pub struct ErrorPattern {
    /// Pattern name (for debugging).
    pub name: &'static str,
    /// Regex to match against error output.
    pub regex: &'static LazyLock<Regex>,
    /// When this pattern fires.
    pub context: PatternContext,
    /// Kind assigned on match. `None` keeps the generic command failure and
    /// only contributes suggestions.
    pub kind: Option<ErrorKind>,
    /// Remediation suggestions, most useful first.
    pub suggestions: &'static [&'static str],
}

/// A pattern that matched, with the length of the matched text.
#[derive(Debug)]
pub struct PatternMatch<'a> {
    pub pattern: &'a ErrorPattern,
    pub len: usize,
}

// --- Compiled regexes (one-time via LazyLock) ---

macro_rules! lazy_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($pattern).unwrap());
    };
}

lazy_regex!(RE_VERSION_NOT_FOUND, r"Version not found");
lazy_regex!(
    RE_VERSION_NOT_IMPORTED,
    r"Version directory not found|Please import the version first"
);
lazy_regex!(RE_NOT_ANALYZED, r"(?i)not (?:yet )?analy[sz]ed");
lazy_regex!(RE_NO_ZIP, r"No ZIP file");
lazy_regex!(RE_PYTHON, r"Python");
lazy_regex!(
    RE_ARTIFACT_UNAVAILABLE,
    r"No release found|No combined asset found|\b404\b|not found"
);
lazy_regex!(
    RE_NETWORK,
    r"(?i)unable to connect|network|connection|timed? ?out|\bdns\b"
);

static PATTERNS: LazyLock<Vec<ErrorPattern>> = LazyLock::new(built_in_patterns);

/// Return all built-in error patterns, in table order.
pub fn built_in_patterns() -> Vec<ErrorPattern> {
    vec![
        ErrorPattern {
            name: "version_not_found",
            regex: &RE_VERSION_NOT_FOUND,
            context: PatternContext::Always,
            kind: Some(ErrorKind::VersionNotFound),
            suggestions: &[
                "Import a ZIP file for this version first",
                "Run 'ifs-mcp list' to see available versions",
            ],
        },
        ErrorPattern {
            name: "version_not_imported",
            regex: &RE_VERSION_NOT_IMPORTED,
            context: PatternContext::Always,
            kind: Some(ErrorKind::VersionNotFound),
            suggestions: &[
                "The version must be imported before it can be processed",
                "Run 'ifs-mcp import <zip>' first",
            ],
        },
        ErrorPattern {
            name: "not_analyzed",
            regex: &RE_NOT_ANALYZED,
            context: PatternContext::Always,
            kind: Some(ErrorKind::NotAnalyzed),
            suggestions: &["Run 'ifs-mcp analyze' for this version first"],
        },
        ErrorPattern {
            name: "no_zip_file",
            regex: &RE_NO_ZIP,
            context: PatternContext::Always,
            kind: None,
            suggestions: &["Select a valid IFS Cloud ZIP file"],
        },
        ErrorPattern {
            name: "python_runtime",
            regex: &RE_PYTHON,
            context: PatternContext::Always,
            kind: None,
            suggestions: &[
                "Ensure Python is installed and accessible",
                "Check the virtual environment with 'ifs-mcp install' (reinstall)",
            ],
        },
        ErrorPattern {
            name: "artifact_unavailable",
            regex: &RE_ARTIFACT_UNAVAILABLE,
            context: PatternContext::CommandIn(&["download"]),
            kind: Some(ErrorKind::ArtifactUnavailable),
            suggestions: &[
                "No pre-built indexes are published for this version",
                "Generate the indexes locally with 'ifs-mcp setup complete'",
            ],
        },
        ErrorPattern {
            name: "network",
            regex: &RE_NETWORK,
            context: PatternContext::Always,
            kind: Some(ErrorKind::NetworkFailure),
            suggestions: &[
                "Check your internet connection and retry",
                "Generate the indexes locally with 'ifs-mcp setup complete'",
            ],
        },
    ]
}

/// All patterns matching `text` for `command`, longest match first.
///
/// Ties keep table order.
pub fn matching_patterns<'a>(text: &str, command: &str) -> Vec<PatternMatch<'a>> {
    let table: &'a [ErrorPattern] = &PATTERNS;
    let mut matches: Vec<PatternMatch<'a>> = table
        .iter()
        .filter(|p| p.context.matches(command))
        .filter_map(|p| {
            p.regex
                .find_iter(text)
                .map(|m| m.len())
                .max()
                .map(|len| PatternMatch { pattern: p, len })
        })
        .collect();
    matches.sort_by(|a, b| b.len.cmp(&a.len));
    matches
}
