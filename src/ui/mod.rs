//! Interactive user interface components.
//!
//! This module provides:
//! - [`UserInterface`] trait for UI abstraction
//! - [`TerminalUI`] for interactive terminal usage
//! - [`NonInteractiveUI`] for CI/headless environments
//! - [`MockUI`] for tests
//!
//! # Example
//!
//! ```
//! use ifs_mcp::ui::{create_ui, OutputMode};
//!
//! // Use non-interactive mode for testability
//! let mut ui = create_ui(false, OutputMode::Quiet);
//! ui.show_header("IFS Cloud MCP Server");
//! ui.success("Ready");
//! ```

pub mod mock;
pub mod non_interactive;
pub mod output;
pub mod prompts;
pub mod spinner;
pub mod terminal;
pub mod theme;

pub use mock::{MockSpinner, MockUI, SpinnerStatus};
pub use non_interactive::NonInteractiveUI;
pub use output::OutputMode;
pub use prompts::prompt_user;
pub use spinner::ProgressSpinner;
pub use terminal::{create_ui, TerminalUI};
pub use theme::{should_use_colors, McpTheme};

use crate::classify::StructuredError;
use crate::error::Result;

/// Trait for user interface interactions.
///
/// This trait allows mocking the UI in tests.
pub trait UserInterface {
    /// Get the current output mode.
    fn output_mode(&self) -> OutputMode;

    /// Display a message to the user.
    fn message(&mut self, msg: &str);

    /// Display a success message.
    fn success(&mut self, msg: &str);

    /// Display a warning message.
    fn warning(&mut self, msg: &str);

    /// Display an error message.
    fn error(&mut self, msg: &str);

    /// Show a prompt and get user input.
    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult>;

    /// Start a spinner for an operation.
    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle>;

    /// Show a header/banner.
    fn show_header(&mut self, title: &str);

    /// Show progress (e.g., "Step 3 of 7").
    fn show_progress(&mut self, current: usize, total: usize);

    /// Show a failed command with its output and remediation suggestions.
    fn show_error_block(&mut self, command: &str, output: &str, suggestions: &[String]);

    /// Check if running in interactive mode.
    fn is_interactive(&self) -> bool;
}

/// Handle for controlling a spinner.
pub trait SpinnerHandle {
    /// Update the spinner message.
    fn set_message(&mut self, msg: &str);

    /// Mark the operation as successful.
    fn finish_success(&mut self, msg: &str);

    /// Mark the operation as failed.
    fn finish_error(&mut self, msg: &str);

    /// Mark as skipped.
    fn finish_skipped(&mut self, msg: &str);
}

/// A prompt to show to the user.
#[derive(Debug, Clone)]
pub struct Prompt {
    /// Unique key for the prompt (used for env overrides and test lookup).
    pub key: String,
    /// The question to display.
    pub question: String,
    /// The type of prompt.
    pub prompt_type: PromptType,
    /// Default value if user just presses enter.
    pub default: Option<String>,
}

impl Prompt {
    /// Yes/no question.
    pub fn confirm(key: &str, question: &str, default: bool) -> Self {
        Self {
            key: key.to_string(),
            question: question.to_string(),
            prompt_type: PromptType::Confirm,
            default: Some(default.to_string()),
        }
    }

    /// Free-form text question.
    pub fn input(key: &str, question: &str, default: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            question: question.to_string(),
            prompt_type: PromptType::Input,
            default: default.map(str::to_string),
        }
    }

    /// Pick one of `options`. The default is an option value.
    pub fn select(key: &str, question: &str, options: Vec<PromptOption>, default: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            question: question.to_string(),
            prompt_type: PromptType::Select { options },
            default: default.map(str::to_string),
        }
    }
}

/// The type of prompt.
#[derive(Debug, Clone)]
pub enum PromptType {
    /// Yes/no confirmation.
    Confirm,
    /// Free-form text input.
    Input,
    /// Select one from a list of options.
    Select { options: Vec<PromptOption> },
}

/// An option in a select prompt.
#[derive(Debug, Clone)]
pub struct PromptOption {
    /// Display label.
    pub label: String,
    /// Value returned when selected.
    pub value: String,
}

impl PromptOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Result of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult {
    /// Boolean result from confirm.
    Bool(bool),
    /// String result from input or select.
    String(String),
    /// The user dismissed the prompt.
    Cancelled,
}

impl PromptResult {
    /// Get as string.
    pub fn as_string(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::String(s) => s.clone(),
            Self::Cancelled => String::new(),
        }
    }

    /// Interpret as a yes/no answer. Cancelling means no.
    pub fn as_bool(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::String(s) => is_truthy(s),
            Self::Cancelled => false,
        }
    }

    /// The chosen value, `None` when cancelled.
    pub fn into_choice(self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::String(s) => Some(s),
            Self::Cancelled => None,
        }
    }
}

pub(crate) fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Ask a yes/no question.
pub fn confirm(ui: &mut dyn UserInterface, key: &str, question: &str, default: bool) -> Result<bool> {
    Ok(ui.prompt(&Prompt::confirm(key, question, default))?.as_bool())
}

/// Ask the user to pick one option. `None` when cancelled.
pub fn choose(
    ui: &mut dyn UserInterface,
    key: &str,
    question: &str,
    options: Vec<PromptOption>,
    default: Option<&str>,
) -> Result<Option<String>> {
    Ok(ui
        .prompt(&Prompt::select(key, question, options, default))?
        .into_choice())
}

/// Show a classified failure.
pub fn show_structured_error(ui: &mut dyn UserInterface, error: &StructuredError) {
    ui.error(&format!("{} ({})", error.message.lines().next().unwrap_or(""), error.kind));
    ui.show_error_block(&error.command, &error.message, &error.suggestions);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_result_as_string() {
        assert_eq!(PromptResult::Bool(true).as_string(), "true");
        assert_eq!(PromptResult::String("cpu".into()).as_string(), "cpu");
        assert_eq!(PromptResult::Cancelled.as_string(), "");
    }

    #[test]
    fn prompt_result_as_bool() {
        assert!(PromptResult::Bool(true).as_bool());
        assert!(PromptResult::String("yes".into()).as_bool());
        assert!(!PromptResult::String("no".into()).as_bool());
        assert!(!PromptResult::Cancelled.as_bool());
    }

    #[test]
    fn into_choice_maps_cancel_to_none() {
        assert_eq!(PromptResult::String("gpu129".into()).into_choice(), Some("gpu129".into()));
        assert_eq!(PromptResult::Cancelled.into_choice(), None);
    }

    #[test]
    fn prompt_constructors() {
        let p = Prompt::confirm("delete_version", "Delete?", false);
        assert!(matches!(p.prompt_type, PromptType::Confirm));
        assert_eq!(p.default.as_deref(), Some("false"));

        let p = Prompt::select(
            "build_variant",
            "Which build?",
            vec![PromptOption::new("CPU", "cpu"), PromptOption::new("GPU", "gpu")],
            Some("cpu"),
        );
        match p.prompt_type {
            PromptType::Select { options } => assert_eq!(options[1].value, "gpu"),
            _ => panic!("Expected Select variant"),
        }
    }

    #[test]
    fn helpers_use_mock_answers() {
        let mut ui = MockUI::new();
        ui.set_prompt_response("proceed", "yes");
        ui.set_prompt_response("variant", "gpu");
        assert!(confirm(&mut ui, "proceed", "Proceed?", false).unwrap());
        let choice = choose(
            &mut ui,
            "variant",
            "Variant?",
            vec![PromptOption::new("CPU", "cpu"), PromptOption::new("GPU", "gpu")],
            None,
        )
        .unwrap();
        assert_eq!(choice.as_deref(), Some("gpu"));
    }
}
