//! Interactive terminal UI.
//!
//! Status, version and stage lines come from [`McpTheme`]; failed tool
//! calls show the tail of their output.

use console::Term;
use std::io::Write;

use crate::error::Result;

use super::{
    prompt_user, McpTheme, NonInteractiveUI, OutputMode, ProgressSpinner, Prompt, PromptResult,
    SpinnerHandle, UserInterface,
};

/// Interactive terminal UI implementation.
pub struct TerminalUI {
    term: Term,
    theme: McpTheme,
    mode: OutputMode,
}

impl TerminalUI {
    /// Create a new terminal UI.
    pub fn new(mode: OutputMode) -> Self {
        Self {
            term: Term::stdout(),
            theme: McpTheme::detect(),
            mode,
        }
    }
}

impl UserInterface for TerminalUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", msg).ok();
        }
    }

    fn success(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_success(msg)).ok();
        }
    }

    fn warning(&mut self, msg: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "{}", self.theme.format_warning(msg)).ok();
        }
    }

    fn error(&mut self, msg: &str) {
        writeln!(self.term, "{}", self.theme.format_error(msg)).ok();
    }

    fn prompt(&mut self, prompt: &Prompt) -> Result<PromptResult> {
        prompt_user(prompt, &self.term)
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        if self.mode.shows_spinners() {
            Box::new(ProgressSpinner::new(message))
        } else {
            Box::new(ProgressSpinner::hidden())
        }
    }

    fn show_header(&mut self, title: &str) {
        if self.mode.shows_status() {
            writeln!(self.term, "\n{}\n", self.theme.format_header(title)).ok();
        }
    }

    fn show_progress(&mut self, current: usize, total: usize) {
        if self.mode.shows_status() {
            writeln!(self.term, "  {}", self.theme.format_stage(current, total)).ok();
        }
    }

    fn show_error_block(&mut self, command: &str, output: &str, suggestions: &[String]) {
        let rule = self.theme.dim.apply_to("│");
        writeln!(
            self.term,
            "    {} {}",
            self.theme.dim.apply_to("tool command:"),
            self.theme.command.apply_to(command)
        )
        .ok();

        let (hidden, tail) = output_tail(output);
        if hidden > 0 {
            writeln!(
                self.term,
                "    {} {}",
                rule,
                self.theme.dim.apply_to(format!("… {} earlier line(s)", hidden))
            )
            .ok();
        }
        for line in tail {
            writeln!(self.term, "    {} {}", rule, line).ok();
        }

        for s in suggestions {
            writeln!(self.term, "    {}", self.theme.format_hint(s)).ok();
        }
    }

    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }
}

/// Tool output lines shown in an error block.
const ERROR_TAIL_LINES: usize = 15;

/// The last lines of `output`, where Python tracebacks put the actual error,
/// and how many lines were left out.
fn output_tail(output: &str) -> (usize, Vec<&str>) {
    let lines: Vec<&str> = output.lines().collect();
    let hidden = lines.len().saturating_sub(ERROR_TAIL_LINES);
    (hidden, lines[hidden..].to_vec())
}

/// Create the appropriate UI for the environment.
pub fn create_ui(interactive: bool, mode: OutputMode) -> Box<dyn UserInterface> {
    if interactive && Term::stdout().is_term() {
        Box::new(TerminalUI::new(mode))
    } else {
        Box::new(NonInteractiveUI::new(mode))
    }
}
