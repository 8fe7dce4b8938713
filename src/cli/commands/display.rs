//! Shared display helpers for pipeline progress and failures.

use crate::classify::StructuredError;
use crate::error::McpError;
use crate::sequencer::{Stage, StageObserver};
use crate::shell::CommandResult;
use crate::ui::{show_structured_error, UserInterface};

/// Reports pipeline progress through the UI.
pub struct UiObserver<'a> {
    ui: &'a mut dyn UserInterface,
}

impl<'a> UiObserver<'a> {
    pub fn new(ui: &'a mut dyn UserInterface) -> Self {
        Self { ui }
    }
}

impl StageObserver for UiObserver<'_> {
    fn stage_started(&mut self, index: usize, total: usize, stage: &Stage) {
        if total > 1 {
            self.ui.show_progress(index + 1, total);
        }
        self.ui.message(&format!("Running {}...", stage.name()));
    }

    fn stage_succeeded(&mut self, stage: &Stage, result: &CommandResult) {
        if self.ui.output_mode().shows_command_output() && !result.stdout.trim().is_empty() {
            self.ui.message(result.stdout.trim_end());
        }
        self.ui.success(&format!("{} complete", stage.name()));
    }

    fn stage_failed(&mut self, _stage: &Stage, error: &StructuredError) {
        show_structured_error(self.ui, error);
    }

    fn falling_back(&mut self, remote_error: &StructuredError) {
        self.ui.warning(&format!(
            "Pre-built indexes unavailable ({}). Generating them locally instead.",
            remote_error.kind
        ));
    }
}

/// Show a failure raised while running `command`.
///
/// Stage failures were already shown by [`UiObserver`] and are skipped.
pub fn report_error(ui: &mut dyn UserInterface, command: &str, error: &McpError) {
    if matches!(error, McpError::StageFailed { .. }) {
        return;
    }
    show_structured_error(ui, &StructuredError::from_error(command, error));
}
