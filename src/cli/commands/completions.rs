//! Shell completions generation.
//!
//! The `ifs-mcp completions` command generates shell completion scripts.

use crate::cli::args::{Cli, CompletionsArgs};
use crate::ui::UserInterface;
use clap::CommandFactory;

use super::dispatcher::{Command, CommandResult};

/// The completions command implementation.
pub struct CompletionsCommand {
    args: CompletionsArgs,
}

impl CompletionsCommand {
    /// Create a new completions command.
    pub fn new(args: CompletionsArgs) -> Self {
        Self { args }
    }
}

impl Command for CompletionsCommand {
    fn execute(&self, _ui: &mut dyn UserInterface) -> crate::error::Result<CommandResult> {
        let mut cmd = Cli::command();
        clap_complete::generate(self.args.shell, &mut cmd, "ifs-mcp", &mut std::io::stdout());
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap_complete::Shell;

    fn render(shell: Shell) -> String {
        let mut cmd = Cli::command();
        let mut buf = Vec::new();
        clap_complete::generate(shell, &mut cmd, "ifs-mcp", &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn bash_completions_cover_subcommands() {
        let output = render(Shell::Bash);
        assert!(output.contains("ifs-mcp"));
        assert!(output.contains("calculate-rank"));
        assert!(output.contains("reindex-lexical"));
    }

    #[test]
    fn other_shells_generate() {
        for shell in [Shell::Zsh, Shell::Fish, Shell::PowerShell] {
            assert!(render(shell).contains("ifs-mcp"), "{:?}", shell);
        }
    }

    #[test]
    fn command_writes_to_stdout() {
        let mut ui = crate::ui::MockUI::new();
        let cmd = CompletionsCommand::new(CompletionsArgs { shell: Shell::Bash });
        assert!(cmd.execute(&mut ui).unwrap().success);
    }
}
