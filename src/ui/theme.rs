//! Visual theme and styling.

use console::Style;

use crate::versions::{Status, VersionRecord};

/// Terminal styling for ifs-mcp output.
#[derive(Debug, Clone)]
pub struct McpTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for informational/running elements (cyan).
    pub info: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for commands shown in output (dim italic).
    pub command: Style,
    /// Style for remediation hints.
    pub hint: Style,
}

impl Default for McpTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl McpTheme {
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            info: Style::new().cyan(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            command: Style::new().dim().italic(),
            hint: Style::new().cyan().dim(),
        }
    }

    /// Create a theme without colors (for non-TTY or NO_COLOR).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            info: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            command: Style::new(),
            hint: Style::new(),
        }
    }

    /// Pick [`McpTheme::new`] or [`McpTheme::plain`] for the current terminal.
    pub fn detect() -> Self {
        if should_use_colors() {
            Self::new()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    pub fn format_skipped(&self, msg: &str) -> String {
        format!("{}", self.dim.apply_to(format!("○ {}", msg)))
    }

    pub fn format_hint(&self, msg: &str) -> String {
        format!("{}", self.hint.apply_to(format!("→ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("◆"),
            self.highlight.apply_to(title)
        )
    }
}

impl McpTheme {
    /// Filled for a version that can be served, hollow otherwise.
    pub fn version_marker(&self, ready: bool) -> String {
        if ready {
            self.success.apply_to("●").to_string()
        } else {
            self.dim.apply_to("○").to_string()
        }
    }

    /// A version line for pickers and listings: marker, id and artifacts.
    pub fn format_version(&self, record: &VersionRecord) -> String {
        format!(
            "{} {}  {}",
            self.version_marker(record.is_ready_derived()),
            self.highlight.apply_to(&record.id),
            record.annotation()
        )
    }

    /// The status bar: short label, then the longer description.
    pub fn format_status(&self, status: Status, detail: &str) -> String {
        let style = match status {
            Status::ServerRunning | Status::VersionsReady(_) => &self.success,
            Status::NoVersions | Status::VersionsNeedSetup(_) => &self.warning,
            Status::NotInstalled | Status::InstallInProgress => &self.info,
        };
        format!(
            "{} {}",
            style.apply_to(format!("[{}]", status.label())),
            self.dim.apply_to(detail)
        )
    }

    /// Counter shown before each setup stage.
    pub fn format_stage(&self, current: usize, total: usize) -> String {
        self.dim
            .apply_to(format!("stage {}/{}", current, total))
            .to_string()
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_formats_status_lines() {
        let theme = McpTheme::plain();
        assert_eq!(theme.format_success("Installed"), "✓ Installed");
        assert_eq!(theme.format_warning("Caution"), "⚠ Caution");
        assert_eq!(theme.format_error("Failed"), "✗ Failed");
        assert_eq!(theme.format_skipped("Skipped"), "○ Skipped");
        assert_eq!(theme.format_hint("Check your connection"), "→ Check your connection");
    }

    #[test]
    fn theme_formats_header() {
        let msg = McpTheme::plain().format_header("IFS Cloud MCP Server");
        assert!(msg.contains("◆"));
        assert!(msg.contains("IFS Cloud MCP Server"));
    }

    #[test]
    fn version_lines_mark_servable_versions() {
        let theme = McpTheme::plain();
        let mut record = VersionRecord {
            id: "25.1.0".into(),
            ..Default::default()
        };
        assert!(theme.format_version(&record).starts_with("○ 25.1.0  not analyzed"));

        record.flags.has_rank = true;
        record.flags.has_lexical_index = true;
        record.flags.has_vector_index = true;
        assert!(theme.format_version(&record).starts_with("● 25.1.0  "));
    }

    #[test]
    fn status_bar_and_stage_counter() {
        let theme = McpTheme::plain();
        let bar = theme.format_status(Status::VersionsReady(2), "2 versions ready");
        assert_eq!(bar, format!("[{}] 2 versions ready", Status::VersionsReady(2).label()));
        assert_eq!(theme.format_stage(2, 4), "stage 2/4");
    }

    #[test]
    fn default_impl_matches_new() {
        assert_eq!(
            McpTheme::default().format_success("test"),
            McpTheme::new().format_success("test")
        );
    }
}
