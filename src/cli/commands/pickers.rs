//! Version pickers for commands that were not given a version.

use crate::bridge::CommandBridge;
use crate::error::Result;
use crate::ui::{choose, PromptOption, UserInterface};
use crate::versions::VersionRecord;

/// Which versions a picker offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionFilter {
    Any,
    /// Rank, embed and reindex need an analysis.
    Analyzed,
    /// The server needs rank, lexical and vector indexes.
    Ready,
}

impl VersionFilter {
    fn accepts(self, version: &VersionRecord) -> bool {
        match self {
            VersionFilter::Any => true,
            VersionFilter::Analyzed => version.flags.has_analysis,
            VersionFilter::Ready => version.is_ready_derived(),
        }
    }

    fn empty_message(self) -> &'static str {
        match self {
            VersionFilter::Any => "No IFS Cloud versions imported. Run 'ifs-mcp import <zip>' first.",
            VersionFilter::Analyzed => {
                "No analyzed versions. Run 'ifs-mcp analyze' or 'ifs-mcp setup' first."
            }
            VersionFilter::Ready => "No version is ready to serve. Run 'ifs-mcp setup' first.",
        }
    }
}

/// Picker options for the versions `filter` accepts.
pub fn version_options(versions: &[VersionRecord], filter: VersionFilter) -> Vec<PromptOption> {
    versions
        .iter()
        .filter(|v| filter.accepts(v))
        .map(|v| PromptOption::new(format!("{} ({})", v.id, v.annotation()), v.id.clone()))
        .collect()
}

/// Return `given`, or ask the user to pick from the tool's version list.
///
/// `None` when nothing matches `filter` (a warning is shown) or the prompt
/// was cancelled.
pub fn pick_version(
    ui: &mut dyn UserInterface,
    bridge: &CommandBridge,
    given: Option<&str>,
    filter: VersionFilter,
    question: &str,
) -> Result<Option<String>> {
    if let Some(version) = given {
        return Ok(Some(version.to_string()));
    }

    let versions = bridge.list_versions()?;
    pick_from(ui, &versions, filter, question)
}

/// Pick from an already listed set of versions.
pub fn pick_from(
    ui: &mut dyn UserInterface,
    versions: &[VersionRecord],
    filter: VersionFilter,
    question: &str,
) -> Result<Option<String>> {
    let options = version_options(versions, filter);
    if options.is_empty() {
        ui.warning(filter.empty_message());
        return Ok(None);
    }

    let default = options[0].value.clone();
    choose(ui, "version", question, options, Some(&default))
}
