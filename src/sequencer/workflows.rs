//! Setup workflows built from pipeline stages.

use super::Stage;

/// Which setup workflow to run for a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupMode {
    /// Download pre-built indexes, computing locally if none are published.
    Fast,
    /// Compute everything locally.
    Complete { embeddings: bool },
}

fn version_stage(command: &str, version: &str) -> Stage {
    Stage::new(command, ["--version", version])
}

/// The remote half of fast setup.
pub fn fast_setup_remote(version: &str) -> Stage {
    Stage::new("download", ["--version", version, "--force"])
}

/// `analyze → calculate-rank → reindex-lexical`
pub fn local_pipeline_stages(version: &str) -> Vec<Stage> {
    vec![
        version_stage("analyze", version),
        version_stage("calculate-rank", version),
        version_stage("reindex-lexical", version),
    ]
}

/// Local pipeline, plus `embed` when requested.
pub fn complete_setup_stages(version: &str, embeddings: bool) -> Vec<Stage> {
    let mut stages = local_pipeline_stages(version);
    if embeddings {
        stages.push(version_stage("embed", version));
    }
    stages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_setup_forces_download() {
        let stage = fast_setup_remote("25.1.0");
        assert_eq!(stage.command, "download");
        assert_eq!(stage.args, vec!["--version", "25.1.0", "--force"]);
    }

    #[test]
    fn local_pipeline_order() {
        let names: Vec<_> = local_pipeline_stages("v")
            .into_iter()
            .map(|s| s.command)
            .collect();
        assert_eq!(names, vec!["analyze", "calculate-rank", "reindex-lexical"]);
    }

    #[test]
    fn complete_setup_appends_embed_last() {
        let stages = complete_setup_stages("v", true);
        assert_eq!(stages.len(), 4);
        assert_eq!(stages[3].command, "embed");
        assert_eq!(complete_setup_stages("v", false).len(), 3);
    }
}
