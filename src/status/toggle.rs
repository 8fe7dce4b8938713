//! The single "do the obvious thing" action behind the status indicator.

use crate::versions::{ready_versions, Status, VersionRecord};

/// What a toggle should do given the current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleAction {
    /// Server is running: offer to stop it.
    StopServer,
    /// Start the server; carries the ready version ids to choose from.
    StartServer { ready: Vec<String> },
    /// Installed but nothing is ready: guide the user to setup.
    GuideSetup,
    /// Not installed: offer installation.
    OfferInstall,
    /// An installation is running elsewhere; nothing to do yet.
    Wait,
}

/// Decide the toggle action.
pub fn decide_toggle(status: Status, versions: &[VersionRecord]) -> ToggleAction {
    match status {
        Status::ServerRunning => ToggleAction::StopServer,
        Status::VersionsReady(_) => ToggleAction::StartServer {
            ready: ready_versions(versions)
                .into_iter()
                .map(|v| v.id.clone())
                .collect(),
        },
        Status::NoVersions | Status::VersionsNeedSetup(_) => ToggleAction::GuideSetup,
        Status::NotInstalled => ToggleAction::OfferInstall,
        Status::InstallInProgress => ToggleAction::Wait,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versions::VersionFlags;

    fn ready(id: &str) -> VersionRecord {
        VersionRecord {
            id: id.to_string(),
            flags: VersionFlags {
                has_rank: true,
                has_lexical_index: true,
                has_vector_index: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn running_offers_stop() {
        assert_eq!(decide_toggle(Status::ServerRunning, &[]), ToggleAction::StopServer);
    }

    #[test]
    fn ready_starts_with_ready_ids_only() {
        let versions = vec![
            ready("25.1.0"),
            VersionRecord {
                id: "24.2.1".into(),
                ..Default::default()
            },
        ];
        assert_eq!(
            decide_toggle(Status::VersionsReady(1), &versions),
            ToggleAction::StartServer {
                ready: vec!["25.1.0".to_string()]
            }
        );
    }

    #[test]
    fn remaining_states() {
        assert_eq!(decide_toggle(Status::NoVersions, &[]), ToggleAction::GuideSetup);
        assert_eq!(decide_toggle(Status::VersionsNeedSetup(2), &[]), ToggleAction::GuideSetup);
        assert_eq!(decide_toggle(Status::NotInstalled, &[]), ToggleAction::OfferInstall);
        assert_eq!(decide_toggle(Status::InstallInProgress, &[]), ToggleAction::Wait);
    }
}
