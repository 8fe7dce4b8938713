//! Property tests for status derivation over arbitrary version lists.

use ifs_mcp::status::{decide_toggle, ToggleAction};
use ifs_mcp::versions::{derive_status, ready_versions, Status, VersionFlags, VersionRecord};
use proptest::prelude::*;

fn version_record() -> impl Strategy<Value = VersionRecord> {
    (
        "[0-9]{2}\\.[0-9]\\.[0-9]",
        any::<[bool; 5]>(),
    )
        .prop_map(|(id, [analysis, lexical, vector, rank, reported])| VersionRecord {
            id,
            flags: VersionFlags {
                has_analysis: analysis,
                has_lexical_index: lexical,
                has_vector_index: vector,
                has_rank: rank,
                ..Default::default()
            },
            is_ready: reported,
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn running_server_dominates(versions in prop::collection::vec(version_record(), 0..8)) {
        prop_assert_eq!(derive_status(&versions, true), Status::ServerRunning);
    }

    #[test]
    fn ready_count_matches_flag_conjunction(versions in prop::collection::vec(version_record(), 1..8)) {
        let ready = versions
            .iter()
            .filter(|v| v.flags.has_rank && v.flags.has_lexical_index && v.flags.has_vector_index)
            .count();

        let expected = if ready > 0 {
            Status::VersionsReady(ready)
        } else {
            Status::VersionsNeedSetup(versions.len())
        };
        prop_assert_eq!(derive_status(&versions, false), expected);
    }

    #[test]
    fn reported_readiness_is_ignored(versions in prop::collection::vec(version_record(), 0..8)) {
        let flipped: Vec<_> = versions
            .iter()
            .cloned()
            .map(|mut v| {
                v.is_ready = !v.is_ready;
                v
            })
            .collect();

        prop_assert_eq!(derive_status(&versions, false), derive_status(&flipped, false));
    }

    #[test]
    fn toggle_starts_only_ready_versions(versions in prop::collection::vec(version_record(), 0..8)) {
        let status = derive_status(&versions, false);
        match decide_toggle(status, &versions) {
            ToggleAction::StartServer { ready } => {
                prop_assert!(!ready.is_empty());
                let expected: Vec<_> = ready_versions(&versions).into_iter().map(|v| v.id.clone()).collect();
                prop_assert_eq!(ready, expected);
            }
            ToggleAction::GuideSetup => prop_assert!(ready_versions(&versions).is_empty()),
            other => prop_assert!(false, "unexpected action {:?}", other),
        }
    }
}
