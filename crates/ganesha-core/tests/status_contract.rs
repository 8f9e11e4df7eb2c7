//! Contract Test: Export Status Reconciliation
//!
//! Constraints verified:
//! - Hosts missing from live status, or failing, are reported inactive
//! - Live export state is copied for configured exports it knows about
//! - Configured exports unknown to the daemon are reported as not exported
//! - Live status is fetched once for the requested role
//!
//! If this test fails, the dashboard may show dead exports as healthy.

mod common;

use common::*;
use ganesha_core::status::SERVICE_NOT_RUNNING;
use ganesha_core::traits::{LiveExport, LiveStatus};
use ganesha_core::{HostExportSet, check_exports_status, reconcile};
use std::collections::HashMap;

fn configured() -> Vec<HostExportSet> {
    serde_json::from_str(
        r#"[
            {"host": "H", "exports": [
                {"export_id": 3, "path": "/", "pseudo": "/three"},
                {"export_id": 5, "path": "/volumes/five", "pseudo": "/five"}
            ]},
            {"host": "down", "exports": [{"export_id": 1, "path": "/"}]},
            {"host": "failing", "exports": [{"export_id": 1, "path": "/"}]}
        ]"#,
    )
    .unwrap()
}

fn live() -> HashMap<String, LiveStatus> {
    HashMap::from([
        (
            "H".to_string(),
            LiveStatus::running(vec![LiveExport {
                export_id: 3,
                active: true,
                message: None,
            }]),
        ),
        (
            "failing".to_string(),
            LiveStatus::failed("Failed to connect to DBus"),
        ),
    ])
}

#[test]
fn missing_export_reported_with_pseudo() {
    let reports = reconcile(&configured(), &live());
    let host = &reports["H"];
    assert!(host.active);
    assert_eq!(host.exports.len(), 2);

    assert_eq!(host.exports[0].export_id, Some(3));
    assert!(host.exports[0].active);
    assert_eq!(host.exports[0].message, None);

    assert_eq!(host.exports[1].export_id, Some(5));
    assert!(!host.exports[1].active);
    assert_eq!(host.exports[1].message.as_deref(), Some("/five is not exported"));
}

#[test]
fn unreachable_hosts_are_inactive() {
    let reports = reconcile(&configured(), &live());

    let down = &reports["down"];
    assert!(!down.active);
    assert_eq!(down.message.as_deref(), Some(SERVICE_NOT_RUNNING));
    assert!(down.exports.is_empty());

    let failing = &reports["failing"];
    assert!(!failing.active);
    assert_eq!(failing.message.as_deref(), Some("Failed to connect to DBus"));
}

#[test]
fn live_status_parsed_from_json() {
    let live: HashMap<String, LiveStatus> = serde_json::from_str(
        r#"{"H": {"success": true, "exports": [
            {"export_id": 5, "active": false, "message": "Export failed: path not found"}
        ]}}"#,
    )
    .unwrap();
    let reports = reconcile(&configured(), &live);
    let five = &reports["H"].exports[1];
    assert!(!five.active);
    assert_eq!(five.message.as_deref(), Some("Export failed: path not found"));
    assert_eq!(
        reports["H"].exports[0].message.as_deref(),
        Some("/three is not exported")
    );
}

#[tokio::test]
async fn check_fetches_status_for_role() {
    let service = StaticLiveStatus::new(live());
    let reports = check_exports_status(&configured(), &service, "ganesha")
        .await
        .unwrap();
    assert_eq!(service.queried_roles(), vec!["ganesha"]);
    assert_eq!(
        reports.keys().collect::<Vec<_>>(),
        vec!["H", "down", "failing"]
    );
}
