//! Export status reconciliation
//!
//! Compares what each host is configured to export with what its running
//! daemon reports.

use crate::exports::HostExportSet;
use crate::traits::{LiveStatus, LiveStatusService};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Message for hosts whose daemon did not answer
pub const SERVICE_NOT_RUNNING: &str = "nfs-ganesha service not running";

/// Status of one configured export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    pub export_id: Option<i64>,
    pub active: bool,
    pub message: Option<String>,
}

/// Status of one host
///
/// Serialized `exports` is present for every active host, even when empty,
/// and absent for hosts whose daemon did not answer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostReport {
    pub active: bool,
    #[serde(default)]
    pub message: Option<String>,
    /// Per-export detail, only when the daemon answered
    #[serde(default)]
    pub exports: Vec<ExportReport>,
}

impl Serialize for HostReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 1 + usize::from(self.message.is_some()) + usize::from(self.active);
        let mut state = serializer.serialize_struct("HostReport", len)?;
        state.serialize_field("active", &self.active)?;
        match &self.message {
            Some(message) => state.serialize_field("message", message)?,
            None => state.skip_field("message")?,
        }
        if self.active {
            state.serialize_field("exports", &self.exports)?;
        } else {
            state.skip_field("exports")?;
        }
        state.end()
    }
}

impl HostReport {
    fn down(message: Option<&str>) -> Self {
        Self {
            active: false,
            message: Some(message.unwrap_or(SERVICE_NOT_RUNNING).to_string()),
            exports: Vec::new(),
        }
    }
}

/// Reconcile configured exports against live daemon status
///
/// Host sets without a `host` are skipped.
pub fn reconcile(
    configured: &[HostExportSet],
    live: &HashMap<String, LiveStatus>,
) -> BTreeMap<String, HostReport> {
    let mut reports = BTreeMap::new();
    for set in configured {
        let Some(host) = set.host.as_deref() else {
            continue;
        };

        let status = match live.get(host) {
            Some(status) if status.success => status,
            other => {
                let message = other.and_then(|s| s.message.as_deref());
                debug!("Daemon on {} is not running", host);
                reports.insert(host.to_string(), HostReport::down(message));
                continue;
            }
        };

        let exports = set
            .exports()
            .iter()
            .map(|export| {
                let export_id = export.export_id();
                match export_id.and_then(|id| status.find(id)) {
                    Some(live) => ExportReport {
                        export_id,
                        active: live.active,
                        message: live.message.clone(),
                    },
                    None => ExportReport {
                        export_id,
                        active: false,
                        message: Some(format!(
                            "{} is not exported",
                            export.pseudo().or(export.path()).unwrap_or_default()
                        )),
                    },
                }
            })
            .collect();

        reports.insert(
            host.to_string(),
            HostReport {
                active: true,
                message: None,
                exports,
            },
        );
    }
    reports
}

/// Fetch live status for `role` and reconcile `configured` against it
pub async fn check_exports_status(
    configured: &[HostExportSet],
    live_service: &dyn LiveStatusService,
    role: &str,
) -> Result<BTreeMap<String, HostReport>, crate::Error> {
    let live = live_service.exports_info(role).await?;
    debug!("Live status of role {} fetched for {} host(s)", role, live.len());
    Ok(reconcile(configured, &live))
}
