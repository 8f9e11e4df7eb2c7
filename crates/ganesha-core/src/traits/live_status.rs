//! Live export status reported by running daemons

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of one export as seen by its daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveExport {
    pub export_id: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Status report of one daemon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveStatus {
    /// Whether the daemon answered
    pub success: bool,
    /// Failure detail when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub exports: Vec<LiveExport>,
}

impl LiveStatus {
    pub fn running(exports: Vec<LiveExport>) -> Self {
        Self {
            success: true,
            message: None,
            exports,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            exports: Vec::new(),
        }
    }

    pub fn find(&self, export_id: i64) -> Option<&LiveExport> {
        self.exports.iter().find(|e| e.export_id == export_id)
    }
}

/// Source of live status for every daemon of a role
#[async_trait]
pub trait LiveStatusService: Send + Sync {
    /// Status keyed by host; hosts that did not answer are absent
    async fn exports_info(&self, role: &str) -> Result<HashMap<String, LiveStatus>, crate::Error>;
}
