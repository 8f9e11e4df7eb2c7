//! Pre-migration checks on the collected daemon configs

use crate::conf::{self, ParserOptions};
use crate::error::{ConsolidationError, MigrationError};
use std::collections::HashMap;
use tracing::debug;

/// Config file content of one daemon, as collected from its host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Ganesha role the host was collected under
    pub role: String,
    /// Host the config was read from
    pub minion: String,
    /// Daemon identifier (short host name), used in object names
    pub daemon_id: String,
    /// Raw config text
    pub raw: String,
}

impl DaemonConfig {
    pub fn new(
        role: impl Into<String>,
        minion: impl Into<String>,
        daemon_id: impl Into<String>,
        raw: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            minion: minion.into(),
            daemon_id: daemon_id.into(),
            raw: raw.into(),
        }
    }
}

/// Check that the daemon set can be migrated
///
/// - no host appears twice, in the same role or in two roles
/// - every config parses to at least one block
pub fn validate_daemon_configs(
    daemons: &[DaemonConfig],
    options: &ParserOptions,
) -> Result<(), MigrationError> {
    let mut roles_by_minion: HashMap<&str, &str> = HashMap::new();
    for daemon in daemons {
        if let Some(first) = roles_by_minion.insert(&daemon.minion, &daemon.role) {
            return Err(MigrationError::DuplicateDaemon {
                minion: daemon.minion.clone(),
                first: first.to_string(),
                second: daemon.role.clone(),
            });
        }
    }

    for daemon in daemons {
        let blocks = conf::parse_config_with(&daemon.raw, options).map_err(|source| {
            ConsolidationError::Parse {
                daemon: daemon.daemon_id.clone(),
                source,
            }
        })?;
        if blocks.is_empty() {
            return Err(MigrationError::EmptyConfig(daemon.minion.clone()));
        }
        debug!("Config of {} parsed into {} block(s)", daemon.minion, blocks.len());
    }
    Ok(())
}
