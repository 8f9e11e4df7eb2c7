//! Export migration runner
//!
//! Moves a fleet of daemons from one local `ganesha.conf` each to shared
//! export objects.
//!
//! ## Flow
//!
//! ```text
//! DaemonConfig (per host)
//!        │
//!        ▼
//!   validate ──► consolidate ──► persist ──► backup configs ──► flag restart
//!                    │              │              │                  │
//!                    ▼              ▼              ▼                  ▼
//!                          MigrationEvent (bounded channel)
//! ```
//!
//! 1. Reject hosts listed twice and configs with no blocks
//! 2. Merge exports, in host name order
//! 3. Write `export-{id}` and `conf-{daemon}` objects
//! 4. Back up every host's config file, and the master's cached copy of it,
//!    through [`RemoteExec`]
//! 5. If anything was exported, set `restart_{role}` on every role
//!
//! Any failure stops the run. Objects already written stay written; a rerun
//! with the same input finds them unchanged.

mod validate;

pub use validate::{DaemonConfig, validate_daemon_configs};

use crate::config::MigrationConfig;
use crate::consolidate::{DaemonExports, consolidate_with};
use crate::error::{MigrationError, Result};
use crate::persist::persist;
use crate::traits::{ObjectStore, RemoteExec, role_target};
use serde_json::Value as Json;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Remote operation copying a file to `<path><suffix>` unless that exists
pub const BACKUP_OPERATION: &str = "ganesha.backup_config_file";

/// Remote operation setting a host grain
pub const SET_GRAIN_OPERATION: &str = "grains.set";

/// Events emitted while a migration runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    /// Run started
    Started { daemons: usize },

    /// Exports merged
    Consolidated { exports: usize, daemons: usize },

    /// Objects stored
    Persisted { written: usize, unchanged: usize },

    /// A host already had a backup of its config
    BackupSkipped { minion: String },

    /// The master already had a backup of a cached daemon config
    CacheBackupSkipped { path: String },

    /// Restart flag set for a role
    RestartRequested { role: String },

    /// Run finished
    Finished { exports: usize },
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSummary {
    /// Number of canonical exports
    pub export_count: usize,
    /// Export ids per daemon
    pub exports_per_daemon: Vec<DaemonExports>,
    /// Objects created
    pub written: Vec<String>,
    /// Objects that already held the same content
    pub unchanged: Vec<String>,
    /// Hosts whose config already had a backup
    pub skipped_backups: Vec<String>,
    /// Master cache files that already had a backup
    pub skipped_cache_backups: Vec<String>,
    /// Roles flagged for restart
    pub restarted_roles: Vec<String>,
}

/// Export migration runner
///
/// ## Lifecycle
///
/// 1. Create with [`ExportMigration::new()`]
/// 2. Collect one [`DaemonConfig`] per host
/// 3. Call [`ExportMigration::run()`]
///
/// Events are sent with `try_send`; when the receiver falls behind they are
/// dropped with a warning and the run continues.
pub struct ExportMigration {
    store: Box<dyn ObjectStore>,
    remote: Box<dyn RemoteExec>,
    config: MigrationConfig,
    event_tx: mpsc::Sender<MigrationEvent>,
}

impl ExportMigration {
    /// Create a new migration runner
    ///
    /// # Returns
    ///
    /// A tuple of (runner, event_receiver)
    pub fn new(
        store: Box<dyn ObjectStore>,
        remote: Box<dyn RemoteExec>,
        config: MigrationConfig,
    ) -> Result<(Self, mpsc::Receiver<MigrationEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let runner = Self {
            store,
            remote,
            config,
            event_tx: tx,
        };

        Ok((runner, rx))
    }

    /// Run the migration over `daemons`
    pub async fn run(
        &self,
        mut daemons: Vec<DaemonConfig>,
    ) -> std::result::Result<MigrationSummary, MigrationError> {
        self.emit_event(MigrationEvent::Started {
            daemons: daemons.len(),
        });

        validate_daemon_configs(&daemons, &self.config.parser)?;

        daemons.sort_by(|a, b| a.minion.cmp(&b.minion));
        let canonical = consolidate_with(
            daemons.iter().map(|d| (d.daemon_id.clone(), d.raw.as_str())),
            &self.config.parser,
        )?;
        info!(
            "Export list consolidated: {} export(s), {} daemon(s)",
            canonical.len(),
            canonical.exports_per_daemon.len()
        );
        self.emit_event(MigrationEvent::Consolidated {
            exports: canonical.len(),
            daemons: canonical.exports_per_daemon.len(),
        });

        let report = persist(&canonical, &self.config.pool, &*self.store).await?;
        self.emit_event(MigrationEvent::Persisted {
            written: report.written.len(),
            unchanged: report.unchanged.len(),
        });

        let backups = self.backup_configs(&daemons).await?;

        let mut restarted_roles = Vec::new();
        if !canonical.is_empty() {
            for role in &self.config.roles {
                self.request_restart(role).await?;
                restarted_roles.push(role.clone());
            }
        }

        self.emit_event(MigrationEvent::Finished {
            exports: canonical.len(),
        });
        info!("Migration complete: {} export(s)", canonical.len());

        Ok(MigrationSummary {
            export_count: canonical.len(),
            exports_per_daemon: canonical.exports_per_daemon,
            written: report.written,
            unchanged: report.unchanged,
            skipped_backups: backups.hosts,
            skipped_cache_backups: backups.cache_files,
            restarted_roles,
        })
    }

    /// Back up the config file on every host of every role
    ///
    /// For each host that answered, the master's cached copy of that
    /// daemon's config is backed up as well. Existing backups are only
    /// reported.
    async fn backup_configs(
        &self,
        daemons: &[DaemonConfig],
    ) -> std::result::Result<SkippedBackups, MigrationError> {
        let conf_path = &self.config.conf_path;
        let backup_path = self.config.backup_path();
        let daemon_ids: HashMap<(&str, &str), &str> = daemons
            .iter()
            .map(|d| ((d.role.as_str(), d.minion.as_str()), d.daemon_id.as_str()))
            .collect();
        let mut skipped = SkippedBackups::default();

        for role in &self.config.roles {
            let replies = self
                .call(&role_target(role), BACKUP_OPERATION, &[conf_path.clone()])
                .await?;
            if replies.is_empty() {
                return Err(MigrationError::remote(
                    BACKUP_OPERATION,
                    format!("Failed to backup {} from role '{}'", conf_path, role),
                ));
            }

            let mut replies: Vec<_> = replies.into_iter().collect();
            replies.sort_by(|a, b| a.0.cmp(&b.0));
            for (minion, reply) in replies {
                if !backup_done(&minion, reply)? {
                    warn!(
                        "{}: backup of {} ignored as a backup already existed",
                        minion, conf_path
                    );
                    self.emit_event(MigrationEvent::BackupSkipped {
                        minion: minion.clone(),
                    });
                    skipped.hosts.push(minion.clone());
                } else {
                    debug!("Config of {} backed up to {}", minion, backup_path);
                }

                let Some(daemon_id) = daemon_ids.get(&(role.as_str(), minion.as_str())) else {
                    return Err(MigrationError::remote(
                        BACKUP_OPERATION,
                        format!("{}: no config was collected from this host", minion),
                    ));
                };
                let cache_file = self.config.cache_file(role, daemon_id);
                if !self.backup_cache_file(role, &cache_file).await? {
                    warn!(
                        "backup of {} ignored as a backup already existed",
                        cache_file
                    );
                    self.emit_event(MigrationEvent::CacheBackupSkipped {
                        path: cache_file.clone(),
                    });
                    skipped.cache_files.push(cache_file);
                }
            }
        }
        Ok(skipped)
    }

    /// Back up `cache_file` on the master; `false` when a backup existed
    async fn backup_cache_file(
        &self,
        role: &str,
        cache_file: &str,
    ) -> std::result::Result<bool, MigrationError> {
        let master = &self.config.master;
        let mut replies = self
            .call(master, BACKUP_OPERATION, &[cache_file.to_string()])
            .await?;
        if replies.is_empty() {
            return Err(MigrationError::remote(
                BACKUP_OPERATION,
                format!("Failed to backup cache ganesha.conf from role '{}'", role),
            ));
        }
        let reply = replies.remove(master).unwrap_or(Json::Null);
        backup_done(master, reply)
    }

    /// Flag every host of `role` for a daemon restart
    async fn request_restart(&self, role: &str) -> std::result::Result<(), MigrationError> {
        let args = [format!("restart_{}", role), "true".to_string()];
        let replies = self
            .call(&role_target(role), SET_GRAIN_OPERATION, &args)
            .await?;
        if replies.is_empty() {
            return Err(MigrationError::remote(
                SET_GRAIN_OPERATION,
                "Failed to set restart grains.",
            ));
        }
        for (minion, reply) in &replies {
            if !reply.is_object() {
                return Err(MigrationError::remote(
                    SET_GRAIN_OPERATION,
                    format!("Failed to set restart grain in {}:\n{}", minion, reply_text(reply)),
                ));
            }
        }
        info!("Restart of {} requested on {} host(s)", role, replies.len());
        self.emit_event(MigrationEvent::RestartRequested {
            role: role.to_string(),
        });
        Ok(())
    }

    async fn call(
        &self,
        target: &str,
        operation: &str,
        args: &[String],
    ) -> std::result::Result<HashMap<String, Json>, MigrationError> {
        self.remote
            .run(target, operation, args)
            .await
            .map_err(|e| MigrationError::remote(operation, e.to_string()))
    }

    fn emit_event(&self, event: MigrationEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event");
        }
    }
}

#[derive(Debug, Default)]
struct SkippedBackups {
    hosts: Vec<String>,
    cache_files: Vec<String>,
}

/// `true` if a backup was made, `false` if one already existed
fn backup_done(minion: &str, reply: Json) -> std::result::Result<bool, MigrationError> {
    match reply {
        Json::Bool(done) => Ok(done),
        other => Err(MigrationError::remote(
            BACKUP_OPERATION,
            format!("{}: {}", minion, reply_text(&other)),
        )),
    }
}

/// Remote replies are usually error strings; show those without quotes
fn reply_text(reply: &Json) -> String {
    match reply {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}
