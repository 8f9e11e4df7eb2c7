//! Configuration types for the export migration
//!
//! This module defines the settings shared by the migration runner and the
//! `ganesha-migrate` binary.

use serde::{Deserialize, Serialize};

use crate::conf::ParserOptions;

/// Role used when no roles are configured
pub const DEFAULT_ROLE: &str = "ganesha";

/// Daemon config file backed up after migration
pub const DEFAULT_CONF_PATH: &str = "/etc/ganesha/ganesha.conf";

/// Suffix appended to backed up config files
pub const DEFAULT_BACKUP_SUFFIX: &str = ".ses5.bak";

/// Minion id of the Salt master
pub const DEFAULT_MASTER: &str = "admin";

/// Directory on the master caching each daemon's generated config
pub const DEFAULT_CACHE_DIR: &str = "/srv/salt/ceph/ganesha/cache";

/// Capacity of the migration event channel
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 64;

/// Main migration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Pool holding the export objects
    pub pool: String,

    /// Ganesha roles whose daemons take part
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,

    /// Per-daemon config file to back up once migrated
    #[serde(default = "default_conf_path")]
    pub conf_path: String,

    /// Suffix of the backup copy
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,

    /// Minion id of the Salt master
    #[serde(default = "default_master")]
    pub master: String,

    /// Master directory holding `{role}.{daemon_id}.conf` cache files
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    /// Where objects are written
    #[serde(default)]
    pub store: StoreConfig,

    /// Grammar switches for reading daemon configs
    #[serde(default)]
    pub parser: ParserOptions,

    /// Bounded capacity of the migration event channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl MigrationConfig {
    /// Create a configuration for `pool` with defaults for everything else
    pub fn new(pool: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            roles: default_roles(),
            conf_path: default_conf_path(),
            backup_suffix: default_backup_suffix(),
            master: default_master(),
            cache_dir: default_cache_dir(),
            store: StoreConfig::default(),
            parser: ParserOptions::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.pool.is_empty() {
            return Err(crate::Error::config("Pool name cannot be empty"));
        }
        if self.pool.contains('/') {
            return Err(crate::Error::config(format!(
                "Pool name cannot contain '/': {}",
                self.pool
            )));
        }
        if self.roles.is_empty() {
            return Err(crate::Error::config("At least one ganesha role is required"));
        }
        if self.roles.iter().any(String::is_empty) {
            return Err(crate::Error::config("Role names cannot be empty"));
        }
        if self.conf_path.is_empty() {
            return Err(crate::Error::config("Config path cannot be empty"));
        }
        if self.backup_suffix.is_empty() {
            return Err(crate::Error::config("Backup suffix cannot be empty"));
        }
        if self.master.is_empty() {
            return Err(crate::Error::config("Master minion id cannot be empty"));
        }

        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.store.validate()?;

        Ok(())
    }

    /// Backup location of the daemon config file
    pub fn backup_path(&self) -> String {
        format!("{}{}", self.conf_path, self.backup_suffix)
    }

    /// Master-side cache file of a daemon's config
    pub fn cache_file(&self, role: &str, daemon_id: &str) -> String {
        format!(
            "{}/{}.{}.conf",
            self.cache_dir.trim_end_matches('/'),
            role,
            daemon_id
        )
    }
}

fn default_roles() -> Vec<String> {
    vec![DEFAULT_ROLE.to_string()]
}

fn default_conf_path() -> String {
    DEFAULT_CONF_PATH.to_string()
}

fn default_backup_suffix() -> String {
    DEFAULT_BACKUP_SUFFIX.to_string()
}

fn default_master() -> String {
    DEFAULT_MASTER.to_string()
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

fn default_event_channel_capacity() -> usize {
    DEFAULT_EVENT_CHANNEL_CAPACITY
}

/// Object store configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// One file per object below `path`
    File {
        /// Root directory
        path: String,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("File store path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}
