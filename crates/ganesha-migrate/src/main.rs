// # ganesha-migrate - NFS-Ganesha export migration
//
// Thin integration layer over ganesha-core:
// 1. Read configuration from environment variables
// 2. Load one `<daemon>.conf` per daemon from a directory
// 3. Consolidate the exports and write them as shared objects
//
// All parsing, consolidation and persistence logic lives in ganesha-core.
//
// ## Configuration
//
// - `GANESHA_POOL`: Pool the objects belong to (required)
// - `GANESHA_CONF_DIR`: Directory of `<daemon>.conf` files (required)
// - `GANESHA_STORE_PATH`: Root directory of the object store (required)
// - `GANESHA_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// Objects end up in `$GANESHA_STORE_PATH/$GANESHA_POOL/ganesha/`.
//
// ## Example
//
// ```bash
// export GANESHA_POOL=cephfs_data
// export GANESHA_CONF_DIR=/srv/ganesha/collected
// export GANESHA_STORE_PATH=/var/lib/ganesha/objects
//
// ganesha-migrate
// ```

use anyhow::{Context, Result};
use ganesha_core::config::{DEFAULT_ROLE, MigrationConfig, StoreConfig};
use ganesha_core::consolidate::consolidate_with;
use ganesha_core::migration::{DaemonConfig, validate_daemon_configs};
use ganesha_core::persist::persist;
use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Extension of collected daemon config files
const CONF_EXTENSION: &str = "conf";

/// Exit codes
///
/// - 0: Migration complete
/// - 1: Configuration or startup error
/// - 2: Migration failed
#[derive(Debug, Clone, Copy)]
enum MigrateExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<MigrateExitCode> for ExitCode {
    fn from(code: MigrateExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    pool: String,
    conf_dir: PathBuf,
    store_path: String,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            pool: env::var("GANESHA_POOL").context("GANESHA_POOL is required")?,
            conf_dir: env::var("GANESHA_CONF_DIR")
                .context("GANESHA_CONF_DIR is required")?
                .into(),
            store_path: env::var("GANESHA_STORE_PATH")
                .context("GANESHA_STORE_PATH is required")?,
            log_level: env::var("GANESHA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if !self.conf_dir.is_dir() {
            anyhow::bail!(
                "GANESHA_CONF_DIR is not a directory: {}",
                self.conf_dir.display()
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "GANESHA_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.migration_config().validate()?;

        Ok(())
    }

    fn migration_config(&self) -> MigrationConfig {
        let mut config = MigrationConfig::new(self.pool.clone());
        config.store = StoreConfig::File {
            path: self.store_path.clone(),
        };
        config
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return MigrateExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return MigrateExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return MigrateExitCode::ConfigError.into();
    }

    info!("Starting ganesha-migrate");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return MigrateExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_migration(config).await {
            error!("Migration failed: {:#}", e);
            MigrateExitCode::RuntimeError
        } else {
            MigrateExitCode::Success
        }
    });

    result.into()
}

/// Load, consolidate and persist
async fn run_migration(config: Config) -> Result<()> {
    let migration = config.migration_config();
    let daemons = load_daemon_configs(&config.conf_dir, DEFAULT_ROLE).await?;
    if daemons.is_empty() {
        anyhow::bail!(
            "No *.{} files found in {}",
            CONF_EXTENSION,
            config.conf_dir.display()
        );
    }
    info!("Loaded {} daemon config(s)", daemons.len());

    validate_daemon_configs(&daemons, &migration.parser)?;

    let canonical = consolidate_with(
        daemons.iter().map(|d| (d.daemon_id.clone(), d.raw.as_str())),
        &migration.parser,
    )?;
    for daemon in &canonical.exports_per_daemon {
        info!("Daemon {} serves exports {:?}", daemon.daemon, daemon.export_ids);
    }

    let store = ganesha_core::store::open(&migration).await?;
    let report = persist(&canonical, &migration.pool, &*store).await?;

    info!(
        "Migration complete: {} export(s), {} object(s) written, {} unchanged",
        canonical.len(),
        report.written.len(),
        report.unchanged.len()
    );
    Ok(())
}

/// Read every `<daemon>.conf` below `dir`, sorted by daemon id
async fn load_daemon_configs(dir: &Path, role: &str) -> Result<Vec<DaemonConfig>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .with_context(|| format!("Failed to read {}", dir.display()))?;

    let mut daemons = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(CONF_EXTENSION) {
            continue;
        }
        let Some(daemon_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        daemons.push(DaemonConfig::new(role, daemon_id, daemon_id, raw));
    }

    daemons.sort_by(|a, b| a.daemon_id.cmp(&b.daemon_id));
    Ok(daemons)
}
