// # Export Store Adapter
//
// Writes a consolidated export set into the object store.
//
// ## Objects
//
// - `export-{id}`: the canonical EXPORT block, rendered alone
// - `conf-{daemon}`: one `%url "rados://{pool}/ganesha/export-{id}"` line
//   per export the daemon serves
//
// ## Write Semantics
//
// Objects are never overwritten. Every object is rendered and its key read
// before anything is written:
//
// - key absent: scheduled for writing
// - same bytes already stored: reported as unchanged
// - different bytes stored: `PersistError::Conflict`, nothing written
//
// Writes then run in order: exports by id, then daemons in consolidation
// order. A key that appears between preflight and write is checked again
// and fails the run if its content differs.

use crate::conf::{self, Block};
use crate::consolidate::{CanonicalExportSet, DaemonExports};
use crate::error::PersistError;
use crate::traits::{ObjectStore, WriteOutcome};
use tracing::{debug, info, warn};

/// Namespace all Ganesha objects live in
pub const NAMESPACE: &str = "ganesha";

/// Object name of a canonical export
pub fn export_object_name(export_id: i64) -> String {
    format!("export-{}", export_id)
}

/// Object name of a daemon's config
pub fn daemon_object_name(daemon: &str) -> String {
    format!("conf-{}", daemon)
}

/// Cross reference to an object, as used in `%url` directives
///
/// ```
/// use ganesha_core::persist::rados_url;
///
/// assert_eq!(rados_url("nfs", "export-1"), "rados://nfs/ganesha/export-1");
/// ```
pub fn rados_url(pool: &str, object: &str) -> String {
    format!("rados://{}/{}/{}", pool, NAMESPACE, object)
}

/// `%url` blocks a daemon's config object consists of
pub fn daemon_config_blocks(pool: &str, daemon: &DaemonExports) -> Vec<Block> {
    daemon
        .export_ids
        .iter()
        .map(|id| Block::url(rados_url(pool, &export_object_name(*id))))
        .collect()
}

/// Keys touched by a persist run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistReport {
    /// Objects created by this run, in write order
    pub written: Vec<String>,
    /// Objects that already held exactly the rendered content
    pub unchanged: Vec<String>,
}

/// Persist a canonical export set into `store`
pub async fn persist(
    canonical: &CanonicalExportSet,
    pool: &str,
    store: &dyn ObjectStore,
) -> Result<PersistReport, PersistError> {
    let objects = render_objects(canonical, pool);

    let mut report = PersistReport::default();
    let mut pending = Vec::with_capacity(objects.len());
    for (key, content) in objects {
        match existing(store, &key, &content).await? {
            Existing::Absent => pending.push((key, content)),
            Existing::Same => {
                warn!("Object {} already exists with identical content", key);
                report.unchanged.push(key);
            }
            Existing::Different => return Err(PersistError::Conflict(key)),
        }
    }
    debug!(
        "Preflight complete: {} pending, {} unchanged",
        pending.len(),
        report.unchanged.len()
    );

    for (key, content) in pending {
        let outcome = store
            .write_if_absent(&key, content.as_bytes())
            .await
            .map_err(store_error)?;
        match outcome {
            WriteOutcome::Written => {
                info!("Created object {}", key);
                report.written.push(key);
            }
            WriteOutcome::AlreadyExists => match existing(store, &key, &content).await? {
                Existing::Same => report.unchanged.push(key),
                _ => return Err(PersistError::Conflict(key)),
            },
        }
    }

    info!(
        "Export objects persisted: {} written, {} unchanged",
        report.written.len(),
        report.unchanged.len()
    );
    Ok(report)
}

/// Every object of a run, in write order
fn render_objects(canonical: &CanonicalExportSet, pool: &str) -> Vec<(String, String)> {
    let exports = canonical.exports.iter().map(|export| {
        let content = conf::write(std::slice::from_ref(&export.export));
        (export_object_name(export.export_id()), content)
    });
    let daemons = canonical.exports_per_daemon.iter().map(|daemon| {
        let content = conf::write(&daemon_config_blocks(pool, daemon));
        (daemon_object_name(&daemon.daemon), content)
    });
    exports.chain(daemons).collect()
}

enum Existing {
    Absent,
    Same,
    Different,
}

async fn existing(
    store: &dyn ObjectStore,
    key: &str,
    content: &str,
) -> Result<Existing, PersistError> {
    let stored = store.read(key).await.map_err(store_error)?;
    Ok(match stored {
        None => Existing::Absent,
        Some(bytes) if bytes == content.as_bytes() => Existing::Same,
        Some(_) => Existing::Different,
    })
}

fn store_error(err: crate::Error) -> PersistError {
    PersistError::Store(err.to_string())
}
