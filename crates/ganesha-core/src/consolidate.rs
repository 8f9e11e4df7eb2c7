//! Export consolidation
//!
//! Each daemon used to carry its own copy of every export it served, each
//! with a locally chosen `export_id`. Consolidation merges those copies into
//! one canonical list with ids `1, 2, 3, …` and records which daemons serve
//! which ids.
//!
//! Two exports are the same export when they are equal in everything except
//! `export_id`. Canonical order is first-encounter order over the daemons in
//! the order given, so callers must supply a deterministic daemon order for
//! ids to be reproducible.

use crate::conf::{self, Block, BlockKind, EXPORT_ID_KEY, ParserOptions, Value};
use crate::error::ConsolidationError;
use tracing::{debug, info};

/// One deduplicated export and the daemons serving it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalExport {
    /// The EXPORT block, `export_id` set to its canonical id
    pub export: Block,
    /// Daemons serving it, in first-seen order
    pub daemons: Vec<String>,
}

impl CanonicalExport {
    pub fn export_id(&self) -> i64 {
        self.export.export_id().unwrap_or_default()
    }
}

/// Export ids assigned to one daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonExports {
    pub daemon: String,
    /// Ids in the order the daemon's own config listed them
    pub export_ids: Vec<i64>,
}

/// Result of consolidation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalExportSet {
    /// Canonical exports in id order
    pub exports: Vec<CanonicalExport>,
    /// Daemons that contributed at least one export, in input order
    pub exports_per_daemon: Vec<DaemonExports>,
}

impl CanonicalExportSet {
    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Export ids served by `daemon`
    pub fn exports_for(&self, daemon: &str) -> Option<&[i64]> {
        self.exports_per_daemon
            .iter()
            .find(|d| d.daemon == daemon)
            .map(|d| d.export_ids.as_slice())
    }

    pub fn export(&self, export_id: i64) -> Option<&CanonicalExport> {
        self.exports.iter().find(|e| e.export_id() == export_id)
    }
}

/// Consolidate raw per-daemon configs
///
/// # Example
///
/// ```
/// use ganesha_core::consolidate;
///
/// let export = r#"EXPORT { export_id = 9; path = "/"; FSAL { name = "CEPH"; } }"#;
/// let set = consolidate([("d1", export), ("d2", export)]).unwrap();
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.exports_for("d2"), Some(&[1][..]));
/// ```
pub fn consolidate<I, K, V>(per_daemon: I) -> Result<CanonicalExportSet, ConsolidationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    consolidate_with(per_daemon, &ParserOptions::default())
}

/// Consolidate raw per-daemon configs with explicit grammar options
pub fn consolidate_with<I, K, V>(
    per_daemon: I,
    options: &ParserOptions,
) -> Result<CanonicalExportSet, ConsolidationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<str>,
{
    let mut parsed = Vec::new();
    for (daemon, raw) in per_daemon {
        let daemon = daemon.into();
        let blocks = conf::parse_config_with(raw.as_ref(), options)
            .map_err(|source| ConsolidationError::Parse {
                daemon: daemon.clone(),
                source,
            })?;
        parsed.push((daemon, blocks));
    }
    consolidate_blocks(parsed)
}

/// Consolidate already parsed per-daemon block lists
pub fn consolidate_blocks<I>(per_daemon: I) -> Result<CanonicalExportSet, ConsolidationError>
where
    I: IntoIterator<Item = (String, Vec<Block>)>,
{
    let mut consolidator = Consolidator::default();
    for (daemon, blocks) in per_daemon {
        for export in blocks.into_iter().filter(|b| b.kind() == BlockKind::Export) {
            consolidator.add(export, &daemon)?;
        }
    }
    let set = consolidator.finish();
    info!(
        "Consolidated {} export(s) across {} daemon(s)",
        set.exports.len(),
        set.exports_per_daemon.len()
    );
    Ok(set)
}

#[derive(Debug, Default)]
struct Consolidator {
    canonical: Vec<CanonicalExport>,
    per_daemon: Vec<DaemonExports>,
    next_id: i64,
}

impl Consolidator {
    fn add(&mut self, export: Block, daemon: &str) -> Result<(), ConsolidationError> {
        let mut matches = self
            .canonical
            .iter()
            .enumerate()
            .filter(|(_, c)| c.export.same_export_as(&export))
            .map(|(idx, _)| idx);

        let (idx, export_id) = match (matches.next(), matches.next()) {
            (Some(idx), None) => {
                let entry = &mut self.canonical[idx];
                if !entry.daemons.iter().any(|d| d == daemon) {
                    entry.daemons.push(daemon.to_string());
                }
                debug!("Merged duplicate export from {} into {}", daemon, entry.export_id());
                (idx, entry.export_id())
            }
            (Some(_), Some(_)) => {
                let matches = 2 + matches.count();
                return Err(ConsolidationError::AmbiguousDuplicate {
                    daemon: daemon.to_string(),
                    matches,
                });
            }
            (None, _) => {
                self.next_id += 1;
                let export_id = self.next_id;
                let mut export = export;
                export.attributes.insert(EXPORT_ID_KEY, Value::Int(export_id));
                debug!("New canonical export {} from {}", export_id, daemon);
                self.canonical.push(CanonicalExport {
                    export,
                    daemons: vec![daemon.to_string()],
                });
                (self.canonical.len() - 1, export_id)
            }
        };
        debug_assert_eq!(self.canonical[idx].export_id(), export_id);

        self.record(daemon, export_id);
        Ok(())
    }

    fn record(&mut self, daemon: &str, export_id: i64) {
        match self.per_daemon.iter_mut().find(|d| d.daemon == daemon) {
            Some(entry) if entry.export_ids.contains(&export_id) => {}
            Some(entry) => entry.export_ids.push(export_id),
            None => self.per_daemon.push(DaemonExports {
                daemon: daemon.to_string(),
                export_ids: vec![export_id],
            }),
        }
    }

    fn finish(self) -> CanonicalExportSet {
        CanonicalExportSet {
            exports: self.canonical,
            exports_per_daemon: self.per_daemon,
        }
    }
}
