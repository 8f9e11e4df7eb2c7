//! Host-level export views
//!
//! [`HostExportSet`] is the JSON shape exports travel in between the
//! management layer and this crate: one entry per host, each export a flat
//! attribute map with its `fsal` and `client_blocks` nested as maps.
//!
//! ```json
//! {
//!   "host": "data1.ceph",
//!   "exports": [{
//!     "export_id": 1,
//!     "path": "/",
//!     "pseudo": "/cephfs",
//!     "fsal": {"name": "CEPH"},
//!     "client_blocks": [{"clients": "10.0.0.0/24", "access_type": "RW"}]
//!   }]
//! }
//! ```

use crate::conf::{self, Attributes, Block, BlockKind, EXPORT_ID_KEY};
use crate::error::ParseError;
use serde::{Deserialize, Serialize};

/// FSAL attributes never shown in the export view
const SECRET_KEYS: [&str; 2] = ["secret_access_key", "access_key_id"];

/// Storage backends an export may be served from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsalKind {
    /// CephFS
    Ceph,
    /// RADOS gateway (S3 buckets)
    Rgw,
}

impl FsalKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CEPH" => Some(FsalKind::Ceph),
            "RGW" => Some(FsalKind::Rgw),
            _ => None,
        }
    }
}

/// Exports configured on one host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostExportSet {
    /// Host identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Exports served by the host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<Vec<ExportSpec>>,
}

impl HostExportSet {
    pub fn new(host: impl Into<String>, exports: Vec<ExportSpec>) -> Self {
        Self {
            host: Some(host.into()),
            exports: Some(exports),
        }
    }

    /// Exports, or an empty slice when the list is absent
    pub fn exports(&self) -> &[ExportSpec] {
        self.exports.as_deref().unwrap_or_default()
    }
}

/// One export, flattened for editing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportSpec {
    /// FSAL block attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsal: Option<Attributes>,

    /// CLIENT block attributes, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_blocks: Vec<Attributes>,

    /// Export attributes (`export_id`, `path`, `pseudo`, ...)
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl ExportSpec {
    /// Build the view of a parsed EXPORT block
    ///
    /// Credentials are stripped: `secret_access_key` and `access_key_id`
    /// everywhere, and the generated `user_id` of CEPH FSALs.
    pub fn from_block(block: &Block) -> Self {
        let mut spec = ExportSpec {
            attributes: visible_attributes(block),
            ..Default::default()
        };
        for child in &block.children {
            match child.kind() {
                BlockKind::Fsal => spec.fsal = Some(visible_attributes(child)),
                BlockKind::Client => spec.client_blocks.push(visible_attributes(child)),
                _ => {}
            }
        }
        spec
    }

    /// Turn the view back into an EXPORT block
    pub fn into_block(self) -> Block {
        let mut block = Block::new("EXPORT");
        block.attributes = self.attributes;
        if let Some(fsal) = self.fsal {
            let mut fsal_block = Block::new("FSAL");
            fsal_block.attributes = fsal;
            block.children.push(fsal_block);
        }
        for client in self.client_blocks {
            let mut client_block = Block::new("CLIENT");
            client_block.attributes = client;
            block.children.push(client_block);
        }
        block
    }

    pub fn export_id(&self) -> Option<i64> {
        self.attributes.get(EXPORT_ID_KEY).and_then(conf::Value::as_int)
    }

    pub fn path(&self) -> Option<&str> {
        self.attributes.get_str("path")
    }

    pub fn pseudo(&self) -> Option<&str> {
        self.attributes.get_str("pseudo")
    }

    /// Name of the FSAL, if set
    pub fn fsal_name(&self) -> Option<&str> {
        self.fsal.as_ref().and_then(|f| f.get_str("name"))
    }
}

fn visible_attributes(block: &Block) -> Attributes {
    let is_ceph = block.attributes.get_str("name") == Some("CEPH");
    block
        .attributes
        .iter()
        .filter(|(key, _)| !SECRET_KEYS.contains(key))
        .filter(|(key, _)| !(is_ceph && *key == "user_id"))
        .map(|(key, value)| (key, value.clone()))
        .collect()
}

/// Build a host's export view from its raw config
///
/// `None` (no config file on the host) yields an empty export list.
/// Blocks other than EXPORT are ignored.
pub fn host_exports_from_config(
    host: impl Into<String>,
    raw: Option<&str>,
) -> Result<HostExportSet, ParseError> {
    let exports = match raw {
        Some(raw) => conf::parse_config(raw)?
            .iter()
            .filter(|b| b.kind() == BlockKind::Export)
            .map(ExportSpec::from_block)
            .collect(),
        None => Vec::new(),
    };
    Ok(HostExportSet::new(host, exports))
}
