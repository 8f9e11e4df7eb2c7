//! Credential injection for host export sets
//!
//! Export views never carry credentials. Before a host's exports can be
//! written out as a daemon config, every FSAL gets the keys it needs:
//!
//! - CEPH: the host's own CephX user `ganesha.<short host>` and its secret
//! - RGW: the S3 access and secret keys of the configured `user_id`
//!
//! A host with any RGW export also gets an `RGW` backend block.

use crate::conf::{self, Block};
use crate::error::SecretError;
use crate::exports::{ExportSpec, FsalKind, HostExportSet};
use crate::traits::CredentialService;
use tracing::{debug, info};

/// Keyring role holding the per-host CephX users
const KEYRING_ROLE: &str = "ganesha";

/// Ceph config path referenced by RGW backend blocks
const CEPH_CONF: &str = "/etc/ceph/ceph.conf";

/// Cluster name referenced by RGW backend blocks
const CEPH_CLUSTER: &str = "ceph";

/// A host's complete config, ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub host: String,
    /// EXPORT blocks in input order, then the RGW backend block if any
    pub blocks: Vec<Block>,
}

impl HostConfig {
    /// Render the config as text
    pub fn render(&self) -> String {
        conf::write(&self.blocks)
    }
}

/// Host part of a fully qualified name
///
/// ```
/// use ganesha_core::secrets::short_hostname;
///
/// assert_eq!(short_hostname("data1.ceph"), "data1");
/// assert_eq!(short_hostname("data1"), "data1");
/// ```
pub fn short_hostname(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}

/// CephX user of the ganesha daemon on `short_host`
pub fn ceph_user_id(short_host: &str) -> String {
    format!("ganesha.{}", short_host)
}

/// Backend block the RGW FSAL of `short_host` connects through
pub fn rgw_backend_block(short_host: &str) -> Block {
    Block::new("RGW")
        .with_attr("ceph_conf", CEPH_CONF)
        .with_attr("name", format!("client.{}", ceph_user_id(short_host)))
        .with_attr("cluster", CEPH_CLUSTER)
}

/// Add credentials to every export and build each host's blocks
///
/// Hosts are processed in order and the first failure aborts the whole call.
pub async fn inject_secrets(
    hosts: Vec<HostExportSet>,
    credentials: &dyn CredentialService,
) -> Result<Vec<HostConfig>, SecretError> {
    let mut configs = Vec::with_capacity(hosts.len());
    for set in hosts {
        configs.push(inject_host(set, credentials).await?);
    }
    info!("Credentials injected for {} host(s)", configs.len());
    Ok(configs)
}

/// Inject secrets, then render each host's config to text
pub async fn render_host_configs(
    hosts: Vec<HostExportSet>,
    credentials: &dyn CredentialService,
) -> Result<Vec<(String, String)>, SecretError> {
    let configs = inject_secrets(hosts, credentials).await?;
    Ok(configs
        .into_iter()
        .map(|config| {
            let text = config.render();
            (config.host, text)
        })
        .collect())
}

async fn inject_host(
    set: HostExportSet,
    credentials: &dyn CredentialService,
) -> Result<HostConfig, SecretError> {
    let host = set
        .host
        .ok_or_else(|| SecretError::missing("host", "host identifier"))?;
    let exports = set
        .exports
        .ok_or_else(|| SecretError::missing("exports", "host"))?;
    let short_host = short_hostname(&host).to_string();

    let mut blocks = Vec::with_capacity(exports.len() + 1);
    let mut found_rgw = false;
    for export in exports {
        let (export, kind) = inject_export(export, &short_host, credentials).await?;
        found_rgw |= kind == FsalKind::Rgw;
        blocks.push(export.into_block());
    }
    if found_rgw {
        blocks.push(rgw_backend_block(&short_host));
    }

    debug!("Built config for {} with {} block(s)", host, blocks.len());
    Ok(HostConfig { host, blocks })
}

async fn inject_export(
    mut export: ExportSpec,
    short_host: &str,
    credentials: &dyn CredentialService,
) -> Result<(ExportSpec, FsalKind), SecretError> {
    let fsal = export
        .fsal
        .as_mut()
        .ok_or_else(|| SecretError::missing("fsal", "export"))?;
    let name = fsal
        .get_str("name")
        .ok_or_else(|| SecretError::missing("name", "FSAL"))?;
    let kind = FsalKind::from_name(name)
        .ok_or_else(|| SecretError::UnrecognizedFsal(name.to_string()))?;

    match kind {
        FsalKind::Ceph => {
            let user_id = ceph_user_id(short_host);
            let principal = format!("client.{}", user_id);
            let secret = credentials
                .keyring_secret(KEYRING_ROLE, &principal)
                .await
                .map_err(credential_error)?
                .ok_or_else(|| SecretError::UnknownUser(principal.clone()))?;
            fsal.insert("user_id", user_id);
            fsal.insert("secret_access_key", secret);
        }
        FsalKind::Rgw => {
            let user_id = fsal
                .get_str("user_id")
                .ok_or_else(|| SecretError::missing("user_id", "FSAL RGW"))?
                .to_string();
            if !fsal.contains_key("access_key_id") {
                let key = credentials
                    .rgw_access_key(&user_id)
                    .await
                    .map_err(credential_error)?
                    .ok_or_else(|| SecretError::UnknownUser(user_id.clone()))?;
                fsal.insert("access_key_id", key);
            }
            if !fsal.contains_key("secret_access_key") {
                let key = credentials
                    .rgw_secret_key(&user_id)
                    .await
                    .map_err(credential_error)?
                    .ok_or_else(|| SecretError::UnknownUser(user_id.clone()))?;
                fsal.insert("secret_access_key", key);
            }
        }
    }
    Ok((export, kind))
}

fn credential_error(err: crate::Error) -> SecretError {
    SecretError::Credentials(err.to_string())
}
