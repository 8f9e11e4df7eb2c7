//! Test doubles and common utilities for contract tests
//!
//! Each double records how it was called so tests can assert on the
//! interaction, not only on the returned values.

#![allow(dead_code)]

use ganesha_core::error::Result;
use ganesha_core::store::MemoryObjectStore;
use ganesha_core::traits::{
    CredentialService, LiveStatus, LiveStatusService, ObjectStore, RemoteExec, WriteOutcome,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Object store wrapper that records every call
pub struct RecordingObjectStore {
    inner: MemoryObjectStore,
    reads: Arc<AtomicUsize>,
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingObjectStore {
    pub fn new() -> Self {
        Self::wrapping(MemoryObjectStore::new())
    }

    /// Record calls made against `inner`
    pub fn wrapping(inner: MemoryObjectStore) -> Self {
        Self {
            inner,
            reads: Arc::new(AtomicUsize::new(0)),
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a store that shares objects and counters with an existing one
    pub fn sharing_with(other: &Self) -> Self {
        Self {
            inner: other.inner.clone(),
            reads: Arc::clone(&other.reads),
            writes: Arc::clone(&other.writes),
        }
    }

    /// Number of read() calls
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Keys passed to write_if_absent(), in call order
    pub fn write_attempts(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    /// Stored object as text
    pub async fn object(&self, key: &str) -> Option<String> {
        self.inner
            .read(key)
            .await
            .unwrap()
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    pub async fn keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

#[async_trait::async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn write_if_absent(&self, key: &str, content: &[u8]) -> Result<WriteOutcome> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.write_if_absent(key, content).await
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(key).await
    }
}

/// Object store where some keys appear between a read and the next write
///
/// A key given to [`RacingObjectStore::appearing`] reads as absent until
/// the first write_if_absent() on it. That write stores the other writer's
/// content instead and reports `AlreadyExists`.
pub struct RacingObjectStore {
    inner: MemoryObjectStore,
    appearing: Mutex<HashMap<String, Vec<u8>>>,
    writes: Mutex<Vec<String>>,
}

impl RacingObjectStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryObjectStore::new(),
            appearing: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Let another writer create `key` with `content` just before our write
    pub fn appearing(self, key: &str, content: impl Into<Vec<u8>>) -> Self {
        self.appearing
            .lock()
            .unwrap()
            .insert(key.to_string(), content.into());
        self
    }

    /// Keys passed to write_if_absent(), in call order
    pub fn write_attempts(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

#[async_trait::async_trait]
impl ObjectStore for RacingObjectStore {
    async fn write_if_absent(&self, key: &str, content: &[u8]) -> Result<WriteOutcome> {
        self.writes.lock().unwrap().push(key.to_string());
        let raced = self.appearing.lock().unwrap().remove(key);
        match raced {
            Some(theirs) => {
                self.inner.write_if_absent(key, &theirs).await?;
                Ok(WriteOutcome::AlreadyExists)
            }
            None => self.inner.write_if_absent(key, content).await,
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.read(key).await
    }
}

/// Credential service backed by fixed maps
#[derive(Default)]
pub struct FixedCredentials {
    keyring: HashMap<String, String>,
    access_keys: HashMap<String, String>,
    secret_keys: HashMap<String, String>,
    lookups: Arc<AtomicUsize>,
}

impl FixedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the CephX secret of `principal`
    pub fn with_keyring(mut self, principal: &str, secret: &str) -> Self {
        self.keyring.insert(principal.to_string(), secret.to_string());
        self
    }

    /// Add S3 keys of an RGW user
    pub fn with_rgw_user(mut self, user_id: &str, access_key: &str, secret_key: &str) -> Self {
        self.access_keys
            .insert(user_id.to_string(), access_key.to_string());
        self.secret_keys
            .insert(user_id.to_string(), secret_key.to_string());
        self
    }

    /// Number of lookups of any kind
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl CredentialService for FixedCredentials {
    async fn keyring_secret(&self, role: &str, principal: &str) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        assert_eq!(role, "ganesha", "keyrings are generated for the ganesha role");
        Ok(self.keyring.get(principal).cloned())
    }

    async fn rgw_access_key(&self, user_id: &str) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.access_keys.get(user_id).cloned())
    }

    async fn rgw_secret_key(&self, user_id: &str) -> Result<Option<String>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.secret_keys.get(user_id).cloned())
    }
}

/// One recorded remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub target: String,
    pub operation: String,
    pub args: Vec<String>,
}

type Replies = HashMap<String, serde_json::Value>;

/// Remote executor answering each operation with a fixed reply
///
/// Replies scripted for a specific target win over the ones for any target.
pub struct ScriptedRemote {
    replies: HashMap<(Option<String>, String), Replies>,
    calls: Arc<Mutex<Vec<RemoteCall>>>,
}

impl ScriptedRemote {
    pub fn new() -> Self {
        Self {
            replies: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply to `operation` with `reply` from each of `hosts`
    pub fn reply(self, operation: &str, hosts: &[&str], reply: serde_json::Value) -> Self {
        self.script(None, operation, hosts, reply)
    }

    /// Reply to `operation` sent to `target` with `reply` from each of `hosts`
    pub fn reply_on(
        self,
        target: &str,
        operation: &str,
        hosts: &[&str],
        reply: serde_json::Value,
    ) -> Self {
        self.script(Some(target), operation, hosts, reply)
    }

    fn script(
        mut self,
        target: Option<&str>,
        operation: &str,
        hosts: &[&str],
        reply: serde_json::Value,
    ) -> Self {
        let per_host = hosts
            .iter()
            .map(|h| (h.to_string(), reply.clone()))
            .collect();
        self.replies
            .insert((target.map(str::to_string), operation.to_string()), per_host);
        self
    }

    /// Create an executor that shares the call log with an existing one
    pub fn sharing_calls_with(other: &Self) -> Self {
        Self {
            replies: other.replies.clone(),
            calls: Arc::clone(&other.calls),
        }
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.operation).collect()
    }

    /// Calls sent to `target`
    pub fn calls_to(&self, target: &str) -> Vec<RemoteCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.target == target)
            .collect()
    }
}

#[async_trait::async_trait]
impl RemoteExec for ScriptedRemote {
    async fn run(
        &self,
        target: &str,
        operation: &str,
        args: &[String],
    ) -> Result<HashMap<String, serde_json::Value>> {
        self.calls.lock().unwrap().push(RemoteCall {
            target: target.to_string(),
            operation: operation.to_string(),
            args: args.to_vec(),
        });
        let targeted = (Some(target.to_string()), operation.to_string());
        let any = (None, operation.to_string());
        Ok(self
            .replies
            .get(&targeted)
            .or_else(|| self.replies.get(&any))
            .cloned()
            .unwrap_or_default())
    }
}

/// Live status service returning a fixed map
pub struct StaticLiveStatus {
    status: HashMap<String, LiveStatus>,
    roles: Arc<Mutex<Vec<String>>>,
}

impl StaticLiveStatus {
    pub fn new(status: HashMap<String, LiveStatus>) -> Self {
        Self {
            status,
            roles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Roles queried, in call order
    pub fn queried_roles(&self) -> Vec<String> {
        self.roles.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LiveStatusService for StaticLiveStatus {
    async fn exports_info(&self, role: &str) -> Result<HashMap<String, LiveStatus>> {
        self.roles.lock().unwrap().push(role.to_string());
        Ok(self.status.clone())
    }
}

/// CephFS export as a daemon would have it in its local config
pub fn ceph_export_conf(export_id: i64, pseudo: &str) -> String {
    format!(
        r#"
EXPORT
{{
    Export_Id = {export_id};
    Path = "/";
    Pseudo = "{pseudo}";
    Access_Type = "RW";
    Squash = "No_root_squash";
    FSAL {{
        Name = "CEPH";
    }}
}}
"#
    )
}
