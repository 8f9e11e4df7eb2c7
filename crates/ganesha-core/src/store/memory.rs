// # Memory Object Store
//
// In-memory implementation of ObjectStore.
//
// ## Purpose
//
// Holds objects in a map for the lifetime of the process. Used by tests and
// for dry runs where nothing should reach a real pool.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::object_store::{ObjectStore, WriteOutcome};

/// In-memory object store implementation
///
/// # Example
///
/// ```rust,no_run
/// use ganesha_core::store::MemoryObjectStore;
/// use ganesha_core::traits::{ObjectStore, WriteOutcome};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryObjectStore::new();
///
///     let outcome = store.write_if_absent("export-1", b"EXPORT {\n}\n\n").await?;
///     assert_eq!(outcome, WriteOutcome::Written);
///
///     let outcome = store.write_if_absent("export-1", b"other").await?;
///     assert_eq!(outcome, WriteOutcome::AlreadyExists);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryObjectStore {
    /// Create a new empty memory object store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `objects`
    pub fn with_objects<K, V>(objects: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let map = objects
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    /// Get the number of objects in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Sorted object keys
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn write_if_absent(&self, key: &str, content: &[u8]) -> Result<WriteOutcome, Error> {
        let mut guard = self.inner.write().await;
        if guard.contains_key(key) {
            return Ok(WriteOutcome::AlreadyExists);
        }
        guard.insert(key.to_string(), content.to_vec());
        Ok(WriteOutcome::Written)
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }
}
