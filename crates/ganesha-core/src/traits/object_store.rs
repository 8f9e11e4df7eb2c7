// # Object Store Trait
//
// Defines the byte-level contract with the store export and daemon objects
// are persisted into.
//
// ## Object Naming
//
// Objects live in the `ganesha` namespace of a pool:
// - `export-{id}`: one EXPORT block
// - `conf-{daemon}`: `%url` directives pointing at the daemon's exports
//
// ## Implementations
//
// - `MemoryObjectStore`: in-process map, for tests
// - `FileObjectStore`: one file per object on local disk

use async_trait::async_trait;

/// Result of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The object did not exist and now holds the new content
    Written,
    /// The object already existed; nothing was written
    AlreadyExists,
}

/// Trait for object store implementations
///
/// Writes never overwrite. Callers that need idempotency compare the
/// existing content themselves via [`ObjectStore::read`].
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `content` under `key` unless the key already exists
    ///
    /// # Returns
    ///
    /// - `Ok(WriteOutcome::Written)`: Object created
    /// - `Ok(WriteOutcome::AlreadyExists)`: Key taken, store unchanged
    /// - `Err(Error)`: Storage error
    async fn write_if_absent(&self, key: &str, content: &[u8]) -> Result<WriteOutcome, crate::Error>;

    /// Read an object
    ///
    /// # Returns
    ///
    /// - `Ok(Some(bytes))`: Object content
    /// - `Ok(None)`: No such object
    /// - `Err(Error)`: Storage error
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, crate::Error>;
}
