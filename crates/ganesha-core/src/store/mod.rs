// # Object Store Implementations
//
// This module provides implementations of the ObjectStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::FileObjectStore;
pub use memory::MemoryObjectStore;

use crate::config::{MigrationConfig, StoreConfig};
use crate::persist::NAMESPACE;
use crate::traits::ObjectStore;

/// Open the object store described by `config`
///
/// File stores are rooted at the pool's [`NAMESPACE`] directory, the same
/// place the `%url` lines of daemon objects point to.
pub async fn open(config: &MigrationConfig) -> Result<Box<dyn ObjectStore>, crate::Error> {
    match &config.store {
        StoreConfig::Memory => Ok(Box::new(MemoryObjectStore::new())),
        StoreConfig::File { path } => {
            let store = FileObjectStore::new(path, &config.pool, NAMESPACE).await?;
            Ok(Box::new(store))
        }
    }
}
