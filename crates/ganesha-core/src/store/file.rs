// # File Object Store
//
// File-based implementation of ObjectStore.
//
// ## Layout
//
// One file per object:
//
// ```text
// <root>/<pool>/<namespace>/export-1
// <root>/<pool>/<namespace>/conf-data1
// ```
//
// ## Write Semantics
//
// - Content is written to a temporary file first
// - The temporary file is then hard-linked to its final name, which fails
//   if the name is taken, so readers never see a partial object
// - The temporary file is removed either way

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::object_store::{ObjectStore, WriteOutcome};

/// Suffix of in-flight temporary files
const TEMP_SUFFIX: &str = ".tmp";

/// Directory-backed object store
///
/// # Example
///
/// ```rust,no_run
/// use ganesha_core::store::FileObjectStore;
/// use ganesha_core::traits::ObjectStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileObjectStore::new("/var/lib/ganesha/objects", "nfs", "ganesha").await?;
///     store.write_if_absent("export-1", b"EXPORT {\n}\n\n").await?;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    dir: PathBuf,
}

impl FileObjectStore {
    /// Open (and create if needed) the directory for `pool`/`namespace`
    pub async fn new<P: AsRef<Path>>(root: P, pool: &str, namespace: &str) -> Result<Self, Error> {
        let dir = root.as_ref().join(pool).join(namespace);
        fs::create_dir_all(&dir).await.map_err(|e| {
            Error::store(format!(
                "Failed to create object directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        tracing::debug!("Opened file object store at {}", dir.display());
        Ok(Self { dir })
    }

    /// Directory holding the objects
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, Error> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.ends_with(TEMP_SUFFIX)
            && !key.contains(['/', '\\', '\0']);
        if !valid {
            return Err(Error::store(format!("Invalid object key '{}'", key)));
        }
        Ok(self.dir.join(key))
    }

    async fn write_temp(&self, path: &Path, content: &[u8]) -> Result<PathBuf, Error> {
        let mut temp = path.as_os_str().to_owned();
        temp.push(format!(".{}{}", std::process::id(), TEMP_SUFFIX));
        let temp = PathBuf::from(temp);

        let mut file = fs::File::create(&temp).await.map_err(|e| {
            Error::store(format!("Failed to create temp file {}: {}", temp.display(), e))
        })?;
        file.write_all(content).await.map_err(|e| {
            Error::store(format!("Failed to write temp file {}: {}", temp.display(), e))
        })?;
        file.sync_all().await.map_err(|e| {
            Error::store(format!("Failed to sync temp file {}: {}", temp.display(), e))
        })?;
        Ok(temp)
    }
}

#[async_trait]
impl ObjectStore for FileObjectStore {
    async fn write_if_absent(&self, key: &str, content: &[u8]) -> Result<WriteOutcome, Error> {
        let path = self.object_path(key)?;
        if fs::try_exists(&path).await? {
            return Ok(WriteOutcome::AlreadyExists);
        }

        let temp = self.write_temp(&path, content).await?;
        let linked = fs::hard_link(&temp, &path).await;
        if let Err(e) = fs::remove_file(&temp).await {
            tracing::warn!("Failed to remove temp file {}: {}", temp.display(), e);
        }

        match linked {
            Ok(()) => {
                tracing::trace!("Object written: {}", path.display());
                Ok(WriteOutcome::Written)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(WriteOutcome::AlreadyExists),
            Err(e) => Err(Error::store(format!(
                "Failed to publish object {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let path = self.object_path(key)?;
        match fs::read(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::store(format!(
                "Failed to read object {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
