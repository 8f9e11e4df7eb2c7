// # ganesha-core
//
// Configuration-language engine for NFS-Ganesha export definitions.
//
// ## Architecture Overview
//
// This library parses, rewrites and consolidates Ganesha export configs:
// - **conf**: Tokenizer, block parser and canonical block writer
// - **consolidate**: Deduplicates EXPORT blocks across daemons and assigns ids
// - **secrets**: Adds CephX / RGW credentials to FSAL blocks
// - **persist**: Writes `export-{id}` and `conf-{daemon}` objects to an ObjectStore
// - **status**: Compares configured exports with live daemon status
// - **migration**: Runs the whole per-daemon → shared-object migration
//
// ## Design Principles
//
// 1. **Pure core**: Parsing, writing and consolidation do no I/O
// 2. **Injected collaborators**: Stores, credentials and remote execution are traits
// 3. **Fail-fast**: The first error aborts the run and is returned, never swallowed
// 4. **No hidden state**: Every run takes its inputs by value

pub mod conf;
pub mod config;
pub mod consolidate;
pub mod error;
pub mod exports;
pub mod migration;
pub mod persist;
pub mod secrets;
pub mod status;
pub mod store;
pub mod traits;

// Re-export core types for convenience
pub use conf::{Attributes, Block, BlockKind, ParserOptions, Value, parse_config, write};
pub use config::{MigrationConfig, StoreConfig};
pub use consolidate::{CanonicalExport, CanonicalExportSet, DaemonExports, consolidate};
pub use error::{
    ConsolidationError, Error, MigrationError, ParseError, PersistError, Result, SecretError,
};
pub use exports::{ExportSpec, HostExportSet, host_exports_from_config};
pub use migration::{
    DaemonConfig, ExportMigration, MigrationEvent, MigrationSummary, validate_daemon_configs,
};
pub use persist::{PersistReport, persist};
pub use secrets::{HostConfig, inject_secrets, render_host_configs};
pub use status::{ExportReport, HostReport, check_exports_status, reconcile};
pub use store::{FileObjectStore, MemoryObjectStore};
pub use traits::{CredentialService, LiveStatusService, ObjectStore, RemoteExec};
