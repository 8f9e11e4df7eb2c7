//! Collaborator traits
//!
//! The core never talks to a cluster directly. Everything outside the
//! process goes through one of these interfaces:
//!
//! - [`ObjectStore`]: key-addressed object persistence (RADOS in production)
//! - [`CredentialService`]: CephX keyrings and RGW user keys
//! - [`LiveStatusService`]: export status reported by running daemons
//! - [`RemoteExec`]: fleet-wide command execution for backups and restarts

pub mod credentials;
pub mod live_status;
pub mod object_store;
pub mod remote_exec;

pub use credentials::CredentialService;
pub use live_status::{LiveExport, LiveStatus, LiveStatusService};
pub use object_store::{ObjectStore, WriteOutcome};
pub use remote_exec::{RemoteExec, role_target};
