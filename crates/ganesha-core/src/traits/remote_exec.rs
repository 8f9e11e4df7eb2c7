//! Fleet-wide remote execution
//!
//! Only the migration runner uses this, to back up config files and to flag
//! daemons for restart. Replies are passed through as JSON because each
//! operation has its own reply shape.

use async_trait::async_trait;
use std::collections::HashMap;

/// Runs an operation on every host matched by a target selector
#[async_trait]
pub trait RemoteExec: Send + Sync {
    /// Run `operation` with `args` on `target`
    ///
    /// # Returns
    ///
    /// - `Ok(map)`: Reply per host that answered (empty if none matched)
    /// - `Err(Error)`: The call could not be dispatched
    async fn run(
        &self,
        target: &str,
        operation: &str,
        args: &[String],
    ) -> Result<HashMap<String, serde_json::Value>, crate::Error>;
}

/// Compound target matching every host of `role`
pub fn role_target(role: &str) -> String {
    format!("I@roles:{}", role)
}
