//! Credential lookup for FSAL blocks

use async_trait::async_trait;

/// Source of CephX secrets and RGW user keys
///
/// Every lookup returns `Ok(None)` when the principal or user is unknown;
/// `Err` is reserved for the service itself failing.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// CephX secret of `principal` (e.g. `client.ganesha.data1`) from the
    /// keyring generated for `role`
    async fn keyring_secret(&self, role: &str, principal: &str)
    -> Result<Option<String>, crate::Error>;

    /// S3 access key of an RGW user
    async fn rgw_access_key(&self, user_id: &str) -> Result<Option<String>, crate::Error>;

    /// S3 secret key of an RGW user
    async fn rgw_secret_key(&self, user_id: &str) -> Result<Option<String>, crate::Error>;
}
