//! Directory service seam used by the resolver and the driver

use async_trait::async_trait;

use crate::error::Result;
use crate::payload::RoleAttributeUpdate;
use crate::types::Member;

/// Read and write access to a user directory with nested groups
///
/// Implemented by [`crate::google::DirectoryClient`] for Google Workspace and
/// by in-memory fakes in tests.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Lists the direct members of a group
    async fn list_members(&self, group: &str) -> Result<Vec<Member>>;

    /// Resolves a user key (primary address or alias) to its primary address
    ///
    /// Returns `Ok(None)` when the directory has no primary address on record.
    async fn primary_email(&self, user: &str) -> Result<Option<String>>;

    /// Overwrites the role attributes of a user
    async fn update_user(&self, user: &str, update: &RoleAttributeUpdate) -> Result<()>;
}
