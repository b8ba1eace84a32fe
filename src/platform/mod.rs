pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;

pub use client::PlatformClient;
pub use error::PlatformError;
pub use types::{AclEntry, PlatformAccessLevel, PlatformStatus, SubsystemStatus};

/// Availability check of the downstream platform.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Never fails: transport errors come back as an unavailable status.
    async fn status(&self) -> PlatformStatus;

    async fn is_available(&self) -> bool {
        self.status().await.ok
    }
}

/// Workspace permission operations on the downstream platform.
#[async_trait]
pub trait PermissionApi: Send + Sync {
    fn build_acl_entry(
        &self,
        principal: &str,
        level: PlatformAccessLevel,
        can_share: bool,
        can_compute: bool,
    ) -> AclEntry {
        AclEntry {
            email: principal.to_string(),
            access_level: level,
            can_share,
            can_compute,
        }
    }

    async fn push_acl(
        &self,
        project: &str,
        workspace: &str,
        entry: &AclEntry,
    ) -> Result<(), PlatformError>;
}
