use async_trait::async_trait;
use dnswarden_domain::{BlockedServicesConfig, DomainError};

/// Admin-facing store of the blocked-services configuration.
#[async_trait]
pub trait BlockedServicesStore: Send + Sync {
    async fn get_blocked_services(&self) -> BlockedServicesConfig;

    async fn set_blocked_services(&self, conf: BlockedServicesConfig) -> Result<(), DomainError>;
}
