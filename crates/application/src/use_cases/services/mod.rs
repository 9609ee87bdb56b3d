use crate::ports::BlockedServicesStore;
use dnswarden_domain::{BlockedServicesConfig, DomainError};
use std::sync::Arc;
use tracing::info;

pub struct GetBlockedServicesUseCase {
    store: Arc<dyn BlockedServicesStore>,
}

impl GetBlockedServicesUseCase {
    pub fn new(store: Arc<dyn BlockedServicesStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> BlockedServicesConfig {
        self.store.get_blocked_services().await
    }
}

/// Replace the blocked-services configuration. Unknown service IDs fail
/// validation before anything is stored.
pub struct UpdateBlockedServicesUseCase {
    store: Arc<dyn BlockedServicesStore>,
}

impl UpdateBlockedServicesUseCase {
    pub fn new(store: Arc<dyn BlockedServicesStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, conf: BlockedServicesConfig) -> Result<(), DomainError> {
        conf.validate()?;
        let count = conf.ids.len();
        self.store.set_blocked_services(conf).await?;
        info!(services = count, "Blocked services updated");
        Ok(())
    }
}
