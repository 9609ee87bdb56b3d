use crate::ports::FilterListStore;
use dnswarden_domain::DomainError;
use std::sync::Arc;
use tracing::info;

/// Remove a filter list by its source URL.
pub struct RemoveFilterUseCase {
    store: Arc<dyn FilterListStore>,
}

impl RemoveFilterUseCase {
    pub fn new(store: Arc<dyn FilterListStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, url: &str, allow: bool) -> Result<(), DomainError> {
        self.store.remove_filter(url, allow).await?;
        info!(url, allow, "Filter list removed");
        Ok(())
    }
}
