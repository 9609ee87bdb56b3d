use crate::ports::{FilterRefresher, RefreshOutcome};
use dnswarden_domain::DomainError;
use std::sync::Arc;
use tracing::info;

/// Admin "refresh now": force-update every enabled filter list.
pub struct RefreshFiltersUseCase {
    refresher: Arc<dyn FilterRefresher>,
}

impl RefreshFiltersUseCase {
    pub fn new(refresher: Arc<dyn FilterRefresher>) -> Self {
        Self { refresher }
    }

    pub async fn execute(&self) -> Result<RefreshOutcome, DomainError> {
        let outcome = self.refresher.refresh(true).await?;
        info!(
            updated = outcome.updated,
            checked = outcome.checked,
            "Manual filter refresh finished"
        );
        Ok(outcome)
    }
}
