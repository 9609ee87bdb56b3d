use crate::ports::{FilterListStore, FilterProperties};
use dnswarden_domain::{validators, DomainError};
use std::sync::Arc;
use tracing::info;

/// Change name/URL/enabled of an existing filter list.
pub struct UpdateFilterUseCase {
    store: Arc<dyn FilterListStore>,
}

impl UpdateFilterUseCase {
    pub fn new(store: Arc<dyn FilterListStore>) -> Self {
        Self { store }
    }

    /// Returns true when the change triggered a content re-fetch.
    pub async fn execute(
        &self,
        url: &str,
        props: FilterProperties,
        allow: bool,
    ) -> Result<bool, DomainError> {
        validators::validate_filter_url(&props.url)?;
        validators::validate_filter_name(&props.name)?;

        let refetched = self.store.set_filter_properties(url, props, allow).await?;
        info!(url, allow, refetched, "Filter list updated");
        Ok(refetched)
    }
}
