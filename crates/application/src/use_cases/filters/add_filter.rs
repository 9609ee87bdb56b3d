use crate::ports::FilterListStore;
use dnswarden_domain::{validators, DomainError, FilterListConf};
use std::sync::Arc;
use tracing::info;

/// Register a new filter list from a URL or absolute path.
pub struct AddFilterUseCase {
    store: Arc<dyn FilterListStore>,
}

impl AddFilterUseCase {
    pub fn new(store: Arc<dyn FilterListStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        url: String,
        name: String,
        allow: bool,
    ) -> Result<FilterListConf, DomainError> {
        validators::validate_filter_url(&url)?;
        validators::validate_filter_name(&name)?;

        let conf = self.store.add_filter(url, name, allow).await?;
        info!(id = conf.id, url = %conf.url, allow, "Filter list added");
        Ok(conf)
    }
}
