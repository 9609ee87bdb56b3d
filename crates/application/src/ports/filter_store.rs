use async_trait::async_trait;
use dnswarden_domain::{DomainError, FilterListConf};

/// Mutable properties of a filter list, set by admin action.
#[derive(Debug, Clone)]
pub struct FilterProperties {
    pub name: String,
    pub url: String,
    pub enabled: bool,
}

/// Admin-facing store of filter lists, implemented by the filtering engine.
///
/// All mutations validate first and leave state untouched on failure.
#[async_trait]
pub trait FilterListStore: Send + Sync {
    async fn list_filters(&self, allow: bool) -> Vec<FilterListConf>;

    /// Register a new list and fetch its content once. The store assigns
    /// the ID. Fails with `DuplicateFilter` when the URL is already known.
    async fn add_filter(
        &self,
        url: String,
        name: String,
        allow: bool,
    ) -> Result<FilterListConf, DomainError>;

    /// Remove the list with the given source URL; its on-disk file is
    /// renamed to `<id>.txt.old`, never deleted.
    async fn remove_filter(&self, url: &str, allow: bool) -> Result<(), DomainError>;

    /// Update name/URL/enabled of an existing list. Returns true when the
    /// change requires re-fetching the content (URL changed or re-enabled).
    async fn set_filter_properties(
        &self,
        url: &str,
        props: FilterProperties,
        allow: bool,
    ) -> Result<bool, DomainError>;
}
