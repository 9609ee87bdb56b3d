use async_trait::async_trait;
use dnswarden_domain::config::SafeSearchConfig;
use dnswarden_domain::DomainError;

/// Hash-prefix checker contract (safe browsing, parental).
///
/// Implementations live outside the core and may perform network I/O; the
/// pipeline treats them as opaque classifiers.
#[async_trait]
pub trait Checker: Send + Sync {
    /// Short stable name used when wrapping errors ("safebrowsing",
    /// "parental", "safesearch").
    fn name(&self) -> &'static str;

    /// True when `host` should be blocked by this checker.
    async fn check(&self, host: &str) -> Result<bool, DomainError>;
}

/// Safe-search additionally accepts configuration updates.
#[async_trait]
pub trait SafeSearchChecker: Checker {
    async fn update(&self, conf: SafeSearchConfig) -> Result<(), DomainError>;
}
