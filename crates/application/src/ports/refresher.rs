use async_trait::async_trait;
use dnswarden_domain::DomainError;

/// Result of one refresh cycle over all enabled filter lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Lists whose content actually changed.
    pub updated: usize,
    /// Lists examined this cycle.
    pub checked: usize,
    /// Transient fetch failures (drive the job's backoff).
    pub network_errors: usize,
}

/// Refresh entry point consumed by the background job and the admin
/// "refresh now" action.
#[async_trait]
pub trait FilterRefresher: Send + Sync {
    /// Run one refresh cycle. `force` updates every enabled list regardless
    /// of its age. Returns immediately with a default outcome when another
    /// cycle is already running.
    async fn refresh(&self, force: bool) -> Result<RefreshOutcome, DomainError>;
}
