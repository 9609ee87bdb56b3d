use async_trait::async_trait;
use dnswarden_application::ports::{FilterRefresher, RefreshOutcome};
use dnswarden_domain::DomainError;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counting refresher with a scripted outcome.
pub struct MockRefresher {
    calls: AtomicUsize,
    network_errors: usize,
}

impl MockRefresher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            network_errors: 0,
        }
    }

    pub fn with_network_errors(mut self, count: usize) -> Self {
        self.network_errors = count;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FilterRefresher for MockRefresher {
    async fn refresh(&self, _force: bool) -> Result<RefreshOutcome, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RefreshOutcome {
            updated: 0,
            checked: 1,
            network_errors: self.network_errors,
        })
    }
}
