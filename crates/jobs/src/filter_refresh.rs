use dnswarden_application::ports::FilterRefresher;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const INITIAL_INTERVAL: Duration = Duration::from_secs(5);
const INTERVAL_CAP: Duration = Duration::from_secs(3600);

/// Periodic filter-list refresh.
///
/// Starts eagerly (5 s after boot), doubles its interval on network
/// errors up to a one-hour cap, and pins to the cap after a clean cycle.
/// Which lists are actually due is the refresher's decision.
pub struct FilterRefreshJob {
    refresher: Arc<dyn FilterRefresher>,
    shutdown: CancellationToken,
}

impl FilterRefreshJob {
    pub fn new(refresher: Arc<dyn FilterRefresher>) -> Self {
        Self {
            refresher,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!("Starting filter refresh job");

        tokio::spawn(async move {
            let mut interval = INITIAL_INTERVAL;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("FilterRefreshJob: shutting down");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        match self.refresher.refresh(false).await {
                            Ok(outcome) if outcome.network_errors > 0 => {
                                interval = (interval * 2).min(INTERVAL_CAP);
                                warn!(
                                    network_errors = outcome.network_errors,
                                    next_secs = interval.as_secs(),
                                    "FilterRefreshJob: cycle hit network errors, backing off"
                                );
                            }
                            Ok(outcome) => {
                                interval = INTERVAL_CAP;
                                info!(
                                    checked = outcome.checked,
                                    updated = outcome.updated,
                                    "FilterRefreshJob: cycle completed"
                                );
                            }
                            Err(e) => {
                                interval = (interval * 2).min(INTERVAL_CAP);
                                error!(error = %e, "FilterRefreshJob: cycle failed");
                            }
                        }
                    }
                }
            }
        });
    }
}
