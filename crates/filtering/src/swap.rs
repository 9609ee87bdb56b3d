use crate::engine::{EngineSet, MatchingEngine};
use crate::rules::StorageBuilder;
use arc_swap::ArcSwap;
use dnswarden_domain::DomainError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Where a rule storage gets its rule text from.
#[derive(Debug, Clone)]
pub enum SourceContent {
    /// Inline rules (the custom user-rules pseudo-list).
    Inline(String),
    /// The canonical on-disk file of a downloaded list.
    File(PathBuf),
}

/// One rule source feeding an engine build.
#[derive(Debug, Clone)]
pub struct FilterSource {
    pub id: i32,
    pub content: SourceContent,
}

/// Build both storages and engines from the given sources.
///
/// Sources whose file is missing are skipped silently (the list may simply
/// not have been downloaded yet); any other read failure fails the whole
/// build and the current engine generation stays in place.
pub(crate) fn build_engine_set(
    block: &[FilterSource],
    allow: &[FilterSource],
) -> Result<EngineSet, DomainError> {
    let build_one = |sources: &[FilterSource]| -> Result<Option<MatchingEngine>, DomainError> {
        if sources.is_empty() {
            return Ok(None);
        }
        let mut builder = StorageBuilder::new();
        for source in sources {
            match &source.content {
                SourceContent::Inline(text) => builder.add_filter_text(source.id, text),
                SourceContent::File(path) => match std::fs::read_to_string(path) {
                    Ok(text) => builder.add_filter_text(source.id, &text),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                        debug!(id = source.id, path = %path.display(), "Filter file absent, skipping");
                    }
                    Err(e) => {
                        return Err(DomainError::StorageError(format!(
                            "reading {}: {e}",
                            path.display()
                        )));
                    }
                },
            }
        }
        Ok(Some(MatchingEngine::new(builder.build())))
    };

    Ok(EngineSet {
        block: build_one(block)?,
        allow: build_one(allow)?,
    })
}

/// A pending rebuild: the full source sets for both storages.
pub(crate) struct RebuildRequest {
    pub block: Vec<FilterSource>,
    pub allow: Vec<FilterSource>,
}

/// Atomic replacement of the matching engines.
///
/// The current generation lives behind an `ArcSwap`; readers take a cheap
/// guard and keep the generation alive for as long as they inspect rule
/// objects. The asynchronous path is a single-slot latest-wins queue
/// drained by one dedicated worker, so racing submitters coalesce.
pub(crate) struct SwapCoordinator {
    engines: ArcSwap<EngineSet>,
    slot: Mutex<Option<RebuildRequest>>,
    notify: Notify,
}

impl SwapCoordinator {
    pub fn new(initial: EngineSet) -> Self {
        Self {
            engines: ArcSwap::from_pointee(initial),
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    pub fn current(&self) -> Arc<EngineSet> {
        self.engines.load_full()
    }

    /// Synchronous path: build, then publish atomically. The previous
    /// generation is freed once its last reader drops.
    pub fn set_filters_sync(
        &self,
        block: &[FilterSource],
        allow: &[FilterSource],
    ) -> Result<(), DomainError> {
        let set = build_engine_set(block, allow)?;
        let block_rules = set.block.as_ref().map_or(0, MatchingEngine::rules_count);
        let allow_rules = set.allow.as_ref().map_or(0, MatchingEngine::rules_count);
        self.engines.store(Arc::new(set));
        info!(block_rules, allow_rules, "Matching engines swapped");
        Ok(())
    }

    /// Asynchronous path: replace whatever request is pending and wake the
    /// worker.
    pub async fn enqueue(&self, request: RebuildRequest) {
        let mut slot = self.slot.lock().await;
        if slot.replace(request).is_some() {
            debug!("Superseded a pending engine rebuild request");
        }
        drop(slot);
        self.notify.notify_one();
    }

    /// Dedicated worker: consume requests until shutdown. A failed build
    /// keeps the current generation and waits for the next trigger.
    pub async fn run_worker(&self, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Engine swap worker shutting down");
                    break;
                }
                _ = self.notify.notified() => {
                    let request = self.slot.lock().await.take();
                    if let Some(req) = request {
                        if let Err(e) = self.set_filters_sync(&req.block, &req.allow) {
                            error!(error = %e, "Engine rebuild failed; keeping current engines");
                        }
                    }
                }
            }
        }
    }
}
