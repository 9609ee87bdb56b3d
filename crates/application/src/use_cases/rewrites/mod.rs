use crate::ports::RewriteStore;
use dnswarden_domain::{validators, DomainError, LegacyRewrite};
use std::sync::Arc;
use tracing::info;

/// Add one legacy rewrite record. The answer's kind and IP are derived
/// during normalisation, so only `(domain, answer)` is taken.
pub struct AddRewriteUseCase {
    store: Arc<dyn RewriteStore>,
}

impl AddRewriteUseCase {
    pub fn new(store: Arc<dyn RewriteStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, domain: &str, answer: &str) -> Result<(), DomainError> {
        validators::validate_rewrite_domain(domain)?;
        if answer.is_empty() {
            return Err(DomainError::Validation(
                "rewrite answer cannot be empty".to_string(),
            ));
        }

        let rewrite = LegacyRewrite::new(domain, answer);
        self.store.add_rewrite(rewrite).await?;
        info!(domain, answer, "Rewrite added");
        Ok(())
    }
}

/// Remove the rewrite matching `(domain, answer)` exactly.
pub struct RemoveRewriteUseCase {
    store: Arc<dyn RewriteStore>,
}

impl RemoveRewriteUseCase {
    pub fn new(store: Arc<dyn RewriteStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, domain: &str, answer: &str) -> Result<(), DomainError> {
        self.store.remove_rewrite(domain, answer).await?;
        info!(domain, answer, "Rewrite removed");
        Ok(())
    }
}

/// List all configured rewrites in their stored order.
pub struct ListRewritesUseCase {
    store: Arc<dyn RewriteStore>,
}

impl ListRewritesUseCase {
    pub fn new(store: Arc<dyn RewriteStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self) -> Vec<LegacyRewrite> {
        self.store.list_rewrites().await
    }
}
