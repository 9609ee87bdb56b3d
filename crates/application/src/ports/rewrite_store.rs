use async_trait::async_trait;
use dnswarden_domain::{DomainError, LegacyRewrite};

/// Admin-facing store of legacy rewrite records.
#[async_trait]
pub trait RewriteStore: Send + Sync {
    async fn list_rewrites(&self) -> Vec<LegacyRewrite>;

    async fn add_rewrite(&self, rewrite: LegacyRewrite) -> Result<(), DomainError>;

    /// Remove the first record matching `(domain, answer)` exactly.
    async fn remove_rewrite(&self, domain: &str, answer: &str) -> Result<(), DomainError>;
}
