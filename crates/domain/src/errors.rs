use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid filter URL: {0}")]
    InvalidFilterUrl(String),

    #[error("Invalid update interval: {0} hours")]
    InvalidUpdateInterval(u32),

    #[error("Unknown blocked service: {0}")]
    UnknownService(String),

    #[error("Filter list already exists: {0}")]
    DuplicateFilter(String),

    #[error("Filter list not found: {0}")]
    FilterNotFound(String),

    #[error("Rewrite not found: {0}")]
    RewriteNotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Rejected filter content: {0}")]
    ContentRejected(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Rule storage error: {0}")]
    StorageError(String),

    #[error("Checker {name} failed: {message}")]
    CheckerFailed { name: &'static str, message: String },
}

impl DomainError {
    /// True for failures where retrying later can succeed (refresh backoff
    /// doubles on these).
    pub fn is_transient(&self) -> bool {
        matches!(self, DomainError::NetworkError(_) | DomainError::IoError(_))
    }
}
