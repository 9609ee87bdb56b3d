//! DNS Warden background jobs.
mod filter_refresh;
mod runner;

pub use filter_refresh::FilterRefreshJob;
pub use runner::JobRunner;
