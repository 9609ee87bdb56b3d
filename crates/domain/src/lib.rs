//! DNS Warden domain layer: configuration shapes, filter-list metadata,
//! legacy rewrites, and validation shared by every other crate.
pub mod blocked_services;
pub mod config;
pub mod errors;
pub mod filter_list;
pub mod rewrite;
pub mod schedule;
pub mod validators;

pub use blocked_services::{find_service, BlockedServicesConfig, ServiceEntry, SERVICE_CATALOGUE};
pub use config::{BlockingMode, FilteringConfig, SafeSearchConfig, UpdateInterval};
pub use errors::DomainError;
pub use filter_list::{builtin, FilterListConf, IdGenerator};
pub use rewrite::{LegacyRewrite, RewriteKind};
pub use schedule::{DayRange, WeeklySchedule};
