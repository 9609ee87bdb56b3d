pub mod checker;
pub mod filter_store;
pub mod hosts_storage;
pub mod refresher;
pub mod rewrite_store;
pub mod services_store;

pub use checker::{Checker, SafeSearchChecker};
pub use filter_store::{FilterListStore, FilterProperties};
pub use hosts_storage::HostsStorage;
pub use refresher::{FilterRefresher, RefreshOutcome};
pub use rewrite_store::RewriteStore;
pub use services_store::BlockedServicesStore;
