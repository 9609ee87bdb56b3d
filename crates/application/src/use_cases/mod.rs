pub mod filters;
pub mod rewrites;
pub mod services;

pub use filters::{
    AddFilterUseCase, RefreshFiltersUseCase, RemoveFilterUseCase, UpdateFilterUseCase,
};
pub use rewrites::{AddRewriteUseCase, ListRewritesUseCase, RemoveRewriteUseCase};
pub use services::{GetBlockedServicesUseCase, UpdateBlockedServicesUseCase};
