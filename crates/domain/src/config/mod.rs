//! Configuration structures consumed by the filtering core.
//!
//! Loading (YAML/CLI) happens outside the core; these are the already-parsed
//! shapes handed in at construction time.

pub mod filtering;

pub use filtering::{BlockingMode, FilteringConfig, SafeSearchConfig, UpdateInterval};
