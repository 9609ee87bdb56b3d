//! DNS Warden filtering engine.
//!
//! Decides, for each hostname query, whether to block it, rewrite its
//! answer, permit it, or pass it through: legacy rewrites, the OS hosts
//! database, rule-list matching (allow/block), blocked services, and the
//! remote checkers, composed in a fixed order with short-circuit
//! semantics.
pub mod admin;
pub mod engine;
pub mod filter;
pub mod hosts;
mod lifecycle;
pub mod result;
pub mod rewrites;
pub mod rules;
pub mod services;
pub mod settings;
pub mod swap;

pub use engine::{EngineSet, MatchingEngine};
pub use filter::{DnsFilter, DnsFilterDeps};
pub use hosts::HostsMatcher;
pub use result::{DnsRewriteResult, FilterReason, FilterResult, ResultRule, RewriteValue};
pub use services::{compile_catalogue, CompiledService};
pub use settings::RequestSettings;
