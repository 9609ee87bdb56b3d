use crate::services::CompiledService;
use dnswarden_domain::FilteringConfig;
use std::net::IpAddr;

/// Per-request filtering settings: the global flags snapshotted at query
/// time plus the per-client overlay. Immutable for the duration of the
/// query.
#[derive(Clone, Default)]
pub struct RequestSettings {
    pub client_name: Option<String>,
    pub client_ip: Option<IpAddr>,
    pub client_tags: Vec<String>,

    /// Service rule sets already reduced by the pause schedule.
    pub services_rules: Vec<CompiledService>,

    pub protection_enabled: bool,
    pub filtering_enabled: bool,
    pub safe_search_enabled: bool,
    pub safe_browsing_enabled: bool,
    pub parental_enabled: bool,
}

impl RequestSettings {
    /// Snapshot the global flags; the caller applies any per-client
    /// overrides on top.
    pub fn from_config(conf: &FilteringConfig) -> Self {
        Self {
            protection_enabled: conf.protection_enabled,
            filtering_enabled: conf.filtering_enabled,
            safe_search_enabled: conf.safe_search_enabled,
            safe_browsing_enabled: conf.safe_browsing_enabled,
            parental_enabled: conf.parental_enabled,
            ..Self::default()
        }
    }

    /// Everything on, no client overlay. Handy for tests and diagnostics.
    pub fn enabled() -> Self {
        Self {
            protection_enabled: true,
            filtering_enabled: true,
            safe_search_enabled: true,
            safe_browsing_enabled: true,
            parental_enabled: true,
            ..Self::default()
        }
    }
}
