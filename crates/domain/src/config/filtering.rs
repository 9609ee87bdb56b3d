use crate::blocked_services::BlockedServicesConfig;
use crate::errors::DomainError;
use crate::filter_list::FilterListConf;
use crate::rewrite::LegacyRewrite;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How blocked responses are labelled for the DNS layer.
///
/// The core never constructs blocked responses itself; this is carried
/// through so the server layer can build them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingMode {
    CustomIp,
    Default,
    NullIp,
    Nxdomain,
    Refused,
}

impl Default for BlockingMode {
    fn default() -> Self {
        BlockingMode::Default
    }
}

/// Automatic refresh interval for filter lists, in hours. Zero disables the
/// refresh job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct UpdateInterval(u32);

impl UpdateInterval {
    pub const ALLOWED: [u32; 6] = [0, 1, 12, 24, 72, 168];

    pub fn new(hours: u32) -> Result<Self, DomainError> {
        if Self::ALLOWED.contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(DomainError::InvalidUpdateInterval(hours))
        }
    }

    pub fn hours(&self) -> u32 {
        self.0
    }

    pub fn is_disabled(&self) -> bool {
        self.0 == 0
    }
}

impl Default for UpdateInterval {
    fn default() -> Self {
        Self(24)
    }
}

impl TryFrom<u32> for UpdateInterval {
    type Error = DomainError;

    fn try_from(hours: u32) -> Result<Self, Self::Error> {
        Self::new(hours)
    }
}

impl From<UpdateInterval> for u32 {
    fn from(i: UpdateInterval) -> u32 {
        i.0
    }
}

/// Full filtering configuration: global flags plus the mutable rule sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilteringConfig {
    #[serde(default = "default_true")]
    pub filtering_enabled: bool,

    #[serde(default = "default_true")]
    pub protection_enabled: bool,

    #[serde(default)]
    pub safe_browsing_enabled: bool,

    #[serde(default)]
    pub parental_enabled: bool,

    #[serde(default)]
    pub safe_search_enabled: bool,

    #[serde(default)]
    pub blocking_mode: BlockingMode,

    #[serde(default)]
    pub filters_update_interval: UpdateInterval,

    /// Directory holding `filters/<id>.txt` files.
    pub data_dir: PathBuf,

    /// Block filter lists.
    #[serde(default)]
    pub filters: Vec<FilterListConf>,

    /// Allow filter lists.
    #[serde(default)]
    pub whitelist_filters: Vec<FilterListConf>,

    /// Custom user rules, stored inline rather than on disk.
    #[serde(default)]
    pub user_rules: Vec<String>,

    #[serde(default)]
    pub rewrites: Vec<LegacyRewrite>,

    #[serde(default)]
    pub blocked_services: BlockedServicesConfig,
}

fn default_true() -> bool {
    true
}

impl FilteringConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            filtering_enabled: true,
            protection_enabled: true,
            safe_browsing_enabled: false,
            parental_enabled: false,
            safe_search_enabled: false,
            blocking_mode: BlockingMode::default(),
            filters_update_interval: UpdateInterval::default(),
            data_dir: data_dir.into(),
            filters: Vec::new(),
            whitelist_filters: Vec::new(),
            user_rules: Vec::new(),
            rewrites: Vec::new(),
            blocked_services: BlockedServicesConfig::default(),
        }
    }
}

/// Per-engine safe-search toggles, consumed by the safe-search checker's
/// `update` contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeSearchConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bing: bool,
    #[serde(default)]
    pub duckduckgo: bool,
    #[serde(default)]
    pub google: bool,
    #[serde(default)]
    pub yandex: bool,
    #[serde(default)]
    pub youtube: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_interval_allowed_values() {
        for hours in UpdateInterval::ALLOWED {
            assert!(UpdateInterval::new(hours).is_ok());
        }
        assert!(matches!(
            UpdateInterval::new(5),
            Err(DomainError::InvalidUpdateInterval(5))
        ));
    }

    #[test]
    fn test_update_interval_zero_disables() {
        assert!(UpdateInterval::new(0).unwrap().is_disabled());
        assert!(!UpdateInterval::default().is_disabled());
    }

    #[test]
    fn test_blocking_mode_serde_names() {
        let json = serde_json::to_string(&BlockingMode::NullIp).unwrap();
        assert_eq!(json, r#""null_ip""#);
        let back: BlockingMode = serde_json::from_str(r#""nxdomain""#).unwrap();
        assert_eq!(back, BlockingMode::Nxdomain);
    }
}
