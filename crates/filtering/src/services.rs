use crate::result::{FilterReason, FilterResult, ResultRule};
use crate::rules::parser::{parse_rule_line, ParsedLine};
use crate::rules::NetworkRule;
use crate::settings::RequestSettings;
use chrono::{DateTime, Utc};
use dnswarden_domain::{builtin, BlockedServicesConfig, SERVICE_CATALOGUE};
use std::sync::Arc;
use tracing::warn;

/// One catalogue service with its rules compiled for matching.
#[derive(Clone)]
pub struct CompiledService {
    pub id: &'static str,
    pub name: &'static str,
    pub rules: Arc<[NetworkRule]>,
}

/// Compile the built-in service catalogue once at startup.
pub fn compile_catalogue() -> Vec<CompiledService> {
    SERVICE_CATALOGUE
        .iter()
        .map(|entry| {
            let rules: Vec<NetworkRule> = entry
                .rules
                .iter()
                .filter_map(|text| match parse_rule_line(text, builtin::BLOCKED_SERVICES) {
                    Some(ParsedLine::Network(rule)) => Some(rule),
                    _ => {
                        warn!(service = entry.id, rule = text, "Unparseable service rule");
                        None
                    }
                })
                .collect();
            CompiledService {
                id: entry.id,
                name: entry.name,
                rules: rules.into(),
            }
        })
        .collect()
}

/// Pick the per-request service rules for the configured IDs, honouring the
/// pause schedule. The matcher itself never consults the schedule.
pub fn service_rules_at(
    conf: &BlockedServicesConfig,
    compiled: &[CompiledService],
    now: DateTime<Utc>,
) -> Vec<CompiledService> {
    if conf.ids.is_empty() || conf.schedule.contains(now) {
        return Vec::new();
    }
    conf.ids
        .iter()
        .filter_map(|id| compiled.iter().find(|svc| svc.id == id.as_str()).cloned())
        .collect()
}

/// Match a hostname against the per-request service rule sets; first match
/// wins.
pub fn match_blocked_services(host: &str, settings: &RequestSettings) -> FilterResult {
    if !settings.protection_enabled || settings.services_rules.is_empty() {
        return FilterResult::not_found();
    }

    for service in &settings.services_rules {
        for rule in service.rules.iter() {
            if rule.matches_hostname(host) {
                return FilterResult {
                    reason: FilterReason::FilteredBlockedService,
                    is_filtered: true,
                    service_name: Some(service.id.to_string()),
                    rules: vec![ResultRule {
                        text: rule.text.clone(),
                        ip: None,
                        filter_list_id: builtin::BLOCKED_SERVICES,
                    }],
                    ..FilterResult::default()
                };
            }
        }
    }

    FilterResult::not_found()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dnswarden_domain::{DayRange, WeeklySchedule};

    fn settings_with(ids: &[&str]) -> RequestSettings {
        let compiled = compile_catalogue();
        let conf = BlockedServicesConfig {
            ids: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };
        let mut settings = RequestSettings::enabled();
        settings.services_rules = service_rules_at(&conf, &compiled, Utc::now());
        settings
    }

    #[test]
    fn test_blocked_service_matches_subdomain() {
        let settings = settings_with(&["facebook"]);
        let res = match_blocked_services("www.facebook.com", &settings);
        assert_eq!(res.reason, FilterReason::FilteredBlockedService);
        assert!(res.is_filtered);
        assert_eq!(res.service_name.as_deref(), Some("facebook"));
        assert_eq!(res.rules[0].filter_list_id, builtin::BLOCKED_SERVICES);
    }

    #[test]
    fn test_unlisted_service_not_matched() {
        let settings = settings_with(&["facebook"]);
        let res = match_blocked_services("www.tiktok.com", &settings);
        assert_eq!(res.reason, FilterReason::NotFilteredNotFound);
    }

    #[test]
    fn test_protection_disabled_skips_services() {
        let mut settings = settings_with(&["facebook"]);
        settings.protection_enabled = false;
        let res = match_blocked_services("facebook.com", &settings);
        assert_eq!(res.reason, FilterReason::NotFilteredNotFound);
    }

    #[test]
    fn test_schedule_pause_suppresses_rules() {
        let compiled = compile_catalogue();
        // Pause window covering the whole week.
        let all_day = Some(DayRange { start: 0, end: 1440 });
        let conf = BlockedServicesConfig {
            schedule: WeeklySchedule {
                sun: all_day,
                mon: all_day,
                tue: all_day,
                wed: all_day,
                thu: all_day,
                fri: all_day,
                sat: all_day,
            },
            ids: vec!["facebook".into()],
        };
        assert!(service_rules_at(&conf, &compiled, Utc::now()).is_empty());
    }
}
