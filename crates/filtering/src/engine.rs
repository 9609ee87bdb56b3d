use crate::result::{FilterResult, ResultRule};
use crate::rules::storage::DnsResult;
use crate::rules::{dnsrewrite, HostRule, RuleListStorage, RuleQuery};
use crate::settings::RequestSettings;
use hickory_proto::rr::RecordType;

/// Matching engine over one compiled rule storage.
pub struct MatchingEngine {
    storage: RuleListStorage,
}

impl MatchingEngine {
    pub fn new(storage: RuleListStorage) -> Self {
        Self { storage }
    }

    pub fn rules_count(&self) -> usize {
        self.storage.rules_count()
    }

    pub fn match_request<'s>(&'s self, q: &RuleQuery<'_>) -> (DnsResult<'s>, bool) {
        let res = self.storage.match_request(q);
        let matched = res.matched();
        (res, matched)
    }
}

/// One generation of the filtering state: a block engine and an optional
/// allow engine. Built as a unit and swapped atomically; readers that
/// looked it up keep it alive until they drop their guard.
#[derive(Default)]
pub struct EngineSet {
    pub block: Option<MatchingEngine>,
    pub allow: Option<MatchingEngine>,
}

fn host_rule_result(rule: &HostRule, with_ip: bool) -> ResultRule {
    ResultRule {
        text: rule.text.clone(),
        ip: with_ip.then_some(rule.ip),
        filter_list_id: rule.filter_list_id,
    }
}

impl EngineSet {
    /// Match one host against the allow and block storages.
    ///
    /// Order: the allow storage short-circuits (only while protection is
    /// on), then `$dnsrewrite` rules from the block storage, then host
    /// rules by query type, then the winning network rule.
    pub fn match_host(&self, q: &RuleQuery<'_>, settings: &RequestSettings) -> FilterResult {
        if settings.protection_enabled {
            if let Some(allow) = &self.allow {
                let (res, matched) = allow.match_request(q);
                if matched {
                    let mut rules: Vec<ResultRule> = Vec::new();
                    if let Some(rule) = res.network_rule {
                        rules.push(ResultRule {
                            text: rule.text.clone(),
                            ip: None,
                            filter_list_id: rule.filter_list_id,
                        });
                    }
                    for rule in res.host_rules_v4.iter().chain(&res.host_rules_v6) {
                        rules.push(host_rule_result(rule, false));
                    }
                    return FilterResult::allowed(rules);
                }
            }
        }

        let Some(block) = &self.block else {
            return FilterResult::not_found();
        };
        let (res, matched) = block.match_request(q);
        if !matched {
            return FilterResult::not_found();
        }

        if let Some(rewritten) = dnsrewrite::evaluate(res.dns_rewrites()) {
            // A rewrite onto the queried host itself is a no-op; fall
            // through to the other mechanisms.
            if rewritten.canon_name.as_deref() != Some(q.host) {
                return rewritten;
            }
        }

        if !res.host_rules_v4.is_empty() || !res.host_rules_v6.is_empty() {
            return match q.qtype {
                RecordType::A if !res.host_rules_v4.is_empty() => FilterResult::blocked(
                    res.host_rules_v4
                        .iter()
                        .map(|r| host_rule_result(r, true))
                        .collect(),
                ),
                RecordType::AAAA if !res.host_rules_v6.is_empty() => FilterResult::blocked(
                    res.host_rules_v6
                        .iter()
                        .map(|r| host_rule_result(r, true))
                        .collect(),
                ),
                _ => {
                    // Any other combination answers with the first matched
                    // host rule of either family, without an address.
                    let first = res
                        .host_rules_v4
                        .first()
                        .or_else(|| res.host_rules_v6.first())
                        .copied();
                    match first {
                        Some(rule) => FilterResult::blocked(vec![host_rule_result(rule, false)]),
                        None => FilterResult::not_found(),
                    }
                }
            };
        }

        if let Some(rule) = res.network_rule {
            let entry = ResultRule {
                text: rule.text.clone(),
                ip: None,
                filter_list_id: rule.filter_list_id,
            };
            return if rule.whitelist {
                FilterResult::allowed(vec![entry])
            } else {
                FilterResult::blocked(vec![entry])
            };
        }

        FilterResult::not_found()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::FilterReason;
    use crate::rules::StorageBuilder;

    fn engines(block: &[&str], allow: &[&str]) -> EngineSet {
        let mut set = EngineSet::default();
        if !block.is_empty() {
            let mut b = StorageBuilder::new();
            b.add_filter_text(1, &block.join("\n"));
            set.block = Some(MatchingEngine::new(b.build()));
        }
        if !allow.is_empty() {
            let mut b = StorageBuilder::new();
            b.add_filter_text(2, &allow.join("\n"));
            set.allow = Some(MatchingEngine::new(b.build()));
        }
        set
    }

    fn query(host: &str, qtype: RecordType) -> RuleQuery<'_> {
        RuleQuery {
            host,
            qtype,
            client_ip: None,
            client_name: None,
            client_tags: &[],
        }
    }

    fn settings() -> RequestSettings {
        RequestSettings::enabled()
    }

    #[test]
    fn test_allow_storage_wins_when_protection_on() {
        let set = engines(&["||example.org^"], &["||example.org^"]);
        let res = set.match_host(&query("example.org", RecordType::A), &settings());
        assert_eq!(res.reason, FilterReason::NotFilteredAllowList);
        assert!(!res.is_filtered);
    }

    #[test]
    fn test_allow_storage_skipped_when_protection_off() {
        let set = engines(&["||example.org^"], &["||example.org^"]);
        let mut s = settings();
        s.protection_enabled = false;
        let res = set.match_host(&query("example.org", RecordType::A), &s);
        assert_eq!(res.reason, FilterReason::FilteredBlockList);
    }

    #[test]
    fn test_a_query_with_only_aaaa_host_rules_blocks_without_ip() {
        let set = engines(&[":: blocked.example"], &[]);
        let res = set.match_host(&query("blocked.example", RecordType::A), &settings());
        assert_eq!(res.reason, FilterReason::FilteredBlockList);
        assert_eq!(res.rules.len(), 1);
        assert!(res.rules[0].ip.is_none());
    }

    #[test]
    fn test_a_query_collects_all_v4_host_rule_ips() {
        let set = engines(&["0.0.0.0 blocked.example", "127.0.0.1 blocked.example"], &[]);
        let res = set.match_host(&query("blocked.example", RecordType::A), &settings());
        assert_eq!(res.rules.len(), 2);
        assert!(res.rules.iter().all(|r| r.ip.is_some()));
    }

    #[test]
    fn test_dnsrewrite_to_same_host_is_noop() {
        let set = engines(
            &["|self.example^$dnsrewrite=self.example", "||self.example^"],
            &[],
        );
        let res = set.match_host(&query("self.example", RecordType::A), &settings());
        // The rewrite is discarded; the plain block rule decides.
        assert_eq!(res.reason, FilterReason::FilteredBlockList);
    }
}
