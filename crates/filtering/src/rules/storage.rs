use super::parser::{parse_rule_line, ParsedLine};
use super::rule::{HostRule, NetworkRule, RuleQuery};
use super::trie::DomainTrie;
use aho_corasick::AhoCorasick;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use std::collections::HashMap;
use tracing::warn;

/// Everything the rule engine found for one request in one storage.
///
/// Borrows rule objects owned by the storage; callers convert to an owned
/// result before the storage guard is released.
#[derive(Debug, Default)]
pub struct DnsResult<'s> {
    /// Winning network rule after `$important`/whitelist precedence.
    pub network_rule: Option<&'s NetworkRule>,
    pub host_rules_v4: Vec<&'s HostRule>,
    pub host_rules_v6: Vec<&'s HostRule>,
    dns_rewrites: Vec<&'s NetworkRule>,
}

impl<'s> DnsResult<'s> {
    pub fn matched(&self) -> bool {
        self.network_rule.is_some()
            || !self.host_rules_v4.is_empty()
            || !self.host_rules_v6.is_empty()
            || !self.dns_rewrites.is_empty()
    }

    /// Matched `$dnsrewrite` rules, already reduced by whitelist
    /// cancellation.
    pub fn dns_rewrites(&self) -> &[&'s NetworkRule] {
        &self.dns_rewrites
    }
}

/// Compiled, queryable form of one or more filter lists.
///
/// Immutable once built; replaced wholesale by the engine swap. Network
/// rules with a domain key live in a reversed-label trie, substring rules
/// in one Aho-Corasick automaton, host rules in an exact-name index.
pub struct RuleListStorage {
    network: Vec<NetworkRule>,
    hosts: Vec<HostRule>,
    trie: DomainTrie,
    substring_ids: Vec<u32>,
    substring_ac: Option<AhoCorasick>,
    host_index: HashMap<String, SmallVec<[u32; 2]>, FxBuildHasher>,
}

pub struct StorageBuilder {
    network: Vec<NetworkRule>,
    hosts: Vec<HostRule>,
}

impl StorageBuilder {
    pub fn new() -> Self {
        Self {
            network: Vec::new(),
            hosts: Vec::new(),
        }
    }

    /// Parse the text of one filter list. Unintelligible lines are skipped.
    pub fn add_filter_text(&mut self, filter_list_id: i32, text: &str) {
        for line in text.lines() {
            match parse_rule_line(line, filter_list_id) {
                Some(ParsedLine::Network(rule)) => self.network.push(rule),
                Some(ParsedLine::Hosts(rules)) => self.hosts.extend(rules),
                None => {}
            }
        }
    }

    pub fn build(self) -> RuleListStorage {
        let mut trie = DomainTrie::new();
        let mut substring_ids = Vec::new();
        let mut substring_patterns: Vec<&str> = Vec::new();

        for (id, rule) in self.network.iter().enumerate() {
            match rule.pattern.domain_key() {
                Some(domain) => trie.insert(domain, id as u32),
                None => {
                    if let super::rule::Pattern::Substring(s) = &rule.pattern {
                        substring_ids.push(id as u32);
                        substring_patterns.push(s);
                    }
                }
            }
        }

        let substring_ac = if substring_patterns.is_empty() {
            None
        } else {
            match AhoCorasick::builder().build(&substring_patterns) {
                Ok(ac) => Some(ac),
                Err(e) => {
                    warn!(error = %e, "Failed to compile substring rule automaton");
                    None
                }
            }
        };

        let mut host_index: HashMap<String, SmallVec<[u32; 2]>, FxBuildHasher> =
            HashMap::with_capacity_and_hasher(self.hosts.len(), FxBuildHasher);
        for (id, rule) in self.hosts.iter().enumerate() {
            host_index
                .entry(rule.hostname.clone())
                .or_default()
                .push(id as u32);
        }

        RuleListStorage {
            network: self.network,
            hosts: self.hosts,
            trie,
            substring_ids,
            substring_ac,
            host_index,
        }
    }
}

impl Default for StorageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleListStorage {
    pub fn rules_count(&self) -> usize {
        self.network.len() + self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules_count() == 0
    }

    /// Answer a single match query.
    pub fn match_request<'s>(&'s self, q: &RuleQuery<'_>) -> DnsResult<'s> {
        let mut candidates: SmallVec<[u32; 16]> = self
            .trie
            .lookup(q.host)
            .into_iter()
            .map(|hit| hit.rule_id)
            .collect();

        if let Some(ac) = &self.substring_ac {
            for m in ac.find_overlapping_iter(q.host) {
                candidates.push(self.substring_ids[m.pattern().as_usize()]);
            }
        }
        candidates.sort_unstable();
        candidates.dedup();

        let mut result = DnsResult::default();
        let mut cancel_rewrites = false;

        for id in candidates {
            let rule = &self.network[id as usize];
            if !rule.matches_query(q) {
                continue;
            }

            if rule.dns_rewrite.is_some() {
                if rule.whitelist {
                    cancel_rewrites = true;
                } else {
                    result.dns_rewrites.push(rule);
                }
                continue;
            }

            let better = match result.network_rule {
                Some(current) => rule.priority() > current.priority(),
                None => true,
            };
            if better {
                result.network_rule = Some(rule);
            }
        }

        if cancel_rewrites {
            result.dns_rewrites.clear();
        }

        if let Some(ids) = self.host_index.get(q.host) {
            for &id in ids {
                let rule = &self.hosts[id as usize];
                if rule.ip.is_ipv4() {
                    result.host_rules_v4.push(rule);
                } else {
                    result.host_rules_v6.push(rule);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::RecordType;

    fn storage(rules: &[&str]) -> RuleListStorage {
        let mut b = StorageBuilder::new();
        b.add_filter_text(1, &rules.join("\n"));
        b.build()
    }

    fn query(host: &str) -> RuleQuery<'_> {
        RuleQuery {
            host,
            qtype: RecordType::A,
            client_ip: None,
            client_name: None,
            client_tags: &[],
        }
    }

    #[test]
    fn test_domain_anchor_matches_subdomain() {
        let s = storage(&["||doubleclick.net^"]);
        let res = s.match_request(&query("www.doubleclick.net"));
        assert!(res.matched());
        assert_eq!(
            &*res.network_rule.unwrap().text,
            "||doubleclick.net^"
        );
    }

    #[test]
    fn test_whitelist_beats_plain_block() {
        let s = storage(&["||example.org^", "@@||test.example.org"]);

        let blocked = s.match_request(&query("example.org"));
        assert!(!blocked.network_rule.unwrap().whitelist);

        let allowed = s.match_request(&query("test.example.org"));
        assert!(allowed.network_rule.unwrap().whitelist);

        let miss = s.match_request(&query("testexample.org"));
        assert!(!miss.matched());
    }

    #[test]
    fn test_important_beats_whitelist() {
        let s = storage(&["@@||example.org^", "||test.example.org^$important"]);

        let allowed = s.match_request(&query("example.org"));
        assert!(allowed.network_rule.unwrap().whitelist);

        let blocked = s.match_request(&query("test.example.org"));
        let rule = blocked.network_rule.unwrap();
        assert!(!rule.whitelist);
        assert!(rule.important);
    }

    #[test]
    fn test_dnsrewrite_rules_are_separated() {
        let s = storage(&["|a-records^$dnsrewrite=127.0.0.1", "||a-records^"]);
        let res = s.match_request(&query("a-records"));
        assert_eq!(res.dns_rewrites().len(), 1);
        assert!(res.network_rule.is_some());
    }

    #[test]
    fn test_whitelist_dnsrewrite_cancels() {
        let s = storage(&[
            "|host.example^$dnsrewrite=127.0.0.1",
            "@@||host.example^$dnsrewrite",
        ]);
        let res = s.match_request(&query("host.example"));
        assert!(res.dns_rewrites().is_empty());
    }

    #[test]
    fn test_host_rules_split_by_family() {
        let s = storage(&["0.0.0.0 blocked.example", ":: blocked.example"]);
        let res = s.match_request(&query("blocked.example"));
        assert_eq!(res.host_rules_v4.len(), 1);
        assert_eq!(res.host_rules_v6.len(), 1);
    }

    #[test]
    fn test_substring_rule() {
        let s = storage(&["/tracker/"]);
        assert!(s.match_request(&query("mytracker.example")).matched());
        assert!(!s.match_request(&query("clean.example")).matched());
    }

    #[test]
    fn test_rules_count() {
        let s = storage(&["||a.example^", "# comment", "0.0.0.0 b.example", ""]);
        assert_eq!(s.rules_count(), 2);
    }
}
