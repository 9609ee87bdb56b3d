use crate::result::{
    DnsRewriteResult, FilterReason, FilterResult, ResultRule, RewriteValue,
};
use dnswarden_application::ports::HostsStorage;
use dnswarden_domain::builtin;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// Parse a reverse-DNS name (`4.3.2.1.in-addr.arpa`, `…ip6.arpa`) back into
/// the address it encodes.
pub fn reverse_dns_addr(name: &str) -> Option<IpAddr> {
    let name = name.strip_suffix('.').unwrap_or(name);

    if let Some(v4) = name.strip_suffix(".in-addr.arpa") {
        let mut octets: Vec<&str> = v4.split('.').collect();
        if octets.len() != 4 {
            return None;
        }
        octets.reverse();
        return octets.join(".").parse::<Ipv4Addr>().ok().map(IpAddr::V4);
    }

    if let Some(v6) = name.strip_suffix(".ip6.arpa") {
        let nibbles: Vec<&str> = v6.split('.').collect();
        if nibbles.len() != 32 || nibbles.iter().any(|n| n.len() != 1) {
            return None;
        }
        let mut text = String::with_capacity(39);
        for (i, nibble) in nibbles.iter().rev().enumerate() {
            if i > 0 && i % 4 == 0 {
                text.push(':');
            }
            text.push_str(nibble);
        }
        return text.parse::<Ipv6Addr>().ok().map(IpAddr::V6);
    }

    None
}

/// Translate OS hosts entries into DNS rewrite results.
pub struct HostsMatcher {
    storage: Arc<dyn HostsStorage>,
}

impl HostsMatcher {
    pub fn new(storage: Arc<dyn HostsStorage>) -> Self {
        Self { storage }
    }

    /// A/AAAA queries look the name up; PTR queries decode the reversed
    /// address and look that up. Other query types never match.
    pub fn check(&self, host: &str, qtype: RecordType) -> FilterResult {
        let mut rewrite = DnsRewriteResult::new(ResponseCode::NoError);
        let mut rules: Vec<ResultRule> = Vec::new();

        match qtype {
            RecordType::A | RecordType::AAAA => {
                let want_v4 = qtype == RecordType::A;
                for addr in self.storage.by_name(host) {
                    if addr.is_ipv4() != want_v4 {
                        continue;
                    }
                    rewrite
                        .response
                        .entry(qtype)
                        .or_default()
                        .push(RewriteValue::Ip(addr));
                    rules.push(ResultRule {
                        text: Arc::from(format!("{addr} {host}")),
                        ip: None,
                        filter_list_id: builtin::OS_HOSTS,
                    });
                }
            }
            RecordType::PTR => {
                let Some(addr) = reverse_dns_addr(host) else {
                    return FilterResult::not_found();
                };
                for name in self.storage.by_addr(addr) {
                    rewrite
                        .response
                        .entry(qtype)
                        .or_default()
                        .push(RewriteValue::Name(name.clone()));
                    rules.push(ResultRule {
                        text: Arc::from(format!("{addr} {name}")),
                        ip: None,
                        filter_list_id: builtin::OS_HOSTS,
                    });
                }
            }
            _ => return FilterResult::not_found(),
        }

        if rules.is_empty() {
            return FilterResult::not_found();
        }

        FilterResult {
            reason: FilterReason::RewrittenAutoHosts,
            is_filtered: false,
            dns_rewrite: Some(rewrite),
            rules,
            ..FilterResult::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    struct FakeHosts {
        by_name: FxHashMap<String, Vec<IpAddr>>,
        by_addr: FxHashMap<IpAddr, Vec<String>>,
    }

    impl FakeHosts {
        fn new() -> Self {
            let mut by_name: FxHashMap<String, Vec<IpAddr>> = FxHashMap::default();
            let mut by_addr: FxHashMap<IpAddr, Vec<String>> = FxHashMap::default();
            let v4: IpAddr = "192.168.1.10".parse().unwrap();
            let v6: IpAddr = "fd00::10".parse().unwrap();
            by_name.insert("nas.lan".to_string(), vec![v4, v6]);
            by_addr.insert(v4, vec!["nas.lan".to_string()]);
            Self { by_name, by_addr }
        }
    }

    impl HostsStorage for FakeHosts {
        fn by_name(&self, host: &str) -> Vec<IpAddr> {
            self.by_name.get(host).cloned().unwrap_or_default()
        }

        fn by_addr(&self, addr: IpAddr) -> Vec<String> {
            self.by_addr.get(&addr).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn test_reverse_dns_addr_v4() {
        assert_eq!(
            reverse_dns_addr("10.1.168.192.in-addr.arpa"),
            Some("192.168.1.10".parse().unwrap())
        );
        assert_eq!(reverse_dns_addr("1.168.192.in-addr.arpa"), None);
        assert_eq!(reverse_dns_addr("example.org"), None);
    }

    #[test]
    fn test_reverse_dns_addr_v6() {
        let name = "b.a.9.8.7.6.5.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa";
        assert_eq!(
            reverse_dns_addr(name),
            Some("2001:db8::567:89ab".parse().unwrap())
        );
    }

    #[test]
    fn test_a_query_returns_only_ipv4() {
        let m = HostsMatcher::new(Arc::new(FakeHosts::new()));
        let res = m.check("nas.lan", RecordType::A);
        assert_eq!(res.reason, FilterReason::RewrittenAutoHosts);
        let rewrite = res.dns_rewrite.unwrap();
        assert_eq!(rewrite.rcode, ResponseCode::NoError);
        assert_eq!(rewrite.response[&RecordType::A].len(), 1);
        assert_eq!(res.rules[0].filter_list_id, builtin::OS_HOSTS);
        assert_eq!(&*res.rules[0].text, "192.168.1.10 nas.lan");
    }

    #[test]
    fn test_ptr_query_resolves_names() {
        let m = HostsMatcher::new(Arc::new(FakeHosts::new()));
        let res = m.check("10.1.168.192.in-addr.arpa", RecordType::PTR);
        assert_eq!(res.reason, FilterReason::RewrittenAutoHosts);
        let rewrite = res.dns_rewrite.unwrap();
        assert_eq!(
            rewrite.response[&RecordType::PTR],
            vec![RewriteValue::Name("nas.lan".to_string())]
        );
    }

    #[test]
    fn test_unknown_host_and_qtype() {
        let m = HostsMatcher::new(Arc::new(FakeHosts::new()));
        assert_eq!(
            m.check("other.lan", RecordType::A).reason,
            FilterReason::NotFilteredNotFound
        );
        assert_eq!(
            m.check("nas.lan", RecordType::MX).reason,
            FilterReason::NotFilteredNotFound
        );
    }
}
