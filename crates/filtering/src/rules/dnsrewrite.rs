use crate::result::{DnsRewriteResult, FilterReason, FilterResult, ResultRule, RewriteValue};
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;

use super::rule::NetworkRule;

/// Parsed `$dnsrewrite=` modifier value.
///
/// Shorthand forms: an RCODE keyword, an IP address, or a canonical name.
/// The full form is `RCODE;RRTYPE;VALUE`.
#[derive(Debug, Clone, PartialEq)]
pub struct DnsRewrite {
    pub rcode: ResponseCode,
    pub rtype: RecordType,
    pub value: Option<RewriteValue>,
    pub new_cname: Option<String>,
}

fn parse_rcode(s: &str) -> Option<ResponseCode> {
    match s {
        "NOERROR" => Some(ResponseCode::NoError),
        "NXDOMAIN" => Some(ResponseCode::NXDomain),
        "REFUSED" => Some(ResponseCode::Refused),
        "SERVFAIL" => Some(ResponseCode::ServFail),
        "FORMERR" => Some(ResponseCode::FormErr),
        _ => None,
    }
}

impl DnsRewrite {
    fn from_rcode(rcode: ResponseCode) -> Self {
        Self {
            rcode,
            rtype: RecordType::A,
            value: None,
            new_cname: None,
        }
    }

    fn from_ip(ip: IpAddr) -> Self {
        Self {
            rcode: ResponseCode::NoError,
            rtype: if ip.is_ipv4() {
                RecordType::A
            } else {
                RecordType::AAAA
            },
            value: Some(RewriteValue::Ip(ip)),
            new_cname: None,
        }
    }

    fn from_cname(name: &str) -> Self {
        Self {
            rcode: ResponseCode::NoError,
            rtype: RecordType::CNAME,
            value: None,
            new_cname: Some(name.to_ascii_lowercase()),
        }
    }

    /// Parse a `$dnsrewrite=` value. Returns `None` for malformed input,
    /// which invalidates the whole rule line.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(';');
        let first = parts.next()?;

        let second = parts.next();
        if second.is_none() {
            // Shorthand.
            if let Some(rcode) = parse_rcode(first) {
                return Some(Self::from_rcode(rcode));
            }
            if let Ok(ip) = first.parse::<IpAddr>() {
                return Some(Self::from_ip(ip));
            }
            return Some(Self::from_cname(first));
        }

        let rcode = parse_rcode(first)?;
        let rtype_text = second?;
        let rest = parts.next().unwrap_or("");

        if rcode != ResponseCode::NoError {
            return Some(Self::from_rcode(rcode));
        }

        let rtype: RecordType = rtype_text.parse().ok()?;
        match rtype {
            RecordType::A | RecordType::AAAA => {
                let ip: IpAddr = rest.parse().ok()?;
                let expect_v4 = rtype == RecordType::A;
                if ip.is_ipv4() != expect_v4 {
                    return None;
                }
                Some(Self {
                    rcode,
                    rtype,
                    value: Some(RewriteValue::Ip(ip)),
                    new_cname: None,
                })
            }
            RecordType::CNAME => Some(Self::from_cname(rest)),
            RecordType::PTR => Some(Self {
                rcode,
                rtype,
                value: Some(RewriteValue::Name(rest.to_ascii_lowercase())),
                new_cname: None,
            }),
            _ => Some(Self {
                rcode,
                rtype,
                value: Some(RewriteValue::Text(rest.to_string())),
                new_cname: None,
            }),
        }
    }
}

fn result_rule(rule: &NetworkRule) -> ResultRule {
    ResultRule {
        text: rule.text.clone(),
        ip: None,
        filter_list_id: rule.filter_list_id,
    }
}

/// Evaluate the `$dnsrewrite` rules matched for `host` (spec order: a new
/// canonical name wins outright, then a non-success RCODE, then all
/// success records accumulate).
///
/// The caller discards results whose canonical name equals the queried
/// host, so matching can continue through other mechanisms.
pub fn evaluate(rules: &[&NetworkRule]) -> Option<FilterResult> {
    if rules.is_empty() {
        return None;
    }

    for rule in rules {
        let Some(rw) = rule.dns_rewrite.as_ref() else {
            continue;
        };
        if let Some(cname) = &rw.new_cname {
            if !cname.is_empty() {
                return Some(FilterResult {
                    reason: FilterReason::RewrittenRule,
                    is_filtered: false,
                    canon_name: Some(cname.clone()),
                    rules: vec![result_rule(rule)],
                    ..FilterResult::default()
                });
            }
        }
    }

    for rule in rules {
        let Some(rw) = rule.dns_rewrite.as_ref() else {
            continue;
        };
        if rw.rcode != ResponseCode::NoError {
            return Some(FilterResult {
                reason: FilterReason::RewrittenRule,
                is_filtered: false,
                dns_rewrite: Some(DnsRewriteResult::new(rw.rcode)),
                rules: vec![result_rule(rule)],
                ..FilterResult::default()
            });
        }
    }

    let mut rewrite = DnsRewriteResult::new(ResponseCode::NoError);
    let mut matched_rules = Vec::with_capacity(rules.len());
    for rule in rules {
        let Some(rw) = rule.dns_rewrite.as_ref() else {
            continue;
        };
        if let Some(value) = &rw.value {
            rewrite
                .response
                .entry(rw.rtype)
                .or_default()
                .push(value.clone());
        }
        matched_rules.push(result_rule(rule));
    }

    Some(FilterResult {
        reason: FilterReason::RewrittenRule,
        is_filtered: false,
        dns_rewrite: Some(rewrite),
        rules: matched_rules,
        ..FilterResult::default()
    })
}
